use super::types::{
    ApiResponse, ProxyResponse, SourceCodeItem, VerificationStatus, VerifySourceCodeRequest,
};
use ethabi::Address;
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error occurred while sending request: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("unexpected status code: {status_code} - {msg}")]
    UnexpectedStatusCode {
        status_code: StatusCode,
        msg: String,
    },
    #[error("explorer responded with an error: {message} - {result}")]
    Notok { message: String, result: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Client of the etherscan-like contract verification api. Blockscout and most
/// of the etherscan clones expose the same `module=contract` endpoints.
#[derive(Clone)]
pub struct Client {
    api_url: Url,
    api_key: Option<String>,
    chain_id: Option<u64>,
    reqwest_client: reqwest::Client,
}

#[derive(Serialize)]
struct CommonQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    apikey: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chainid: Option<u64>,
    module: &'a str,
    action: &'a str,
}

impl Client {
    pub fn new(
        api_url: Url,
        api_key: Option<String>,
        chain_id: Option<u64>,
        request_timeout: Duration,
    ) -> Result<Self, Error> {
        let reqwest_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            api_url,
            api_key,
            chain_id,
            reqwest_client,
        })
    }

    fn common_query<'a>(&'a self, module: &'a str, action: &'a str) -> CommonQuery<'a> {
        CommonQuery {
            apikey: self.api_key.as_deref(),
            chainid: self.chain_id,
            module,
            action,
        }
    }

    /// Returns `true` if the explorer already has verified sources for the contract.
    pub async fn is_verified(&self, address: Address) -> Result<bool, Error> {
        let address = format!("{address:#x}");
        let response = self
            .reqwest_client
            .get(self.api_url.clone())
            .query(&self.common_query("contract", "getsourcecode"))
            .query(&[("address", address.as_str())])
            .send()
            .await?;

        let items: Vec<SourceCodeItem> = Self::process_api_response(response)
            .await
            .and_then(parse_result)?;
        Ok(items.first().map_or(false, SourceCodeItem::is_verified))
    }

    /// Runtime code currently deployed at the address.
    pub async fn get_code(&self, address: Address) -> Result<Vec<u8>, Error> {
        let address = format!("{address:#x}");
        let response = self
            .reqwest_client
            .get(self.api_url.clone())
            .query(&self.common_query("proxy", "eth_getCode"))
            .query(&[("address", address.as_str()), ("tag", "latest")])
            .send()
            .await?;

        match Self::process_response::<ProxyResponse>(response).await? {
            ProxyResponse::Result { result } => hex::decode(result.trim_start_matches("0x"))
                .map_err(|err| Error::InvalidResponse(format!("invalid code: {err}"))),
            ProxyResponse::RpcError { error } => Err(Error::Notok {
                message: error.message,
                result: format!("rpc error code {}", error.code),
            }),
            ProxyResponse::Api(response) => Err(Error::Notok {
                message: response.message.clone(),
                result: response.result_text(),
            }),
        }
    }

    /// Submits standard json input for verification. Returns the submission guid.
    pub async fn verify_source_code(
        &self,
        request: &VerifySourceCodeRequest,
    ) -> Result<String, Error> {
        let response = self
            .reqwest_client
            .post(self.api_url.clone())
            .query(&self.common_query("contract", "verifysourcecode"))
            .form(request)
            .send()
            .await?;

        Self::process_api_response(response)
            .await
            .and_then(parse_result)
    }

    pub async fn check_verify_status(&self, guid: &str) -> Result<VerificationStatus, Error> {
        let response = self
            .reqwest_client
            .get(self.api_url.clone())
            .query(&self.common_query("contract", "checkverifystatus"))
            .query(&[("guid", guid)])
            .send()
            .await?;

        // Pending and failed statuses come with `status = "0"`,
        // so the result text is the only reliable source.
        let response = Self::process_response::<ApiResponse>(response).await?;
        Ok(VerificationStatus::from(response.result_text().as_str()))
    }
}

impl Client {
    async fn process_response<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        match response.status() {
            status_code if status_code.is_success() => {
                let body = response.text().await?;
                serde_json::from_str(&body)
                    .map_err(|err| Error::InvalidResponse(format!("{err}: {body}")))
            }
            status_code => Err(Error::UnexpectedStatusCode {
                status_code,
                msg: response.text().await?,
            }),
        }
    }

    async fn process_api_response(response: Response) -> Result<ApiResponse, Error> {
        let response = Self::process_response::<ApiResponse>(response).await?;
        if !response.is_ok() {
            return Err(Error::Notok {
                message: response.message.clone(),
                result: response.result_text(),
            });
        }
        Ok(response)
    }
}

fn parse_result<T: DeserializeOwned>(response: ApiResponse) -> Result<T, Error> {
    serde_json::from_value(response.result)
        .map_err(|err| Error::InvalidResponse(format!("unexpected result: {err}")))
}
