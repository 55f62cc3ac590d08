use serde::{Deserialize, Serialize};

// Definition of etherscan-like api responses
// https://docs.etherscan.io/api-endpoints/contracts
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub result: serde_json::Value,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    pub fn result_text(&self) -> String {
        match &self.result {
            serde_json::Value::String(text) => text.clone(),
            value => value.to_string(),
        }
    }
}

// `module=proxy` endpoints follow json-rpc response format
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProxyResponse {
    Api(ApiResponse),
    RpcError { error: RpcError },
    Result { result: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceCodeItem {
    #[serde(default)]
    pub source_code: String,
}

impl SourceCodeItem {
    pub fn is_verified(&self) -> bool {
        !self.source_code.is_empty()
    }
}

/// Form of `module=contract&action=verifysourcecode` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifySourceCodeRequest {
    #[serde(rename = "contractaddress")]
    pub contract_address: String,
    #[serde(rename = "sourceCode")]
    pub source_code: String,
    #[serde(rename = "codeformat")]
    pub code_format: String,
    #[serde(rename = "contractname")]
    pub contract_name: String,
    #[serde(rename = "compilerversion")]
    pub compiler_version: String,
    // sic
    #[serde(rename = "constructorArguements")]
    pub constructor_arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

impl From<&str> for VerificationStatus {
    fn from(result: &str) -> Self {
        if result.starts_with("Pending") {
            VerificationStatus::Pending
        } else if result.starts_with("Pass") {
            VerificationStatus::Verified
        } else if result.to_lowercase().contains("already verified") {
            VerificationStatus::AlreadyVerified
        } else {
            VerificationStatus::Failed(result.to_string())
        }
    }
}
