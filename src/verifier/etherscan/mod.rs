mod client;
mod types;

pub use client::{Client, Error};
pub use types::{VerificationStatus, VerifySourceCodeRequest};

use super::{Verification, VerificationError, Verifier};
use crate::{
    artifacts::{ArtifactError, Artifacts, ContractArtifact},
    settings::EtherscanSettings,
    types::VerificationTarget,
};
use async_trait::async_trait;
use std::{num::NonZeroUsize, time::Duration};

const CODE_FORMAT: &str = "solidity-standard-json-input";

/// Verifies contracts through an etherscan-like api using
/// standard json inputs from hardhat build artifacts.
pub struct EtherscanVerifier {
    client: Client,
    artifacts: Artifacts,
    status_poll_interval: Duration,
    status_poll_attempts: NonZeroUsize,
}

impl EtherscanVerifier {
    pub fn new(
        client: Client,
        artifacts: Artifacts,
        status_poll_interval: Duration,
        status_poll_attempts: NonZeroUsize,
    ) -> Self {
        Self {
            client,
            artifacts,
            status_poll_interval,
            status_poll_attempts,
        }
    }

    pub fn from_settings(
        settings: &EtherscanSettings,
        artifacts: Artifacts,
    ) -> Result<Self, Error> {
        let client = Client::new(
            settings.api_url.clone(),
            settings.api_key.clone(),
            settings.chain_id,
            settings.request_timeout,
        )?;
        Ok(Self::new(
            client,
            artifacts,
            settings.status_poll_interval,
            settings.status_poll_attempts,
        ))
    }

    async fn resolve_contract(
        &self,
        target: &VerificationTarget,
    ) -> Result<ContractArtifact<'_>, VerificationError> {
        if let Some(contract) = &target.contract {
            return match self.artifacts.find_by_name(contract, None) {
                Err(ArtifactError::ConflictingCompilations { compilers, .. }) => {
                    log::debug!(
                        "selecting compilation by deployed bytecode; \
                        address={}, contract={contract}, compilers={compilers:?}",
                        target.display_address()
                    );
                    let code = self.deployed_code(target).await?;
                    Ok(self.artifacts.find_by_name(contract, Some(&code))?)
                }
                result => Ok(result?),
            };
        }

        let code = self.deployed_code(target).await?;
        let artifact = self.artifacts.find_by_runtime_code(&code)?;
        log::debug!(
            "contract inferred from deployed bytecode; address={}, contract={}",
            target.display_address(),
            artifact.fully_qualified_name()
        );
        Ok(artifact)
    }

    async fn deployed_code(
        &self,
        target: &VerificationTarget,
    ) -> Result<Vec<u8>, VerificationError> {
        let code = self.client.get_code(target.address).await?;
        if code.is_empty() {
            return Err(VerificationError::NoDeployedCode);
        }
        Ok(code)
    }

    fn build_request(
        target: &VerificationTarget,
        artifact: &ContractArtifact<'_>,
    ) -> Result<VerifySourceCodeRequest, VerificationError> {
        let arguments = target.constructor_arguments.as_deref().unwrap_or_default();
        let constructor_arguments = artifact.encode_constructor_arguments(arguments)?;

        Ok(VerifySourceCodeRequest {
            contract_address: target.display_address(),
            source_code: artifact.standard_json_input().to_string(),
            code_format: CODE_FORMAT.to_string(),
            contract_name: artifact.fully_qualified_name(),
            compiler_version: artifact.compiler_version()?,
            constructor_arguments: hex::encode(constructor_arguments),
        })
    }

    async fn submit(
        &self,
        request: &VerifySourceCodeRequest,
    ) -> Result<String, VerificationError> {
        match self.client.verify_source_code(request).await {
            Ok(guid) => Ok(guid),
            Err(Error::Notok { result, .. }) if is_already_verified(&result) => {
                Err(VerificationError::AlreadyVerified)
            }
            Err(Error::Notok { message, result }) => {
                Err(VerificationError::Rejected(format!("{message}: {result}")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn wait_for_result(&self, guid: &str) -> Result<(), VerificationError> {
        let attempts = self.status_poll_attempts.get();
        for attempt in 1..=attempts {
            tokio::time::sleep(self.status_poll_interval).await;
            match self.client.check_verify_status(guid).await? {
                VerificationStatus::Verified => return Ok(()),
                VerificationStatus::AlreadyVerified => {
                    return Err(VerificationError::AlreadyVerified)
                }
                VerificationStatus::Failed(reason) => {
                    return Err(VerificationError::Failed(reason))
                }
                VerificationStatus::Pending => {
                    log::debug!("verification is pending; guid={guid}, attempt={attempt}");
                }
            }
        }

        Err(VerificationError::StatusPollingExhausted {
            guid: guid.to_string(),
            attempts,
        })
    }
}

fn is_already_verified(result: &str) -> bool {
    result.to_lowercase().contains("already verified")
}

#[async_trait]
impl Verifier for EtherscanVerifier {
    async fn verify(
        &self,
        target: &VerificationTarget,
    ) -> Result<Verification, VerificationError> {
        if self.client.is_verified(target.address).await? {
            return Err(VerificationError::AlreadyVerified);
        }

        let artifact = self.resolve_contract(target).await?;
        let request = Self::build_request(target, &artifact)?;
        let guid = self.submit(&request).await?;
        log::info!(
            "verification submitted; address={}, contract={}, guid={guid}",
            request.contract_address,
            request.contract_name
        );

        self.wait_for_result(&guid).await?;
        Ok(Verification {
            contract_name: request.contract_name,
            guid,
        })
    }
}
