pub mod etherscan;

use crate::{
    artifacts::{ArtifactError, ConstructorError},
    types::VerificationTarget,
};
use async_trait::async_trait;
use thiserror::Error;

/// Successful verification of a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Fully qualified name of the submitted contract.
    pub contract_name: String,
    /// Explorer side identifier of the submission.
    pub guid: String,
}

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Already Verified")]
    AlreadyVerified,
    #[error("no contract code at the address")]
    NoDeployedCode,
    #[error("contract artifact: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("invalid constructor arguments: {0}")]
    InvalidConstructorArguments(#[from] ConstructorError),
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("verification failed: {0}")]
    Failed(String),
    #[error("verification is still pending after {attempts} status checks; guid={guid}")]
    StatusPollingExhausted { guid: String, attempts: usize },
    #[error("explorer api: {0}")]
    Api(#[from] etherscan::Error),
}

/// External capability that submits a single target for verification.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, target: &VerificationTarget) -> Result<Verification, VerificationError>;
}
