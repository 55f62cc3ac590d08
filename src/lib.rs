pub mod artifacts;
mod cli;
mod consts;
pub mod runner;
mod settings;
mod types;
pub mod verifier;

pub use cli::Args;
pub use runner::{ProcessOutcome, RunReport, TargetOutcome};
pub use settings::{ArtifactsSettings, EtherscanSettings, Settings};
pub use types::VerificationTarget;

use anyhow::Context;
use artifacts::Artifacts;
use verifier::etherscan::EtherscanVerifier;

/// Verifies all configured targets against the etherscan-like api.
///
/// Only the setup (artifacts loading, client initialization) may fail;
/// failures of single targets are reported inside the returned [`RunReport`].
pub async fn run(settings: Settings) -> anyhow::Result<RunReport> {
    if settings.targets.is_empty() {
        log::info!("no verification targets configured");
        return Ok(RunReport::default());
    }

    let artifacts = Artifacts::load(&settings.artifacts.build_info_path)
        .context("build artifacts loading")?;
    let verifier = EtherscanVerifier::from_settings(&settings.etherscan, artifacts)
        .context("explorer client initialization")?;

    Ok(runner::run(&verifier, &settings.targets).await)
}
