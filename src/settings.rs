use crate::{
    consts::{DEFAULT_BUILD_INFO_PATH, DEFAULT_ETHERSCAN_API_URL, SETTINGS_ENV_PREFIX},
    types::VerificationTarget,
};
use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::{num::NonZeroUsize, path::Path, path::PathBuf, time::Duration};
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub etherscan: EtherscanSettings,
    pub artifacts: ArtifactsSettings,
    /// Processed strictly in the given order.
    pub targets: Vec<VerificationTarget>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtherscanSettings {
    pub api_url: Url,
    pub api_key: Option<String>,
    /// Sent as `chainid` for multichain (v2) apis.
    pub chain_id: Option<u64>,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub status_poll_interval: Duration,
    /// Number of `checkverifystatus` requests made for one submission.
    /// Should be at least one. Set to `20` by default.
    pub status_poll_attempts: NonZeroUsize,
}

impl Default for EtherscanSettings {
    fn default() -> Self {
        Self {
            api_url: Url::try_from(DEFAULT_ETHERSCAN_API_URL).expect("valid url"),
            api_key: None,
            chain_id: None,
            request_timeout: Duration::from_secs(30),
            status_poll_interval: Duration::from_secs(3),
            status_poll_attempts: NonZeroUsize::new(20).expect("Is not zero"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsSettings {
    pub build_info_path: PathBuf,
}

impl Default for ArtifactsSettings {
    fn default() -> Self {
        Self {
            build_info_path: PathBuf::from(DEFAULT_BUILD_INFO_PATH),
        }
    }
}

impl Settings {
    pub fn new(config_path: &Path) -> anyhow::Result<Self> {
        Config::builder()
            .add_source(File::from(config_path))
            .add_source(config::Environment::with_prefix(SETTINGS_ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
            .map_err(|err| anyhow!(err))
    }
}
