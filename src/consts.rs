pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";
//"https://eth.blockscout.com/api";

pub const DEFAULT_BUILD_INFO_PATH: &str = "artifacts/build-info";

pub const SETTINGS_ENV_PREFIX: &str = "VERIFICATION_RUNNER";
