use clap::Parser;

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the toml file with explorer settings and verification targets.
    #[clap(
        short,
        long,
        env = "VERIFICATION_RUNNER_CONFIG",
        default_value = "config.toml"
    )]
    pub config_path: std::path::PathBuf,
}
