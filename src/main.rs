use anyhow::Context;
use clap::Parser;
use verification_runner::{Args, ProcessOutcome, Settings};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = async {
        let settings = Settings::new(&args.config_path).context("failed to read config")?;
        verification_runner::run(settings).await
    }
    .await;

    let outcome = ProcessOutcome::from(result);
    if let ProcessOutcome::Fatal(err) = &outcome {
        log::error!("verification run failed");
        eprintln!("{err:?}");
    }
    std::process::exit(outcome.exit_code());
}
