use anyhow::Result;
use clap::Parser;
use llm_relay_common::SystemConfig;
use llm_relay_server::{server, tracing_setup, AppState};
use tracing::warn;

#[derive(Parser)]
#[command(name = "llm-relay-server", about = "Websocket front-end for LLM agent orchestration")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_setup::init_tracing_with_level(&args.log_level)?;

    let config = match SystemConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            warn!("could not load {}: {e}; using defaults", args.config);
            SystemConfig::default()
        }
    };

    server::run(AppState::from_config(config)).await
}
