use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install the global subscriber: env filter with a fallback level plus a
/// compact fmt layer. `RUST_LOG` overrides the configured level.
pub fn init_tracing_with_level(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    Registry::default().with(env_filter).with(fmt_layer).try_init()?;
    Ok(())
}

pub fn init_tracing() -> Result<()> {
    init_tracing_with_level("info")
}
