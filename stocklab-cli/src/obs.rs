//! Tracing subscriber setup.

use anyhow::{anyhow, Result};

/// Environment variable that overrides `--log-level` with a full filter directive.
pub const LOG_ENV: &str = "STOCKLAB_LOG";

pub fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow!("invalid log filter: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format.trim().to_lowercase().as_str() {
        "json" => builder.json().init(),
        "text" | "" => builder.init(),
        other => return Err(anyhow!("unknown log format '{other}' (expected text or json)")),
    }
    Ok(())
}
