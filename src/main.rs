use std::io;

use anyhow::Context;
use chrono::Local;
use pos_billing::{Config, run_terminal};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let today = Local::now().date_naive();

    run_terminal(&config, today, io::stdin().lock(), io::stdout().lock())
        .context("billing run failed")?;

    Ok(())
}
