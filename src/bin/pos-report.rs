use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pos_billing::log::read_log;
use pos_billing::report::CategoryRevenue;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Summarises a day's bill log into revenue per category.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a bill log, e.g. bill_log_2024-07-14.csv
    log_file: PathBuf,

    /// Currency code shown next to amounts.
    #[arg(long, env = "POS_CURRENCY", default_value = "INR")]
    currency: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.log_file.extension().is_none_or(|ext| ext != "csv") {
        warn!(path = %args.log_file.display(), "log file seems to not be a csv file");
    }

    let rows = read_log(&args.log_file)
        .with_context(|| format!("failed to read log '{}'", args.log_file.display()))?;
    let revenue = CategoryRevenue::from_rows(&rows);

    println!("Category-wise Revenue Distribution");
    println!("{}", revenue.render(&args.currency));
    Ok(())
}
