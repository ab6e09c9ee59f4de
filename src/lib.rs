pub mod amount;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod csv;
pub mod error;
pub mod log;
pub mod loyalty;
pub mod model;
pub mod receipt;
pub mod report;
pub mod session;

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use tracing::info;

pub use amount::Amount;
pub use billing::{Bill, Cart};
pub use catalog::Catalog;
pub use config::Config;
pub use error::{PosError, Result};
pub use loyalty::Ledger;
pub use session::{Outcome, Terminal};

/// Run one billing session against the files named in `config`.
///
/// Loads catalog, discounts and ledger, runs the interactive checkout over
/// `input`/`output`, then appends the sale to the log for `date` and rewrites the
/// catalog and ledger. The three writes are independent; a failure part-way leaves
/// the earlier ones in place.
pub fn run_terminal<R: BufRead, W: Write>(
    config: &Config,
    date: NaiveDate,
    input: R,
    output: W,
) -> Result<Outcome> {
    let catalog = crate::csv::read_products(&config.products)?;
    let discounts = crate::csv::read_discounts(&config.categories)?;
    let ledger = crate::csv::read_ledger(&config.users)?;

    let mut terminal = Terminal::new(input, output);
    let outcome = session::checkout(&mut terminal, catalog, &discounts, ledger, config)?;

    if let Some(sale) = &outcome.sale {
        let path = config.log_path(date);
        crate::log::BillLog::open(&path, &config.currency)?.append(&sale.bill)?;
        info!(path = %path.display(), "sale logged");

        crate::csv::write_products(&config.products, &outcome.catalog)?;
        crate::csv::write_ledger(&config.users, &outcome.ledger)?;
    }

    Ok(outcome)
}
