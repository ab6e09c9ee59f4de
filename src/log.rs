//! Per-day transaction log.
//!
//! The log is a CSV file with an explicit row kind in its first column:
//!
//! ```text
//! Kind,ID,Product,Category,Quantity,Price,Discount,Total
//! item,P001,Apple,Fruits,3,100.00,30.00,270.00 INR
//! redemption,,Points Redeemed,,,,,-20.00 INR
//! ,,,,,,,
//! summary,,Total Amount,,3,,30.00,250.00 INR
//! ```
//!
//! Every transaction is appended as its item rows, an optional redemption row, a blank
//! separator and a summary row. Readers classify each record into a [`LogRow`] instead of
//! guessing from field counts. Logs written before the `Kind` column existed (header
//! starting with `ID`) are still understood.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::Amount;
use crate::billing::Bill;
use crate::model::{Category, ProductId};

pub const HEADER: [&str; 8] = [
    "Kind", "ID", "Product", "Category", "Quantity", "Price", "Discount", "Total",
];

const TOTAL_LABEL: &str = "Total Amount";
const REDEMPTION_LABEL: &str = "Points Redeemed";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

/// One sold line as recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogItem {
    pub id: ProductId,
    pub product: String,
    pub category: Category,
    pub quantity: u32,
    pub price: Amount,
    pub discount: Amount,
    pub total: Amount,
}

/// Closing row of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSummary {
    pub units: u64,
    pub savings: Amount,
    /// Amount paid, after redemption.
    pub total: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRow {
    Item(LogItem),
    Redemption(Amount),
    Summary(LogSummary),
    Blank,
}

/// Append handle on a day's log file.
pub struct BillLog {
    path: PathBuf,
    writer: csv::Writer<File>,
    currency: String,
}

impl BillLog {
    /// Open `path` for appending, writing the header if the file is new or empty.
    pub fn open(path: impl AsRef<Path>, currency: &str) -> Result<BillLog, LogError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| LogError::Io {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let is_new = file.metadata().map_err(io_err)?.len() == 0;

        let mut log = BillLog {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(file),
            path,
            currency: currency.to_string(),
        };
        if is_new {
            log.write(HEADER.map(str::to_string))?;
        }
        Ok(log)
    }

    /// Append one transaction and flush it to disk.
    pub fn append(&mut self, bill: &Bill) -> Result<(), LogError> {
        for line in bill.priced_lines() {
            self.write([
                "item".to_string(),
                line.id.clone(),
                line.name.clone(),
                line.category.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.discount.to_string(),
                self.money(line.total),
            ])?;
        }

        if bill.redeemed().is_positive() {
            let total = self.money(-bill.redeemed());
            self.write(row("redemption", REDEMPTION_LABEL, "", "", total))?;
        }

        self.write(Default::default())?;

        let total = self.money(bill.payable());
        self.write(row(
            "summary",
            TOTAL_LABEL,
            &bill.units().to_string(),
            &bill.savings().to_string(),
            total,
        ))?;

        self.writer.flush().map_err(|source| LogError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), lines = bill.lines().len(), "bill logged");
        Ok(())
    }

    fn money(&self, amount: Amount) -> String {
        format!("{amount} {}", self.currency)
    }

    fn write(&mut self, record: [String; 8]) -> Result<(), LogError> {
        self.writer
            .write_record(&record)
            .map_err(|source| LogError::Csv {
                path: self.path.clone(),
                source,
            })
    }
}

fn row(kind: &str, product: &str, quantity: &str, discount: &str, total: String) -> [String; 8] {
    [
        kind.to_string(),
        String::new(),
        product.to_string(),
        String::new(),
        quantity.to_string(),
        String::new(),
        discount.to_string(),
        total,
    ]
}

/// Strip a trailing currency code (`"270.00 INR"` -> `"270.00"`).
fn strip_currency(field: &str) -> &str {
    field.split_whitespace().next().unwrap_or("")
}

fn parse_amount(field: &str) -> Result<Amount, String> {
    strip_currency(field)
        .parse()
        .map_err(|e| format!("{e}"))
}

fn parse_quantity<T: FromStr>(field: &str) -> Result<T, String> {
    field
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{field}'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `Kind,ID,Product,Category,Quantity,Price,Discount,Total`
    Kinded,
    /// `ID,Product,Category,Quantity,Price,Discount,Total`, summary rows labelled `Total Amount`
    Legacy,
}

/// Classify one record. `Ok(None)` marks a repeated header.
fn classify(record: &csv::StringRecord, layout: Layout) -> Result<Option<LogRow>, String> {
    if record.iter().all(|field| field.trim().is_empty()) {
        return Ok(Some(LogRow::Blank));
    }
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    match layout {
        Layout::Kinded => match field(0) {
            "Kind" => Ok(None),
            "item" => Ok(Some(LogRow::Item(LogItem {
                id: field(1).to_string(),
                product: field(2).to_string(),
                category: field(3).to_string(),
                quantity: parse_quantity(field(4))?,
                price: parse_amount(field(5))?,
                discount: parse_amount(field(6))?,
                total: parse_amount(field(7))?,
            }))),
            "redemption" => Ok(Some(LogRow::Redemption(-parse_amount(field(7))?))),
            "summary" => Ok(Some(LogRow::Summary(LogSummary {
                units: parse_quantity(field(4))?,
                savings: parse_amount(field(6))?,
                total: parse_amount(field(7))?,
            }))),
            other => Err(format!("unknown row kind '{other}'")),
        },
        Layout::Legacy => {
            if field(0) == "ID" {
                return Ok(None);
            }
            if let Some(pos) = record.iter().position(|f| f.trim() == TOTAL_LABEL) {
                return Ok(Some(LogRow::Summary(LogSummary {
                    units: 0,
                    savings: Amount::ZERO,
                    total: parse_amount(field(pos + 1))?,
                })));
            }
            if record.len() != 7 {
                return Err(format!("expected 7 fields, found {}", record.len()));
            }
            Ok(Some(LogRow::Item(LogItem {
                id: field(0).to_string(),
                product: field(1).to_string(),
                category: field(2).to_string(),
                quantity: parse_quantity(field(3))?,
                price: parse_amount(field(4))?,
                discount: parse_amount(field(5))?,
                total: parse_amount(field(6))?,
            })))
        }
    }
}

/// Read and classify every row of a log file.
///
/// Malformed rows are skipped with a warning; only I/O and CSV framing errors fail.
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<LogRow>, LogError> {
    let path = path.as_ref();
    let csv_err = |source| LogError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let layout = match reader.headers().map_err(csv_err)?.get(0).map(str::trim) {
        Some("ID") => Layout::Legacy,
        _ => Layout::Kinded,
    };

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2; // 1-indexed, skip header
        let record = result.map_err(csv_err)?;
        match classify(&record, layout) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(reason) => warn!(path = %path.display(), line, reason = %reason, "skipping log row"),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{Bill, Cart, DiscountTable};
    use crate::catalog::Catalog;
    use crate::model::{DiscountKind, DiscountRule, Product};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn sample_bill() -> Bill {
        let catalog: Catalog = [
            Product {
                id: "P001".into(),
                name: "Apple".into(),
                price: Amount::from_units(100),
                category: "Fruits".into(),
                stock: Some(50),
            },
            Product {
                id: "P002".into(),
                name: "Milk, 1L".into(),
                price: Amount::from_units(40),
                category: "Dairy".into(),
                stock: None,
            },
        ]
        .into_iter()
        .collect();
        let discounts: DiscountTable = [(
            "Fruits".to_string(),
            DiscountRule {
                category: "Fruits".into(),
                kind: DiscountKind::Percentage,
                value: Amount::from_units(10),
            },
        )]
        .into_iter()
        .collect();

        let mut cart = Cart::new();
        cart.push("P001", 3);
        cart.push("P002", 1);
        cart.push("X9", 2);
        Bill::compute(&cart, &catalog, &discounts)
    }

    #[test]
    fn append_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bill_log_2024-07-14.csv");

        BillLog::open(&path, "INR").unwrap().append(&sample_bill()).unwrap();
        BillLog::open(&path, "INR").unwrap().append(&sample_bill()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Kind,ID").count(), 1);
        assert!(content.starts_with("Kind,ID,Product,Category,Quantity,Price,Discount,Total\n"));
        assert!(content.contains("item,P001,Apple,Fruits,3,100.00,30.00,270.00 INR\n"));
        assert!(content.contains("item,P002,\"Milk, 1L\",Dairy,1,40.00,0.00,40.00 INR\n"));
        assert!(content.contains("summary,,Total Amount,,4,,30.00,310.00 INR\n"));
        assert!(!content.contains("X9"));
    }

    #[test]
    fn logged_lines_add_up_to_summary() {
        let catalog: Catalog = ["1.01", "3.03"]
            .into_iter()
            .enumerate()
            .map(|(i, price)| Product {
                id: format!("H{i}"),
                name: format!("Half {i}"),
                price: price.parse().unwrap(),
                category: "Half".into(),
                stock: None,
            })
            .collect();
        let discounts: DiscountTable = [(
            "Half".to_string(),
            DiscountRule {
                category: "Half".into(),
                kind: DiscountKind::Percentage,
                value: Amount::from_units(50),
            },
        )]
        .into_iter()
        .collect();
        let mut cart = Cart::new();
        cart.push("H0", 1);
        cart.push("H1", 1);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        let bill = Bill::compute(&cart, &catalog, &discounts);
        BillLog::open(&path, "INR").unwrap().append(&bill).unwrap();

        let rows = read_log(&path).unwrap();
        let (totals, savings) = rows
            .iter()
            .filter_map(|row| match row {
                LogRow::Item(item) => Some((item.total, item.discount)),
                _ => None,
            })
            .fold((Amount::ZERO, Amount::ZERO), |(t, s), (total, discount)| {
                (t + total, s + discount)
            });
        let Some(LogRow::Summary(summary)) = rows.last() else {
            panic!("no summary row: {rows:?}");
        };
        assert_eq!(totals, summary.total);
        assert_eq!(savings, summary.savings);
        assert_eq!(summary.total, "2.03".parse().unwrap());
    }

    #[test]
    fn appended_bill_reads_back_as_kinded_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        let bill = sample_bill().with_redemption(Amount::from_units(10));

        BillLog::open(&path, "INR").unwrap().append(&bill).unwrap();
        let rows = read_log(&path).unwrap();

        assert_eq!(rows.len(), 5);
        assert!(matches!(&rows[0], LogRow::Item(item) if item.total == Amount::from_units(270)));
        assert!(matches!(&rows[1], LogRow::Item(item) if item.category == "Dairy"));
        assert_eq!(rows[2], LogRow::Redemption(Amount::from_units(10)));
        assert_eq!(rows[3], LogRow::Blank);
        assert_eq!(
            rows[4],
            LogRow::Summary(LogSummary {
                units: 4,
                savings: Amount::from_units(30),
                total: Amount::from_units(300),
            })
        );
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"Kind,ID,Product,Category,Quantity,Price,Discount,Total\n\
              item,P1,Apple,Fruits,two,1.00,0.00,2.00 INR\n\
              refund,P1,Apple,Fruits,1,1.00,0.00,1.00 INR\n\
              item,P2,Milk,Dairy,1,40.00,0.00,40.00 INR\n",
        )
        .unwrap();

        let rows = read_log(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], LogRow::Item(item) if item.id == "P2"));
    }

    #[test]
    fn legacy_layout_is_classified() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"ID,Product,Category,Quantity,Price,Discount,Total\n\
              ,,,,,,\n\
              P1,Apple,Fruits,1,100.00,0.00,100.00 INR\n\
              P2,Milk,Dairy,1,50.00,0.00,50.00 INR\n\
              \n\
              ,,,,,,Total Amount,150.00 INR\n\
              ID,Product,Category,Quantity,Price,Discount,Total\n\
              P1,Apple,Fruits,1,30.00,0.00,30.00 INR\n",
        )
        .unwrap();

        let rows = read_log(file.path()).unwrap();
        let items: Vec<_> = rows
            .iter()
            .filter_map(|row| match row {
                LogRow::Item(item) => Some((item.category.as_str(), item.total)),
                _ => None,
            })
            .collect();
        assert_eq!(
            items,
            [
                ("Fruits", Amount::from_units(100)),
                ("Dairy", Amount::from_units(50)),
                ("Fruits", Amount::from_units(30)),
            ]
        );
        assert!(rows.contains(&LogRow::Summary(LogSummary {
            units: 0,
            savings: Amount::ZERO,
            total: Amount::from_units(150),
        })));
    }

    #[test]
    fn missing_log_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_log(dir.path().join("nope.csv")),
            Err(LogError::Csv { .. })
        ));
    }
}
