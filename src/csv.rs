use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::amount::AmountParseError;
use crate::billing::DiscountTable;
use crate::catalog::Catalog;
use crate::loyalty::Ledger;
use crate::model::{DiscountKind, DiscountRule, InvalidPhone, LoyaltyAccount, Phone, Product};

const PRODUCTS_HEADER: [&str; 5] = ["id", "product_name", "price", "category", "stock"];
const LEDGER_HEADER: [&str; 3] = ["phone", "name", "points"];

/// Errors that can occur when reading or writing the catalog, discount and ledger files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("{}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("{}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: {source}")]
    Amount {
        line: usize,
        source: AmountParseError,
    },

    #[error("line {line}: {source}")]
    Phone { line: usize, source: InvalidPhone },

    #[error("line {line}: duplicate key '{key}'")]
    Duplicate { line: usize, key: String },

    #[error("{}: failed to write: {source}", path.display())]
    Write { path: PathBuf, source: csv::Error },
}

#[derive(Debug, Deserialize, Serialize)]
struct ProductRow {
    id: String,
    product_name: String,
    price: String,
    category: String,
    #[serde(default)]
    stock: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DiscountRow {
    category: String,
    discount_type: String,
    discount_value: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct LedgerRow {
    phone: String,
    name: String,
    points: u64,
}

fn open(path: &Path) -> Result<csv::Reader<File>, CsvError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn create(path: &Path) -> Result<csv::Writer<File>, CsvError> {
    let file = File::create(path).map_err(|source| CsvError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}

/// Deserialize every row of `path`, handing each one to `f` with its 1-indexed line number.
fn for_each_row<T, F>(path: &Path, mut f: F) -> Result<(), CsvError>
where
    T: for<'de> Deserialize<'de>,
    F: FnMut(usize, T) -> Result<(), CsvError>,
{
    for (idx, result) in open(path)?.into_deserialize::<T>().enumerate() {
        let line = idx + 2; // 1-indexed, skip header
        let row = result.map_err(|source| CsvError::Parse { line, source })?;
        f(line, row)?;
    }
    Ok(())
}

/// Read the product catalog. Missing file is an error.
pub fn read_products(path: impl AsRef<Path>) -> Result<Catalog, CsvError> {
    let path = path.as_ref();
    let mut catalog = Catalog::new();

    for_each_row(path, |line, row: ProductRow| {
        let price = row
            .price
            .parse()
            .map_err(|source| CsvError::Amount { line, source })?;
        let product = Product {
            id: row.id,
            name: row.product_name,
            price,
            category: row.category,
            stock: row.stock,
        };
        let key = product.id.clone();
        if !catalog.insert(product) {
            return Err(CsvError::Duplicate { line, key });
        }
        Ok(())
    })?;

    info!(path = %path.display(), products = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Rewrite the whole product file from `catalog`.
pub fn write_products(path: impl AsRef<Path>, catalog: &Catalog) -> Result<(), CsvError> {
    let path = path.as_ref();
    let write_err = |source| CsvError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = create(path)?;

    writer.write_record(PRODUCTS_HEADER).map_err(write_err)?;
    for product in catalog.products() {
        let row = ProductRow {
            id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.price.exact(),
            category: product.category.clone(),
            stock: product.stock,
        };
        writer.serialize(&row).map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;

    info!(path = %path.display(), products = catalog.len(), "catalog saved");
    Ok(())
}

/// Read per-category discount rules. Missing file is an error.
pub fn read_discounts(path: impl AsRef<Path>) -> Result<DiscountTable, CsvError> {
    let path = path.as_ref();
    let mut discounts = DiscountTable::new();

    for_each_row(path, |line, row: DiscountRow| {
        let value = row
            .discount_value
            .parse()
            .map_err(|source| CsvError::Amount { line, source })?;
        if discounts.contains_key(&row.category) {
            return Err(CsvError::Duplicate {
                line,
                key: row.category,
            });
        }
        discounts.insert(
            row.category.clone(),
            DiscountRule {
                category: row.category,
                kind: DiscountKind::from(row.discount_type.as_str()),
                value,
            },
        );
        Ok(())
    })?;

    info!(path = %path.display(), rules = discounts.len(), "discounts loaded");
    Ok(discounts)
}

/// Read the loyalty ledger, creating an empty one (header only) if the file is missing.
pub fn read_ledger(path: impl AsRef<Path>) -> Result<Ledger, CsvError> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "ledger missing, creating");
        let ledger = Ledger::new();
        write_ledger(path, &ledger)?;
        return Ok(ledger);
    }

    let mut ledger = Ledger::new();
    for_each_row(path, |line, row: LedgerRow| {
        let phone: Phone = row
            .phone
            .parse()
            .map_err(|source| CsvError::Phone { line, source })?;
        let mut account = LoyaltyAccount::new(phone, row.name);
        account.points = row.points;
        if !ledger.insert(account) {
            return Err(CsvError::Duplicate { line, key: row.phone });
        }
        Ok(())
    })?;

    info!(path = %path.display(), accounts = ledger.len(), "ledger loaded");
    Ok(ledger)
}

/// Rewrite the whole ledger file.
pub fn write_ledger(path: impl AsRef<Path>, ledger: &Ledger) -> Result<(), CsvError> {
    let path = path.as_ref();
    let write_err = |source| CsvError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = create(path)?;

    writer.write_record(LEDGER_HEADER).map_err(write_err)?;
    for account in ledger.accounts() {
        let row = LedgerRow {
            phone: account.phone.to_string(),
            name: account.name.clone(),
            points: account.points,
        };
        writer.serialize(&row).map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn read_products_with_stock() {
        let file = write_csv(
            "id,product_name,price,category,stock\n\
             P001,Apple,100,Fruits,25\n\
             P002, Milk 1L , 52.5, Dairy, 8\n",
        );
        let catalog = read_products(file.path()).unwrap();

        assert_eq!(catalog.len(), 2);
        let milk = catalog.get("P002").unwrap();
        assert_eq!(milk.name, "Milk 1L");
        assert_eq!(milk.price, "52.5".parse::<Amount>().unwrap());
        assert_eq!(milk.category, "Dairy");
        assert_eq!(milk.stock, Some(8));
    }

    #[test]
    fn read_products_without_stock_column() {
        let file = write_csv("id,product_name,price,category\nP001,Apple,100,Fruits\n");
        let catalog = read_products(file.path()).unwrap();
        assert_eq!(catalog.get("P001").unwrap().stock, None);
    }

    #[test]
    fn read_products_rejects_duplicates() {
        let file = write_csv(
            "id,product_name,price,category,stock\nP1,A,1,X,1\nP1,B,2,Y,2\n",
        );
        let err = read_products(file.path()).unwrap_err();
        assert!(matches!(err, CsvError::Duplicate { line: 3, ref key } if key == "P1"));
    }

    #[test]
    fn read_products_reports_bad_price_line() {
        let file = write_csv("id,product_name,price,category,stock\nP1,A,cheap,X,1\n");
        let err = read_products(file.path()).unwrap_err();
        assert!(matches!(err, CsvError::Amount { line: 2, .. }));
    }

    #[test]
    fn read_products_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = read_products(dir.path().join("products.csv")).unwrap_err();
        assert!(matches!(err, CsvError::Open { .. }));
    }

    #[test]
    fn products_survive_rewrite() {
        let file = write_csv(
            "id,product_name,price,category,stock\n\
             P001,Apple,100,Fruits,25\n\
             P002,Saffron,2.125,Spices,\n",
        );
        let catalog = read_products(file.path()).unwrap();
        write_products(file.path(), &catalog).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "id,product_name,price,category,stock\n\
             P001,Apple,100.00,Fruits,25\n\
             P002,Saffron,2.125,Spices,\n"
        );
        assert_eq!(read_products(file.path()).unwrap(), catalog);
    }

    #[test]
    fn read_discounts_table() {
        let file = write_csv(
            "category,discount_type,discount_value\n\
             Fruits,percentage,10\n\
             Dairy,fixed,5\n\
             Toys,bogo,1\n",
        );
        let discounts = read_discounts(file.path()).unwrap();

        assert_eq!(discounts.len(), 3);
        assert_eq!(discounts["Fruits"].kind, DiscountKind::Percentage);
        assert_eq!(discounts["Fruits"].value, Amount::from_units(10));
        assert_eq!(discounts["Dairy"].kind, DiscountKind::Fixed);
        assert_eq!(discounts["Toys"].kind, DiscountKind::Other("bogo".into()));
    }

    #[test]
    fn read_discounts_rejects_duplicate_category() {
        let file = write_csv(
            "category,discount_type,discount_value\nFruits,percentage,10\nFruits,fixed,1\n",
        );
        assert!(matches!(
            read_discounts(file.path()),
            Err(CsvError::Duplicate { line: 3, .. })
        ));
    }

    #[test]
    fn missing_ledger_is_created_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.csv");

        let ledger = read_ledger(&path).unwrap();

        assert!(ledger.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "phone,name,points\n");
    }

    #[test]
    fn ledger_round_trips_leading_zeros() {
        let file = write_csv("phone,name,points\n0123456789,Asha,12\n9876543210,Ravi,0\n");
        let ledger = read_ledger(file.path()).unwrap();
        assert_eq!(ledger.len(), 2);

        write_ledger(file.path(), &ledger).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "phone,name,points\n0123456789,Asha,12\n9876543210,Ravi,0\n"
        );
    }

    #[test]
    fn ledger_rejects_bad_phone() {
        let file = write_csv("phone,name,points\n12345,Asha,12\n");
        assert!(matches!(
            read_ledger(file.path()),
            Err(CsvError::Phone { line: 2, .. })
        ));
    }
}
