//! Runtime configuration.
//!
//! Every setting has a default matching the conventional file names in the working
//! directory and can be overridden through a `POS_*` environment variable.

use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{var}: expected a non-negative integer, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub products: PathBuf,
    pub categories: PathBuf,
    pub users: PathBuf,
    /// Directory receiving `bill_log_YYYY-MM-DD.csv` files.
    pub log_dir: PathBuf,
    /// Remaining stock strictly below this triggers a warning.
    pub low_stock_threshold: u32,
    /// Currency units paid per loyalty point earned.
    pub points_per: u32,
    /// Currency code appended to totals.
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            products: PathBuf::from("products.csv"),
            categories: PathBuf::from("categories.csv"),
            users: PathBuf::from("users.csv"),
            log_dir: PathBuf::from("."),
            low_stock_threshold: 10,
            points_per: 100,
            currency: "INR".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `POS_*` variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = lookup("POS_PRODUCTS") {
            config.products = path.into();
        }
        if let Some(path) = lookup("POS_CATEGORIES") {
            config.categories = path.into();
        }
        if let Some(path) = lookup("POS_USERS") {
            config.users = path.into();
        }
        if let Some(path) = lookup("POS_LOG_DIR") {
            config.log_dir = path.into();
        }
        if let Some(value) = lookup("POS_LOW_STOCK") {
            config.low_stock_threshold = parse_number("POS_LOW_STOCK", value)?;
        }
        if let Some(value) = lookup("POS_POINTS_PER") {
            config.points_per = parse_number("POS_POINTS_PER", value)?;
        }
        if let Some(currency) = lookup("POS_CURRENCY") {
            config.currency = currency.trim().to_string();
        }

        Ok(config)
    }

    /// Log file for `date`.
    pub fn log_path(&self, date: NaiveDate) -> PathBuf {
        log_path_in(&self.log_dir, date)
    }
}

pub fn log_path_in(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("bill_log_{}.csv", date.format("%Y-%m-%d")))
}

fn parse_number(var: &'static str, value: String) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError { var, value })
}
