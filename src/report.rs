//! Category revenue report over a day's log.

use std::collections::BTreeMap;

use tabled::builder::Builder;
use tabled::settings::object::{Columns, Rows};
use tabled::settings::{Alignment, Style};

use crate::Amount;
use crate::log::LogRow;
use crate::model::Category;

/// Widest share bar, for a category holding 100% of revenue.
const BAR_WIDTH: f64 = 40.0;

/// Revenue per category, ordered by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRevenue(BTreeMap<Category, Amount>);

impl CategoryRevenue {
    /// Sum item totals by category. Blank, redemption and summary rows are ignored.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a LogRow>) -> Self {
        let mut revenue = BTreeMap::new();
        for row in rows {
            if let LogRow::Item(item) = row {
                *revenue.entry(item.category.clone()).or_insert(Amount::ZERO) += item.total;
            }
        }
        CategoryRevenue(revenue)
    }

    pub fn get(&self, category: &str) -> Option<Amount> {
        self.0.get(category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> + '_ {
        self.0.iter().map(|(category, amount)| (category.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Amount {
        self.0.values().copied().sum()
    }

    /// Percentage of total revenue per category. All zero when there is no revenue.
    pub fn shares(&self) -> Vec<(&str, Amount, f64)> {
        let total = self.total().to_f64();
        self.iter()
            .map(|(category, amount)| {
                let share = if total > 0.0 {
                    amount.to_f64() / total * 100.0
                } else {
                    0.0
                };
                (category, amount, share)
            })
            .collect()
    }

    /// Table of categories with revenue, share and a proportional bar.
    pub fn render(&self, currency: &str) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Category", "Revenue", "Share", ""]);

        for (category, amount, share) in self.shares() {
            let bar = "#".repeat((share / 100.0 * BAR_WIDTH).round() as usize);
            builder.push_record([
                category.to_string(),
                format!("{amount} {currency}"),
                format!("{share:.1}%"),
                bar,
            ]);
        }

        builder.push_record([
            "Total".to_string(),
            format!("{} {currency}", self.total()),
            String::new(),
            String::new(),
        ]);

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..3), Alignment::right());
        table.modify(Rows::first(), Alignment::center());
        table.to_string()
    }
}
