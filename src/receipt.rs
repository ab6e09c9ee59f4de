//! Fixed-width console receipt.

use crate::Amount;
use crate::billing::{Bill, BillLine};
use crate::loyalty::Settlement;

/// Width of everything left of the money columns: ID, Product, Category, Quantity.
const LABEL_WIDTH: usize = 10 + 40 + 15 + 10;
/// Price and Discount columns, ending where the Total column starts.
const TOTALS_LABEL_WIDTH: usize = LABEL_WIDTH + 10 + 10;

/// Render the itemized bill.
///
/// Unknown products show as an `Unknown` row with `N/A` fields and do not count
/// towards the totals.
pub fn render(bill: &Bill, currency: &str) -> String {
    let header = format!(
        "{:<10}{:<40}{:<15}{:<10}{:>10}{:>10}{:>10}",
        "ID", "Product", "Category", "Quantity", "Price", "Discount", "Total"
    );
    let separator = "-".repeat(header.len());
    let mut out = format!("\n{separator}\n{header}\n{separator}\n");

    for line in bill.lines() {
        out.push_str(&match line {
            BillLine::Item(item) => format!(
                "{:<10}{:<40}{:<15}{:<10}{:>10}{:>10}{:>10} {currency}\n",
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit_price,
                item.discount,
                item.total,
            ),
            BillLine::Unknown { id, quantity } => format!(
                "{:<10}{:<40}{:<15}{:<10}{:>10}{:>10}{:>10}\n",
                id, "Unknown", "N/A", quantity, "N/A", "N/A", "N/A"
            ),
        });
    }

    out.push_str(&separator);
    out.push('\n');
    out.push_str(&total_line("Total Amount", bill.total(), currency));
    out.push_str(&total_line("You Saved", bill.savings(), currency));
    if bill.redeemed().is_positive() {
        out.push_str(&total_line("Points Redeemed", -bill.redeemed(), currency));
        out.push_str(&total_line("Amount Payable", bill.payable(), currency));
    }
    out.push_str(&separator);
    out.push('\n');

    out
}

fn total_line(label: &str, amount: Amount, currency: &str) -> String {
    format!(
        "{label:<width$}{amount:>10} {currency}\n",
        width = TOTALS_LABEL_WIDTH
    )
}

/// Loyalty footer printed after the receipt.
pub fn render_loyalty(name: &str, settlement: &Settlement) -> String {
    let who = if name.is_empty() { "Customer" } else { name };
    format!(
        "{who}: {} points earned, {} redeemed, balance {} points.",
        settlement.earned, settlement.redeemed, settlement.balance
    )
}
