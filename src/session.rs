//! Interactive billing session.
//!
//! The entry loop is a small state machine:
//!
//! ```text
//! AwaitingInput -> ValidatingProduct -> ValidatingQuantity -> Accumulating -> AwaitingInput
//!       |                                                                         ...
//!       +-- empty line / EOF --> Finalizing
//! ```
//!
//! Invalid input re-prompts; it never aborts the transaction. The session works over any
//! `BufRead`/`Write` pair so it can be driven from tests as well as a real terminal.

use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use crate::billing::{Bill, Cart, CartError, DiscountTable, parse_quantity};
use crate::catalog::{Catalog, LowStock};
use crate::config::Config;
use crate::loyalty::{Ledger, Settlement};
use crate::model::{Phone, ProductId};
use crate::receipt;

#[derive(Debug)]
enum EntryState {
    AwaitingInput,
    ValidatingProduct(String),
    ValidatingQuantity(ProductId),
    Accumulating(ProductId, u32),
    Finalizing,
}

/// Line-oriented prompt/answer channel.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `text` and read one trimmed line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Run the entry loop until an empty product id (or end of input).
    pub fn collect_cart(&mut self, catalog: &Catalog) -> io::Result<Cart> {
        let mut cart = Cart::new();
        let mut state = EntryState::AwaitingInput;

        loop {
            state = match state {
                EntryState::AwaitingInput => {
                    match self.prompt("Enter product ID (or press Enter to finish): ")? {
                        Some(id) if !id.is_empty() => EntryState::ValidatingProduct(id),
                        _ => EntryState::Finalizing,
                    }
                }

                EntryState::ValidatingProduct(id) => match catalog.get(&id) {
                    None => {
                        self.say("Product ID not found. Please try again.")?;
                        EntryState::AwaitingInput
                    }
                    Some(product)
                        if product
                            .stock
                            .is_some_and(|stock| stock <= cart.quantity_of(&id)) =>
                    {
                        self.say(&format!("{} is out of stock.", product.name))?;
                        EntryState::AwaitingInput
                    }
                    Some(_) => EntryState::ValidatingQuantity(id),
                },

                EntryState::ValidatingQuantity(id) => {
                    let name = catalog.get(&id).map_or(id.as_str(), |p| p.name.as_str());
                    match self.prompt(&format!("Enter quantity for {name}: "))? {
                        None => EntryState::Finalizing,
                        // empty quantity cancels this entry
                        Some(text) if text.is_empty() => EntryState::AwaitingInput,
                        Some(text) => match parse_quantity(&text) {
                            Ok(quantity) => EntryState::Accumulating(id, quantity),
                            Err(_) => {
                                self.say("Invalid quantity. Please enter a positive whole number.")?;
                                EntryState::ValidatingQuantity(id)
                            }
                        },
                    }
                }

                EntryState::Accumulating(id, quantity) => match cart.add(catalog, &id, quantity) {
                    Ok(()) => EntryState::AwaitingInput,
                    Err(CartError::InsufficientStock {
                        name, available, ..
                    }) => {
                        self.say(&format!("Only {available} in stock for {name}."))?;
                        EntryState::ValidatingQuantity(id)
                    }
                    Err(CartError::InvalidQuantity(_)) => {
                        self.say("Invalid quantity. Please enter a positive whole number.")?;
                        EntryState::ValidatingQuantity(id)
                    }
                    Err(e) => {
                        self.say(&format!("{e}. Please try again."))?;
                        EntryState::AwaitingInput
                    }
                },

                EntryState::Finalizing => return Ok(cart),
            };
        }
    }

    /// Ask for a loyalty phone number; empty input skips.
    pub fn ask_phone(&mut self) -> io::Result<Option<Phone>> {
        loop {
            match self.prompt("Enter customer phone number (or press Enter to skip): ")? {
                None => return Ok(None),
                Some(text) if text.is_empty() => return Ok(None),
                Some(text) => match text.parse() {
                    Ok(phone) => return Ok(Some(phone)),
                    Err(_) => self.say("Invalid phone number. Please enter 10 digits.")?,
                },
            }
        }
    }

    pub fn ask_name(&mut self) -> io::Result<String> {
        Ok(self
            .prompt("New customer! Enter name: ")?
            .unwrap_or_default())
    }

    /// Yes/no question. Empty input and end of input mean no.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        loop {
            match self.prompt(&format!("{question} (y/n): "))? {
                None => return Ok(false),
                Some(answer) => match answer.to_ascii_lowercase().as_str() {
                    "y" | "yes" => return Ok(true),
                    "" | "n" | "no" => return Ok(false),
                    _ => self.say("Please answer y or n.")?,
                },
            }
        }
    }
}

/// A completed sale, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    pub bill: Bill,
    pub low_stock: Vec<LowStock>,
    pub customer: Option<(Phone, Settlement)>,
}

/// State handed back by [`checkout`]: the updated catalog and ledger, and the sale if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub catalog: Catalog,
    pub ledger: Ledger,
    pub sale: Option<Sale>,
}

/// Run one checkout: collect items, settle loyalty, print the receipt and apply the sale
/// to stock. Nothing is written to disk here.
pub fn checkout<R: BufRead, W: Write>(
    terminal: &mut Terminal<R, W>,
    catalog: Catalog,
    discounts: &DiscountTable,
    ledger: Ledger,
    config: &Config,
) -> io::Result<Outcome> {
    let cart = terminal.collect_cart(&catalog)?;
    if cart.is_empty() {
        terminal.say("No items added. Please enter product IDs and quantities.")?;
        return Ok(Outcome {
            catalog,
            ledger,
            sale: None,
        });
    }

    let bill = Bill::compute(&cart, &catalog, discounts);
    info!(
        lines = bill.lines().len(),
        total = %bill.total(),
        savings = %bill.savings(),
        "bill computed"
    );

    let mut ledger = ledger;
    let mut customer = None;
    if let Some(phone) = terminal.ask_phone()? {
        if ledger.get(&phone).is_none() {
            let name = terminal.ask_name()?;
            ledger = ledger.open_account(phone.clone(), &name);
        }

        let redeemable = ledger.redeemable(&phone, bill.total());
        let redeem = redeemable > 0
            && terminal.confirm(&format!(
                "You have {} points. Redeem {redeemable} against this bill?",
                ledger.balance(&phone)
            ))?;

        let (settled, settlement) =
            ledger.settle(&phone, redeem, bill.total(), config.points_per);
        ledger = settled;
        customer = Some((phone, settlement));
    }

    let bill = match &customer {
        Some((_, settlement)) => bill.with_redemption(settlement.redeemed_amount()),
        None => bill,
    };
    terminal.say(&receipt::render(&bill, &config.currency))?;

    let (catalog, low_stock) = catalog.apply_sale(&cart, config.low_stock_threshold);
    for low in &low_stock {
        warn!(product = %low.id, remaining = low.remaining, "low stock");
        terminal.say(&format!(
            "Warning: Low stock for {}. Only {} left.",
            low.name, low.remaining
        ))?;
    }

    if let Some((phone, settlement)) = &customer {
        let name = ledger.get(phone).map_or("", |account| account.name.as_str());
        terminal.say(&receipt::render_loyalty(name, settlement))?;
    }

    Ok(Outcome {
        catalog,
        ledger,
        sale: Some(Sale {
            bill,
            low_stock,
            customer,
        }),
    })
}
