//! Summary
//!
//! Currency-aware view of a cart for display: per-line totals, the cart
//! total and what the shopper saves against each product's original price.

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::Cart,
    lines::CartLine,
    storage::Storage,
    weight::{format_weight_label, price_for_weight},
};

/// Errors writing a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One priced row of the summary.
#[derive(Debug, Clone)]
pub struct SummaryLine<'a> {
    /// Product identifier
    pub product_id: String,

    /// Product display name
    pub name: String,

    /// Weight label for weighed lines
    pub weight: Option<String>,

    /// Units on the line
    pub quantity: u32,

    /// Price of one unit
    pub unit_price: Money<'a, Currency>,

    /// Unit price multiplied by quantity
    pub total: Money<'a, Currency>,

    /// Saving against the original price, zero if none
    pub savings: Money<'a, Currency>,
}

/// Priced view of a cart.
#[derive(Debug, Clone)]
pub struct CartSummary<'a> {
    lines: Vec<SummaryLine<'a>>,
    total_items: u64,
    total: Money<'a, Currency>,
    savings: Money<'a, Currency>,
}

impl<'a> CartSummary<'a> {
    /// Price every line of `cart` in `currency`.
    pub fn new<S: Storage>(cart: &Cart<S>, currency: &'a Currency) -> Self {
        let lines = cart
            .lines()
            .iter()
            .map(|line| SummaryLine {
                product_id: line.product_id().to_string(),
                name: line.product().name.clone(),
                weight: line.weight_grams().map(format_weight_label),
                quantity: line.quantity(),
                unit_price: Money::from_decimal(line.unit_price(), currency),
                total: Money::from_decimal(line.line_total(), currency),
                savings: Money::from_decimal(line_savings(line), currency),
            })
            .collect::<Vec<_>>();

        let savings = cart
            .lines()
            .iter()
            .map(line_savings)
            .fold(Decimal::ZERO, Decimal::saturating_add);

        Self {
            lines,
            total_items: cart.total_items(),
            total: Money::from_decimal(cart.total_price(), currency),
            savings: Money::from_decimal(savings, currency),
        }
    }

    /// Priced rows in cart order.
    pub fn lines(&self) -> &[SummaryLine<'a>] {
        &self.lines
    }

    /// Total units in the cart.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Amount payable.
    pub fn total(&self) -> &Money<'a, Currency> {
        &self.total
    }

    /// Total saving against original prices.
    pub fn savings(&self) -> &Money<'a, Currency> {
        &self.savings
    }

    /// Render the summary as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        if self.lines.is_empty() {
            writeln!(out, "Cart is empty")?;
            return Ok(());
        }

        let mut builder = Builder::default();

        builder.push_record(["Item", "Weight", "Qty", "Unit Price", "Total"]);

        for line in &self.lines {
            builder.push_record([
                line.name.clone(),
                line.weight.clone().unwrap_or_default(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.total.to_string(),
            ]);
        }

        let mut table = builder.build();

        table
            .with(Style::modern_rounded())
            .modify(Columns::new(2..5), Alignment::right())
            .modify(Rows::first(), Alignment::center());

        writeln!(out, "{table}")?;
        writeln!(out, " Items:   {}", self.total_items)?;
        writeln!(out, " Total:   {}", self.total)?;

        if !self.savings.is_zero() {
            writeln!(out, " Savings: {}", self.savings)?;
        }

        Ok(())
    }
}

/// Saving on a line against the product's original price, never negative.
fn line_savings(line: &CartLine) -> Decimal {
    let product = line.product();

    let Some(original) = product.original_price else {
        return Decimal::ZERO;
    };

    let original_unit_price = match line.weight() {
        None => Some(original),
        Some(weighed) => product
            .weight_info()
            .and_then(|info| original.checked_div(info.base_weight_grams))
            .map(|per_gram| price_for_weight(per_gram, weighed.grams)),
    };

    original_unit_price
        .map(|original| original - line.unit_price())
        .filter(|saving| *saving > Decimal::ZERO)
        .map_or(Decimal::ZERO, |saving| {
            saving.saturating_mul(Decimal::from(line.quantity()))
        })
}
