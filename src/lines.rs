//! Cart Lines

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::Product;

/// Weight chosen for a weight-priced line and the price it resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weighed {
    /// Requested weight in grams
    pub grams: Decimal,

    /// Price of one unit at `grams`
    pub price: Decimal,
}

/// Identity of a line: flat lines match on product alone, weighed lines on
/// product and weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKey<'a> {
    /// Flat-priced line for a product
    Unit(&'a str),

    /// Weight-priced line for a product at a given weight
    Weight(&'a str, Decimal),
}

/// One addressable entry in the cart.
///
/// The product is embedded as it was when added, so a serialized line can be
/// priced without a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    product: Product,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<Weighed>,

    quantity: u32,
}

impl CartLine {
    /// A flat-priced line with quantity 1.
    pub fn unit(product: Product) -> Self {
        Self {
            product,
            weight: None,
            quantity: 1,
        }
    }

    /// A weight-priced line with quantity 1.
    pub fn weighed(product: Product, grams: Decimal, price: Decimal) -> Self {
        Self {
            product,
            weight: Some(Weighed { grams, price }),
            quantity: 1,
        }
    }

    /// Product the line was added with
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Identifier of the line's product
    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Weight selection, if the line is weight-priced
    pub fn weight(&self) -> Option<&Weighed> {
        self.weight.as_ref()
    }

    /// Requested weight in grams, if the line is weight-priced
    pub fn weight_grams(&self) -> Option<Decimal> {
        self.weight.map(|weight| weight.grams)
    }

    /// Price resolved for the requested weight, if the line is weight-priced
    pub fn calculated_price(&self) -> Option<Decimal> {
        self.weight.map(|weight| weight.price)
    }

    /// Returns true for weight-priced lines.
    pub fn is_weighed(&self) -> bool {
        self.weight.is_some()
    }

    /// Number of units on the line
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price of one unit: the weight-resolved price, or the product's listed price.
    pub fn unit_price(&self) -> Decimal {
        self.calculated_price().unwrap_or(self.product.price)
    }

    /// Unit price multiplied by quantity.
    pub fn line_total(&self) -> Decimal {
        self.unit_price()
            .saturating_mul(Decimal::from(self.quantity))
    }

    /// Identity key used for merging.
    pub fn key(&self) -> LineKey<'_> {
        match self.weight {
            Some(weight) => LineKey::Weight(&self.product.id, weight.grams),
            None => LineKey::Unit(&self.product.id),
        }
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub(crate) fn add_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }

    pub(crate) fn reweigh(&mut self, grams: Decimal, price: Decimal) {
        self.weight = Some(Weighed { grams, price });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rice() -> Product {
        Product::new("rice", "Rice (1kg)", Decimal::from(100))
    }

    #[test]
    fn unit_line_uses_listed_price() {
        let mut line = CartLine::unit(rice());
        line.set_quantity(3);

        assert_eq!(line.unit_price(), Decimal::from(100));
        assert_eq!(line.line_total(), Decimal::from(300));
        assert_eq!(line.key(), LineKey::Unit("rice"));
    }

    #[test]
    fn weighed_line_uses_calculated_price() {
        let mut line = CartLine::weighed(rice(), Decimal::from(500), Decimal::new(5000, 2));
        line.add_quantity(1);

        assert_eq!(line.calculated_price(), Some(Decimal::from(50)));
        assert_eq!(line.line_total(), Decimal::from(100));
        assert_eq!(line.key(), LineKey::Weight("rice", Decimal::from(500)));
    }

    #[test]
    fn weight_keys_compare_numerically() {
        let line = CartLine::weighed(rice(), Decimal::new(5000, 1), Decimal::from(50));

        assert_eq!(line.key(), LineKey::Weight("rice", Decimal::from(500)));
    }

    #[test]
    fn unit_lines_serialize_without_weight() -> testresult::TestResult {
        let json = serde_json::to_value(CartLine::unit(rice()))?;

        assert!(json.get("weight").is_none());
        assert_eq!(json.get("quantity"), Some(&serde_json::json!(1)));

        Ok(())
    }
}
