//! Products

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::weight::{WeightInfo, resolve_weight_info, weight_info_for_pack};

/// Product, as served by the catalog.
///
/// `price` is quoted for the package named in `name` (e.g. `Rice (1kg)`), or
/// per item when the name carries no unit token and `pack_grams` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: String,

    /// Display name, possibly embedding a unit-size token
    pub name: String,

    /// Brand
    #[serde(default)]
    pub brand: String,

    /// Price for the stated unit or package
    pub price: Decimal,

    /// Category
    #[serde(default)]
    pub category: String,

    /// Units in stock
    #[serde(default)]
    pub stock: u32,

    /// Best-before date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Date>,

    /// Image reference
    #[serde(default)]
    pub image: String,

    /// Store aisle
    #[serde(default)]
    pub aisle: String,

    /// Price before any markdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,

    /// Offer label shown alongside the price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,

    /// Reference package weight in grams that `price` is quoted for.
    ///
    /// Takes precedence over any unit token in `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_grams: Option<Decimal>,
}

impl Product {
    /// Create a product with the given id, name and price, leaving every other field empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: String::new(),
            price,
            category: String::new(),
            stock: 0,
            expiry_date: None,
            image: String::new(),
            aisle: String::new(),
            original_price: None,
            offer: None,
            pack_grams: None,
        }
    }

    /// Set the reference package weight.
    #[must_use]
    pub fn with_pack_grams(mut self, grams: Decimal) -> Self {
        self.pack_grams = Some(grams);
        self
    }

    /// Set the pre-markdown price.
    #[must_use]
    pub fn with_original_price(mut self, price: Decimal) -> Self {
        self.original_price = Some(price);
        self
    }

    /// Weight pricing for this product, or `None` if it is sold per item.
    ///
    /// An explicit `pack_grams` wins; otherwise the unit token in `name` is used.
    pub fn weight_info(&self) -> Option<WeightInfo> {
        match self.pack_grams {
            Some(grams) => weight_info_for_pack(grams, self.price),
            None => resolve_weight_info(&self.name, self.price),
        }
    }

    /// Returns true if the product is sold by weight.
    pub fn is_weight_based(&self) -> bool {
        self.weight_info().is_some()
    }
}
