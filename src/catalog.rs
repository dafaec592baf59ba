//! Catalog
//!
//! Loads the product read model from a YAML file:
//!
//! ```yaml
//! products:
//!   rice-1kg:
//!     name: Basmati Rice (1kg)
//!     brand: Daawat
//!     price: "120.00"
//!     category: Staples
//!     stock: 40
//!     expiry_date: 2027-03-01
//! ```

use std::{fs, path::Path};

use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::products::Product;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Price is negative
    #[error("Invalid price for product {0}")]
    InvalidPrice(String),

    /// Pack weight is not positive
    #[error("Invalid pack weight for product {0}")]
    InvalidPackWeight(String),
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: FxHashMap<String, ProductEntry>,
}

/// Product entry, keyed by id in the file
#[derive(Debug, Deserialize)]
struct ProductEntry {
    name: String,
    #[serde(default)]
    brand: String,
    price: Decimal,
    #[serde(default)]
    category: String,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    expiry_date: Option<Date>,
    #[serde(default)]
    image: String,
    #[serde(default)]
    aisle: String,
    #[serde(default)]
    original_price: Option<Decimal>,
    #[serde(default)]
    offer: Option<String>,
    #[serde(default)]
    pack_grams: Option<Decimal>,
}

impl ProductEntry {
    fn into_product(self, id: String) -> Result<Product, CatalogError> {
        if self.price < Decimal::ZERO {
            return Err(CatalogError::InvalidPrice(id));
        }

        if self.pack_grams.is_some_and(|grams| grams <= Decimal::ZERO) {
            return Err(CatalogError::InvalidPackWeight(id));
        }

        Ok(Product {
            id,
            name: self.name,
            brand: self.brand,
            price: self.price,
            category: self.category,
            stock: self.stock,
            expiry_date: self.expiry_date,
            image: self.image,
            aisle: self.aisle,
            original_price: self.original_price,
            offer: self.offer,
            pack_grams: self.pack_grams,
        })
    }
}

/// Products keyed by id.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    products: FxHashMap<String, Product>,
}

impl Catalog {
    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an entry is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or an entry is invalid.
    pub fn from_yaml(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_norway::from_str(contents)?;

        let products = file
            .products
            .into_iter()
            .map(|(id, entry)| entry.into_product(id.clone()).map(|product| (id, product)))
            .collect::<Result<FxHashMap<_, _>, CatalogError>>()?;

        Ok(Self { products })
    }

    /// Add or replace a product.
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Look up a product by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Products sorted by id.
    pub fn products(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.values().collect();

        products.sort_by(|a, b| a.id.cmp(&b.id));

        products
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
