//! Trolley
//!
//! Shopping cart engine for a storefront: flat and weight-priced lines,
//! write-through persistence and a one-shot snapshot that carries the cart
//! across a sign-in redirect.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod lines;
pub mod logging;
pub mod prelude;
pub mod products;
pub mod snapshot;
pub mod storage;
pub mod summary;
pub mod weight;
