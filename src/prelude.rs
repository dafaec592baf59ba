//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{AuthSnapshotState, Cart, CartError, CartEvent},
    catalog::{Catalog, CatalogError},
    lines::{CartLine, LineKey, Weighed},
    products::Product,
    snapshot::{SnapshotError, SnapshotKeys},
    storage::{FileStorage, MemoryStorage, Storage, StorageError},
    summary::{CartSummary, SummaryError},
    weight::{WeightInfo, format_weight_label, price_for_weight, resolve_weight_info},
};
