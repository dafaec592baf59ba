//! Cart
//!
//! The cart keeps its lines in memory and mirrors them into a [`Storage`] on
//! every mutation. Storage is best-effort: a failed write is logged, the
//! in-memory cart stays authoritative and the write is retried on the next
//! mutation or [`Cart::flush`].
//!
//! Before an auth redirect the cart is also written under a second key by
//! [`Cart::persist_for_auth`]. On return, [`Cart::restore_from_auth`]
//! consumes that snapshot exactly once, replacing the current lines.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    lines::{CartLine, LineKey},
    products::Product,
    snapshot::{self, SnapshotKeys},
    storage::Storage,
};

/// Invalid cart operations. These indicate a caller bug rather than something
/// a shopper can correct.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// A weight was supplied for a product that is not sold by weight.
    #[error("product {0} is not sold by weight")]
    NotWeightBased(String),

    /// A weight-priced add asked for zero or negative grams.
    #[error("requested weight must be positive, got {0} g")]
    NonPositiveWeight(Decimal),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// An item was added (drives the add-to-cart animation).
    ItemAdded {
        /// Product that was added
        product_id: String,

        /// Weight chosen, for weight-priced adds
        weight_grams: Option<Decimal>,
    },

    /// Lines changed (drives badge counts).
    Changed {
        /// Total units after the change
        total_items: u64,
    },
}

/// Progress of the auth-redirect snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthSnapshotState {
    /// Nothing waiting to be restored.
    #[default]
    NoPendingSnapshot,

    /// A snapshot was written and has not been consumed.
    SnapshotPersisted,

    /// The snapshot was restored in this session; further restores are no-ops.
    SnapshotConsumed,
}

/// Shopping cart mirrored into durable storage.
#[derive(Debug)]
pub struct Cart<S: Storage> {
    lines: Vec<CartLine>,
    storage: S,
    keys: SnapshotKeys,
    auth_state: AuthSnapshotState,
    events: Vec<CartEvent>,
    dirty: bool,
}

impl<S: Storage> Cart<S> {
    /// Open a cart on `storage` using the default keys, restoring any saved lines.
    pub fn open(storage: S) -> Self {
        Self::with_keys(storage, SnapshotKeys::default())
    }

    /// Open a cart on `storage` using custom keys, restoring any saved lines.
    ///
    /// A missing, unreadable or corrupt snapshot opens an empty cart.
    pub fn with_keys(storage: S, keys: SnapshotKeys) -> Self {
        let lines = load_lines(&storage, &keys.cart);

        let auth_state = match storage.get(&keys.auth_pending) {
            Ok(Some(_)) => AuthSnapshotState::SnapshotPersisted,
            _ => AuthSnapshotState::NoPendingSnapshot,
        };

        debug!(lines = lines.len(), ?auth_state, "opened cart");

        Self {
            lines,
            storage,
            keys,
            auth_state,
            events: Vec::new(),
            dirty: false,
        }
    }

    /// Add one unit of `product`, or `grams` of it if the product is sold by weight.
    ///
    /// Flat adds increment the product's existing flat line. Weighed adds
    /// increment a line with exactly the same weight, otherwise a new line is
    /// appended.
    ///
    /// # Errors
    ///
    /// - [`CartError::NonPositiveWeight`]: `grams` is zero or negative.
    /// - [`CartError::NotWeightBased`]: `grams` was given for a flat-priced product.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&mut self, product: &Product, grams: Option<Decimal>) -> Result<(), CartError> {
        match grams {
            None => self.add_unit(product),
            Some(grams) => self.add_weighed(product, grams)?,
        }

        self.events.push(CartEvent::ItemAdded {
            product_id: product.id.clone(),
            weight_grams: grams,
        });

        self.changed();

        Ok(())
    }

    fn add_unit(&mut self, product: &Product) {
        let key = LineKey::Unit(&product.id);

        match self.lines.iter_mut().find(|line| line.key() == key) {
            Some(line) => line.add_quantity(1),
            None => self.lines.push(CartLine::unit(product.clone())),
        }
    }

    fn add_weighed(&mut self, product: &Product, grams: Decimal) -> Result<(), CartError> {
        if grams <= Decimal::ZERO {
            return Err(CartError::NonPositiveWeight(grams));
        }

        let info = product
            .weight_info()
            .ok_or_else(|| CartError::NotWeightBased(product.id.clone()))?;

        let key = LineKey::Weight(&product.id, grams);

        match self.lines.iter_mut().find(|line| line.key() == key) {
            Some(line) => line.add_quantity(1),
            None => {
                let price = info.price_for(grams);

                self.lines
                    .push(CartLine::weighed(product.clone(), grams, price));
            }
        }

        Ok(())
    }

    /// Remove every line of `product_id`, flat and weighed. Removing an absent
    /// product does nothing.
    pub fn remove_item(&mut self, product_id: &str) {
        let before = self.lines.len();

        self.lines.retain(|line| line.product_id() != product_id);

        if self.lines.len() == before {
            debug!(product_id, "remove_item: nothing to remove");
            return;
        }

        self.changed();
    }

    /// Set the quantity of the flat line for `product_id`.
    ///
    /// Zero or negative quantities remove the product entirely. Products with
    /// only weighed lines are left untouched; use [`Cart::update_weight`].
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let key = LineKey::Unit(product_id);

        match self.lines.iter_mut().find(|line| line.key() == key) {
            Some(line) if line.quantity() == quantity => {}
            Some(line) => {
                line.set_quantity(quantity);
                self.changed();
            }
            None => debug!(product_id, "update_quantity: no flat line"),
        }
    }

    /// Re-weigh every weighed line of `product_id` to `grams`, recomputing
    /// prices. Lines that end up with the same weight are merged.
    ///
    /// Zero or negative weights remove the product entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotWeightBased`] if the product's weighed lines no
    /// longer resolve to weight pricing.
    pub fn update_weight(&mut self, product_id: &str, grams: Decimal) -> Result<(), CartError> {
        if grams <= Decimal::ZERO {
            self.remove_item(product_id);
            return Ok(());
        }

        let Some(first) = self
            .lines
            .iter()
            .find(|line| line.product_id() == product_id && line.is_weighed())
        else {
            debug!(product_id, "update_weight: no weighed line");
            return Ok(());
        };

        let price = first
            .product()
            .weight_info()
            .ok_or_else(|| CartError::NotWeightBased(product_id.to_string()))?
            .price_for(grams);

        let mut lines: Vec<CartLine> = Vec::with_capacity(self.lines.len());
        let mut merged_at: Option<usize> = None;

        for mut line in self.lines.drain(..) {
            if line.product_id() != product_id || !line.is_weighed() {
                lines.push(line);
                continue;
            }

            if let Some(existing) = merged_at.and_then(|index| lines.get_mut(index)) {
                existing.add_quantity(line.quantity());
                continue;
            }

            line.reweigh(grams, price);
            merged_at = Some(lines.len());
            lines.push(line);
        }

        self.lines = lines;
        self.changed();

        Ok(())
    }

    /// Remove every line. A pending auth snapshot is left alone.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.changed();
    }

    /// Write the current lines under the auth key, replacing any earlier
    /// snapshot. Call immediately before leaving for an external auth flow.
    ///
    /// Returns false if the snapshot could not be written; the failure is logged.
    pub fn persist_for_auth(&mut self) -> bool {
        let written = snapshot::encode(&self.lines)
            .map_err(|error| error.to_string())
            .and_then(|raw| {
                self.storage
                    .set(&self.keys.auth_pending, &raw)
                    .map_err(|error| error.to_string())
            });

        match written {
            Ok(()) => {
                self.auth_state = AuthSnapshotState::SnapshotPersisted;
                info!(lines = self.lines.len(), "persisted cart for auth redirect");
                true
            }
            Err(error) => {
                warn!(key = %self.keys.auth_pending, %error, "failed to persist cart for auth redirect");
                false
            }
        }
    }

    /// Replace the cart with the auth snapshot and delete it.
    ///
    /// Returns true if a non-empty snapshot was restored. Returns false, leaving
    /// the cart unchanged, if there is no snapshot, it is empty or corrupt, it
    /// was already consumed in this session, or it could not be deleted. Empty
    /// and corrupt snapshots are deleted.
    pub fn restore_from_auth(&mut self) -> bool {
        if self.auth_state == AuthSnapshotState::SnapshotConsumed {
            debug!("auth snapshot already consumed");
            return false;
        }

        let raw = match self.storage.get(&self.keys.auth_pending) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.auth_state = AuthSnapshotState::NoPendingSnapshot;
                return false;
            }
            Err(error) => {
                warn!(key = %self.keys.auth_pending, %error, "failed to read auth snapshot");
                return false;
            }
        };

        let lines = match snapshot::decode(&raw) {
            Ok(lines) if !lines.is_empty() => lines,
            Ok(_) => {
                debug!("auth snapshot is empty");
                self.discard_auth_snapshot();
                self.auth_state = AuthSnapshotState::NoPendingSnapshot;
                return false;
            }
            Err(error) => {
                warn!(key = %self.keys.auth_pending, %error, "discarding corrupt auth snapshot");
                self.discard_auth_snapshot();
                self.auth_state = AuthSnapshotState::NoPendingSnapshot;
                return false;
            }
        };

        // Consumed before it is applied, so a restart can never restore it twice.
        if let Err(error) = self.storage.remove(&self.keys.auth_pending) {
            warn!(key = %self.keys.auth_pending, %error, "failed to consume auth snapshot, cart left unchanged");
            return false;
        }

        self.lines = lines;
        self.auth_state = AuthSnapshotState::SnapshotConsumed;

        info!(lines = self.lines.len(), "restored cart after auth redirect");

        self.changed();

        true
    }

    fn discard_auth_snapshot(&mut self) {
        if let Err(error) = self.storage.remove(&self.keys.auth_pending) {
            warn!(key = %self.keys.auth_pending, %error, "failed to delete auth snapshot");
        }
    }

    /// Retry a write-through that previously failed. Returns true once the
    /// stored snapshot matches the in-memory cart.
    pub fn flush(&mut self) -> bool {
        if self.dirty {
            self.write_through();
        }

        !self.dirty
    }

    /// Flush and hand back the storage, ending the session.
    pub fn close(mut self) -> S {
        if !self.flush() {
            warn!("closing cart with unsaved changes");
        }

        self.storage
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<CartEvent> {
        std::mem::take(&mut self.events)
    }

    /// Total number of units across all lines.
    pub fn total_items(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity()))
            .sum()
    }

    /// Sum of every line's unit price multiplied by its quantity.
    pub fn total_price(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |total, line| {
                total.saturating_add(line.line_total())
            })
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Where the auth-redirect snapshot is in its lifecycle.
    pub fn auth_state(&self) -> AuthSnapshotState {
        self.auth_state
    }

    /// Returns true if the last write-through failed and has not been retried.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Storage keys in use.
    pub fn keys(&self) -> &SnapshotKeys {
        &self.keys
    }

    /// Read access to the backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write access to the backing storage.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn changed(&mut self) {
        self.events.push(CartEvent::Changed {
            total_items: self.total_items(),
        });

        self.write_through();
    }

    fn write_through(&mut self) {
        let raw = match snapshot::encode(&self.lines) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "failed to encode cart snapshot");
                self.dirty = true;
                return;
            }
        };

        match self.storage.set(&self.keys.cart, &raw) {
            Ok(()) => self.dirty = false,
            Err(error) => {
                warn!(key = %self.keys.cart, %error, "cart snapshot write failed; keeping in-memory cart");
                self.dirty = true;
            }
        }
    }
}

fn load_lines(storage: &impl Storage, key: &str) -> Vec<CartLine> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(error) => {
            warn!(key, %error, "failed to read cart snapshot; starting empty");
            return Vec::new();
        }
    };

    snapshot::decode(&raw).unwrap_or_else(|error| {
        warn!(key, %error, "ignoring corrupt cart snapshot; starting empty");
        Vec::new()
    })
}
