//! Cart Snapshots
//!
//! Versioned JSON encoding of a cart's lines, as written to durable storage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lines::CartLine;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Default key for the write-through cart snapshot.
pub const DEFAULT_CART_KEY: &str = "trolley.cart";

/// Default key for the snapshot taken before an auth redirect.
pub const DEFAULT_AUTH_PENDING_KEY: &str = "trolley.cart.auth-pending";

/// Errors decoding a stored snapshot. Any of these means the stored value is
/// not a usable cart.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not valid JSON, or not the expected shape.
    #[error("malformed cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by an incompatible version.
    #[error("unsupported cart snapshot version {0}")]
    UnsupportedVersion(u32),

    /// A line breaks a cart invariant (index, reason).
    #[error("cart snapshot line {0} is invalid: {1}")]
    InvalidLine(usize, &'static str),

    /// Two lines share an identity key (index of the second).
    #[error("cart snapshot line {0} duplicates an earlier line")]
    DuplicateLine(usize),
}

/// Storage keys used by a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotKeys {
    /// Write-through snapshot, restored at startup
    pub cart: String,

    /// Snapshot taken before an auth redirect, consumed on return
    pub auth_pending: String,
}

impl Default for SnapshotKeys {
    fn default() -> Self {
        Self {
            cart: DEFAULT_CART_KEY.to_string(),
            auth_pending: DEFAULT_AUTH_PENDING_KEY.to_string(),
        }
    }
}

impl SnapshotKeys {
    /// Keys namespaced under `prefix`, for running several carts on one store.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            cart: format!("{prefix}.cart"),
            auth_pending: format!("{prefix}.cart.auth-pending"),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    lines: &'a [CartLine],
}

#[derive(Deserialize)]
struct OwnedEnvelope {
    version: u32,
    lines: Vec<CartLine>,
}

/// Serialize lines into a snapshot string.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn encode(lines: &[CartLine]) -> Result<String, SnapshotError> {
    let envelope = Envelope {
        version: SNAPSHOT_VERSION,
        lines,
    };

    Ok(serde_json::to_string(&envelope)?)
}

/// Parse and validate a snapshot string.
///
/// # Errors
///
/// Returns a [`SnapshotError`] if the snapshot is malformed, from another
/// version, or contains lines that violate cart invariants.
pub fn decode(raw: &str) -> Result<Vec<CartLine>, SnapshotError> {
    let envelope: OwnedEnvelope = serde_json::from_str(raw)?;

    if envelope.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(envelope.version));
    }

    validate(&envelope.lines)?;

    Ok(envelope.lines)
}

fn validate(lines: &[CartLine]) -> Result<(), SnapshotError> {
    for (index, line) in lines.iter().enumerate() {
        if line.quantity() == 0 {
            return Err(SnapshotError::InvalidLine(index, "quantity must be at least 1"));
        }

        if line.product().price < Decimal::ZERO {
            return Err(SnapshotError::InvalidLine(index, "negative product price"));
        }

        if let Some(weight) = line.weight() {
            if weight.grams <= Decimal::ZERO {
                return Err(SnapshotError::InvalidLine(index, "weight must be positive"));
            }

            if weight.price < Decimal::ZERO {
                return Err(SnapshotError::InvalidLine(index, "negative weighed price"));
            }
        }

        if lines
            .iter()
            .take(index)
            .any(|earlier| earlier.key() == line.key())
        {
            return Err(SnapshotError::DuplicateLine(index));
        }
    }

    Ok(())
}
