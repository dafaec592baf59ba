//! Command-line configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::snapshot::SnapshotKeys;

/// Configuration errors detected after parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Currency code is not an ISO 4217 code known to the money library.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Where the cart and catalog live.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Directory holding cart snapshots
    #[arg(long, env = "TROLLEY_STORE_DIR", default_value = ".trolley")]
    pub store_dir: PathBuf,

    /// Product catalog (YAML)
    #[arg(long, env = "TROLLEY_CATALOG", default_value = "fixtures/catalog.yml")]
    pub catalog: PathBuf,

    /// ISO 4217 code prices are shown in
    #[arg(long, env = "TROLLEY_CURRENCY", default_value = "INR")]
    pub currency: String,

    /// Namespace for snapshot keys, to keep several carts in one directory
    #[arg(long, env = "TROLLEY_KEY_PREFIX")]
    pub key_prefix: Option<String>,
}

impl StoreConfig {
    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not recognised.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(&self.currency.to_uppercase())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Snapshot keys, honouring the optional prefix.
    pub fn snapshot_keys(&self) -> SnapshotKeys {
        self.key_prefix
            .as_deref()
            .map_or_else(SnapshotKeys::default, SnapshotKeys::with_prefix)
    }
}

/// Cart actions.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the cart
    Show,

    /// List catalog products
    Products,

    /// Add a product, optionally by weight
    Add {
        /// Product identifier
        product_id: String,

        /// Weight in grams, for products sold by weight
        #[arg(long, allow_negative_numbers = true)]
        grams: Option<Decimal>,
    },

    /// Remove every line of a product
    Remove {
        /// Product identifier
        product_id: String,
    },

    /// Set the quantity of a product's flat line (0 or less removes it)
    SetQuantity {
        /// Product identifier
        product_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Re-weigh a product's weighed lines (0 or less removes it)
    SetWeight {
        /// Product identifier
        product_id: String,

        /// New weight in grams
        #[arg(allow_negative_numbers = true)]
        grams: Decimal,
    },

    /// Empty the cart
    Clear,

    /// Price a product name without touching the cart
    Quote {
        /// Display name, e.g. "Rice (1kg)"
        name: String,

        /// Listed price
        price: Decimal,

        /// Weight to price, in grams
        #[arg(long)]
        grams: Option<Decimal>,
    },

    /// Save the cart before leaving for sign-in
    AuthHandoff,

    /// Restore the cart saved before sign-in
    AuthReturn,
}

/// Trolley CLI configuration
#[derive(Debug, Parser)]
#[command(name = "trolley", about = "Storefront cart", long_about = None)]
pub struct CliConfig {
    /// Storage and catalog settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Action to run.
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_weighed_add() -> TestResult {
        let config = CliConfig::try_parse_from(["trolley", "add", "rice", "--grams", "750"])?;

        let Command::Add { product_id, grams } = &config.command else {
            return Err(format!("expected add, got {:?}", config.command).into());
        };

        assert_eq!(product_id, "rice");
        assert_eq!(*grams, Some(Decimal::from(750)));

        Ok(())
    }

    #[test]
    fn negative_quantities_parse() -> TestResult {
        let config = CliConfig::try_parse_from(["trolley", "set-quantity", "bread", "-3"])?;

        assert!(matches!(
            config.command,
            Command::SetQuantity { quantity: -3, .. }
        ));

        Ok(())
    }

    #[test]
    fn currency_is_case_insensitive() -> TestResult {
        let config =
            CliConfig::try_parse_from(["trolley", "--currency", "gbp", "show"])?;

        assert_eq!(config.store.currency()?, iso::GBP);

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() -> TestResult {
        let config = CliConfig::try_parse_from(["trolley", "--currency", "XYZ", "show"])?;

        assert!(matches!(
            config.store.currency(),
            Err(ConfigError::UnknownCurrency(code)) if code == "XYZ"
        ));

        Ok(())
    }

    #[test]
    fn key_prefix_namespaces_snapshots() -> TestResult {
        let config =
            CliConfig::try_parse_from(["trolley", "--key-prefix", "kiosk-2", "show"])?;

        assert_eq!(config.store.snapshot_keys(), SnapshotKeys::with_prefix("kiosk-2"));

        Ok(())
    }
}
