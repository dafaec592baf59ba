//! Trolley CLI

use std::{
    io::{self, Write},
    process,
};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use trolley::{
    cart::{Cart, CartError},
    catalog::{Catalog, CatalogError},
    config::{CliConfig, Command, ConfigError, StoreConfig},
    logging::{self, LoggingError},
    storage::{FileStorage, StorageError},
    summary::{CartSummary, SummaryError},
    weight::{format_weight_label, resolve_weight_info},
};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Failed to save the cart for sign-in")]
    Handoff,
}

fn main() {
    let config = CliConfig::load().unwrap_or_else(|error| error.exit());

    let result = logging::init_subscriber(&config.logging)
        .map_err(AppError::from)
        .and_then(|()| run(config));

    if let Err(error) = result {
        fail(&error);
    }
}

#[expect(clippy::exit, reason = "failures are reported through the exit status")]
#[expect(
    clippy::print_stderr,
    reason = "logging may not be initialized yet, must use eprintln for errors"
)]
fn fail(error: &AppError) -> ! {
    eprintln!("{error}");
    process::exit(1)
}

fn run(config: CliConfig) -> Result<(), AppError> {
    let CliConfig { store, command, .. } = config;

    match command {
        Command::Quote { name, price, grams } => quote(&name, price, grams),
        Command::Products => list_products(&Catalog::load(&store.catalog)?),
        command => run_cart_command(&store, command),
    }
}

fn run_cart_command(store: &StoreConfig, command: Command) -> Result<(), AppError> {
    let currency = store.currency()?;
    let storage = FileStorage::open(&store.store_dir)?;
    let mut cart = Cart::with_keys(storage, store.snapshot_keys());

    match command {
        Command::Show | Command::Quote { .. } | Command::Products => {}
        Command::Add { product_id, grams } => {
            let catalog = Catalog::load(&store.catalog)?;
            let product = catalog
                .get(&product_id)
                .ok_or(AppError::UnknownProduct(product_id))?;

            cart.add_item(product, grams)?;
        }
        Command::Remove { product_id } => cart.remove_item(&product_id),
        Command::SetQuantity {
            product_id,
            quantity,
        } => cart.update_quantity(&product_id, quantity),
        Command::SetWeight { product_id, grams } => cart.update_weight(&product_id, grams)?,
        Command::Clear => cart.clear(),
        Command::AuthHandoff => {
            if !cart.persist_for_auth() {
                return Err(AppError::Handoff);
            }

            writeln!(io::stdout().lock(), "Cart saved for sign-in")?;
        }
        Command::AuthReturn => {
            let message = if cart.restore_from_auth() {
                "Cart restored after sign-in"
            } else {
                "No saved cart to restore"
            };

            writeln!(io::stdout().lock(), "{message}")?;
        }
    }

    for event in cart.take_events() {
        debug!(?event, "cart event");
    }

    CartSummary::new(&cart, currency).write_to(io::stdout().lock())?;

    let storage = cart.close();

    debug!(root = %storage.root().display(), "cart closed");

    Ok(())
}

fn list_products(catalog: &Catalog) -> Result<(), AppError> {
    let mut out = io::stdout().lock();

    for product in catalog.products() {
        let pricing = product.weight_info().map_or_else(
            || String::from("each"),
            |info| format!("per {}", format_weight_label(info.base_weight_grams)),
        );

        writeln!(
            out,
            "{:<16} {:<32} {:>10} {pricing}",
            product.id, product.name, product.price
        )?;
    }

    Ok(())
}

fn quote(name: &str, price: Decimal, grams: Option<Decimal>) -> Result<(), AppError> {
    let mut out = io::stdout().lock();

    let Some(info) = resolve_weight_info(name, price) else {
        writeln!(out, "{name}: flat price {price}")?;
        return Ok(());
    };

    writeln!(
        out,
        "{name}: {price} per {} ({} per g)",
        format_weight_label(info.base_weight_grams),
        info.price_per_gram
    )?;

    if let Some(grams) = grams {
        if grams <= Decimal::ZERO {
            return Err(CartError::NonPositiveWeight(grams).into());
        }

        writeln!(
            out,
            "{}: {}",
            format_weight_label(grams),
            info.price_for(grams)
        )?;
    }

    Ok(())
}
