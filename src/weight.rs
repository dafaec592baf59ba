//! Weight Pricing
//!
//! Products sold by mass carry their reference package size in the display
//! name, e.g. `Basmati Rice (1kg)` or `Butter (500g)`. The listed price is for
//! that package; any other quantity is priced linearly per gram.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

/// `(<number> kg)`, decimal values allowed.
static KILOGRAM_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(\d+(?:\.\d+)?)\s*kg\s*\)").ok());

/// `(<integer> g)`.
static GRAM_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(\d+)\s*g\s*\)").ok());

/// Unit economics of a weight-based product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightInfo {
    /// Always true; kept so the value can be handed to callers that branch on it.
    pub is_weight_based: bool,

    /// Weight of the package the listed price refers to
    pub base_weight_grams: Decimal,

    /// Listed price divided by the package weight
    pub price_per_gram: Decimal,

    /// Unit the package weight was expressed in (`kg` or `g`)
    pub display_unit: &'static str,
}

impl WeightInfo {
    /// Price of `grams` of this product.
    pub fn price_for(&self, grams: Decimal) -> Decimal {
        price_for_weight(self.price_per_gram, grams)
    }
}

/// Derives weight pricing from a product's display name and listed price.
///
/// Kilogram tokens win over gram tokens. Returns `None` when the name carries
/// no unit token, the number cannot be parsed, the package weight is zero or
/// the price is not positive.
pub fn resolve_weight_info(name: &str, price: Decimal) -> Option<WeightInfo> {
    if let Some(kilograms) = capture_decimal(KILOGRAM_TOKEN.as_ref(), name) {
        let grams = kilograms.checked_mul(Decimal::ONE_THOUSAND)?;

        return weight_info(grams, price, "kg");
    }

    let grams = capture_decimal(GRAM_TOKEN.as_ref(), name)?;

    weight_info(grams, price, "g")
}

/// Weight pricing for an explicit package weight in grams.
pub fn weight_info_for_pack(grams: Decimal, price: Decimal) -> Option<WeightInfo> {
    let unit = if grams >= Decimal::ONE_THOUSAND {
        "kg"
    } else {
        "g"
    };

    weight_info(grams, price, unit)
}

/// Price of `requested_grams` at `price_per_gram`, rounded half-up to two places.
///
/// Does not validate its input; callers reject non-positive weights first.
pub fn price_for_weight(price_per_gram: Decimal, requested_grams: Decimal) -> Decimal {
    let mut price = price_per_gram
        .saturating_mul(requested_grams)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    price.rescale(2);

    price
}

/// Human label for a weight: `1.25 kg` from 1000 g upwards, `750 g` below.
pub fn format_weight_label(grams: Decimal) -> String {
    if grams >= Decimal::ONE_THOUSAND {
        let kilograms = (grams / Decimal::ONE_THOUSAND)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        format!("{kilograms:.2} kg")
    } else {
        let grams = grams
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize();

        format!("{grams} g")
    }
}

fn weight_info(grams: Decimal, price: Decimal, display_unit: &'static str) -> Option<WeightInfo> {
    if grams <= Decimal::ZERO || price <= Decimal::ZERO {
        return None;
    }

    let price_per_gram = price.checked_div(grams)?;

    Some(WeightInfo {
        is_weight_based: true,
        base_weight_grams: grams,
        price_per_gram,
        display_unit,
    })
}

fn capture_decimal(pattern: Option<&Regex>, name: &str) -> Option<Decimal> {
    pattern?
        .captures(name)?
        .get(1)?
        .as_str()
        .parse::<Decimal>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap_or_default()
    }

    #[test]
    fn kilogram_token_resolves_price_per_gram() {
        let info = resolve_weight_info("Rice (1kg)", Decimal::from(100));

        assert_eq!(
            info,
            Some(WeightInfo {
                is_weight_based: true,
                base_weight_grams: Decimal::from(1000),
                price_per_gram: dec("0.1"),
                display_unit: "kg",
            })
        );
    }

    #[test]
    fn fractional_kilograms_are_accepted() {
        let info = resolve_weight_info("Atta (2.5 KG)", Decimal::from(250));

        assert_eq!(
            info.map(|info| (info.base_weight_grams, info.price_per_gram)),
            Some((Decimal::from(2500), dec("0.1")))
        );
    }

    #[test]
    fn gram_token_resolves_price_per_gram() {
        let info = resolve_weight_info("Butter (500g)", Decimal::from(250));

        assert_eq!(info.map(|info| info.price_per_gram), Some(dec("0.5")));
        assert_eq!(info.map(|info| info.display_unit), Some("g"));
    }

    #[test]
    fn gram_token_is_case_insensitive_and_allows_spaces() {
        let info = resolve_weight_info("Paneer ( 200 G )", Decimal::from(90));

        assert_eq!(
            info.map(|info| info.base_weight_grams),
            Some(Decimal::from(200))
        );
    }

    #[test]
    fn names_without_tokens_are_flat_priced() {
        assert_eq!(resolve_weight_info("Bread Loaf", Decimal::from(40)), None);
        assert_eq!(resolve_weight_info("Rice 1kg", Decimal::from(40)), None);
        assert_eq!(resolve_weight_info("Sugar (1.5g)", Decimal::from(40)), None);
        assert_eq!(resolve_weight_info("", Decimal::from(40)), None);
    }

    #[test]
    fn zero_weight_or_price_is_rejected() {
        assert_eq!(resolve_weight_info("Air (0g)", Decimal::from(10)), None);
        assert_eq!(resolve_weight_info("Sample (100g)", Decimal::ZERO), None);
    }

    #[test]
    fn oversized_numbers_do_not_panic() {
        let name = format!("Bulk ({}kg)", "9".repeat(40));

        assert_eq!(resolve_weight_info(&name, Decimal::from(10)), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let names = ["Rice (1kg)", "Butter (500g)", "Bread Loaf", "Oats (0.75kg)"];

        for name in names {
            let first = resolve_weight_info(name, Decimal::from(120));
            let second = resolve_weight_info(name, Decimal::from(120));

            assert_eq!(first, second, "{name} resolved differently on repeat");
        }
    }

    #[test]
    fn price_for_weight_rounds_to_two_places() {
        assert_eq!(price_for_weight(dec("0.1"), Decimal::from(500)), dec("50.00"));
        assert_eq!(price_for_weight(dec("0.5"), Decimal::from(200)), dec("100.00"));
        assert_eq!(price_for_weight(dec("0.0125"), Decimal::from(1)), dec("0.01"));
        assert_eq!(price_for_weight(dec("0.0124"), Decimal::from(1)), dec("0.01"));
        assert_eq!(price_for_weight(dec("0.005"), Decimal::from(1)), dec("0.01"));
    }

    #[test]
    fn price_for_weight_has_two_decimal_places() {
        assert_eq!(
            price_for_weight(dec("0.1"), Decimal::from(500)).to_string(),
            "50.00"
        );
    }

    #[test]
    fn repeating_price_per_gram_prices_a_full_pack_exactly() -> testresult::TestResult {
        let info =
            resolve_weight_info("Ghee (300g)", Decimal::from(100)).ok_or("expected weight info")?;

        assert_eq!(info.price_for(Decimal::from(300)), dec("100.00"));

        Ok(())
    }

    #[test]
    fn pack_weight_picks_display_unit() {
        let kilo = weight_info_for_pack(Decimal::from(1000), Decimal::from(80));
        let grams = weight_info_for_pack(Decimal::from(250), Decimal::from(80));

        assert_eq!(kilo.map(|info| info.display_unit), Some("kg"));
        assert_eq!(grams.map(|info| info.display_unit), Some("g"));
    }

    #[test]
    fn weight_labels() {
        assert_eq!(format_weight_label(Decimal::from(250)), "250 g");
        assert_eq!(format_weight_label(dec("999.6")), "1000 g");
        assert_eq!(format_weight_label(Decimal::from(1000)), "1.00 kg");
        assert_eq!(format_weight_label(Decimal::from(1250)), "1.25 kg");
        assert_eq!(format_weight_label(Decimal::ZERO), "0 g");
    }
}
