use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Maps a minor-unit quote currency (pence, cents) to its major currency and
/// the factor that converts a minor-unit amount into major units.
///
/// The denomination class is carried by the quote currency code itself, as
/// reported by the instrument's market data; ticker suffixes are never
/// consulted.
#[derive(Debug, Clone)]
pub struct CurrencyDenominationRule {
    pub major_code: &'static str,
    pub factor: Decimal,
    pub label: &'static str,
}

static CURRENCY_RULES: OnceLock<HashMap<&'static str, CurrencyDenominationRule>> = OnceLock::new();

fn get_rules() -> &'static HashMap<&'static str, CurrencyDenominationRule> {
    CURRENCY_RULES.get_or_init(|| {
        let mut map = HashMap::new();

        map.insert(
            "GBp",
            CurrencyDenominationRule {
                major_code: "GBP",
                factor: dec!(0.01),
                label: "Pence",
            },
        );

        map.insert(
            "GBX",
            CurrencyDenominationRule {
                major_code: "GBP",
                factor: dec!(0.01),
                label: "Pence",
            },
        );

        map.insert(
            "ZAc",
            CurrencyDenominationRule {
                major_code: "ZAR",
                factor: dec!(0.01),
                label: "SA Cents",
            },
        );

        map.insert(
            "ZAC",
            CurrencyDenominationRule {
                major_code: "ZAR",
                factor: dec!(0.01),
                label: "SA Cents",
            },
        );

        map.insert(
            "ILA",
            CurrencyDenominationRule {
                major_code: "ILS",
                factor: dec!(0.01),
                label: "Agorot",
            },
        );

        map
    })
}

/// Returns the denomination rule for a given currency code, if one exists.
pub fn get_denomination_rule(code: &str) -> Option<&'static CurrencyDenominationRule> {
    get_rules().get(code)
}

/// Returns the major currency code for FX lookups without mutating amounts.
pub fn normalize_currency_code(currency: &str) -> &str {
    if let Some(rule) = get_denomination_rule(currency) {
        rule.major_code
    } else {
        currency
    }
}

/// Factor converting an amount quoted in `currency` into its major unit.
/// `1` for major-unit currencies, `0.01` for pence-class codes.
pub fn minor_unit_factor(currency: &str) -> Decimal {
    if let Some(rule) = get_denomination_rule(currency) {
        rule.factor
    } else {
        Decimal::ONE
    }
}
