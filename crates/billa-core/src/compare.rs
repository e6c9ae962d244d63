//! Value equivalence used by the diff engine.
//!
//! Comparison happens in two stages. [`normalize_for_compare`] maps a field
//! value onto a [`NormalizedValue`], collapsing every spelling of "no value"
//! the feed uses into [`NormalizedValue::Absent`], and rewriting text the
//! older history files spell differently (`True`, `1.0`, `['bio', 'vegan']`)
//! into the form the live feed renders to. A [`CompareStrategy`], looked up
//! per field in [`FIELD_STRATEGIES`], then decides whether two normalized
//! values are equivalent.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::record::{FieldValue, PriceField};

/// Text values that mean "no value" in the feed or in older history files.
const ABSENT_MARKERS: &[&str] = &["", "None", "NaN", "nan"];

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Absent,
    Text(String),
    Decimal(Decimal),
}

impl NormalizedValue {
    /// Numeric reading of the value, if it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NormalizedValue::Absent => None,
            NormalizedValue::Text(text) => text.trim().parse::<f64>().ok(),
            NormalizedValue::Decimal(d) => d.to_string().parse::<f64>().ok(),
        }
    }
}

/// Collapses absence variants and brings pass-through text to one spelling.
///
/// Booleans compare case-insensitively, decimal numbers by value
/// (`1.0` and `1` are the same), and lists or objects through their compact
/// JSON form, whether the text holds JSON or a Python literal.
#[must_use]
pub fn normalize_for_compare(value: FieldValue<'_>) -> NormalizedValue {
    match value {
        FieldValue::Money(Some(d)) => NormalizedValue::Decimal(d),
        FieldValue::Money(None) => NormalizedValue::Absent,
        FieldValue::Raw(_) => match value.canonical_text() {
            Some(text) if !ABSENT_MARKERS.contains(&text.as_str()) => {
                NormalizedValue::Text(canonical_scalar(text))
            }
            _ => NormalizedValue::Absent,
        },
    }
}

fn canonical_scalar(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return "true".to_owned();
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return "false".to_owned();
    }
    if let Ok(d) = trimmed.parse::<Decimal>() {
        return d.normalize().to_string();
    }
    canonical_collection(trimmed).unwrap_or(text)
}

/// Compact JSON of a bracketed list or object, read as JSON first and as a
/// Python literal second. `None` if it is neither.
fn canonical_collection(text: &str) -> Option<String> {
    let bracketed = (text.starts_with('[') && text.ends_with(']'))
        || (text.starts_with('{') && text.ends_with('}'));
    if !bracketed {
        return None;
    }
    serde_json::from_str::<Value>(text)
        .or_else(|_| serde_json::from_str::<Value>(&python_literal_to_json(text)))
        .ok()
        .map(|parsed| parsed.to_string())
}

/// Rewrites quotes and the `True`/`False`/`None` keywords of a Python
/// literal into JSON. String contents are carried over unchanged.
fn python_literal_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => {}
                        },
                        q if q == c => break,
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStrategy {
    /// Equality of normalized values.
    Generic,
    /// Equal when both sides read as the same number, otherwise [`Self::Generic`].
    NumericOrFallback,
}

impl CompareStrategy {
    #[must_use]
    pub fn equivalent(self, historical: &NormalizedValue, scraped: &NormalizedValue) -> bool {
        match self {
            CompareStrategy::Generic => historical == scraped,
            CompareStrategy::NumericOrFallback => {
                #[allow(clippy::float_cmp)]
                let numeric_match = matches!(
                    (historical.as_number(), scraped.as_number()),
                    (Some(h), Some(s)) if h == s
                );
                numeric_match || historical == scraped
            }
        }
    }
}

/// Fields that do not use [`CompareStrategy::Generic`].
pub const FIELD_STRATEGIES: &[(PriceField, CompareStrategy)] =
    &[(PriceField::Amount, CompareStrategy::NumericOrFallback)];

#[must_use]
pub fn strategy_for(field: PriceField) -> CompareStrategy {
    FIELD_STRATEGIES
        .iter()
        .find(|(f, _)| *f == field)
        .map_or(CompareStrategy::Generic, |(_, strategy)| *strategy)
}

/// Whether `historical` and `scraped` count as the same value of `field`.
#[must_use]
pub fn values_equivalent(
    field: PriceField,
    historical: FieldValue<'_>,
    scraped: FieldValue<'_>,
) -> bool {
    strategy_for(field).equivalent(
        &normalize_for_compare(historical),
        &normalize_for_compare(scraped),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn raw(value: &Value) -> FieldValue<'_> {
        FieldValue::Raw(Some(value))
    }

    #[test]
    fn absence_variants_are_all_equivalent() {
        let null = Value::Null;
        let empty = json!("");
        let none_text = json!("None");
        let variants = [
            FieldValue::Raw(None),
            raw(&null),
            raw(&empty),
            raw(&none_text),
        ];
        for historical in variants {
            for scraped in variants {
                assert!(
                    values_equivalent(PriceField::PromotionText, historical, scraped),
                    "{historical:?} vs {scraped:?} should be equivalent"
                );
            }
        }
    }

    #[test]
    fn nan_text_counts_as_absent() {
        let nan = json!("NaN");
        assert_eq!(normalize_for_compare(raw(&nan)), NormalizedValue::Absent);
    }

    #[test]
    fn lists_compare_by_canonical_string() {
        let scraped = json!(["bio", "vegan"]);
        let historical = json!(r#"["bio","vegan"]"#);
        assert!(values_equivalent(
            PriceField::RegularTags,
            raw(&historical),
            raw(&scraped)
        ));

        let reordered = json!(["vegan", "bio"]);
        assert!(!values_equivalent(
            PriceField::RegularTags,
            raw(&historical),
            raw(&reordered)
        ));
    }

    #[test]
    fn scalars_compare_by_their_text() {
        let historical = json!("true");
        let scraped = json!(true);
        assert!(values_equivalent(
            PriceField::InPromotion,
            raw(&historical),
            raw(&scraped)
        ));
    }

    #[test]
    fn money_compares_numerically() {
        assert!(values_equivalent(
            PriceField::PriceCrossed,
            FieldValue::Money(Some(Decimal::new(129, 1))),
            FieldValue::Money(Some(Decimal::new(1290, 2))),
        ));
        assert!(!values_equivalent(
            PriceField::PriceCrossed,
            FieldValue::Money(Some(Decimal::new(999, 2))),
            FieldValue::Money(None),
        ));
    }

    #[test]
    fn amount_uses_numeric_override() {
        let historical = json!("500");
        let scraped = json!(500.0);
        assert!(values_equivalent(
            PriceField::Amount,
            raw(&historical),
            raw(&scraped)
        ));
    }

    #[test]
    fn amount_falls_back_to_text_when_unparseable() {
        let historical = json!("abc");
        let scraped = json!(500);
        assert!(!values_equivalent(
            PriceField::Amount,
            raw(&historical),
            raw(&scraped)
        ));
    }

    #[test]
    fn amount_missing_on_one_side_is_a_difference() {
        let scraped = json!(500);
        assert!(!values_equivalent(
            PriceField::Amount,
            FieldValue::Raw(None),
            raw(&scraped)
        ));
        assert!(values_equivalent(
            PriceField::Amount,
            FieldValue::Raw(None),
            FieldValue::Raw(None)
        ));
    }

    #[test]
    fn integral_number_text_matches_json_integer() {
        let historical = json!("1.0");
        let scraped = json!(1);
        assert!(values_equivalent(
            PriceField::BundleSize,
            raw(&historical),
            raw(&scraped)
        ));
        let other = json!(2);
        assert!(!values_equivalent(
            PriceField::BundleSize,
            raw(&historical),
            raw(&other)
        ));
    }

    #[test]
    fn capitalized_boolean_text_matches_json_bool() {
        let historical = json!("True");
        assert!(values_equivalent(
            PriceField::InPromotion,
            raw(&historical),
            raw(&json!(true))
        ));
        assert!(!values_equivalent(
            PriceField::InPromotion,
            raw(&historical),
            raw(&json!(false))
        ));
    }

    #[test]
    fn python_list_text_matches_json_list() {
        let historical = json!("['bio', 'vegan']");
        let scraped = json!(["bio", "vegan"]);
        assert!(values_equivalent(
            PriceField::RegularTags,
            raw(&historical),
            raw(&scraped)
        ));
        let changed = json!(["bio"]);
        assert!(!values_equivalent(
            PriceField::RegularTags,
            raw(&historical),
            raw(&changed)
        ));
    }

    #[test]
    fn python_literal_keeps_quotes_inside_strings() {
        assert_eq!(
            python_literal_to_json(r#"['it\'s', "say \"hi\"", None, True]"#),
            r#"["it's", "say \"hi\"", null, true]"#
        );
        assert_eq!(
            python_literal_to_json(r#"{'a': 'x"y'}"#),
            r#"{"a": "x\"y"}"#
        );
    }

    #[test]
    fn non_numeric_text_is_kept_verbatim() {
        let historical = json!("1 Stk");
        let scraped = json!(1);
        assert!(!values_equivalent(
            PriceField::PackageLabel,
            raw(&historical),
            raw(&scraped)
        ));
        assert_eq!(
            normalize_for_compare(raw(&historical)),
            NormalizedValue::Text("1 Stk".to_owned())
        );
    }

    #[test]
    fn strategy_table_defaults_to_generic() {
        assert_eq!(
            strategy_for(PriceField::Amount),
            CompareStrategy::NumericOrFallback
        );
        assert_eq!(
            strategy_for(PriceField::PriceRegularValue),
            CompareStrategy::Generic
        );
    }
}
