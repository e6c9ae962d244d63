//! Normalization from raw catalog entries to [`billa_core::PriceRecord`].
//!
//! The catalog nests prices (`price.regular.value`, `price.crossed`, ...)
//! and uses camelCase keys. Each canonical field is looked up by a fixed
//! dotted path; anything missing becomes null. Monetary values arrive as
//! integer cents and are rescaled to currency units.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use billa_core::record::parse_decimal_text;
use billa_core::{PriceField, PriceRecord};

/// Source path of every canonical field, in table column order.
pub const FIELD_PATHS: &[(&str, PriceField)] = &[
    ("price.regular.value", PriceField::PriceRegularValue),
    ("bundleInfo", PriceField::BundleInfo),
    ("bundleSize", PriceField::BundleSize),
    ("inPromotion", PriceField::InPromotion),
    ("price.regular.promotionQuantity", PriceField::PromotionQuantity),
    ("price.regular.promotionText", PriceField::PromotionText),
    ("price.regular.promotionType", PriceField::PromotionType),
    ("price.crossed", PriceField::PriceCrossed),
    ("amount", PriceField::Amount),
    ("volumeLabelShort", PriceField::VolumeLabelShort),
    ("packageLabel", PriceField::PackageLabel),
    ("conversionFactor", PriceField::ConversionFactor),
    ("price.discountPercentage", PriceField::DiscountPercentage),
    (
        "price.regular.perStandardizedQuantity",
        PriceField::PriceRegularPerStandardizedQuantity,
    ),
    ("price.regular.tags", PriceField::RegularTags),
    ("price.regular.promotionValue", PriceField::PriceRegularPromotionValue),
];

const SKU_PATH: &str = "sku";

/// Normalizes a whole scrape, stamping every record with `date`.
///
/// Output order follows input order. Entries without a usable sku are
/// skipped with a warning; nothing else is dropped.
#[must_use]
pub fn normalize_records(raw: &[Value], date: NaiveDate) -> Vec<PriceRecord> {
    let mut skipped = 0usize;
    let records: Vec<PriceRecord> = raw
        .iter()
        .filter_map(|entry| {
            let record = normalize_record(entry, date);
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(skipped, "catalog entries without a sku were skipped");
    }
    records
}

/// Normalizes one catalog entry. Returns `None` if it has no sku.
#[must_use]
pub fn normalize_record(raw: &Value, date: NaiveDate) -> Option<PriceRecord> {
    let sku = lookup(raw, SKU_PATH).and_then(sku_text)?;
    let mut record = PriceRecord::new(sku, date);

    for &(path, field) in FIELD_PATHS {
        let value = lookup(raw, path);
        if field.is_monetary() {
            record.set_money(field, value.and_then(minor_units_to_currency));
        } else {
            record.set_raw(field, value.cloned());
        }
    }
    Some(record)
}

/// Converts a minor-unit amount (cents) to currency units rounded to two
/// decimals. Integers, floats and numeric strings are accepted; anything
/// else is `None`.
#[must_use]
pub fn minor_units_to_currency(value: &Value) -> Option<Decimal> {
    let cents = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())?
            }
        }
        Value::String(s) => parse_decimal_text(s)?,
        _ => return None,
    };
    cents
        .checked_div(Decimal::ONE_HUNDRED)
        .map(|units| units.round_dp(2))
}

/// Resolves a dotted path through nested objects.
///
/// Falls back to the underscore-joined key (`price_regular_value`) for
/// entries that arrive already flattened.
fn lookup<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    let nested = path
        .split('.')
        .try_fold(raw, |node, key| node.as_object()?.get(key));
    nested
        .or_else(|| raw.as_object()?.get(&path.replace('.', "_")))
        .filter(|v| !v.is_null())
}

fn sku_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
