//! The canonical flat price record and its column set.
//!
//! A [`PriceRecord`] is what one catalog entry looks like after
//! normalization, and also what one row of the history table parses into.
//! Both directions go through the same text form ([`PriceRecord::cell`] and
//! [`PriceRecord::set_cell`]) so a value written to disk compares equal to
//! the value it was rendered from.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

/// Column name of the join key.
pub const SKU_COLUMN: &str = "sku";
/// Column name of the observation date.
pub const DATE_COLUMN: &str = "date";
/// Textual date format used in the history table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Every canonical field except `sku` and `date`, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceField {
    PriceRegularValue,
    BundleInfo,
    BundleSize,
    InPromotion,
    PromotionQuantity,
    PromotionText,
    PromotionType,
    PriceCrossed,
    Amount,
    VolumeLabelShort,
    PackageLabel,
    ConversionFactor,
    DiscountPercentage,
    PriceRegularPerStandardizedQuantity,
    RegularTags,
    PriceRegularPromotionValue,
}

impl PriceField {
    pub const ALL: [PriceField; 16] = [
        PriceField::PriceRegularValue,
        PriceField::BundleInfo,
        PriceField::BundleSize,
        PriceField::InPromotion,
        PriceField::PromotionQuantity,
        PriceField::PromotionText,
        PriceField::PromotionType,
        PriceField::PriceCrossed,
        PriceField::Amount,
        PriceField::VolumeLabelShort,
        PriceField::PackageLabel,
        PriceField::ConversionFactor,
        PriceField::DiscountPercentage,
        PriceField::PriceRegularPerStandardizedQuantity,
        PriceField::RegularTags,
        PriceField::PriceRegularPromotionValue,
    ];

    /// Column name in the history table and key in change sets.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PriceField::PriceRegularValue => "price_regular_value",
            PriceField::BundleInfo => "bundle_info",
            PriceField::BundleSize => "bundle_size",
            PriceField::InPromotion => "in_promotion",
            PriceField::PromotionQuantity => "promotion_quantity",
            PriceField::PromotionText => "promotion_text",
            PriceField::PromotionType => "promotion_type",
            PriceField::PriceCrossed => "price_crossed",
            PriceField::Amount => "amount",
            PriceField::VolumeLabelShort => "volume_label_short",
            PriceField::PackageLabel => "package_label",
            PriceField::ConversionFactor => "conversion_factor",
            PriceField::DiscountPercentage => "discount_percentage",
            PriceField::PriceRegularPerStandardizedQuantity => {
                "price_regular_per_standardized_quantity"
            }
            PriceField::RegularTags => "regular_tags",
            PriceField::PriceRegularPromotionValue => "price_regular_promotion_value",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<PriceField> {
        PriceField::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Column name used by history files written before the columns were
    /// renamed to snake case (flattened camelCase source paths).
    #[must_use]
    pub fn legacy_name(self) -> &'static str {
        match self {
            PriceField::BundleInfo => "bundleInfo",
            PriceField::BundleSize => "bundleSize",
            PriceField::InPromotion => "inPromotion",
            PriceField::PromotionQuantity => "price_regular_promotionQuantity",
            PriceField::PromotionText => "price_regular_promotionText",
            PriceField::PromotionType => "price_regular_promotionType",
            PriceField::VolumeLabelShort => "volumeLabelShort",
            PriceField::PackageLabel => "packageLabel",
            PriceField::ConversionFactor => "conversionFactor",
            PriceField::DiscountPercentage => "price_discountPercentage",
            PriceField::PriceRegularPerStandardizedQuantity => {
                "price_regular_perStandardizedQuantity"
            }
            PriceField::RegularTags => "price_regular_tags",
            PriceField::PriceRegularPromotionValue => "price_regular_promotionValue",
            PriceField::PriceRegularValue | PriceField::PriceCrossed | PriceField::Amount => {
                self.name()
            }
        }
    }

    /// Resolves a history-table header under either its current or its
    /// legacy name.
    #[must_use]
    pub fn from_column(column: &str) -> Option<PriceField> {
        PriceField::ALL
            .into_iter()
            .find(|f| f.name() == column || f.legacy_name() == column)
    }

    /// Monetary fields hold currency units as [`Decimal`]; the rest are
    /// passed through from the source unchanged.
    #[must_use]
    pub fn is_monetary(self) -> bool {
        matches!(
            self,
            PriceField::PriceRegularValue
                | PriceField::PriceCrossed
                | PriceField::PriceRegularPerStandardizedQuantity
                | PriceField::PriceRegularPromotionValue
        )
    }

    /// Full column list of the history table: `sku`, `date`, then [`Self::ALL`].
    #[must_use]
    pub fn columns() -> Vec<&'static str> {
        let mut columns = vec![SKU_COLUMN, DATE_COLUMN];
        columns.extend(PriceField::ALL.iter().map(|f| f.name()));
        columns
    }
}

impl std::fmt::Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of one field's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Money(Option<Decimal>),
    Raw(Option<&'a Value>),
}

impl FieldValue<'_> {
    /// Canonical text form: strings as-is, scalars via their JSON text,
    /// lists and objects as compact JSON. `None` for null.
    #[must_use]
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            FieldValue::Money(m) => m.map(|d| d.to_string()),
            FieldValue::Raw(None | Some(Value::Null)) => None,
            FieldValue::Raw(Some(Value::String(s))) => Some(s.clone()),
            FieldValue::Raw(Some(other)) => Some(other.to_string()),
        }
    }

    /// JSON rendering used in change sets and the run log.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Money(None) | FieldValue::Raw(None) => Value::Null,
            FieldValue::Money(Some(d)) => decimal_to_json(*d),
            FieldValue::Raw(Some(v)) => (*v).clone(),
        }
    }
}

fn decimal_to_json(d: Decimal) -> Value {
    d.to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(d.to_string()), Value::Number)
}

/// One observation of one product on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub sku: String,
    pub date: NaiveDate,
    pub price_regular_value: Option<Decimal>,
    pub bundle_info: Option<Value>,
    pub bundle_size: Option<Value>,
    pub in_promotion: Option<Value>,
    pub promotion_quantity: Option<Value>,
    pub promotion_text: Option<Value>,
    pub promotion_type: Option<Value>,
    pub price_crossed: Option<Decimal>,
    pub amount: Option<Value>,
    pub volume_label_short: Option<Value>,
    pub package_label: Option<Value>,
    pub conversion_factor: Option<Value>,
    pub discount_percentage: Option<Value>,
    pub price_regular_per_standardized_quantity: Option<Decimal>,
    pub regular_tags: Option<Value>,
    pub price_regular_promotion_value: Option<Decimal>,
}

impl PriceRecord {
    /// A record with every field null.
    #[must_use]
    pub fn new(sku: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            sku: sku.into(),
            date,
            price_regular_value: None,
            bundle_info: None,
            bundle_size: None,
            in_promotion: None,
            promotion_quantity: None,
            promotion_text: None,
            promotion_type: None,
            price_crossed: None,
            amount: None,
            volume_label_short: None,
            package_label: None,
            conversion_factor: None,
            discount_percentage: None,
            price_regular_per_standardized_quantity: None,
            regular_tags: None,
            price_regular_promotion_value: None,
        }
    }

    #[must_use]
    pub fn value(&self, field: PriceField) -> FieldValue<'_> {
        match field {
            PriceField::PriceRegularValue => FieldValue::Money(self.price_regular_value),
            PriceField::PriceCrossed => FieldValue::Money(self.price_crossed),
            PriceField::PriceRegularPerStandardizedQuantity => {
                FieldValue::Money(self.price_regular_per_standardized_quantity)
            }
            PriceField::PriceRegularPromotionValue => {
                FieldValue::Money(self.price_regular_promotion_value)
            }
            other => FieldValue::Raw(self.raw_value(other)),
        }
    }

    /// Stores a monetary value. Ignored for pass-through fields.
    pub fn set_money(&mut self, field: PriceField, value: Option<Decimal>) {
        if let Some(slot) = self.money_slot_mut(field) {
            *slot = value;
        }
    }

    /// Stores a pass-through value; JSON null is kept as absent.
    /// Ignored for monetary fields.
    pub fn set_raw(&mut self, field: PriceField, value: Option<Value>) {
        if let Some(slot) = self.raw_slot_mut(field) {
            *slot = value.filter(|v| !v.is_null());
        }
    }

    /// Text cell for `field` as written to the history table. Empty for null.
    #[must_use]
    pub fn cell(&self, field: PriceField) -> String {
        self.value(field).canonical_text().unwrap_or_default()
    }

    /// Parses a history-table cell into `field`.
    ///
    /// Empty cells are null. Monetary cells that do not parse as a decimal
    /// become null; pass-through cells are kept verbatim as strings.
    pub fn set_cell(&mut self, field: PriceField, cell: &str) {
        if cell.is_empty() {
            self.set_money(field, None);
            self.set_raw(field, None);
            return;
        }
        if field.is_monetary() {
            self.set_money(field, parse_decimal_text(cell));
        } else {
            self.set_raw(field, Some(Value::String(cell.to_owned())));
        }
    }

    /// Rendered row in the canonical column order of [`PriceField::columns`].
    #[must_use]
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![self.sku.clone(), self.date.format(DATE_FORMAT).to_string()];
        cells.extend(PriceField::ALL.iter().map(|f| self.cell(*f)));
        cells
    }

    fn raw_value(&self, field: PriceField) -> Option<&Value> {
        match field {
            PriceField::BundleInfo => self.bundle_info.as_ref(),
            PriceField::BundleSize => self.bundle_size.as_ref(),
            PriceField::InPromotion => self.in_promotion.as_ref(),
            PriceField::PromotionQuantity => self.promotion_quantity.as_ref(),
            PriceField::PromotionText => self.promotion_text.as_ref(),
            PriceField::PromotionType => self.promotion_type.as_ref(),
            PriceField::Amount => self.amount.as_ref(),
            PriceField::VolumeLabelShort => self.volume_label_short.as_ref(),
            PriceField::PackageLabel => self.package_label.as_ref(),
            PriceField::ConversionFactor => self.conversion_factor.as_ref(),
            PriceField::DiscountPercentage => self.discount_percentage.as_ref(),
            PriceField::RegularTags => self.regular_tags.as_ref(),
            PriceField::PriceRegularValue
            | PriceField::PriceCrossed
            | PriceField::PriceRegularPerStandardizedQuantity
            | PriceField::PriceRegularPromotionValue => None,
        }
    }

    fn raw_slot_mut(&mut self, field: PriceField) -> Option<&mut Option<Value>> {
        match field {
            PriceField::BundleInfo => Some(&mut self.bundle_info),
            PriceField::BundleSize => Some(&mut self.bundle_size),
            PriceField::InPromotion => Some(&mut self.in_promotion),
            PriceField::PromotionQuantity => Some(&mut self.promotion_quantity),
            PriceField::PromotionText => Some(&mut self.promotion_text),
            PriceField::PromotionType => Some(&mut self.promotion_type),
            PriceField::Amount => Some(&mut self.amount),
            PriceField::VolumeLabelShort => Some(&mut self.volume_label_short),
            PriceField::PackageLabel => Some(&mut self.package_label),
            PriceField::ConversionFactor => Some(&mut self.conversion_factor),
            PriceField::DiscountPercentage => Some(&mut self.discount_percentage),
            PriceField::RegularTags => Some(&mut self.regular_tags),
            PriceField::PriceRegularValue
            | PriceField::PriceCrossed
            | PriceField::PriceRegularPerStandardizedQuantity
            | PriceField::PriceRegularPromotionValue => None,
        }
    }

    fn money_slot_mut(&mut self, field: PriceField) -> Option<&mut Option<Decimal>> {
        match field {
            PriceField::PriceRegularValue => Some(&mut self.price_regular_value),
            PriceField::PriceCrossed => Some(&mut self.price_crossed),
            PriceField::PriceRegularPerStandardizedQuantity => {
                Some(&mut self.price_regular_per_standardized_quantity)
            }
            PriceField::PriceRegularPromotionValue => {
                Some(&mut self.price_regular_promotion_value)
            }
            _ => None,
        }
    }
}

/// Parses decimal text, accepting exponent notation (`"1.299e3"`).
#[must_use]
pub fn parse_decimal_text(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if let Ok(d) = trimmed.parse::<Decimal>() {
        return Some(d);
    }
    Decimal::from_scientific(trimmed).ok()
}
