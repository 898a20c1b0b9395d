use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use wholesale_core::{CatalogError, ProductId};

use crate::price_history::{DEFAULT_PRICE_HISTORY_LIMIT, PriceHistory, PriceHistoryEntry};
use crate::slug::{FALLBACK_SLUG, slugify};

macro_rules! impl_catalog_enum {
    ($t:ty, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $t {
            pub const ALL: &'static [$t] = &[$(Self::$variant),+];

            /// Wire/storage label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $t {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => {
                        let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        Err(CatalogError::validation(
                            $field,
                            format!("{other:?} is not one of {}", allowed.join(", ")),
                        ))
                    }
                }
            }
        }
    };
}

/// Product category tier; decides the pricing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A-GRADE")]
    AGrade,
    #[serde(rename = "B-GRADE")]
    BGrade,
    #[serde(rename = "ROSIN")]
    Rosin,
    #[serde(rename = "VAPE")]
    Vape,
    #[serde(rename = "BULK")]
    Bulk,
}

impl_catalog_enum!(Grade, "grade", {
    AGrade => "A-GRADE",
    BGrade => "B-GRADE",
    Rosin => "ROSIN",
    Vape => "VAPE",
    Bulk => "BULK",
});

impl Grade {
    pub fn unit_label(self) -> &'static str {
        match self {
            Grade::Rosin => "/gram",
            Grade::Vape => "/unit",
            Grade::AGrade | Grade::BGrade | Grade::Bulk => "/lb",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    #[default]
    #[serde(rename = "AVAILABLE")]
    Available,
    #[serde(rename = "COMING SOON")]
    ComingSoon,
    #[serde(rename = "SOLD OUT")]
    SoldOut,
}

impl_catalog_enum!(ProductStatus, "status", {
    Available => "AVAILABLE",
    ComingSoon => "COMING SOON",
    SoldOut => "SOLD OUT",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Indica,
    Sativa,
    #[default]
    Hybrid,
    Concentrate,
}

impl_catalog_enum!(ProductType, "type", {
    Indica => "Indica",
    Sativa => "Sativa",
    Hybrid => "Hybrid",
    Concentrate => "Concentrate",
});

/// Certificate-of-analysis numbers, all percentages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResults {
    #[serde(default)]
    pub thc: Option<Decimal>,
    #[serde(default)]
    pub cbd: Option<Decimal>,
    #[serde(default)]
    pub terpenes: Option<Decimal>,
    #[serde(default)]
    pub lab: Option<String>,
    #[serde(default)]
    pub tested_at: Option<DateTime<Utc>>,
}

/// Knobs the write pipeline needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub price_history_limit: usize,
    pub default_minimum_stock: u32,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            price_history_limit: DEFAULT_PRICE_HISTORY_LIMIT,
            default_minimum_stock: 5,
        }
    }
}

/// A stored product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub grade: Grade,
    pub strain: String,
    pub thca: Decimal,
    pub price: Decimal,
    pub cost_basis: Option<Decimal>,
    pub status: ProductStatus,
    pub stock: u64,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub photo: Option<String>,
    pub slug: String,
    pub minimum_stock: u32,
    pub tags: BTreeSet<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub lab_results: Option<LabResults>,
    /// Email of whoever last edited the row.
    pub editor: Option<String>,
    pub price_history: PriceHistory,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub grade: Grade,
    pub strain: String,
    #[serde(default)]
    pub thca: Option<Decimal>,
    pub price: Decimal,
    #[serde(default)]
    pub cost_basis: Option<Decimal>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, rename = "type")]
    pub product_type: Option<ProductType>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub minimum_stock: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub lab_results: Option<LabResults>,
    #[serde(default)]
    pub editor: Option<String>,
}

impl NewProduct {
    pub fn new(grade: Grade, strain: impl Into<String>, price: Decimal) -> Self {
        Self {
            grade,
            strain: strain.into(),
            thca: None,
            price,
            cost_basis: None,
            status: None,
            stock: None,
            product_type: None,
            photo: None,
            slug: None,
            minimum_stock: None,
            tags: Vec::new(),
            featured: false,
            sort_order: 0,
            lab_results: None,
            editor: None,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
///
/// Optional columns take `Some(None)` to clear them (`null` on the wire).
/// `stock` is not assigned directly: it goes through the same clamp and status
/// derivation as a dedicated stock update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub grade: Option<Grade>,
    pub strain: Option<String>,
    pub thca: Option<Decimal>,
    pub price: Option<Decimal>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<Option<Decimal>>,
    pub status: Option<ProductStatus>,
    pub stock: Option<i64>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub photo: Option<Option<String>>,
    pub slug: Option<String>,
    pub minimum_stock: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub sort_order: Option<i32>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub lab_results: Option<Option<LabResults>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub editor: Option<Option<String>>,
}

/// A present key, `null` included, becomes `Some`; an absent key stays `None`
/// through `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Before/after of a stock write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub previous_stock: u64,
    pub stock: u64,
    pub previous_status: ProductStatus,
    pub status: ProductStatus,
}

impl StockChange {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.status
    }
}

/// What an applied update touched beyond plain field assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateEffects {
    pub price_recorded: bool,
    pub stock: Option<StockChange>,
}

/// `max(0, requested)`; every non-negative `i64` fits the stored column.
pub fn clamp_stock(requested: i64) -> u64 {
    u64::try_from(requested).unwrap_or(0)
}

/// Status after stock moves to `stock`.
///
/// Only AVAILABLE <-> SOLD OUT is automatic; COMING SOON is never touched.
pub fn next_status(current: ProductStatus, stock: u64) -> ProductStatus {
    match current {
        ProductStatus::Available if stock == 0 => ProductStatus::SoldOut,
        ProductStatus::SoldOut if stock > 0 => ProductStatus::Available,
        other => other,
    }
}

/// Base slug for a write: an explicit slug normalized, else one derived from the strain.
pub fn base_slug(explicit: Option<&str>, strain: &str) -> String {
    let slug = match explicit {
        Some(explicit) => slugify(explicit),
        None => slugify(strain),
    };
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl Product {
    /// Build an unsaved row from validated input.
    ///
    /// The slug is the base slug only; uniqueness is settled by whoever persists
    /// the row. History is seeded when a cost basis accompanies the price.
    pub fn draft(new: NewProduct, policy: &LifecyclePolicy, now: DateTime<Utc>) -> Self {
        let strain = new.strain.trim().to_string();
        let slug = base_slug(new.slug.as_deref(), &strain);

        let mut price_history = PriceHistory::new();
        if new.cost_basis.is_some() {
            price_history.record(
                PriceHistoryEntry {
                    price: new.price,
                    cost_basis: new.cost_basis,
                    timestamp: now,
                    editor: new.editor.clone(),
                },
                policy.price_history_limit,
            );
        }

        Self {
            id: ProductId::UNASSIGNED,
            grade: new.grade,
            strain,
            thca: new.thca.unwrap_or(Decimal::ZERO),
            price: new.price,
            cost_basis: new.cost_basis,
            status: new.status.unwrap_or_default(),
            stock: new.stock.map(clamp_stock).unwrap_or(0),
            product_type: new.product_type.unwrap_or_default(),
            photo: new.photo,
            slug,
            minimum_stock: new
                .minimum_stock
                .map(saturating_u32)
                .unwrap_or(policy.default_minimum_stock),
            tags: normalize_tags(new.tags),
            featured: new.featured,
            sort_order: new.sort_order,
            lab_results: new.lab_results,
            editor: new.editor,
            price_history,
            last_modified: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Move stock to `max(0, requested)` and derive the status that follows.
    pub fn apply_stock(&mut self, requested: i64, now: DateTime<Utc>) -> StockChange {
        let previous_stock = self.stock;
        let previous_status = self.status;

        self.stock = clamp_stock(requested);
        self.status = next_status(self.status, self.stock);
        self.last_modified = now;
        self.updated_at = now;

        StockChange {
            previous_stock,
            stock: self.stock,
            previous_status,
            status: self.status,
        }
    }

    /// Apply a validated partial update in place.
    ///
    /// A changed price or cost basis appends one history entry and refreshes
    /// `last_modified`. An explicit `status` is assigned before stock is routed,
    /// so the stock transition sees the caller's intended status.
    pub fn apply_update(
        &mut self,
        update: &ProductUpdate,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> UpdateEffects {
        let mut effects = UpdateEffects::default();

        if let Some(editor) = &update.editor {
            self.editor = editor.clone();
        }
        if let Some(grade) = update.grade {
            self.grade = grade;
        }
        if let Some(strain) = &update.strain {
            self.strain = strain.trim().to_string();
        }
        if let Some(thca) = update.thca {
            self.thca = thca;
        }
        if let Some(product_type) = update.product_type {
            self.product_type = product_type;
        }
        if let Some(photo) = &update.photo {
            self.photo = photo.clone();
        }
        if let Some(slug) = &update.slug {
            self.slug = base_slug(Some(slug), &self.strain);
        }
        if let Some(minimum_stock) = update.minimum_stock {
            self.minimum_stock = saturating_u32(minimum_stock);
        }
        if let Some(tags) = &update.tags {
            self.tags = normalize_tags(tags.clone());
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(lab_results) = &update.lab_results {
            self.lab_results = lab_results.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }

        let price_changed = update.price.is_some_and(|p| p != self.price);
        let cost_changed = update.cost_basis.is_some_and(|c| c != self.cost_basis);
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(cost_basis) = update.cost_basis {
            self.cost_basis = cost_basis;
        }
        if price_changed || cost_changed {
            self.price_history.record(
                PriceHistoryEntry {
                    price: self.price,
                    cost_basis: self.cost_basis,
                    timestamp: now,
                    editor: self.editor.clone(),
                },
                policy.price_history_limit,
            );
            self.last_modified = now;
            effects.price_recorded = true;
        }

        if let Some(stock) = update.stock {
            effects.stock = Some(self.apply_stock(stock, now));
        }

        self.updated_at = now;
        effects
    }
}
