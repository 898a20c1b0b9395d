//! Derived read-only fields and the external representation.
//!
//! Nothing here is stored; every value is computed from the row on read.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use wholesale_core::ProductId;

use crate::price_history::PriceHistory;
use crate::product::{Grade, LabResults, Product, ProductStatus, ProductType};

pub const DEFAULT_PLACEHOLDER_IMAGE_BASE: &str = "https://placehold.co/400x400";

impl Product {
    /// Markup over cost, in whole percent (half rounds up).
    ///
    /// `None` when the cost basis is unset or not positive.
    pub fn margin(&self) -> Option<i64> {
        let cost = self.cost_basis.filter(|c| *c > Decimal::ZERO)?;
        let percent = self
            .price
            .checked_sub(cost)?
            .checked_div(cost)?
            .checked_mul(Decimal::ONE_HUNDRED)?;
        (percent + Decimal::new(5, 1)).floor().to_i64()
    }

    pub fn unit_label(&self) -> &'static str {
        self.grade.unit_label()
    }

    pub fn display_name(&self) -> String {
        format!("{} - {}", self.grade, self.strain)
    }

    /// Sellable right now: AVAILABLE with stock on hand.
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available && self.stock > 0
    }

    pub fn needs_restock(&self) -> bool {
        self.stock <= u64::from(self.minimum_stock)
    }

    /// The photo, or a placeholder keyed by grade.
    pub fn image_url(&self, placeholder_base: &str) -> String {
        match self.photo.as_deref() {
            Some(photo) if !photo.is_empty() => photo.to_string(),
            _ => format!("{placeholder_base}?text={}", self.grade),
        }
    }
}

/// Per-request rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Drop cost basis, editor and the price trail (which carries both).
    pub hide_internal: bool,
}

impl ViewOptions {
    pub fn public() -> Self {
        Self {
            hide_internal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub grade: Grade,
    pub strain: String,
    pub thca: Decimal,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_history: Option<PriceHistory>,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub margin: Option<i64>,
    pub unit_label: &'static str,
    pub display_name: String,
    pub available: bool,
    pub image_url: String,
    pub needs_restock: bool,
}

impl ProductView {
    pub fn render(product: &Product, options: ViewOptions, placeholder_base: &str) -> Self {
        let internal = !options.hide_internal;

        Self {
            id: product.id,
            grade: product.grade,
            strain: product.strain.clone(),
            thca: product.thca,
            price: product.price,
            cost_basis: product.cost_basis.filter(|_| internal),
            status: product.status,
            stock: product.stock,
            product_type: product.product_type,
            photo: product.photo.clone(),
            slug: product.slug.clone(),
            minimum_stock: product.minimum_stock,
            tags: product.tags.clone(),
            featured: product.featured,
            sort_order: product.sort_order,
            lab_results: product.lab_results.clone(),
            editor: product.editor.clone().filter(|_| internal),
            price_history: internal.then(|| product.price_history.clone()),
            last_modified: product.last_modified,
            created_at: product.created_at,
            updated_at: product.updated_at,
            deleted_at: product.deleted_at,
            margin: product.margin(),
            unit_label: product.unit_label(),
            display_name: product.display_name(),
            available: product.is_available(),
            image_url: product.image_url(placeholder_base),
            needs_restock: product.needs_restock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{LifecyclePolicy, NewProduct};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn product(grade: Grade, price: Decimal, cost_basis: Option<Decimal>) -> Product {
        let new = NewProduct {
            cost_basis,
            stock: Some(8),
            editor: Some("ops@example.com".into()),
            ..NewProduct::new(grade, "Blue Dream", price)
        };
        Product::draft(
            new,
            &LifecyclePolicy::default(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn margin_is_markup_over_cost() {
        assert_eq!(product(Grade::AGrade, dec!(100), Some(dec!(80))).margin(), Some(25));
        assert_eq!(product(Grade::AGrade, dec!(60), Some(dec!(80))).margin(), Some(-25));
    }

    #[test]
    fn margin_rounds_half_up() {
        // (100.5 - 100) / 100 * 100 = 0.5
        assert_eq!(product(Grade::AGrade, dec!(100.5), Some(dec!(100))).margin(), Some(1));
        // (100 - 75) / 75 * 100 = 33.33..
        assert_eq!(product(Grade::AGrade, dec!(100), Some(dec!(75))).margin(), Some(33));
    }

    #[test]
    fn margin_absent_without_positive_cost() {
        assert_eq!(product(Grade::AGrade, dec!(100), None).margin(), None);
        assert_eq!(product(Grade::AGrade, dec!(100), Some(dec!(0))).margin(), None);
    }

    #[test]
    fn unit_label_follows_grade() {
        assert_eq!(product(Grade::Rosin, dec!(10), None).unit_label(), "/gram");
        assert_eq!(product(Grade::Vape, dec!(10), None).unit_label(), "/unit");
        assert_eq!(product(Grade::Bulk, dec!(10), None).unit_label(), "/lb");
        assert_eq!(product(Grade::BGrade, dec!(10), None).unit_label(), "/lb");
    }

    #[test]
    fn display_name_and_availability() {
        let mut p = product(Grade::BGrade, dec!(10), None);
        assert_eq!(p.display_name(), "B-GRADE - Blue Dream");
        assert!(p.is_available());

        p.stock = 0;
        assert!(!p.is_available());

        p.stock = 3;
        p.status = ProductStatus::ComingSoon;
        assert!(!p.is_available());
    }

    #[test]
    fn image_url_falls_back_to_grade_placeholder() {
        let mut p = product(Grade::Rosin, dec!(10), None);
        assert_eq!(
            p.image_url(DEFAULT_PLACEHOLDER_IMAGE_BASE),
            "https://placehold.co/400x400?text=ROSIN"
        );

        p.photo = Some(String::new());
        assert_eq!(
            p.image_url(DEFAULT_PLACEHOLDER_IMAGE_BASE),
            "https://placehold.co/400x400?text=ROSIN"
        );

        p.photo = Some("https://cdn.example.com/r.jpg".into());
        assert_eq!(p.image_url(DEFAULT_PLACEHOLDER_IMAGE_BASE), "https://cdn.example.com/r.jpg");
    }

    #[test]
    fn public_view_hides_internal_fields() {
        let p = product(Grade::AGrade, dec!(100), Some(dec!(80)));

        let full = serde_json::to_value(ProductView::render(
            &p,
            ViewOptions::default(),
            DEFAULT_PLACEHOLDER_IMAGE_BASE,
        ))
        .unwrap();
        assert!(full.get("costBasis").is_some());
        assert_eq!(full["editor"], "ops@example.com");
        assert_eq!(full["priceHistory"].as_array().unwrap().len(), 1);
        assert_eq!(full["margin"], 25);
        assert_eq!(full["displayName"], "A-GRADE - Blue Dream");
        assert_eq!(full["unitLabel"], "/lb");
        assert_eq!(full["available"], true);

        let public = serde_json::to_value(ProductView::render(
            &p,
            ViewOptions::public(),
            DEFAULT_PLACEHOLDER_IMAGE_BASE,
        ))
        .unwrap();
        assert!(public.get("costBasis").is_none());
        assert!(public.get("editor").is_none());
        assert!(public.get("priceHistory").is_none());
        assert_eq!(public["strain"], "Blue Dream");
    }
}
