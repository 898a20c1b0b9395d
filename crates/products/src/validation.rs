//! Input validation, run to completion before any persistence call.
//!
//! Enum fields are typed, so grade/status/type membership is settled when the
//! input is parsed (`FromStr` or serde). Everything else is checked here and
//! reported together as one `CatalogError::Validation`.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use url::Url;

use wholesale_core::{CatalogResult, ValidationErrors};

use crate::product::{LabResults, NewProduct, ProductUpdate};
use crate::slug::slugify;

pub const STRAIN_MAX_CHARS: usize = 255;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

pub fn validate_new(new: &NewProduct) -> CatalogResult<()> {
    let mut errors = ValidationErrors::new();

    check_strain(&mut errors, &new.strain);
    if let Some(thca) = new.thca {
        check_percentage(&mut errors, "thca", thca);
    }
    check_non_negative(&mut errors, "price", new.price);
    if let Some(cost_basis) = new.cost_basis {
        check_non_negative(&mut errors, "costBasis", cost_basis);
    }
    if new.stock.is_some_and(|stock| stock < 0) {
        errors.push("stock", "must not be negative");
    }
    if let Some(photo) = &new.photo {
        check_photo(&mut errors, photo);
    }
    if let Some(slug) = &new.slug {
        check_slug(&mut errors, slug);
    }
    if let Some(minimum_stock) = new.minimum_stock {
        check_count(&mut errors, "minimumStock", minimum_stock);
    }
    if let Some(lab) = &new.lab_results {
        check_lab_results(&mut errors, lab);
    }
    if let Some(editor) = &new.editor {
        check_editor(&mut errors, editor);
    }

    errors.into_result()
}

/// `stock` is not range-checked here; updates clamp it. A `null` for an
/// optional column clears it and needs no check.
pub fn validate_update(update: &ProductUpdate) -> CatalogResult<()> {
    let mut errors = ValidationErrors::new();

    if let Some(strain) = &update.strain {
        check_strain(&mut errors, strain);
    }
    if let Some(thca) = update.thca {
        check_percentage(&mut errors, "thca", thca);
    }
    if let Some(price) = update.price {
        check_non_negative(&mut errors, "price", price);
    }
    if let Some(Some(cost_basis)) = update.cost_basis {
        check_non_negative(&mut errors, "costBasis", cost_basis);
    }
    if let Some(Some(photo)) = &update.photo {
        check_photo(&mut errors, photo);
    }
    if let Some(slug) = &update.slug {
        check_slug(&mut errors, slug);
    }
    if let Some(minimum_stock) = update.minimum_stock {
        check_count(&mut errors, "minimumStock", minimum_stock);
    }
    if let Some(Some(lab)) = &update.lab_results {
        check_lab_results(&mut errors, lab);
    }
    if let Some(Some(editor)) = &update.editor {
        check_editor(&mut errors, editor);
    }

    errors.into_result()
}

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL.is_match(candidate)
}

pub fn is_valid_photo_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

fn check_strain(errors: &mut ValidationErrors, strain: &str) {
    let trimmed = strain.trim();
    if trimmed.is_empty() {
        errors.push("strain", "must not be empty");
    } else if trimmed.chars().count() > STRAIN_MAX_CHARS {
        errors.push("strain", format!("must be at most {STRAIN_MAX_CHARS} characters"));
    }
}

fn check_non_negative(errors: &mut ValidationErrors, field: &'static str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.push(field, "must not be negative");
    }
}

fn check_percentage(errors: &mut ValidationErrors, field: &'static str, value: Decimal) {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        errors.push(field, "must be between 0 and 100");
    }
}

fn check_count(errors: &mut ValidationErrors, field: &'static str, value: i64) {
    if value < 0 {
        errors.push(field, "must not be negative");
    } else if value > i64::from(u32::MAX) {
        errors.push(field, format!("must be at most {}", u32::MAX));
    }
}

fn check_photo(errors: &mut ValidationErrors, photo: &str) {
    // Empty means "no photo"; the placeholder takes over.
    if !photo.is_empty() && !is_valid_photo_url(photo) {
        errors.push("photo", "must be an http(s) URL");
    }
}

fn check_slug(errors: &mut ValidationErrors, slug: &str) {
    if slugify(slug).is_empty() {
        errors.push("slug", "must contain at least one letter or digit");
    }
}

fn check_lab_results(errors: &mut ValidationErrors, lab: &LabResults) {
    if let Some(thc) = lab.thc {
        check_percentage(errors, "labResults.thc", thc);
    }
    if let Some(cbd) = lab.cbd {
        check_percentage(errors, "labResults.cbd", cbd);
    }
    if let Some(terpenes) = lab.terpenes {
        check_percentage(errors, "labResults.terpenes", terpenes);
    }
}

fn check_editor(errors: &mut ValidationErrors, editor: &str) {
    if !is_valid_email(editor) {
        errors.push("editor", "must be an email address");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Grade;
    use rust_decimal_macros::dec;

    fn valid_new() -> NewProduct {
        NewProduct {
            cost_basis: Some(dec!(600)),
            thca: Some(dec!(27.5)),
            stock: Some(12),
            photo: Some("https://cdn.example.com/gelato.jpg".into()),
            editor: Some("ops@example.com".into()),
            ..NewProduct::new(Grade::AGrade, "Gelato", dec!(900))
        }
    }

    #[test]
    fn accepts_well_formed_input() {
        assert!(validate_new(&valid_new()).is_ok());
    }

    #[test]
    fn reports_every_offending_field() {
        let new = NewProduct {
            strain: "   ".into(),
            price: dec!(-1),
            cost_basis: Some(dec!(-0.01)),
            thca: Some(dec!(100.1)),
            stock: Some(-1),
            photo: Some("not a url".into()),
            editor: Some("nobody".into()),
            ..valid_new()
        };

        let err = validate_new(&new).unwrap_err();
        assert_eq!(
            err.invalid_fields(),
            vec!["strain", "thca", "price", "costBasis", "stock", "photo", "editor"]
        );
    }

    #[test]
    fn strain_length_is_counted_in_characters() {
        let at_limit = NewProduct {
            strain: "é".repeat(STRAIN_MAX_CHARS),
            ..valid_new()
        };
        assert!(validate_new(&at_limit).is_ok());

        let over = NewProduct {
            strain: "a".repeat(STRAIN_MAX_CHARS + 1),
            ..valid_new()
        };
        assert_eq!(validate_new(&over).unwrap_err().invalid_fields(), vec!["strain"]);
    }

    #[test]
    fn zero_price_and_empty_photo_are_allowed() {
        let new = NewProduct {
            price: Decimal::ZERO,
            cost_basis: Some(Decimal::ZERO),
            photo: Some(String::new()),
            ..valid_new()
        };
        assert!(validate_new(&new).is_ok());
    }

    #[test]
    fn photo_requires_http_scheme() {
        assert!(is_valid_photo_url("http://img.example.com/a.png"));
        assert!(!is_valid_photo_url("ftp://img.example.com/a.png"));
        assert!(!is_valid_photo_url("/relative/a.png"));
    }

    #[test]
    fn update_does_not_range_check_stock() {
        let update = ProductUpdate {
            stock: Some(-50),
            ..ProductUpdate::default()
        };
        assert!(validate_update(&update).is_ok());
    }

    #[test]
    fn create_accepts_stock_beyond_u32() {
        let new = NewProduct {
            stock: Some(5_000_000_000),
            ..valid_new()
        };
        assert!(validate_new(&new).is_ok());

        let new = NewProduct {
            minimum_stock: Some(5_000_000_000),
            ..valid_new()
        };
        assert_eq!(validate_new(&new).unwrap_err().invalid_fields(), vec!["minimumStock"]);
    }

    #[test]
    fn clearing_optional_fields_needs_no_check() {
        let update = ProductUpdate {
            cost_basis: Some(None),
            photo: Some(None),
            lab_results: Some(None),
            editor: Some(None),
            ..ProductUpdate::default()
        };
        assert!(validate_update(&update).is_ok());

        let update = ProductUpdate {
            cost_basis: Some(Some(dec!(-1))),
            editor: Some(Some("nobody".into())),
            ..ProductUpdate::default()
        };
        assert_eq!(
            validate_update(&update).unwrap_err().invalid_fields(),
            vec!["costBasis", "editor"]
        );
    }

    #[test]
    fn update_rejects_bad_lab_numbers_and_slug() {
        let update = ProductUpdate {
            slug: Some("---".into()),
            lab_results: Some(Some(LabResults {
                cbd: Some(dec!(-2)),
                ..LabResults::default()
            })),
            ..ProductUpdate::default()
        };
        assert_eq!(
            validate_update(&update).unwrap_err().invalid_fields(),
            vec!["slug", "labResults.cbd"]
        );
    }
}
