//! Catalog error model.

use core::fmt;

use thiserror::Error;

/// Result type used across the catalog.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A single offending input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed validation for one write.
///
/// Validation runs to completion before anything is reported, so callers see
/// all offending fields at once rather than one per round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise a `CatalogError::Validation`.
    pub fn into_result(self) -> CatalogResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(err, f)?;
        }
        Ok(())
    }
}

/// Catalog-level error.
///
/// Every variant is surfaced synchronously by the operation that detected it.
/// Retry policy for `Storage` failures belongs to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// One or more input fields were malformed or out of range.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A uniqueness rule was violated (e.g. duplicate slug).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The targeted product does not exist or has been soft-deleted.
    #[error("not found")]
    NotFound,

    /// The underlying persistence call failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl CatalogError {
    /// Shorthand for a validation failure on a single field.
    pub fn validation(field: &'static str, msg: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(field, msg);
        Self::Validation(errors)
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Offending fields when this is a validation failure; empty otherwise.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        match self {
            Self::Validation(errors) => errors.fields(),
            _ => Vec::new(),
        }
    }
}
