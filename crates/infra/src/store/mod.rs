//! Product persistence abstraction.
//!
//! The catalog treats the database as a table with generated ids and
//! filter/sort/aggregate queries. Implementations must provide per-row
//! atomicity (a single insert or update is all-or-nothing) and enforce slug
//! uniqueness among live rows; nothing here spans rows or operations.
//!
//! Updates are expressed as a change applied to the current row inside the
//! write, never as a row the caller read earlier, so writes to the same row
//! serialize instead of overwriting each other.

pub mod in_memory;
pub mod query;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use wholesale_core::{CatalogError, ProductId};
use wholesale_products::Product;

pub use in_memory::InMemoryProductStore;
pub use query::{AggregateExpr, Column, Condition, Direction, FieldValue, ProductFilter, SortOrder};

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to input validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint (slug) rejected the write.
    #[error("unique constraint violated: {0}")]
    Constraint(String),

    /// No live row with the requested id.
    #[error("no product with id {0}")]
    NotFound(ProductId),

    /// The backend itself failed (connection, lock, timeout).
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Constraint(msg) => CatalogError::Constraint(msg),
            StoreError::NotFound(_) => CatalogError::NotFound,
            StoreError::Backend(msg) => CatalogError::Storage(msg),
        }
    }
}

/// In-place edit of one row, run by the store under its write.
pub type RowChange<'a> = &'a mut dyn FnMut(&mut Product);

/// Table-like product storage.
pub trait ProductStore: Send + Sync {
    /// Persist a new row and return it with its generated id.
    fn insert(&self, product: Product) -> Result<Product, StoreError>;

    /// Apply `change` to the current state of a live row and persist the
    /// result as one write; no other write to the row may land in between.
    /// `id`, `created_at` and `deleted_at` are not changeable. `NotFound` if
    /// the row is missing or soft-deleted, in which case `change` is not run.
    fn update_by_id(&self, id: ProductId, change: RowChange<'_>) -> Result<Product, StoreError>;

    fn find_one(&self, filter: &ProductFilter) -> Result<Option<Product>, StoreError>;

    fn find_many(
        &self,
        filter: &ProductFilter,
        order: &SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, StoreError>;

    fn count(&self, filter: &ProductFilter) -> Result<u64, StoreError>;

    /// Evaluate `expr` over matching rows; zero when nothing matches.
    fn aggregate(&self, filter: &ProductFilter, expr: AggregateExpr) -> Result<Decimal, StoreError>;

    /// Mark a live row deleted at `at`; the row is retained.
    fn soft_delete(&self, id: ProductId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Clear the deletion marker of a soft-deleted row.
    fn restore(&self, id: ProductId) -> Result<Product, StoreError>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn insert(&self, product: Product) -> Result<Product, StoreError> {
        (**self).insert(product)
    }

    fn update_by_id(&self, id: ProductId, change: RowChange<'_>) -> Result<Product, StoreError> {
        (**self).update_by_id(id, change)
    }

    fn find_one(&self, filter: &ProductFilter) -> Result<Option<Product>, StoreError> {
        (**self).find_one(filter)
    }

    fn find_many(
        &self,
        filter: &ProductFilter,
        order: &SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, StoreError> {
        (**self).find_many(filter, order, limit)
    }

    fn count(&self, filter: &ProductFilter) -> Result<u64, StoreError> {
        (**self).count(filter)
    }

    fn aggregate(
        &self,
        filter: &ProductFilter,
        expr: AggregateExpr,
    ) -> Result<Decimal, StoreError> {
        (**self).aggregate(filter, expr)
    }

    fn soft_delete(&self, id: ProductId, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).soft_delete(id, at)
    }

    fn restore(&self, id: ProductId) -> Result<Product, StoreError> {
        (**self).restore(id)
    }
}
