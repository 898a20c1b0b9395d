//! Product entity manager.
//!
//! `ProductCatalog` owns the write pipeline around a `ProductStore`:
//!
//! ```text
//! create:        validate -> draft (defaults, slug, seeded history) -> slug check -> insert
//! update:        validate -> apply to the current row (history append, stock transition)
//! update_stock:  clamp + derive status on the current row
//! delete:        soft delete (row retained)
//! ```
//!
//! Validation always completes before the first store call, so a rejected
//! write leaves storage untouched. Each write is a single row write applied
//! by the store to the row as it stands, so concurrent writes to one product
//! do not revert each other; nothing spans rows. The slug check is
//! read-then-write without locking: two concurrent creates can both see a
//! free slug, in which case the store's unique constraint rejects the loser
//! with `CatalogError::Constraint`. That error is surfaced, never retried here.

use std::thread;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use wholesale_core::{CatalogError, CatalogResult, Clock, ProductId, SystemClock};
use wholesale_products::{
    Grade, LifecyclePolicy, NewProduct, Product, ProductStatus, ProductUpdate, ProductView,
    UpdateEffects, ViewOptions, disambiguate, validate_new, validate_update,
};

use crate::config::CatalogConfig;
use crate::store::{AggregateExpr, Column, ProductFilter, ProductStore, SortOrder, StoreError};

/// Snapshot-free inventory summary.
///
/// Each figure comes from its own query; they may run concurrently with each
/// other and with writes, so the numbers need not agree exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_products: u64,
    pub available_products: u64,
    pub total_value: Decimal,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
}

fn available_filter() -> ProductFilter {
    ProductFilter::new()
        .eq(Column::Status, ProductStatus::Available)
        .gt(Column::Stock, 0i64)
}

fn low_stock_filter(threshold: u32) -> ProductFilter {
    available_filter().lte(Column::Stock, threshold)
}

fn by_strain() -> SortOrder {
    SortOrder::asc(Column::Strain)
}

#[derive(Debug)]
pub struct ProductCatalog<S, C = SystemClock> {
    store: S,
    clock: C,
    config: CatalogConfig,
    policy: LifecyclePolicy,
}

impl<S> ProductCatalog<S> {
    pub fn new(store: S, config: CatalogConfig) -> Self {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S, C> ProductCatalog<S, C> {
    pub fn with_clock(store: S, clock: C, config: CatalogConfig) -> Self {
        let policy = config.lifecycle_policy();
        Self {
            store,
            clock,
            config,
            policy,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// External representation of `product` with derived fields.
    pub fn view(&self, product: &Product, options: ViewOptions) -> ProductView {
        ProductView::render(product, options, &self.config.placeholder_image_base)
    }
}

impl<S, C> ProductCatalog<S, C>
where
    S: ProductStore,
    C: Clock,
{
    /// Validate, derive and insert a new product.
    ///
    /// A slug derived from the strain that collides with another live product
    /// gets the write timestamp appended. An explicit slug is never rewritten;
    /// a collision on it fails with `CatalogError::Constraint`.
    pub fn create(&self, new: NewProduct) -> CatalogResult<Product> {
        validate_new(&new)?;

        let now = self.clock.now();
        let derived_slug = new.slug.is_none();
        let mut product = Product::draft(new, &self.policy, now);
        if derived_slug {
            product.slug = self.available_slug(product.slug, now)?;
        }

        let saved = self.store.insert(product)?;
        tracing::info!(
            product_id = %saved.id,
            slug = %saved.slug,
            grade = %saved.grade,
            stock = saved.stock,
            "product created"
        );
        Ok(saved)
    }

    /// Apply a partial update to a live product.
    pub fn update(&self, id: ProductId, update: ProductUpdate) -> CatalogResult<Product> {
        validate_update(&update)?;

        let now = self.clock.now();
        let mut effects = UpdateEffects::default();
        let saved = self.store.update_by_id(id, &mut |product| {
            effects = product.apply_update(&update, &self.policy, now);
        })?;
        if effects.price_recorded {
            tracing::info!(
                product_id = %id,
                price = %saved.price,
                history_len = saved.price_history.len(),
                "price change recorded"
            );
        }
        if let Some(change) = effects.stock.filter(|c| c.status_changed()) {
            tracing::info!(
                product_id = %id,
                from = %change.previous_status,
                to = %change.status,
                "status derived from stock"
            );
        }
        tracing::debug!(product_id = %id, "product updated");
        Ok(saved)
    }

    /// Set stock to `max(0, new_stock)`, deriving AVAILABLE/SOLD OUT.
    pub fn update_stock(&self, id: ProductId, new_stock: i64) -> CatalogResult<Product> {
        let now = self.clock.now();
        let mut change = None;
        let saved = self.store.update_by_id(id, &mut |product| {
            change = Some(product.apply_stock(new_stock, now));
        })?;

        if let Some(change) = change {
            tracing::info!(
                product_id = %id,
                requested = new_stock,
                previous = change.previous_stock,
                stock = change.stock,
                status = %change.status,
                "stock updated"
            );
        }
        if new_stock < 0 {
            tracing::warn!(product_id = %id, requested = new_stock, "negative stock clamped to 0");
        }
        Ok(saved)
    }

    /// Soft-delete: the row stays in storage with a deletion timestamp.
    pub fn delete(&self, id: ProductId) -> CatalogResult<()> {
        self.store.soft_delete(id, self.clock.now())?;
        tracing::info!(product_id = %id, "product soft-deleted");
        Ok(())
    }

    /// Undo a soft delete.
    pub fn restore(&self, id: ProductId) -> CatalogResult<Product> {
        let restored = self.store.restore(id)?;
        tracing::info!(product_id = %id, slug = %restored.slug, "product restored");
        Ok(restored)
    }

    pub fn get(&self, id: ProductId) -> CatalogResult<Product> {
        self.store
            .find_one(&ProductFilter::new().eq(Column::Id, id))?
            .ok_or(CatalogError::NotFound)
    }

    pub fn get_by_slug(&self, slug: &str) -> CatalogResult<Product> {
        self.store
            .find_one(&ProductFilter::new().eq(Column::Slug, slug))?
            .ok_or(CatalogError::NotFound)
    }

    /// Live products in display order (sort order, then strain).
    pub fn list(&self, limit: Option<usize>) -> CatalogResult<Vec<Product>> {
        let order = SortOrder::asc(Column::SortOrder).then_asc(Column::Strain);
        Ok(self.store.find_many(&ProductFilter::new(), &order, limit)?)
    }

    pub fn find_available(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.store.find_many(&available_filter(), &by_strain(), None)?)
    }

    pub fn find_by_grade(&self, grade: Grade) -> CatalogResult<Vec<Product>> {
        let filter = ProductFilter::new().eq(Column::Grade, grade);
        Ok(self.store.find_many(&filter, &by_strain(), None)?)
    }

    /// Case-insensitive substring match on strain.
    pub fn search_by_strain(&self, term: &str) -> CatalogResult<Vec<Product>> {
        let filter = ProductFilter::new().contains(Column::Strain, term.trim(), true);
        Ok(self.store.find_many(&filter, &by_strain(), None)?)
    }

    /// AVAILABLE products with `0 < stock <= threshold`, lowest stock first.
    ///
    /// `None` uses the configured threshold (10 by default).
    pub fn find_low_stock(&self, threshold: Option<u32>) -> CatalogResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(self.config.low_stock_threshold);
        let order = SortOrder::asc(Column::Stock).then_asc(Column::Strain);
        Ok(self.store.find_many(&low_stock_filter(threshold), &order, None)?)
    }

    pub fn find_by_status(&self, status: ProductStatus) -> CatalogResult<Vec<Product>> {
        let filter = ProductFilter::new().eq(Column::Status, status);
        Ok(self.store.find_many(&filter, &by_strain(), None)?)
    }

    /// Featured products that can be sold now, in merchandising order.
    pub fn find_featured(&self) -> CatalogResult<Vec<Product>> {
        let filter = available_filter().eq(Column::Featured, true);
        let order = SortOrder::asc(Column::SortOrder).then_asc(Column::Strain);
        Ok(self.store.find_many(&filter, &order, None)?)
    }

    /// `sum(price * stock)` over AVAILABLE products; zero when there are none.
    pub fn total_inventory_value(&self) -> CatalogResult<Decimal> {
        Ok(self.inventory_value()?)
    }

    /// Run the four summary queries side by side and combine them.
    pub fn inventory_stats(&self) -> CatalogResult<InventoryStats> {
        let low_stock = low_stock_filter(self.config.low_stock_threshold);

        let (total, available, value, low) = thread::scope(|scope| {
            let total = scope.spawn(|| self.store.count(&ProductFilter::new()));
            let available = scope.spawn(|| self.store.count(&available_filter()));
            let value = scope.spawn(|| self.inventory_value());
            let low = scope.spawn(|| self.store.count(&low_stock));
            (
                joined(total.join()),
                joined(available.join()),
                joined(value.join()),
                joined(low.join()),
            )
        });

        let total_products = total?;
        let available_products = available?;
        Ok(InventoryStats {
            total_products,
            available_products,
            total_value: value?,
            low_stock_count: low?,
            out_of_stock_count: total_products.saturating_sub(available_products),
        })
    }

    fn inventory_value(&self) -> Result<Decimal, StoreError> {
        self.store.aggregate(
            &ProductFilter::new().eq(Column::Status, ProductStatus::Available),
            AggregateExpr::SumProduct(Column::Price, Column::Stock),
        )
    }

    /// `base` if no live product holds it, else `base` + timestamp.
    fn available_slug(&self, base: String, now: DateTime<Utc>) -> CatalogResult<String> {
        let filter = ProductFilter::new().eq(Column::Slug, base.as_str());
        if self.store.find_one(&filter)?.is_none() {
            return Ok(base);
        }
        let slug = disambiguate(&base, now);
        tracing::debug!(base = %base, slug = %slug, "slug taken; disambiguated");
        Ok(slug)
    }
}

fn joined<T>(outcome: thread::Result<Result<T, StoreError>>) -> Result<T, StoreError> {
    outcome.unwrap_or_else(|_| Err(StoreError::Backend("stats sub-query panicked".to_string())))
}
