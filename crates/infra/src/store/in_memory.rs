use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use wholesale_core::ProductId;
use wholesale_products::Product;

use super::query::{AggregateExpr, ProductFilter, SortOrder};
use super::{ProductStore, RowChange, StoreError};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<ProductId, Product>,
    last_id: i64,
}

impl Table {
    fn slug_taken(&self, slug: &str, except: Option<ProductId>) -> bool {
        self.rows
            .values()
            .any(|p| !p.is_deleted() && p.slug == slug && Some(p.id) != except)
    }

    fn live_mut(&mut self, id: ProductId) -> Result<&mut Product, StoreError> {
        match self.rows.get_mut(&id) {
            Some(row) if !row.is_deleted() => Ok(row),
            _ => Err(StoreError::NotFound(id)),
        }
    }
}

/// In-memory product table.
///
/// Intended for tests/dev. Ids are generated sequentially from 1; slug
/// uniqueness is enforced among live rows under the table lock.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<Table>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, deleted or not, in id order.
    pub fn rows(&self) -> Result<Vec<Product>, StoreError> {
        let table = self.read()?;
        Ok(table.rows.values().cloned().collect())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Table>, StoreError> {
        self.table
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Table>, StoreError> {
        self.table
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl ProductStore for InMemoryProductStore {
    fn insert(&self, mut product: Product) -> Result<Product, StoreError> {
        let mut table = self.write()?;

        if table.slug_taken(&product.slug, None) {
            return Err(StoreError::Constraint(format!(
                "slug {:?} already exists",
                product.slug
            )));
        }

        table.last_id += 1;
        product.id = ProductId::new(table.last_id);
        product.deleted_at = None;
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    fn update_by_id(&self, id: ProductId, change: RowChange<'_>) -> Result<Product, StoreError> {
        let mut table = self.write()?;

        let mut product = table.live_mut(id)?.clone();
        let created_at = product.created_at;
        change(&mut product);
        product.id = id;
        product.created_at = created_at;
        product.deleted_at = None;

        if table.slug_taken(&product.slug, Some(id)) {
            return Err(StoreError::Constraint(format!(
                "slug {:?} already exists",
                product.slug
            )));
        }

        let row = table.live_mut(id)?;
        *row = product.clone();
        Ok(product)
    }

    fn find_one(&self, filter: &ProductFilter) -> Result<Option<Product>, StoreError> {
        let table = self.read()?;
        Ok(table.rows.values().find(|p| filter.matches(p)).cloned())
    }

    fn find_many(
        &self,
        filter: &ProductFilter,
        order: &SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, StoreError> {
        let table = self.read()?;
        let mut matched: Vec<Product> = table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        // Stable sort keeps id order among ties.
        matched.sort_by(|a, b| order.compare(a, b));
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn count(&self, filter: &ProductFilter) -> Result<u64, StoreError> {
        let table = self.read()?;
        Ok(table.rows.values().filter(|p| filter.matches(p)).count() as u64)
    }

    fn aggregate(
        &self,
        filter: &ProductFilter,
        expr: AggregateExpr,
    ) -> Result<Decimal, StoreError> {
        let table = self.read()?;
        expr.evaluate(table.rows.values().filter(|p| filter.matches(p)))
            .ok_or_else(|| StoreError::Backend("aggregate overflows the decimal range".to_string()))
    }

    fn soft_delete(&self, id: ProductId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut table = self.write()?;
        let row = table.live_mut(id)?;
        row.deleted_at = Some(at);
        Ok(())
    }

    fn restore(&self, id: ProductId) -> Result<Product, StoreError> {
        let mut table = self.write()?;

        let slug = match table.rows.get(&id) {
            Some(row) if row.is_deleted() => row.slug.clone(),
            _ => return Err(StoreError::NotFound(id)),
        };
        if table.slug_taken(&slug, Some(id)) {
            return Err(StoreError::Constraint(format!(
                "slug {slug:?} was taken while the product was deleted"
            )));
        }

        let row = table
            .rows
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        row.deleted_at = None;
        Ok(row.clone())
    }
}
