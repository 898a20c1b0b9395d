//! Infrastructure layer: persistence abstraction, configuration and the
//! product entity manager that composes them.

pub mod catalog;
pub mod config;
pub mod store;

pub use catalog::{InventoryStats, ProductCatalog};
pub use config::CatalogConfig;
pub use store::{InMemoryProductStore, ProductStore, RowChange, StoreError};
