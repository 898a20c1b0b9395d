//! Products domain module.
//!
//! This crate contains the business rules for the wholesale catalog's single
//! entity, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage). Writes go through an explicit pipeline that callers drive:
//!
//! ```text
//! validate  ->  derive (slug, defaults, stock status)  ->  record price history  ->  persist
//! ```
//!
//! Persistence and uniqueness checks are the caller's job (see `wholesale-infra`).

pub mod price_history;
pub mod product;
pub mod slug;
pub mod validation;
pub mod view;

pub use price_history::{DEFAULT_PRICE_HISTORY_LIMIT, PriceHistory, PriceHistoryEntry};
pub use product::{
    Grade, LabResults, LifecyclePolicy, NewProduct, Product, ProductStatus, ProductType,
    ProductUpdate, StockChange, UpdateEffects, base_slug, clamp_stock, next_status,
};
pub use slug::{FALLBACK_SLUG, disambiguate, slugify};
pub use validation::{validate_new, validate_update};
pub use view::{DEFAULT_PLACEHOLDER_IMAGE_BASE, ProductView, ViewOptions};
