//! `wholesale-core`: shared building blocks for the catalog.
//!
//! This crate contains **pure** primitives (no storage, no IO): the error
//! taxonomy every catalog operation reports through, the product identifier,
//! and the clock abstraction used to stamp writes.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CatalogError, CatalogResult, FieldError, ValidationErrors};
pub use id::ProductId;
