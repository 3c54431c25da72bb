//! Composable filter expressions over dynamically discovered fields.
//!
//! - [`schema`]: semantic field types, operators, type resolution
//! - [`filter`]: the filter tree, its operations, labels, and request shape
//! - [`discovery`]: lazy field tree listing, caching, and navigation
//! - [`saved`]: saved search stores

pub mod core;
pub mod discovery;
pub mod filter;
pub mod saved;
pub mod schema;
pub mod utils;

mod app;

pub use app::FilterForgeApp;
