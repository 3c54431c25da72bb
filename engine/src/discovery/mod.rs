//! Field discovery
//!
//! Lazily lists the field tree of a module, caches listings per path, and
//! drives the navigation and option search used by field pickers.

mod client;
mod error;
mod navigator;
mod options;
mod source;

pub use client::{FieldDiscoveryClient, FieldList};
pub use error::DiscoveryError;
pub use navigator::{Breadcrumb, FieldNavigator, NavigationTicket, SelectOutcome};
pub use options::OptionSearch;
pub use source::{FieldSource, HttpFieldSource, OptionSource};
