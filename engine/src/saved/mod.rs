//! Saved searches
//!
//! Named filter descriptors a user can recall, favorite, and delete.

mod error;
mod file;
mod memory;
mod store;

pub use error::SavedSearchError;
pub use file::JsonFileSavedSearchStore;
pub use memory::InMemorySavedSearchStore;
pub use store::{SavedSearch, SavedSearchStore};
