//! Built-in function groups.

pub mod data;

use std::sync::Arc;

pub use data::DataGroup;

use crate::registry::GroupCatalog;

/// A catalog holding every built-in group.
pub fn builtin_catalog() -> GroupCatalog {
    let mut catalog = GroupCatalog::new();
    catalog.register(Arc::new(DataGroup));
    catalog
}
