//! Function registry and built-in function groups for SignalForge.
//!
//! A [`FunctionRegistry`] is built per request from a [`GroupCatalog`] and
//! an immutable [`RequestContext`](signalforge_core::RequestContext). It
//! hands declarations to the dispatchers and runs implementations after
//! validating the model's arguments against the declared schema.

pub mod groups;
pub mod registry;
pub mod validate;

pub use groups::{DataGroup, builtin_catalog};
pub use registry::{FunctionRegistry, GroupCatalog};
pub use validate::validate_arguments;
