//! Schema compilation for SignalForge.
//!
//! Turns an organisation's object types and metadata types into the
//! property maps that function declarations are built from. Everything
//! here is pure: output order follows input order and there are no
//! failure modes over well-formed rows.

pub mod builder;

pub use builder::{
    build_function_properties, build_object_schema, build_object_type_descriptions,
    build_required_properties,
};
