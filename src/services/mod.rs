//! Service implementations for the Lark OpenAPI surface.

pub mod bitable;

pub use bitable::*;
