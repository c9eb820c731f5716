//! Error types for the Lark OpenAPI client.

mod categories;
mod mapper;
mod types;

pub use categories::*;
pub use mapper::*;
pub use types::*;
