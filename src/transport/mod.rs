//! HTTP transport layer.
//!
//! Defines the transport seam ([`HttpTransport`]) the client and token
//! manager send requests through, plus the production implementation backed
//! by `reqwest`. Tests substitute [`crate::mocks::MockHttpTransport`].

mod error;
mod http;
mod reqwest;

pub use error::TransportError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use reqwest::ReqwestTransport;
