//! Validation for Bitable identifiers and paging parameters.

use crate::error::{LarkResult, ValidationError};

/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest page size the API accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Reject blank path identifiers before they reach the API.
pub(crate) fn validate_identifier(parameter: &'static str, value: &str) -> LarkResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidParameter {
            parameter: parameter.to_string(),
            message: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Clamp a requested page size into the accepted range.
pub(crate) fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}
