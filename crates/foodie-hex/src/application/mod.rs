pub mod address_service;
pub mod carousel_service;
pub mod order_query_service;
pub mod order_service;

use crate::errors::AppError;

/// Rejects a blank identifier or parameter.
pub(crate) fn require(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{name} must not be blank")));
    }
    Ok(())
}
