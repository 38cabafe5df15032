//! Request and response DTOs.

pub mod request;
pub mod response;

use validator::Validate;

use consulthub_core::error::AppError;

/// Run `validator` rules on a request body.
pub fn validated<T: Validate>(body: T) -> Result<T, AppError> {
    body.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(body)
}
