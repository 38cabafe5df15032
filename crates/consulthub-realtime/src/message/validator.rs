//! Message validation rules.

use consulthub_core::error::AppError;

/// Validates the size and shape of a raw inbound frame.
pub fn validate_frame(raw: &str, max_size: usize) -> Result<(), AppError> {
    if raw.len() > max_size {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates chat text; returns it trimmed.
pub fn validate_chat_text(text: &str, max_chars: usize) -> Result<&str, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Message cannot be empty"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "Message exceeds {max_chars} characters"
        )));
    }
    Ok(trimmed)
}
