use serde_json::Value;
use thiserror::Error;

use crate::storage::StorageError;

pub const GENERIC_ERROR: &str = "An error occurred. Please try again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("Authentication failed")]
    Unauthorized { message: Option<String> },
    #[error("Access denied")]
    Forbidden { message: Option<String> },
    #[error("Server error {status}")]
    Status { status: u16, message: Option<String> },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Maps a non-2xx response onto the error taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| server_message(&value));
        match status {
            401 => ApiError::Unauthorized { message },
            403 => ApiError::Forbidden { message },
            _ => ApiError::Status { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Single string suitable for a transient notification.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Validation(message) => message.clone(),
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::Status { message, .. } => {
                message.clone().unwrap_or_else(|| GENERIC_ERROR.to_string())
            }
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::Storage(_) => {
                GENERIC_ERROR.to_string()
            }
        }
    }
}

/// Extracts the human-readable message from an error body.
///
/// Understands `non_field_errors` lists, single `error` / `detail` /
/// `message` strings, and field-keyed message arrays, in that order.
pub fn server_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    if let Some(joined) = object.get("non_field_errors").and_then(join_strings) {
        return Some(joined);
    }
    for key in ["error", "detail", "message"] {
        if let Some(Value::String(message)) = object.get(key) {
            if !message.trim().is_empty() {
                return Some(message.clone());
            }
        }
    }

    let field_messages: Vec<String> = object
        .iter()
        .filter_map(|(field, value)| join_strings(value).map(|m| format!("{field}: {m}")))
        .collect();
    if field_messages.is_empty() {
        None
    } else {
        Some(field_messages.join(", "))
    }
}

fn join_strings(value: &Value) -> Option<String> {
    let parts: Vec<&str> = value
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_non_field_errors() {
        let body = json!({ "non_field_errors": ["Bad credentials.", "Account locked."] });
        assert_eq!(
            server_message(&body).as_deref(),
            Some("Bad credentials., Account locked.")
        );
    }

    #[test]
    fn falls_back_through_single_string_keys() {
        assert_eq!(server_message(&json!({ "error": "nope" })).as_deref(), Some("nope"));
        assert_eq!(
            server_message(&json!({ "detail": "Invalid token." })).as_deref(),
            Some("Invalid token.")
        );
    }

    #[test]
    fn joins_field_keyed_arrays() {
        let body = json!({ "email": ["Enter a valid email address."], "password": ["Too short."] });
        assert_eq!(
            server_message(&body).as_deref(),
            Some("email: Enter a valid email address., password: Too short.")
        );
    }

    #[test]
    fn unreadable_bodies_use_the_generic_fallback() {
        let error = ApiError::from_status(500, "<html>oops</html>");
        assert_eq!(error, ApiError::Status { status: 500, message: None });
        assert_eq!(error.display_message(), GENERIC_ERROR);
        assert_eq!(server_message(&json!({ "other": 3 })), None);
    }

    #[test]
    fn classifies_auth_statuses() {
        assert!(matches!(ApiError::from_status(401, "{}"), ApiError::Unauthorized { .. }));
        assert!(matches!(ApiError::from_status(403, "{}"), ApiError::Forbidden { .. }));
        assert_eq!(ApiError::from_status(404, "{}").status(), Some(404));
    }
}
