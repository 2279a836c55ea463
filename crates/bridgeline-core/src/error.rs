//! Error types for the Bridgeline admin

use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

/// Field name to message map used by client-side and server-side validation
pub type FieldErrors = BTreeMap<String, String>;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Bridgeline admin
#[derive(Error, Debug)]
pub enum Error {
    /// No response was received from the backend
    #[error("Network error: {message}")]
    Network {
        /// Transport failure description
        message: String,
    },

    /// Non-2xx response without field detail
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message reported by the backend
        message: String,
    },

    /// Payload rejected, either by the local schema or by the backend
    #[error("Validation failed: {}", format_field_errors(.field_errors))]
    Validation {
        /// Per-field messages
        field_errors: FieldErrors,
    },

    /// Resource does not exist
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Operation conflicts with existing state (e.g. entity has dependents)
    #[error("Conflict: {message}")]
    Conflict {
        /// Conflict description
        message: String,
    },

    /// Missing, expired or insufficient credentials (401/403)
    #[error("Authentication failed ({status}): {message}")]
    Auth {
        /// HTTP status code
        status: u16,
        /// Message reported by the backend
        message: String,
    },

    /// Request was superseded or its owner was torn down
    #[error("Request cancelled")]
    Cancelled,

    /// A submission for this form is already in flight
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field} - {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error from a field map
    pub const fn validation(field_errors: FieldErrors) -> Self {
        Self::Validation { field_errors }
    }

    /// Create a validation error for a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.into(), message.into());
        Self::Validation { field_errors }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Per-field messages, if this is a validation error
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { field_errors } => Some(field_errors),
            _ => None,
        }
    }

    /// Whether the caller should send the user back to the login boundary
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Whether the error is the expected outcome of a superseded request
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Human-readable message suitable for a toast or banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Server { message, .. } if !message.is_empty() => message.clone(),
            Self::Server { status, .. } => format!("The server returned an error ({status})."),
            Self::Validation { field_errors } if field_errors.is_empty() => {
                "Please correct the highlighted fields.".to_string()
            }
            Self::Validation { field_errors } => format!(
                "Please correct the highlighted fields: {}.",
                field_errors.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
            Self::NotFound { resource } => format!("{resource} no longer exists."),
            Self::Conflict { message } => message.clone(),
            Self::Auth { .. } => "Your session has expired. Please sign in again.".to_string(),
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::SubmissionInFlight => "Please wait for the current save to finish.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut problems = Vec::new();
        collect_problems("", &errors, &mut problems);
        problems.sort();
        Self::Configuration {
            message: format!("invalid configuration: {}", problems.join("; ")),
        }
    }
}

/// Flatten nested validation errors into `path - message` lines
fn collect_problems(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let message = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    out.push(format!("{path} - {message}"));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_problems(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_problems(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as StdError;

    #[test]
    fn test_server_error_display() {
        let error = Error::server(500, "Internal failure");
        assert_eq!(error.to_string(), "Server error (500): Internal failure");
    }

    #[test]
    fn test_validation_error_display_lists_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("content".to_string(), "too short".to_string());
        fields.insert("title".to_string(), "required".to_string());
        let error = Error::validation(fields);

        assert_eq!(
            error.to_string(),
            "Validation failed: content - too short; title - required"
        );
        assert_eq!(error.field_errors().unwrap().len(), 2);
    }

    #[test]
    fn test_single_field_helper() {
        let error = Error::field("email", "invalid email");
        let fields = error.field_errors().unwrap();
        assert_eq!(fields.get("email").map(String::as_str), Some("invalid email"));
    }

    #[test]
    fn test_auth_detection() {
        assert!(Error::auth(401, "expired").is_auth());
        assert!(!Error::server(500, "boom").is_auth());
        assert!(Error::Cancelled.is_cancelled());
    }

    #[test]
    fn test_user_messages_are_readable() {
        assert!(Error::network("dns").user_message().contains("connection"));
        assert_eq!(Error::server(500, "").user_message(), "The server returned an error (500).");
        assert_eq!(Error::server(400, "Bad slug").user_message(), "Bad slug");
        assert_eq!(Error::not_found("Blog abc").user_message(), "Blog abc no longer exists.");
        assert!(Error::auth(403, "").user_message().contains("sign in"));
        assert_eq!(
            Error::field("content", "too short").user_message(),
            "Please correct the highlighted fields: content."
        );
    }

    #[test]
    fn test_io_error_conversion_keeps_source() {
        let error = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(matches!(error, Error::Io(_)));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let error = Error::from(json_error);
        match error {
            Error::Serialization(_) => {}
            other => panic!("Expected Serialization, got {other:?}"),
        }
    }

    #[test]
    fn test_validator_errors_become_configuration_errors() {
        use validator::Validate;

        #[derive(Validate)]
        struct Settings {
            #[validate(length(min = 3, message = "too short"))]
            name: String,
        }

        let errors = Settings {
            name: "ab".to_string(),
        }
        .validate()
        .unwrap_err();
        let error = Error::from(errors);
        assert!(matches!(error, Error::Configuration { .. }));
        assert_eq!(
            error.to_string(),
            "Configuration error: invalid configuration: name - too short"
        );
    }
}
