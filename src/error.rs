//! Structured error type for the admin data layer.
//!
//! Every failure carries an explicit kind so callers and the notification
//! layer never inspect message text. The HTTP transport assigns kinds from
//! status codes; [`Error::from_message`] is an ingestion fallback for
//! failures that only exist as text.

use std::collections::HashMap;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classification, used to select user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Network,
  Authorization,
  NotFound,
  Server,
  Validation,
  Unknown,
}

impl ErrorKind {
  /// Human-readable message for this kind of failure.
  ///
  /// The single place user-facing error text is chosen.
  pub fn user_message(self) -> &'static str {
    match self {
      ErrorKind::Network => "Network error. Check your connection and try again.",
      ErrorKind::Authorization => "Your session has expired. Please sign in again.",
      ErrorKind::NotFound => "The requested resource could not be found.",
      ErrorKind::Server => "Something went wrong on our end. Please try again later.",
      ErrorKind::Validation => "Some fields are invalid. Correct them and try again.",
      ErrorKind::Unknown => "An unexpected error occurred. Please try again.",
    }
  }
}

/// Error type for all operations in this crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
  #[error("network error: {message}")]
  Network { message: String },

  #[error("authorization failed: {message}")]
  Authorization { message: String },

  #[error("not found: {resource}")]
  NotFound { resource: String },

  #[error("server error ({status}): {message}")]
  Server { status: u16, message: String },

  /// Field-level validation failure from a structured backend payload.
  #[error("validation failed: {message}")]
  Validation {
    message: String,
    /// Field name to reasons, for per-field form errors.
    fields: HashMap<String, Vec<String>>,
  },

  #[error("configuration error: {0}")]
  Config(String),

  #[error("cache storage error: {0}")]
  Storage(String),

  #[error("serialization error: {0}")]
  Serialization(String),

  #[error("request cancelled")]
  Cancelled,

  #[error("{0}")]
  Unknown(String),
}

impl Error {
  /// Classification of this error.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Network { .. } => ErrorKind::Network,
      Error::Authorization { .. } => ErrorKind::Authorization,
      Error::NotFound { .. } => ErrorKind::NotFound,
      Error::Server { .. } => ErrorKind::Server,
      Error::Validation { .. } => ErrorKind::Validation,
      Error::Config(_)
      | Error::Storage(_)
      | Error::Serialization(_)
      | Error::Cancelled
      | Error::Unknown(_) => ErrorKind::Unknown,
    }
  }

  /// Message suitable for a user-facing notification.
  pub fn user_message(&self) -> &'static str {
    self.kind().user_message()
  }

  /// Field map of a validation failure, if this is one.
  pub fn validation_fields(&self) -> Option<&HashMap<String, Vec<String>>> {
    match self {
      Error::Validation { fields, .. } => Some(fields),
      _ => None,
    }
  }

  /// Build an error from an HTTP status code and response body details.
  pub fn from_status(status: u16, message: String, fields: HashMap<String, Vec<String>>) -> Self {
    match status {
      401 | 403 => Error::Authorization { message },
      404 => Error::NotFound {
        resource: if message.is_empty() {
          "resource".to_string()
        } else {
          message
        },
      },
      400 | 422 => Error::Validation { message, fields },
      s if s >= 500 => Error::Server { status: s, message },
      s => Error::Unknown(format!("HTTP {}: {}", s, message)),
    }
  }

  /// Classify an error that only exists as text.
  ///
  /// Fallback for failures raised outside the HTTP transport, which assigns
  /// kinds from status codes instead of matching on message text.
  pub fn from_message(message: &str) -> Self {
    let lower = message.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if contains_any(&["network", "connection", "timed out", "timeout", "dns"]) {
      Error::Network {
        message: message.to_string(),
      }
    } else if contains_any(&["401", "403", "unauthorized", "forbidden"]) {
      Error::Authorization {
        message: message.to_string(),
      }
    } else if contains_any(&["404", "not found"]) {
      Error::NotFound {
        resource: message.to_string(),
      }
    } else if contains_any(&["500", "502", "503", "server error", "internal error"]) {
      Error::Server {
        status: 500,
        message: message.to_string(),
      }
    } else {
      Error::Unknown(message.to_string())
    }
  }
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() || err.is_connect() {
      return Error::Network {
        message: err.to_string(),
      };
    }
    if let Some(status) = err.status() {
      return Error::from_status(status.as_u16(), err.to_string(), HashMap::new());
    }
    if err.is_decode() {
      return Error::Serialization(err.to_string());
    }
    // Remaining reqwest failures (request build, body, redirect) are
    // transport-level from the caller's perspective.
    Error::Network {
      message: err.to_string(),
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::Serialization(err.to_string())
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    Error::Storage(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_status_mapping() {
    assert_eq!(
      Error::from_status(401, "bad token".into(), HashMap::new()).kind(),
      ErrorKind::Authorization
    );
    assert_eq!(
      Error::from_status(403, "nope".into(), HashMap::new()).kind(),
      ErrorKind::Authorization
    );
    assert_eq!(
      Error::from_status(404, "user".into(), HashMap::new()).kind(),
      ErrorKind::NotFound
    );
    assert_eq!(
      Error::from_status(503, "down".into(), HashMap::new()).kind(),
      ErrorKind::Server
    );
    assert_eq!(
      Error::from_status(418, "teapot".into(), HashMap::new()).kind(),
      ErrorKind::Unknown
    );
  }

  #[test]
  fn test_from_status_validation_keeps_fields() {
    let mut fields = HashMap::new();
    fields.insert("email".to_string(), vec!["must contain @".to_string()]);

    let err = Error::from_status(422, "invalid input".into(), fields);
    assert_eq!(err.kind(), ErrorKind::Validation);

    let map = err.validation_fields().expect("field map");
    assert_eq!(map["email"], vec!["must contain @".to_string()]);
  }

  #[test]
  fn test_from_message_substring_classification() {
    assert_eq!(
      Error::from_message("request failed with status 401").kind(),
      ErrorKind::Authorization
    );
    assert_eq!(
      Error::from_message("connection refused").kind(),
      ErrorKind::Network
    );
    assert_eq!(
      Error::from_message("order 42 not found").kind(),
      ErrorKind::NotFound
    );
    assert_eq!(
      Error::from_message("500 internal error").kind(),
      ErrorKind::Server
    );
    assert_eq!(
      Error::from_message("something odd").kind(),
      ErrorKind::Unknown
    );
  }

  #[test]
  fn test_network_wins_over_status_fragment_in_text() {
    // "connection reset after 401" reads as a transport failure first.
    let err = Error::from_message("connection reset after 401");
    assert_eq!(err.kind(), ErrorKind::Network);
  }

  #[test]
  fn test_user_message_per_kind() {
    let err = Error::Authorization {
      message: "expired".into(),
    };
    assert_eq!(
      err.user_message(),
      "Your session has expired. Please sign in again."
    );

    let err = Error::Unknown("???".into());
    assert_eq!(
      err.user_message(),
      "An unexpected error occurred. Please try again."
    );
  }
}
