use std::fmt::Display;

use thiserror::Error;

/// Raised when user input fails client side validation (Category (a) errors)
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
    #[error("Minimum length not met. {min} required but found {actual}")]
    MinNotMet { min: usize, actual: usize },
    #[error("Invalid format. Expected {expected}")]
    InvalidFormat { expected: &'static str },
    #[error("Value out of range. Must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },
}

#[derive(Debug, Error)]
#[error("The user has not logged in")]
pub struct NotLoggedInError;

/// Broad grouping used to decide how an error is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategory {
    /// The server rejected the request and said why
    Api,
    /// No usable response was received
    Network,
    /// The credentials are no longer valid and the user must login again
    SessionExpired,
}

/// Structured form of every failed request
///
/// `message` is a message key from the server (or one of the generic keys in
/// [`crate::messages`]) and `violations` lists any field level problems
/// reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiError {
    pub category: ErrorCategory,
    pub status: Option<u16>,
    pub message: String,
    pub violations: Vec<String>,
}

/// Body of an error response as sent by the server
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    violations: Vec<String>,
}

impl ApiError {
    pub fn network<S: Into<String>>(detail: S) -> Self {
        let detail = detail.into();
        tracing::debug!(?detail, "network failure");
        Self {
            category: ErrorCategory::Network,
            status: None,
            message: crate::messages::KEY_NETWORK.to_string(),
            violations: Vec::new(),
        }
    }

    pub fn session_expired() -> Self {
        Self {
            category: ErrorCategory::SessionExpired,
            status: Some(401),
            message: crate::messages::KEY_SESSION_EXPIRED.to_string(),
            violations: Vec::new(),
        }
    }

    /// A problem found by the client itself, reported like a server rejection
    pub fn local<S: Into<String>>(key: S) -> Self {
        Self {
            category: ErrorCategory::Api,
            status: None,
            message: key.into(),
            violations: Vec::new(),
        }
    }

    /// Builds the error from a failed response
    ///
    /// Bodies that are not in the expected shape are kept verbatim as the
    /// message (empty bodies fall back to a generic key)
    pub fn from_response(status: u16, body: &str, was_authenticated: bool) -> Self {
        if status == 401 && was_authenticated {
            return Self::session_expired();
        }
        let (message, violations) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (parsed.message, parsed.violations),
            Err(_) if body.trim().is_empty() => {
                (crate::messages::KEY_UNKNOWN.to_string(), Vec::new())
            }
            Err(_) => (body.trim().to_string(), Vec::new()),
        };
        Self {
            category: ErrorCategory::Api,
            status: Some(status),
            message,
            violations,
        }
    }

    /// Recovers the structured error from an `anyhow` chain, treating
    /// anything else as a failure to get a usable response
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ApiError>() {
            Some(api_error) => api_error.clone(),
            None => Self::network(format!("{err:#}")),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.category == ErrorCategory::SessionExpired
    }

    /// Text suitable to show the user
    pub fn user_text(&self) -> String {
        let mut result = crate::messages::describe(&self.message).to_string();
        for violation in &self.violations {
            result.push_str("\n- ");
            result.push_str(crate::messages::describe(violation));
        }
        result
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.violations.is_empty() {
            write!(f, " ({})", self.violations.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
