//! Error types for the Switchyard routing core.
//!
//! Errors are split by concern: `ConfigError` covers grammar construction
//! and registration problems that must abort service startup, `ParseError`
//! covers per-request grammar violations, `HandlerError` carries an opaque
//! handler failure, and `ServiceError` is the surface the transport adapter
//! sees. All four are returned as typed results, never raised as panics.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for Switchyard operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Startup-time configuration failures.
///
/// These indicate a programming error in a mapping declaration or a bad
/// registration, and are surfaced once while the service is being built,
/// never per-request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option was declared with an empty name
    #[error("option name must not be empty")]
    EmptyOptionName,

    /// An option name contains whitespace and could never be tokenized
    #[error("invalid option name '{0}': names must not contain whitespace")]
    InvalidOptionName(String),

    /// minAllowed exceeds a bounded maxAllowed
    #[error("option '{option}' declares min allowed {min} greater than max allowed {max}")]
    BadCardinality { option: String, min: u32, max: u32 },

    /// An option group was declared without members
    #[error("option group must name at least one member")]
    EmptyGroup,

    /// A group's minimum exceeds its maximum
    #[error("option group [{members}] declares min {min} greater than max {max}")]
    BadGroupBounds { members: String, min: u32, max: u32 },

    /// An option need was declared without needers or without needees
    #[error("option need must name at least one needer and one needee")]
    EmptyNeed,

    /// Two options in one mapping share a name under the mapping's case rule
    #[error("duplicate option '{0}' in mapping")]
    DuplicateOption(String),

    /// Group or need constraints reference options that were never declared.
    /// All dangling names are collected before reporting.
    #[error("mapping references undeclared options: {}", .0.join(", "))]
    DanglingReferences(Vec<String>),

    /// A mapping was built without any options
    #[error("mapping must declare at least one option")]
    NoOptions,

    /// The exact same grammar was registered twice
    #[error("duplicate registration for dispatch key '{0}'")]
    DuplicateMapping(String),
}

/// Request-time grammar violations.
///
/// Recoverable per-request: the offending line is rejected and the service
/// keeps serving. Serializable so a transport adapter can marshal the
/// rejection back to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseError {
    /// The request line contains no tokens
    #[error("empty request")]
    EmptyRequest,

    /// A quoted section was never closed
    #[error("unbalanced quotes in request")]
    UnbalancedQuotes,

    /// A token matched no option and could not be a positional argument
    #[error("unrecognized token: {0}")]
    UnrecognizedToken(String),

    /// An option requiring a value was not followed by one
    #[error("option {0} requires a value")]
    MissingValue(String),

    /// An option occurred outside its allowed count range
    #[error("option {option} occurred {found} time(s), allowed range is {min}..={max}")]
    CardinalityViolation {
        option: String,
        found: u32,
        min: u32,
        /// 0 means unlimited
        max: u32,
    },

    /// Too many or too few options from a constrained group were present
    #[error("group [{members}] has {found} option(s) present, allowed range is {min}..={max}")]
    GroupViolation {
        members: String,
        found: u32,
        min: u32,
        max: u32,
    },

    /// A present option is missing one of the options it needs
    #[error("option {needer} requires option {needee}")]
    MissingDependency { needer: String, needee: String },

    /// More positional arguments than the mapping allows
    #[error("too many positional arguments, at most {max} allowed")]
    TooManyArgs { max: u32 },
}

/// Failure raised by an invoked handler.
///
/// The payload is opaque to the routing core: it is forwarded to the caller
/// unmodified and never reinterpreted as a parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct HandlerError {
    /// Human-readable failure summary
    pub message: String,

    /// Optional structured detail supplied by the handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl HandlerError {
    /// Create a handler error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    /// Create a handler error carrying structured detail.
    pub fn with_detail(message: impl Into<String>, detail: Value) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail),
        }
    }
}

/// One candidate mapping's parse failure recorded during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingAttempt {
    /// Identifying name of the mapping, if one was assigned
    pub mapping: Option<String>,

    /// The candidate's dispatch key
    pub dispatch_key: String,

    /// Why this candidate rejected the line
    pub error: ParseError,
}

/// Errors returned to the transport adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Startup-time misconfiguration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request violated the grammar of the one mapping it selected
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No registered mapping validated the line; carries every candidate's
    /// parse failure so the caller can report the closest one
    #[error("no mapping matched the request ({} candidate(s) tried)", .attempts.len())]
    NoMatchingMapping { attempts: Vec<MappingAttempt> },

    /// The invoked handler itself failed
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_messages_name_the_offender() {
        let err = ParseError::CardinalityViolation {
            option: "NAME".to_string(),
            found: 2,
            min: 1,
            max: 1,
        };
        assert!(err.to_string().contains("NAME"));

        let err = ParseError::MissingDependency {
            needer: "ASYNC".to_string(),
            needee: "WAIT".to_string(),
        };
        assert!(err.to_string().contains("ASYNC"));
        assert!(err.to_string().contains("WAIT"));
    }

    #[test]
    fn handler_error_round_trips_detail() {
        let err = HandlerError::with_detail("boom", serde_json::json!({"code": 17}));
        let json = serde_json::to_string(&err).unwrap();
        let back: HandlerError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn handler_error_without_detail_skips_field() {
        let err = HandlerError::new("boom");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("detail"));
    }
}
