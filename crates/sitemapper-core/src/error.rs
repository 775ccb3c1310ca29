//! Error types for the sitemapper core library.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The class of a validation violation.
///
/// Lets callers tell "a required field is missing" apart from "a value is
/// out of its protocol range" and "a keyword is not in the allowed
/// enumeration" without parsing error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A field the protocol requires is absent or empty.
    MissingField,

    /// A numeric value lies outside its protocol range.
    OutOfRange,

    /// A keyword is not part of the allowed enumeration.
    InvalidEnum,
}

impl ViolationKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing required field",
            Self::OutOfRange => "value out of range",
            Self::InvalidEnum => "invalid enumeration value",
        }
    }
}

/// Core error types for sitemap generation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A URL could not be parsed or resolved to an absolute form.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A loose input value could not be converted to its strict form.
    #[error("invalid value for {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },

    /// An entry violated a protocol constraint at `error` validation level.
    #[error("validation failed on {field} ({}): {detail}", .kind.as_str())]
    Validation {
        field: &'static str,
        kind: ViolationKind,
        detail: String,
    },

    /// Configuration loading or precondition error.
    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new invalid-value error.
    pub fn invalid_value(field: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            detail: detail.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation(field: &'static str, kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self::Validation {
            field,
            kind,
            detail: detail.into(),
        }
    }

    /// The violation kind, if this is a validation error.
    pub fn violation_kind(&self) -> Option<ViolationKind> {
        match self {
            Self::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
