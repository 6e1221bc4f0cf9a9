//! Error types for protocol parsing and configuration.

use thiserror::Error;

/// Result type for wire protocol parsing.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Result type for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reasons an eye tracking datagram is rejected.
///
/// Any of these discards the whole packet; the previously published
/// eye positions stay in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The datagram is not valid UTF-8.
    #[error("Packet is not valid UTF-8")]
    NotUtf8,

    /// An opening or closing tag is absent.
    #[error("Missing tag: {0}")]
    MissingTag(&'static str),

    /// The closing tag only appears before the opening tag.
    #[error("Closing tag precedes opening tag: {0}")]
    TagOrder(&'static str),

    /// The field does not hold exactly three components.
    #[error("Field {tag} has {found} components, expected 3")]
    ComponentCount {
        /// Field name.
        tag: &'static str,
        /// Number of comma separated components found.
        found: usize,
    },

    /// A component is not a decimal number.
    #[error("Field {tag} has invalid number {value:?}")]
    InvalidNumber {
        /// Field name.
        tag: &'static str,
        /// The offending text.
        value: String,
    },

    /// A component parsed to infinity or NaN.
    #[error("Field {tag} has a non-finite component")]
    NonFinite {
        /// Field name.
        tag: &'static str,
    },
}

impl ProtocolError {
    /// Short machine-readable reason, used as a metrics label.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotUtf8 => "not_utf8",
            Self::MissingTag(_) => "missing_tag",
            Self::TagOrder(_) => "tag_order",
            Self::ComponentCount { .. } => "component_count",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::NonFinite { .. } => "non_finite",
        }
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value is out of its permitted range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
