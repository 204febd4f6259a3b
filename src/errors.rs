/*!
 * Error types for the kbp2ass application.
 *
 * The conversion pipeline reports three kinds of failure: malformed KBP
 * input, a document that breaks a structural invariant, and option values
 * that cannot be honoured. All of them are defined with the thiserror crate
 * and wrapped by `ConversionError` for callers that just want "it failed".
 */

use thiserror::Error;

/// Malformed or unparseable KBP input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message} (found '{found}', expected {expected})")]
pub struct FormatError {
    /// 1-based line number in the source text
    pub line: usize,

    /// What went wrong
    pub message: String,

    /// The offending text or field value
    pub found: String,

    /// Description of the pattern that was expected at this point
    pub expected: String,
}

impl FormatError {
    // @creates: Format error at a source line
    pub fn new(line: usize, message: impl Into<String>, found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            found: found.into(),
            expected: expected.into(),
        }
    }
}

/// A built document that violates a structural invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A line refers to a style slot that is not in the style table
    #[error("page {page}, line {line}: style slot {slot} is not defined")]
    UnknownStyle {
        /// 1-based page number
        page: usize,
        /// 1-based line number within the page
        line: usize,
        /// Referenced style slot
        slot: u8,
    },

    /// A page without any line
    #[error("page {page} has no lines")]
    EmptyPage {
        /// 1-based page number
        page: usize,
    },
}

/// Option values that are out of range or contradictory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Fade durations must not be negative
    #[error("{which} must not be negative, got {value}ms")]
    NegativeFade {
        /// Either "fade_in" or "fade_out"
        which: &'static str,
        /// Rejected value in milliseconds
        value: i64,
    },

    /// Target canvas dimensions must be positive
    #[error("target canvas must be positive, got {x}x{y}")]
    InvalidCanvas {
        /// Requested width
        x: i64,
        /// Requested height
        y: i64,
    },

    /// Time offset beyond the supported range
    #[error("offset {value}ms is outside of the supported range of +/-{limit}ms")]
    OffsetOutOfRange {
        /// Rejected offset in milliseconds
        value: i64,
        /// Largest accepted magnitude
        limit: i64,
    },
}

/// Any failure of the KBP to ASS pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Error while parsing the source document
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Error while resolving the document layout
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Error in the supplied options
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the conversion pipeline
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error loading the configuration file
    #[error("Config error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<FormatError> for AppError {
    fn from(error: FormatError) -> Self {
        Self::Conversion(error.into())
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}
