//! Error types for code generation.

use crate::version::VersionError;
use thiserror::Error;

/// Distinguishable failure classes reported to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed markup.
    XmlSyntax,
    /// Well-formed XML that is not a valid interface description.
    SchemaViolation,
    /// Invalid type signature.
    TypeSignature,
    /// Version string with a non-numeric component.
    VersionFormat,
    /// Version outside the supported or requested range.
    VersionRange,
    /// Zero or several output modes requested.
    OutputModeConflict,
}

impl From<dbusgen_schema::ErrorKind> for ErrorKind {
    fn from(kind: dbusgen_schema::ErrorKind) -> Self {
        match kind {
            dbusgen_schema::ErrorKind::XmlSyntax => Self::XmlSyntax,
            dbusgen_schema::ErrorKind::SchemaViolation => Self::SchemaViolation,
            dbusgen_schema::ErrorKind::TypeSignature => Self::TypeSignature,
        }
    }
}

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Document parse or validation error.
    #[error("{0}")]
    Parse(#[from] dbusgen_schema::ParseError),

    /// Error while merging documents.
    #[error("{0}")]
    Schema(#[from] dbusgen_schema::SchemaError),

    /// Invalid version bounds.
    #[error("{0}")]
    Version(#[from] VersionError),

    /// Not exactly one output mode requested.
    #[error("exactly one output mode must be requested, got {requested}")]
    OutputModeConflict {
        /// Number of modes requested.
        requested: usize,
    },
}

impl CodegenError {
    /// Creates an output mode conflict error.
    #[must_use]
    pub fn mode_conflict(requested: usize) -> Self {
        Self::OutputModeConflict { requested }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(e) => e.kind().into(),
            Self::Schema(e) => e.kind().into(),
            Self::Version(VersionError::Format { .. }) => ErrorKind::VersionFormat,
            Self::Version(VersionError::Range { .. }) => ErrorKind::VersionRange,
            Self::OutputModeConflict { .. } => ErrorKind::OutputModeConflict,
        }
    }
}
