//! Error types for introspection parsing and IR construction.

use thiserror::Error;

/// Broad classification of schema-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input is not well-formed XML.
    XmlSyntax,
    /// The XML is well-formed but does not describe valid interfaces.
    SchemaViolation,
    /// A type signature does not follow the D-Bus grammar.
    TypeSignature,
}

/// Invalid D-Bus type signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type signature '{signature}': {reason}")]
pub struct SignatureError {
    /// The offending signature.
    pub signature: String,
    /// What is wrong with it.
    pub reason: String,
}

impl SignatureError {
    /// Creates a signature error.
    pub fn new(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            reason: reason.into(),
        }
    }
}

/// Error type for parsing and validating a single introspection document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed markup detected outside of the XML reader.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax {
        /// Byte offset in the document.
        position: u64,
        /// Error message.
        message: String,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Known element in a place it is not allowed.
    #[error("element '{element}' is not allowed inside '{context}'")]
    IllegalNesting {
        /// Element name.
        element: String,
        /// Parent context.
        context: String,
    },

    /// Duplicate definition within one container.
    #[error("duplicate {kind} '{name}' in {container}")]
    DuplicateDefinition {
        /// Kind of definition (interface, method, ...).
        kind: String,
        /// Name of the duplicate.
        name: String,
        /// Container holding both definitions.
        container: String,
    },

    /// Annotation with a value outside its domain.
    #[error("invalid value '{value}' for annotation '{name}' on {target}")]
    InvalidAnnotation {
        /// Annotation key.
        name: String,
        /// Rejected value.
        value: String,
        /// Annotated entity.
        target: String,
    },

    /// Invalid document structure.
    #[error("invalid document structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// Invalid type signature.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl ParseError {
    /// Creates a syntax error at the given position.
    pub fn syntax(position: u64, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an illegal nesting error.
    pub fn illegal_nesting(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::IllegalNesting {
            element: element.into(),
            context: context.into(),
        }
    }

    /// Creates a duplicate definition error.
    pub fn duplicate(
        kind: impl Into<String>,
        name: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
            container: container.into(),
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Xml(_) | Self::Syntax { .. } | Self::Utf8(_) => ErrorKind::XmlSyntax,
            Self::Signature(_) => ErrorKind::TypeSignature,
            _ => ErrorKind::SchemaViolation,
        }
    }
}

/// Error type for building the merged interface representation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Two documents declare the same interface with different members.
    #[error("interface '{name}' is declared more than once with different contents")]
    InterfaceCollision {
        /// Qualified interface name.
        name: String,
    },

    /// Invalid type signature.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl SchemaError {
    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(e) => e.kind(),
            Self::InterfaceCollision { .. } => ErrorKind::SchemaViolation,
            Self::Signature(_) => ErrorKind::TypeSignature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_kinds() {
        assert_eq!(
            ParseError::syntax(3, "unexpected text").kind(),
            ErrorKind::XmlSyntax
        );
        assert_eq!(
            ParseError::missing_attr("method", "name").kind(),
            ErrorKind::SchemaViolation
        );
        assert_eq!(
            ParseError::from(SignatureError::new("a", "truncated")).kind(),
            ErrorKind::TypeSignature
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ParseError::duplicate("method", "Run", "interface 'com.acme.Coyote'");
        assert_eq!(
            err.to_string(),
            "duplicate method 'Run' in interface 'com.acme.Coyote'"
        );

        let err = SchemaError::InterfaceCollision {
            name: "org.example.Foo".to_string(),
        };
        assert!(err.to_string().contains("org.example.Foo"));
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);
    }
}
