//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred during template parsing.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of template parse error.
#[derive(Debug, Clone, Error)]
pub enum ParseErrorKind {
    /// An unexpected token was encountered.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },

    /// A tag was never closed.
    #[error("unclosed tag: <{tag}>")]
    UnclosedTag {
        /// The name of the unclosed tag.
        tag: String,
    },

    /// A closing tag did not match the open element.
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        /// The expected tag name.
        expected: String,
        /// The found tag name.
        found: String,
    },

    /// An HTML comment was never closed.
    #[error("unclosed comment")]
    UnclosedComment,

    /// An attribute value was never closed.
    #[error("unclosed attribute value for {name}")]
    UnclosedAttributeValue {
        /// The attribute name.
        name: String,
    },

    /// A meta element was missing a required attribute.
    #[error("<{tag}> requires the {attribute} attribute")]
    MissingMetaAttribute {
        /// The meta element tag.
        tag: String,
        /// The missing attribute.
        attribute: String,
    },
}

/// Attempting to register an attribute pattern after the registry froze.
#[derive(Debug, Clone, Copy, Error)]
#[error("attribute pattern registry is frozen after first analysis")]
pub struct RegistryFrozen;
