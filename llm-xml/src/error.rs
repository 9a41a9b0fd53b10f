//! Error types for LLM XML encoding and decoding.

use std::{
    borrow::Cow,
    error::Error,
    fmt::{self, Display},
};

use miette::SourceSpan;

/// Error type for both directions of the codec.
#[derive(Debug)]
pub struct LlmXmlError {
    /// The specific kind of error
    pub(crate) kind: ErrorKind,
    /// Source code for diagnostics
    pub(crate) source_code: Option<String>,
    /// Primary span where the error occurred
    pub(crate) span: Option<SourceSpan>,
}

/// Result alias used throughout the crate.
pub type Result<T, E = LlmXmlError> = core::result::Result<T, E>;

impl LlmXmlError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Byte span of the input the error points at, if known.
    pub fn span(&self) -> Option<SourceSpan> {
        self.span
    }

    /// Create a new error with the given kind.
    pub(crate) fn new(kind: impl Into<ErrorKind>) -> Self {
        LlmXmlError {
            kind: kind.into(),
            source_code: None,
            span: None,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInput(msg.into()))
    }

    pub(crate) fn type_mismatch(expected: &'static str, found: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected,
            found: found.into(),
        })
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedValue(msg.into()))
    }

    /// Attach source code to this error for diagnostics.
    ///
    /// Only errors that point into the input (those with a span) keep it.
    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Self {
        if self.span.is_some() {
            self.source_code = Some(source.into());
        }
        self
    }

    /// Attach a span to this error for diagnostics.
    pub(crate) fn with_span(mut self, span: impl Into<SourceSpan>) -> Self {
        self.span = Some(span.into());
        self
    }
}

impl Display for LlmXmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}

impl Error for LlmXmlError {}

impl<K: Into<ErrorKind>> From<K> for LlmXmlError {
    fn from(value: K) -> Self {
        LlmXmlError::new(value)
    }
}

/// Detailed classification of codec errors.
///
/// Structural problems abort the call. Scalar text that fails to convert
/// (for example `abc` in an integer field) is not an error: the field gets
/// its type's zero value instead.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Lexical or structural violation in the input: unterminated construct,
    /// illegal character in an attribute value, mismatched closing tag or
    /// premature end of input.
    MalformedInput(String),
    /// A decode or encode site received a shape the target type can't take.
    TypeMismatch {
        /// The shape the site demanded.
        expected: &'static str,
        /// The shape that was found.
        found: Cow<'static, str>,
    },
    /// The value has no representation in this format (for example `None`).
    UnsupportedValue(String),
    /// Message raised by a `Serialize` / `Deserialize` implementation, such as
    /// a missing field or an unknown enum variant.
    Custom(String),
}

impl ErrorKind {
    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput(_) => "llm_xml::malformed_input",
            ErrorKind::TypeMismatch { .. } => "llm_xml::type_mismatch",
            ErrorKind::UnsupportedValue(_) => "llm_xml::unsupported_value",
            ErrorKind::Custom(_) => "llm_xml::custom",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            ErrorKind::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            ErrorKind::UnsupportedValue(msg) => write!(f, "unsupported value: {msg}"),
            ErrorKind::Custom(msg) => f.write_str(msg),
        }
    }
}

impl serde::ser::Error for LlmXmlError {
    fn custom<T: Display>(msg: T) -> Self {
        LlmXmlError::new(ErrorKind::Custom(msg.to_string()))
    }
}

impl serde::de::Error for LlmXmlError {
    fn custom<T: Display>(msg: T) -> Self {
        LlmXmlError::new(ErrorKind::Custom(msg.to_string()))
    }
}

// ============================================================================
// Diagnostic Implementation
// ============================================================================

impl miette::Diagnostic for LlmXmlError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let span = self.span?;
        let label = match &self.kind {
            ErrorKind::MalformedInput(msg) => msg.clone(),
            ErrorKind::TypeMismatch { expected, .. } => format!("expected {expected} here"),
            _ => "error occurred here".to_string(),
        };
        Some(Box::new(std::iter::once(miette::LabeledSpan::at(
            span, label,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            ErrorKind::UnsupportedValue(_) => Some(Box::new(
                "absent values have no XML form here; default optional fields before encoding",
            )),
            _ => None,
        }
    }
}
