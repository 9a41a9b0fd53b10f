#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod composer;
mod deserializer;
mod entity;
mod error;
mod lexer;
mod schema;
mod serializer;

use serde::{Deserialize, Serialize};
use tracing::Dispatch;

pub use composer::{CompactComposer, Composer, PrettyComposer};
pub use entity::{Attribute, Content, Document, Element, Entity};
pub use error::{ErrorKind, LlmXmlError, Result};
pub use lexer::{Lexer, QName, Token};
pub use schema::{FieldDecl, FieldKind, LlmSchema, RecordSchema, Schemas};
pub use serializer::{SerializeOptions, serialize_into};

/// A configured LLM XML format.
///
/// Holds the record declarations used on both directions, the output
/// options, and optionally a `tracing` dispatcher that receives every event
/// emitted while encoding or decoding.
///
/// ```
/// use llm_xml::{FieldDecl, LlmSchema, LlmXml, RecordSchema};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Answer {
///     text: String,
/// }
///
/// impl LlmSchema for Answer {
///     fn llm_schema() -> RecordSchema {
///         RecordSchema::new("Answer").field(FieldDecl::scalar("text").prompt("your answer"))
///     }
/// }
///
/// let format = LlmXml::of::<Answer>();
/// let prompt = format.to_string(&Answer { text: String::new() }).unwrap();
/// assert_eq!(prompt, "<Answer>\n  <text>{... your answer ...}</text>\n</Answer>");
///
/// let answer: Answer = format.from_str("<Answer><text>42</text></Answer>").unwrap();
/// assert_eq!(answer.text, "42");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LlmXml {
    schemas: Schemas,
    options: SerializeOptions,
    dispatch: Option<Dispatch>,
}

impl LlmXml {
    /// A format with no declarations: every field is written as its value.
    pub fn new() -> Self {
        Self::default()
    }

    /// A format holding the declarations of `T` and the records it reaches.
    pub fn of<T: LlmSchema>() -> Self {
        Self {
            schemas: Schemas::of::<T>(),
            ..Self::default()
        }
    }

    /// Add the declarations of `T` and the records it reaches.
    pub fn register<T: LlmSchema>(mut self) -> Self {
        self.schemas.register::<T>();
        self
    }

    /// Use `options` for output.
    pub fn with_options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    /// Send this format's `tracing` events to `dispatch` instead of the
    /// ambient subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// The registered declarations.
    pub fn schemas(&self) -> &Schemas {
        &self.schemas
    }

    /// The output options.
    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    fn scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    /// Encode `value` as a prompt template.
    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        self.scoped(|| serializer::serialize(value, &self.schemas, &self.options))
    }

    /// Decode a `T` from model output.
    pub fn from_str<'de, T: Deserialize<'de>>(&self, input: &'de str) -> Result<T> {
        self.scoped(|| deserializer::deserialize(input, &self.schemas))
            .map_err(|e| e.with_source(input))
    }

    /// Capture `input` as an untyped [`Document`].
    pub fn parse_document(&self, input: &str) -> Result<Document> {
        self.scoped(|| Document::parse(input))
            .map_err(|e| e.with_source(input))
    }
}

/// Encode `value` as a prompt template using the declarations of `T`.
///
/// ```
/// use llm_xml::{FieldDecl, LlmSchema, RecordSchema};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Tags {
///     tags: Vec<String>,
/// }
///
/// impl LlmSchema for Tags {
///     fn llm_schema() -> RecordSchema {
///         RecordSchema::new("Tags")
///             .field(FieldDecl::list("tags").element_tag("tag").element_prompt("one tag"))
///     }
/// }
///
/// let xml = llm_xml::to_string(&Tags { tags: vec!["rust".into()] }).unwrap();
/// assert_eq!(
///     xml,
///     "<Tags>\n  <tags>\n    <tag>{... one tag ...}</tag>\n    {... other \"tag\" entries ...}\n  </tags>\n</Tags>"
/// );
/// ```
pub fn to_string<T: Serialize + LlmSchema>(value: &T) -> Result<String> {
    to_string_with_options(value, &SerializeOptions::default())
}

/// Encode `value` with custom output options.
pub fn to_string_with_options<T: Serialize + LlmSchema>(
    value: &T,
    options: &SerializeOptions,
) -> Result<String> {
    serializer::serialize(value, &Schemas::of::<T>(), options)
}

/// Decode a `T` from model output using the declarations of `T`.
///
/// ```
/// use llm_xml::{FieldDecl, LlmSchema, RecordSchema};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Tags {
///     tags: Vec<String>,
/// }
///
/// impl LlmSchema for Tags {
///     fn llm_schema() -> RecordSchema {
///         RecordSchema::new("Tags").field(FieldDecl::list("tags").element_tag("tag"))
///     }
/// }
///
/// let reply = "Sure! <Tags><tags><tag>rust</tag><tag>xml</tag></tags></Tags>";
/// let tags: Tags = llm_xml::from_str(reply).unwrap();
/// assert_eq!(tags.tags, ["rust", "xml"]);
///
/// let none: Tags = llm_xml::from_str("<Tags></Tags>").unwrap();
/// assert!(none.tags.is_empty());
/// ```
pub fn from_str<'de, T: Deserialize<'de> + LlmSchema>(input: &'de str) -> Result<T> {
    deserializer::deserialize(input, &Schemas::of::<T>()).map_err(|e| e.with_source(input))
}

/// Capture `input` as an untyped [`Document`].
pub fn parse_document(input: &str) -> Result<Document> {
    Document::parse(input).map_err(|e| e.with_source(input))
}
