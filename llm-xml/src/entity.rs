//! Untyped XML capture.
//!
//! When no record type fits, [`Document::parse`] keeps the raw structure:
//! element names with their prefixes, attributes and text.

use tracing::debug;

use crate::composer::{CompactComposer, Composer, PrettyComposer};
use crate::error::{LlmXmlError, Result};
use crate::lexer::{Lexer, QName, Token};
use crate::serializer::SerializeOptions;

/// Any node of an untyped document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A whole document.
    Document(Document),
    /// An element.
    Element(Element),
    /// An attribute of an element.
    Attribute(Attribute),
    /// Character data.
    Value(String),
    /// A comment.
    Comment(String),
}

impl Entity {
    /// Render this entity as XML text.
    pub fn to_xml(&self, options: &SerializeOptions) -> String {
        if options.pretty {
            self.render(PrettyComposer::new(options.indent))
        } else {
            self.render(CompactComposer::new())
        }
    }

    fn render<C: Composer>(&self, mut composer: C) -> String {
        match self {
            Entity::Document(doc) => doc.root.write(&mut composer),
            Entity::Element(element) => element.write(&mut composer),
            Entity::Attribute(attribute) => attribute.write(&mut composer),
            Entity::Value(text) => {
                composer.append(text);
            }
            Entity::Comment(text) => write_comment(text, &mut composer),
        }
        composer.finish()
    }
}

impl From<Document> for Entity {
    fn from(doc: Document) -> Self {
        Entity::Document(doc)
    }
}

impl From<Element> for Entity {
    fn from(element: Element) -> Self {
        Entity::Element(element)
    }
}

impl From<Attribute> for Entity {
    fn from(attribute: Attribute) -> Self {
        Entity::Attribute(attribute)
    }
}

impl From<Content> for Entity {
    fn from(content: Content) -> Self {
        match content {
            Content::Element(element) => Entity::Element(element),
            Content::Value(text) => Entity::Value(text),
            Content::Comment(text) => Entity::Comment(text),
        }
    }
}

/// A document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document element.
    pub root: Element,
}

impl Document {
    /// Wrap `root` in a document.
    pub fn new(root: Element) -> Self {
        Document { root }
    }

    /// Capture `input` without a target type.
    ///
    /// The first significant content must be an element; anything after the
    /// root element is not read.
    pub fn parse(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        match lexer.next_token()? {
            Token::ElementStart(name) => {
                let root = parse_element(&mut lexer, name)?;
                debug!(root = %root.name, "captured document");
                Ok(Document { root })
            }
            other => Err(LlmXmlError::type_mismatch("element", other.describe())),
        }
    }

    /// Render the document as XML text.
    pub fn to_xml(&self, options: &SerializeOptions) -> String {
        if options.pretty {
            let mut composer = PrettyComposer::new(options.indent);
            self.root.write(&mut composer);
            composer.finish()
        } else {
            let mut composer = CompactComposer::new();
            self.root.write(&mut composer);
            composer.finish()
        }
    }
}

/// Content that can appear inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A child element.
    Element(Element),
    /// Text content.
    Value(String),
    /// A comment.
    Comment(String),
}

impl Content {
    /// Returns `Some(&str)` if this is text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Value(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `Some(&Element)` if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Content::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An attribute: `prefix:name="value"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
    /// Namespace prefix, if any.
    pub prefix: Option<String>,
}

impl Attribute {
    /// An unprefixed attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
            prefix: None,
        }
    }

    fn write<C: Composer>(&self, composer: &mut C) {
        if let Some(prefix) = &self.prefix {
            composer.append(prefix).append(":");
        }
        composer
            .append(&self.name)
            .append("=\"")
            .append(&self.value)
            .append("\"");
    }
}

/// An element with its attributes and content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Local name.
    pub name: String,
    /// Namespace prefix, if any.
    pub namespace: Option<String>,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Children in document order.
    pub content: Vec<Content>,
}

impl Element {
    /// Create a new element with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the namespace prefix.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.content.push(Content::Element(child));
        self
    }

    /// Add text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(Content::Value(text.into()));
        self
    }

    /// Add a comment.
    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.content.push(Content::Comment(text.into()));
        self
    }

    /// Value of the attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().find(|e| e.name == name)
    }

    /// Child elements, skipping text and comments.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(Content::as_element)
    }

    /// Text runs of this element joined by single spaces.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(Content::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write this element through `composer`. Attributes stay on the opening
    /// line; a lone text child stays inline.
    pub fn write<C: Composer>(&self, composer: &mut C) {
        composer.append("<");
        self.write_name(composer);
        for attribute in &self.attributes {
            composer.new_attribute();
            attribute.write(composer);
        }

        match self.content.as_slice() {
            [] => {
                composer.append("/>");
                return;
            }
            [Content::Value(text)] => {
                composer.append(">").append(text);
            }
            content => {
                composer.append(">").indent();
                for item in content {
                    composer.append_line();
                    match item {
                        Content::Element(child) => child.write(composer),
                        Content::Value(text) => {
                            composer.append(text);
                        }
                        Content::Comment(text) => write_comment(text, composer),
                    }
                }
                composer.unindent().append_line();
            }
        }

        composer.append("</");
        self.write_name(composer);
        composer.append(">");
    }

    fn write_name<C: Composer>(&self, composer: &mut C) {
        if let Some(namespace) = &self.namespace {
            composer.append(namespace).append(":");
        }
        composer.append(&self.name);
    }
}

fn write_comment<C: Composer>(text: &str, composer: &mut C) {
    composer.append("<!-- ").append(text).append(" -->");
}

fn owned(name: QName<'_>) -> (String, Option<String>) {
    (name.local.to_string(), name.prefix.map(str::to_string))
}

fn parse_element<'a>(lexer: &mut Lexer<'a>, name: QName<'a>) -> Result<Element> {
    let (local, namespace) = owned(name);
    let mut element = Element {
        name: local,
        namespace,
        ..Default::default()
    };

    loop {
        match lexer.next_token()? {
            Token::AttributeName(attr) => {
                let value = match lexer.next_token()? {
                    Token::AttributeValue(value) => value.into_owned(),
                    _ => String::new(),
                };
                let (name, prefix) = owned(attr);
                element.attributes.push(Attribute {
                    name,
                    value,
                    prefix,
                });
            }
            Token::ElementStartEnd => break,
            Token::ElementEnd(None) => return Ok(element),
            other => {
                return Err(malformed_at(
                    lexer,
                    format!("unexpected {} in start tag of `{name}`", other.describe()),
                ));
            }
        }
    }

    loop {
        match lexer.next_token()? {
            Token::ElementStart(child) => {
                let child = parse_element(lexer, child)?;
                element.content.push(Content::Element(child));
            }
            Token::Text(text) => element.content.push(Content::Value(text.into_owned())),
            Token::ElementEnd(Some(end)) if end == name => return Ok(element),
            Token::ElementEnd(Some(end)) => {
                return Err(malformed_at(
                    lexer,
                    format!("expected closing tag `{name}`, found `{end}`"),
                ));
            }
            Token::DocumentEnd => {
                return Err(malformed_at(
                    lexer,
                    format!("unexpected end of document inside `{name}`"),
                ));
            }
            other => {
                return Err(malformed_at(
                    lexer,
                    format!("unexpected {} inside `{name}`", other.describe()),
                ));
            }
        }
    }
}

fn malformed_at(lexer: &Lexer<'_>, msg: String) -> LlmXmlError {
    let pos = lexer.position();
    LlmXmlError::malformed(msg).with_span(pos..pos)
}
