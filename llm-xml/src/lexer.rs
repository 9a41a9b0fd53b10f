//! On-demand XML tokenizer.
//!
//! The lexer never builds a tree. It hands out one [`Token`] per call to
//! [`Lexer::next_token`], switching between two grammars based on the last
//! token it scanned: markup mode (between tags) and tag-interior mode (after an
//! element name or attribute). Tokens handed back with [`Lexer::push_back`]
//! are replayed first, newest first.

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use crate::error::{LlmXmlError, Result};

/// A possibly prefixed XML name, such as `item` or `soap:Body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    /// Text before the `:` separator, if any.
    pub prefix: Option<&'a str>,
    /// The local part of the name.
    pub local: &'a str,
}

impl<'a> QName<'a> {
    /// A name without a prefix.
    pub const fn local(local: &'a str) -> Self {
        QName {
            prefix: None,
            local,
        }
    }

    /// Split `raw` on its namespace separator. More than one `:` is malformed.
    pub fn parse(raw: &'a str) -> Result<Self> {
        match raw.split_once(':') {
            None => Ok(QName::local(raw)),
            Some((_, local)) if local.contains(':') => Err(LlmXmlError::malformed(format!(
                "name `{raw}` has more than one `:` separator"
            ))),
            Some((prefix, local)) => Ok(QName {
                prefix: Some(prefix),
                local,
            }),
        }
    }
}

impl fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(self.local),
        }
    }
}

/// One lexical unit of XML input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Nothing scanned yet.
    None,
    /// `<name` of a start tag.
    ElementStart(QName<'a>),
    /// The `>` closing a start tag.
    ElementStartEnd,
    /// `</name>`, or `/>` (no name) for a self-closing element.
    ElementEnd(Option<QName<'a>>),
    /// An attribute name inside a start tag.
    AttributeName(QName<'a>),
    /// The quoted value following an attribute name.
    AttributeValue(Cow<'a, str>),
    /// An attribute that had no `=value` part.
    AttributeEnd,
    /// Trimmed character data, with CDATA sections inlined.
    Text(Cow<'a, str>),
    /// End of input. Every read after the first one returns this again.
    DocumentEnd,
}

impl Token<'_> {
    /// Short human-readable description, used in error messages.
    pub fn describe(&self) -> Cow<'static, str> {
        match self {
            Token::None => "nothing".into(),
            Token::ElementStart(name) => format!("start of element `{name}`").into(),
            Token::ElementStartEnd => "end of start tag".into(),
            Token::ElementEnd(Some(name)) => format!("closing tag `{name}`").into(),
            Token::ElementEnd(None) => "self-closing tag".into(),
            Token::AttributeName(name) => format!("attribute `{name}`").into(),
            Token::AttributeValue(_) => "attribute value".into(),
            Token::AttributeEnd => "end of attribute".into(),
            Token::Text(_) => "text".into(),
            Token::DocumentEnd => "end of document".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Markup,
    TagInterior,
    AttributeValue,
    Finished,
}

/// Streaming tokenizer over an in-memory document.
///
/// Cloning a lexer gives an independent cursor over the same source, which
/// is how callers explore ahead without disturbing the original.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    pushed_back: Vec<Token<'a>>,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        trace!(len = source.len(), "creating lexer");
        Lexer {
            source,
            pos: 0,
            pushed_back: Vec::new(),
            mode: Mode::Markup,
        }
    }

    /// Byte offset of the cursor in the source.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The full source text.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Unread a token. The next call to [`Lexer::next_token`] returns it.
    pub fn push_back(&mut self, token: Token<'a>) {
        self.pushed_back.push(token);
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        if let Some(token) = self.pushed_back.pop() {
            trace!(?token, "replaying pushed back token");
            return Ok(token);
        }

        let token = match self.mode {
            Mode::Finished => return Ok(Token::DocumentEnd),
            Mode::Markup => self.scan_markup()?,
            Mode::TagInterior => self.scan_tag_interior()?,
            Mode::AttributeValue => self.scan_attribute_value()?,
        };

        self.mode = match &token {
            Token::ElementStart(_) | Token::AttributeValue(_) | Token::AttributeEnd => {
                Mode::TagInterior
            }
            Token::AttributeName(_) => Mode::AttributeValue,
            Token::DocumentEnd => Mode::Finished,
            _ => Mode::Markup,
        };
        trace!(?token, pos = self.pos, "token");
        Ok(token)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        self.pos += rest.len() - trimmed.len();
    }

    fn error_here(&self, msg: impl Into<String>) -> LlmXmlError {
        LlmXmlError::malformed(msg).with_span(self.pos..self.pos)
    }

    /// Move the cursor past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<()> {
        let start = self.pos;
        match self.rest().find(terminator) {
            Some(offset) => {
                self.pos += offset + terminator.len();
                Ok(())
            }
            None => Err(LlmXmlError::malformed(format!("unterminated {what}"))
                .with_span(start..self.source.len())),
        }
    }

    fn read_qname(&mut self) -> Result<QName<'a>> {
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '=' | '<' | '"' | '\''))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error_here("expected a name"));
        }
        self.pos += len;
        QName::parse(&rest[..len]).map_err(|e| e.with_span(start..self.pos))
    }

    fn scan_markup(&mut self) -> Result<Token<'a>> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();

            if rest.is_empty() {
                return Ok(Token::DocumentEnd);
            }
            if rest.starts_with("<![CDATA[") {
                return self.read_text();
            }
            if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
                continue;
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
                continue;
            }
            if rest.starts_with("<!") {
                self.skip_past(">", "declaration")?;
                continue;
            }
            if rest.starts_with("</") {
                self.pos += 2;
                let name = self.read_qname()?;
                self.skip_whitespace();
                if !self.rest().starts_with('>') {
                    return Err(self.error_here(format!("unterminated closing tag `{name}`")));
                }
                self.pos += 1;
                return Ok(Token::ElementEnd(Some(name)));
            }
            if opens_markup(rest) {
                self.pos += 1;
                return Ok(Token::ElementStart(self.read_qname()?));
            }
            return self.read_text();
        }
    }

    fn scan_tag_interior(&mut self) -> Result<Token<'a>> {
        self.skip_whitespace();
        let rest = self.rest();
        if rest.starts_with("/>") {
            self.pos += 2;
            Ok(Token::ElementEnd(None))
        } else if rest.starts_with('>') {
            self.pos += 1;
            Ok(Token::ElementStartEnd)
        } else if rest.is_empty() {
            Err(self.error_here("unexpected end of input inside a tag"))
        } else if rest.starts_with(['<', '/']) {
            Err(self.error_here("unterminated start tag"))
        } else {
            Ok(Token::AttributeName(self.read_qname()?))
        }
    }

    fn scan_attribute_value(&mut self) -> Result<Token<'a>> {
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Ok(Token::AttributeEnd);
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            Some(_) => return Err(self.error_here("attribute value must be quoted")),
            None => return Err(self.error_here("unexpected end of input in attribute")),
        };
        let open = self.pos;
        let body = &self.rest()[1..];
        let Some(len) = body.find(quote) else {
            return Err(LlmXmlError::malformed("unterminated attribute value")
                .with_span(open..self.source.len()));
        };
        let value = &body[..len];
        if let Some(bad) = value.find(['<', '&']) {
            let at = open + 1 + bad;
            return Err(LlmXmlError::malformed(format!(
                "`{}` is not allowed in an attribute value",
                &value[bad..bad + 1]
            ))
            .with_span(at..at + 1));
        }
        self.pos = open + 1 + len + 1;
        Ok(Token::AttributeValue(Cow::Borrowed(value)))
    }

    /// Read a text run up to the next `<` that opens a tag, comment or
    /// declaration. CDATA sections are inlined.
    fn read_text(&mut self) -> Result<Token<'a>> {
        let source = self.source;
        let start = self.pos;
        let mut owned: Option<String> = None;
        let mut run_start = self.pos;

        loop {
            let Some(offset) = source[self.pos..].find(['<', '&']) else {
                return Err(LlmXmlError::malformed("unexpected end of input in text content")
                    .with_span(start..source.len()));
            };
            let at = self.pos + offset;
            let tail = &source[at..];

            if let Some(cdata) = tail.strip_prefix("<![CDATA[") {
                let Some(len) = cdata.find("]]>") else {
                    return Err(LlmXmlError::malformed("unterminated CDATA section")
                        .with_span(at..source.len()));
                };
                let buf = owned.get_or_insert_with(String::new);
                buf.push_str(&source[run_start..at]);
                buf.push_str(&cdata[..len]);
                self.pos = at + "<![CDATA[".len() + len + "]]>".len();
                run_start = self.pos;
            } else if tail.starts_with('<') {
                if opens_markup(tail) {
                    self.pos = at;
                    break;
                }
                // stray `<`, kept as text
                self.pos = at + 1;
            } else if let Some((resolved, len)) = resolve_entity(tail) {
                let buf = owned.get_or_insert_with(String::new);
                buf.push_str(&source[run_start..at]);
                buf.push(resolved);
                self.pos = at + len;
                run_start = self.pos;
            } else {
                // unknown reference, kept verbatim
                self.pos = at + 1;
            }
        }

        let text = match owned {
            None => Cow::Borrowed(source[start..self.pos].trim()),
            Some(mut buf) => {
                buf.push_str(&source[run_start..self.pos]);
                Cow::Owned(buf.trim().to_string())
            }
        };
        Ok(Token::Text(text))
    }
}

/// Whether the `<` at the start of `tail` begins markup rather than text.
fn opens_markup(tail: &str) -> bool {
    let mut chars = tail.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || matches!(c, '_' | ':' | '/' | '!' | '?'))
}

/// Resolve a character reference at the start of `tail` (which begins with
/// `&`). Returns the character and the length of the reference.
fn resolve_entity(tail: &str) -> Option<(char, usize)> {
    let semi = tail.bytes().take(12).position(|b| b == b';')?;
    let raw = &tail[1..semi];
    let ch = match raw {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let rest = raw.strip_prefix('#')?;
            let code = match rest.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => rest.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((ch, semi + 1))
}
