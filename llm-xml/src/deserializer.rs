//! Decoding engine: tolerant XML to serde values.
//!
//! Tokens are pulled from the [`Lexer`] as serde asks for values, so no tree
//! is built. Elements are matched to record fields by name, unknown elements
//! are skipped, and scalar text that does not parse falls back to the type's
//! zero value.

use std::borrow::Cow;
use std::str::FromStr;

use serde::de::value::{BorrowedStrDeserializer, CowStrDeserializer};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use tracing::{debug, trace, warn};

use crate::error::{LlmXmlError, Result};
use crate::lexer::{Lexer, QName, Token};
use crate::schema::{FieldDecl, FieldKind, RecordSchema, Schemas};

/// Decode a `T` from `input` using the declarations in `schemas`.
pub(crate) fn deserialize<'de, T: de::Deserialize<'de>>(
    input: &'de str,
    schemas: &Schemas,
) -> Result<T> {
    let mut de = Deserializer {
        lexer: Lexer::new(input),
        schemas,
    };
    T::deserialize(RootDeserializer { de: &mut de })
}

struct Deserializer<'de, 's> {
    lexer: Lexer<'de>,
    schemas: &'s Schemas,
}

impl<'de, 's> Deserializer<'de, 's> {
    fn next(&mut self) -> Result<Token<'de>> {
        self.lexer.next_token()
    }

    fn malformed(&self, msg: impl Into<String>) -> LlmXmlError {
        let pos = self.lexer.position();
        LlmXmlError::malformed(msg).with_span(pos..pos)
    }

    fn unexpected_end(&self, name: QName<'_>) -> LlmXmlError {
        self.malformed(format!("unexpected end of document inside `{name}`"))
    }

    fn expect_close(&self, name: QName<'_>, end: QName<'_>) -> Result<()> {
        if name == end {
            Ok(())
        } else {
            Err(self.malformed(format!(
                "expected closing tag `{name}`, found `{end}`"
            )))
        }
    }

    /// Consume the rest of a start tag. Returns `false` for `<name/>`.
    fn open(&mut self, name: QName<'de>) -> Result<bool> {
        loop {
            match self.next()? {
                Token::ElementStartEnd => return Ok(true),
                Token::ElementEnd(None) => return Ok(false),
                Token::AttributeName(_) | Token::AttributeValue(_) | Token::AttributeEnd => {}
                Token::DocumentEnd => return Err(self.unexpected_end(name)),
                other => {
                    return Err(self.malformed(format!(
                        "unexpected {} in start tag of `{name}`",
                        other.describe()
                    )));
                }
            }
        }
    }

    /// Skip an element whose start token has been read, children included.
    fn skip_element(&mut self, name: QName<'de>) -> Result<()> {
        trace!(%name, "skipping element");
        if !self.open(name)? {
            return Ok(());
        }
        loop {
            match self.next()? {
                Token::ElementStart(child) => self.skip_element(child)?,
                Token::ElementEnd(Some(end)) => return self.expect_close(name, end),
                Token::DocumentEnd => return Err(self.unexpected_end(name)),
                _ => {}
            }
        }
    }

    /// Whether the element whose start token has been read has no content.
    ///
    /// An empty element is consumed. Otherwise every peeked token is pushed
    /// back so the next read sees the element untouched.
    fn is_empty_element(&mut self, name: QName<'de>) -> Result<bool> {
        let mut peeked = Vec::new();
        let empty = loop {
            let token = self.next()?;
            match token {
                Token::AttributeName(_) | Token::AttributeValue(_) | Token::AttributeEnd => {
                    peeked.push(token)
                }
                Token::ElementEnd(None) => break true,
                Token::ElementStartEnd => {
                    let after = self.next()?;
                    if matches!(&after, Token::ElementEnd(Some(end)) if *end == name) {
                        break true;
                    }
                    peeked.push(token);
                    peeked.push(after);
                    break false;
                }
                _ => {
                    peeked.push(token);
                    break false;
                }
            }
        };

        if !empty {
            for token in peeked.into_iter().rev() {
                self.lexer.push_back(token);
            }
        }
        Ok(empty)
    }

    /// Read the text of an element whose start token has been read, up to and
    /// including its closing tag. Child elements are skipped.
    fn read_text(&mut self, name: QName<'de>) -> Result<Cow<'de, str>> {
        if !self.open(name)? {
            return Ok(Cow::Borrowed(""));
        }
        let mut text: Option<Cow<'de, str>> = None;
        loop {
            match self.next()? {
                Token::Text(run) => {
                    text = Some(match text.take() {
                        None => run,
                        Some(prev) => Cow::Owned(format!("{prev} {run}")),
                    });
                }
                Token::ElementStart(child) => {
                    debug!(%name, %child, "skipping element inside scalar content");
                    self.skip_element(child)?;
                }
                Token::ElementEnd(Some(end)) => {
                    self.expect_close(name, end)?;
                    return Ok(text.unwrap_or(Cow::Borrowed("")));
                }
                Token::DocumentEnd => return Err(self.unexpected_end(name)),
                other => {
                    return Err(self.malformed(format!(
                        "unexpected {} inside `{name}`",
                        other.describe()
                    )));
                }
            }
        }
    }
}

fn parse_or_default<T: FromStr + Default>(text: &str, name: QName<'_>) -> T {
    text.parse().unwrap_or_else(|_| {
        warn!(element = %name, text, "unparseable value, using default");
        T::default()
    })
}

// ============================================================================
// Document root
// ============================================================================

struct RootDeserializer<'a, 'de, 's> {
    de: &'a mut Deserializer<'de, 's>,
}

impl<'de> de::Deserializer<'de> for RootDeserializer<'_, 'de, '_> {
    type Error = LlmXmlError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(LlmXmlError::type_mismatch("record", "a non-record type"))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        loop {
            match self.de.next()? {
                Token::ElementStart(root) => {
                    debug!(record = name, element = %root, "decoding document");
                    let element = ElementDeserializer {
                        de: self.de,
                        name: root,
                        decl: None,
                    };
                    return de::Deserializer::deserialize_struct(element, name, fields, visitor);
                }
                Token::DocumentEnd => {
                    return Err(LlmXmlError::type_mismatch("record", "end of document"));
                }
                other => trace!(token = ?other, "skipping content before the root element"),
            }
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct seq tuple tuple_struct map
        enum identifier ignored_any
    }
}

// ============================================================================
// Elements
// ============================================================================

/// Deserializer for one element whose start token has been read.
struct ElementDeserializer<'a, 'de, 's> {
    de: &'a mut Deserializer<'de, 's>,
    name: QName<'de>,
    decl: Option<&'s FieldDecl>,
}

impl<'a, 'de, 's> ElementDeserializer<'a, 'de, 's> {
    fn is_list(&self) -> bool {
        self.decl.is_some_and(FieldDecl::is_list)
    }

    fn scalar_text(self, shape: &'static str) -> Result<Cow<'de, str>> {
        if self.is_list() {
            return Err(LlmXmlError::type_mismatch("sequence", shape));
        }
        self.de.read_text(self.name)
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                let name = self.name;
                let text = self.scalar_text(stringify!($ty))?;
                visitor.$visit(parse_or_default::<$ty>(&text, name))
            }
        )*
    };
}

impl<'a, 'de, 's> de::Deserializer<'de> for ElementDeserializer<'a, 'de, 's> {
    type Error = LlmXmlError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.is_list() {
            self.deserialize_seq(visitor)
        } else {
            self.deserialize_str(visitor)
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let name = self.name;
        let text = self.scalar_text("bool")?;
        let value = if text.eq_ignore_ascii_case("true") {
            true
        } else {
            if !text.eq_ignore_ascii_case("false") {
                warn!(element = %name, text = %text, "unparseable boolean, using false");
            }
            false
        };
        visitor.visit_bool(value)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let name = self.name;
        let text = self.scalar_text("char")?;
        let value = text.chars().next().unwrap_or_else(|| {
            warn!(element = %name, "empty character value, using NUL");
            '\0'
        });
        visitor.visit_char(value)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.scalar_text("string")? {
            Cow::Borrowed(text) => visitor.visit_borrowed_str(text),
            Cow::Owned(text) => visitor.visit_string(text),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.scalar_text("bytes")? {
            Cow::Borrowed(text) => visitor.visit_borrowed_bytes(text.as_bytes()),
            Cow::Owned(text) => visitor.visit_byte_buf(text.into_bytes()),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.is_list() {
            return visitor.visit_some(self);
        }
        if self.de.is_empty_element(self.name)? {
            trace!(element = %self.name, "empty element decodes to None");
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.de.skip_element(self.name)?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let element_tag = match self.decl.map(FieldDecl::kind) {
            Some(FieldKind::List { element_tag, .. }) => element_tag.as_deref(),
            _ => None,
        };
        debug!(wrapper = %self.name, element_tag, "decoding list");

        let has_body = self.de.open(self.name)?;
        let mut access = ListAccess {
            de: self.de,
            wrapper: self.name,
            element_tag,
            done: !has_body,
            closed: !has_body,
            count: 0,
        };
        let value = visitor.visit_seq(&mut access)?;
        access.finish()?;
        Ok(value)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.is_list() {
            return Err(LlmXmlError::type_mismatch("sequence", "map"));
        }
        let has_body = self.de.open(self.name)?;
        let mut access = RecordAccess::new(self.de, self.name, None, &[], !has_body);
        access.any_key = true;
        let value = visitor.visit_map(&mut access)?;
        access.finish()?;
        Ok(value)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if self.is_list() {
            return Err(LlmXmlError::type_mismatch("sequence", "record"));
        }
        let schema = self.de.schemas.get(name);
        debug!(record = name, element = %self.name, declared = schema.is_some(), "decoding record");

        let has_body = self.de.open(self.name)?;
        let mut access = RecordAccess::new(self.de, self.name, schema, fields, !has_body);
        let value = visitor.visit_map(&mut access)?;
        access.finish()?;
        Ok(value)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let text = self.scalar_text("enum")?;
        visitor.visit_enum(CowStrDeserializer::<LlmXmlError>::new(text))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }
}

// ============================================================================
// Records and maps
// ============================================================================

enum Pending<'de, 's> {
    Element(QName<'de>, Option<&'s FieldDecl>),
    EmptyList,
}

/// Walks the child elements of a record, handing serde one field at a time.
struct RecordAccess<'a, 'de, 's> {
    de: &'a mut Deserializer<'de, 's>,
    name: QName<'de>,
    schema: Option<&'s RecordSchema>,
    fields: &'static [&'static str],
    /// Every child element is a key (map targets).
    any_key: bool,
    seen: Vec<&'de str>,
    pending: Option<Pending<'de, 's>>,
    closed: bool,
    /// Next schema field to check for a missing list.
    synthesized: usize,
}

impl<'a, 'de, 's> RecordAccess<'a, 'de, 's> {
    fn new(
        de: &'a mut Deserializer<'de, 's>,
        name: QName<'de>,
        schema: Option<&'s RecordSchema>,
        fields: &'static [&'static str],
        closed: bool,
    ) -> Self {
        RecordAccess {
            de,
            name,
            schema,
            fields,
            any_key: false,
            seen: Vec::new(),
            pending: None,
            closed,
            synthesized: 0,
        }
    }

    /// The field a child element maps to: declared tag first, then serde name.
    fn field_for(&self, element: &'de str) -> Option<(&'de str, Option<&'s FieldDecl>)> {
        if self.any_key {
            return Some((element, None));
        }
        if let Some(decl) = self.schema.and_then(|schema| schema.by_tag(element)) {
            return Some((decl.name(), Some(decl)));
        }
        let key = *self.fields.iter().find(|field| **field == element)?;
        Some((key, self.schema.and_then(|schema| schema.get(key))))
    }

    /// The next declared list field that never appeared in the document.
    fn next_missing_list(&mut self) -> Option<&'static str> {
        let schema = self.schema?;
        while let Some(decl) = schema.fields().get(self.synthesized) {
            self.synthesized += 1;
            if decl.is_list()
                && self.fields.contains(&decl.name())
                && !self.seen.contains(&decl.name())
            {
                return Some(decl.name());
            }
        }
        None
    }

    /// Consume the remaining children and the closing tag.
    fn finish(&mut self) -> Result<()> {
        while !self.closed {
            match self.de.next()? {
                Token::ElementStart(child) => self.de.skip_element(child)?,
                Token::ElementEnd(Some(end)) => {
                    self.de.expect_close(self.name, end)?;
                    self.closed = true;
                }
                Token::DocumentEnd => return Err(self.de.unexpected_end(self.name)),
                _ => {}
            }
        }
        Ok(())
    }
}

impl<'de> MapAccess<'de> for RecordAccess<'_, 'de, '_> {
    type Error = LlmXmlError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        while !self.closed {
            match self.de.next()? {
                Token::ElementStart(child) => match self.field_for(child.local) {
                    Some((key, _)) if !self.any_key && self.seen.contains(&key) => {
                        debug!(element = %child, "skipping repeated field element");
                        self.de.skip_element(child)?;
                    }
                    Some((key, decl)) => {
                        trace!(element = %child, field = key, "matched element to field");
                        self.seen.push(key);
                        self.pending = Some(Pending::Element(child, decl));
                        return seed
                            .deserialize(BorrowedStrDeserializer::<LlmXmlError>::new(key))
                            .map(Some);
                    }
                    None => {
                        debug!(element = %child, record = %self.name, "skipping unknown element");
                        self.de.skip_element(child)?;
                    }
                },
                Token::ElementEnd(Some(end)) => {
                    self.de.expect_close(self.name, end)?;
                    self.closed = true;
                }
                Token::DocumentEnd => return Err(self.de.unexpected_end(self.name)),
                _ => {}
            }
        }

        match self.next_missing_list() {
            Some(key) => {
                debug!(field = key, record = %self.name, "missing list decodes as empty");
                self.pending = Some(Pending::EmptyList);
                seed.deserialize(BorrowedStrDeserializer::<LlmXmlError>::new(key))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.pending.take() {
            Some(Pending::Element(name, decl)) => seed.deserialize(ElementDeserializer {
                de: &mut *self.de,
                name,
                decl,
            }),
            Some(Pending::EmptyList) => seed.deserialize(MissingList),
            None => Err(de::Error::custom("value requested before key")),
        }
    }
}

/// Value of a declared list field whose wrapper never appeared.
struct MissingList;

impl<'de> de::Deserializer<'de> for MissingList {
    type Error = LlmXmlError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(self)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple tuple_struct
        map struct enum identifier ignored_any
    }
}

impl<'de> SeqAccess<'de> for MissingList {
    type Error = LlmXmlError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, _seed: T) -> Result<Option<T::Value>> {
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

// ============================================================================
// Lists
// ============================================================================

/// Walks the item elements of a list wrapper.
struct ListAccess<'a, 'de, 's> {
    de: &'a mut Deserializer<'de, 's>,
    wrapper: QName<'de>,
    element_tag: Option<&'s str>,
    /// No more items will be produced.
    done: bool,
    /// The wrapper's closing tag has been consumed.
    closed: bool,
    count: usize,
}

impl ListAccess<'_, '_, '_> {
    /// Consume whatever is left of the wrapper.
    fn finish(&mut self) -> Result<()> {
        while !self.closed {
            match self.de.next()? {
                Token::ElementStart(child) => self.de.skip_element(child)?,
                Token::ElementEnd(Some(end)) => {
                    self.de.expect_close(self.wrapper, end)?;
                    self.closed = true;
                }
                Token::DocumentEnd => self.closed = true,
                _ => {}
            }
        }
        trace!(wrapper = %self.wrapper, items = self.count, "list decoded");
        Ok(())
    }
}

impl<'de> SeqAccess<'de> for ListAccess<'_, 'de, '_> {
    type Error = LlmXmlError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        while !self.done {
            match self.de.next()? {
                Token::ElementStart(item) => {
                    if self.element_tag.is_some_and(|tag| tag != item.local) {
                        debug!(wrapper = %self.wrapper, element = %item, "skipping non-item element");
                        self.de.skip_element(item)?;
                        continue;
                    }
                    if self.de.is_empty_element(item)? {
                        trace!(wrapper = %self.wrapper, "empty item ends the list");
                        self.done = true;
                        break;
                    }
                    self.count += 1;
                    return seed
                        .deserialize(ElementDeserializer {
                            de: &mut *self.de,
                            name: item,
                            decl: None,
                        })
                        .map(Some);
                }
                Token::ElementEnd(Some(end)) => {
                    self.de.expect_close(self.wrapper, end)?;
                    self.done = true;
                    self.closed = true;
                }
                Token::DocumentEnd => {
                    self.done = true;
                    self.closed = true;
                }
                _ => {}
            }
        }
        Ok(None)
    }
}
