//! Encoding engine: serde values to prompt-template XML.
//!
//! Fields with a prompt are written as `<tag>{... prompt ...}</tag>` instead of
//! their value. List fields get a wrapper element, an optional prompt line,
//! one example item and a trailer line telling the model more items may
//! follow:
//!
//! ```text
//! <messages>
//!   <Message>
//!     <index>{... the index ...}</index>
//!   </Message>
//!   {... other "Message" entries ...}
//! </messages>
//! ```

use serde::Serialize;
use serde::ser::{self, Impossible, SerializeSeq, SerializeStruct};
use tracing::{debug, trace, warn};

use crate::composer::{CompactComposer, Composer, PrettyComposer};
use crate::error::{LlmXmlError, Result};
use crate::schema::{FieldKind, RecordSchema, Schemas};

/// Options for XML output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Whether to break lines and indent nested elements.
    pub pretty: bool,
    /// Spaces per nesting level when pretty printing.
    pub indent: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: 2,
        }
    }
}

impl SerializeOptions {
    /// Create new default options (pretty, 2-space indent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Write everything on one line.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Enable or disable pretty printing.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the indentation width and enable pretty printing.
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = width;
        self.pretty = true;
        self
    }
}

/// Encode `value` using the declarations in `schemas`.
pub(crate) fn serialize<T: Serialize + ?Sized>(
    value: &T,
    schemas: &Schemas,
    options: &SerializeOptions,
) -> Result<String> {
    if options.pretty {
        serialize_into(value, schemas, PrettyComposer::new(options.indent))
    } else {
        serialize_into(value, schemas, CompactComposer::new())
    }
}

/// Encode `value` through the given composer.
pub fn serialize_into<T: Serialize + ?Sized, C: Composer>(
    value: &T,
    schemas: &Schemas,
    composer: C,
) -> Result<String> {
    let mut ser = Serializer {
        composer,
        schemas,
        last_item: None,
    };
    value.serialize(ValueSerializer {
        ser: &mut ser,
        site: Site::Root,
    })?;
    Ok(ser.composer.finish())
}

struct Serializer<'s, C> {
    composer: C,
    schemas: &'s Schemas,
    /// Tag of the list item written most recently, consumed by the list
    /// that requested it to name its trailer.
    last_item: Option<&'s str>,
}

impl<'s, C: Composer> Serializer<'s, C> {
    fn open(&mut self, tag: &str) {
        self.composer.append("<").append(tag).append(">");
    }

    fn close(&mut self, tag: &str) {
        self.composer.append("</").append(tag).append(">");
    }

    fn element(&mut self, tag: &str, text: &str) {
        if text.contains(['<', '&']) {
            warn!(tag, text, "value contains markup characters and is written unescaped");
        }
        self.composer.append_line();
        self.open(tag);
        self.composer.append(text);
        self.close(tag);
    }

    fn placeholder(&mut self, tag: &str, prompt: &str) {
        trace!(tag, prompt, "placeholder");
        self.composer.append_line();
        self.open(tag);
        self.prompt(prompt);
        self.close(tag);
    }

    fn prompt(&mut self, prompt: &str) {
        self.composer.append("{... ").append(prompt).append(" ...}");
    }
}

/// Where in the document a value is being written.
#[derive(Debug, Clone, Copy)]
enum Site<'s> {
    /// The document element.
    Root,
    /// A record field without a list declaration.
    Field { tag: &'s str },
    /// A record field declared as a list.
    List {
        tag: &'s str,
        prompt: Option<&'s str>,
        element_tag: Option<&'s str>,
        element_prompt: Option<&'s str>,
    },
    /// The example item of a list.
    Item {
        tag: Option<&'s str>,
        prompt: Option<&'s str>,
    },
}

struct ValueSerializer<'a, 's, C> {
    ser: &'a mut Serializer<'s, C>,
    site: Site<'s>,
}

impl<'a, 's, C: Composer> ValueSerializer<'a, 's, C> {
    fn scalar(self, shape: &'static str, text: &str) -> Result<()> {
        match self.site {
            Site::Root => Err(LlmXmlError::unsupported(format!(
                "{shape} at the document root; the root value must be a record"
            ))),
            Site::Field { tag } => {
                self.ser.element(tag, text);
                Ok(())
            }
            Site::List { .. } => Err(LlmXmlError::type_mismatch("sequence", shape)),
            Site::Item { tag, prompt } => {
                let tag = tag.unwrap_or("item");
                // the example item never shows a real value
                self.ser.placeholder(tag, prompt.unwrap_or(shape));
                self.ser.last_item = Some(tag);
                Ok(())
            }
        }
    }
}

macro_rules! serialize_display {
    ($($method:ident($ty:ty) => $shape:literal),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<()> {
                self.scalar($shape, &v.to_string())
            }
        )*
    };
}

macro_rules! unsupported {
    ($shape:literal) => {
        Err(LlmXmlError::unsupported(concat!(
            $shape,
            " has no representation in LLM XML"
        )))
    };
}

impl<'a, 's, C: Composer> ser::Serializer for ValueSerializer<'a, 's, C> {
    type Ok = ();
    type Error = LlmXmlError;

    type SerializeSeq = ListSerializer<'a, 's, C>;
    type SerializeTuple = Impossible<(), LlmXmlError>;
    type SerializeTupleStruct = Impossible<(), LlmXmlError>;
    type SerializeTupleVariant = Impossible<(), LlmXmlError>;
    type SerializeMap = Impossible<(), LlmXmlError>;
    type SerializeStruct = StructSerializer<'a, 's, C>;
    type SerializeStructVariant = Impossible<(), LlmXmlError>;

    serialize_display! {
        serialize_bool(bool) => "boolean",
        serialize_i8(i8) => "integer",
        serialize_i16(i16) => "integer",
        serialize_i32(i32) => "integer",
        serialize_i64(i64) => "integer",
        serialize_i128(i128) => "integer",
        serialize_u8(u8) => "integer",
        serialize_u16(u16) => "integer",
        serialize_u32(u32) => "integer",
        serialize_u64(u64) => "integer",
        serialize_u128(u128) => "integer",
        serialize_f32(f32) => "number",
        serialize_f64(f64) => "number",
        serialize_char(char) => "character",
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.scalar("string", v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        unsupported!("a byte string")
    }

    fn serialize_none(self) -> Result<()> {
        Err(LlmXmlError::unsupported(
            "cannot encode an absent value (`None`)",
        ))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.scalar("unit", "")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.scalar("unit", "")
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.scalar("enum variant", variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        unsupported!("an enum variant with data")
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let (tag, prompt, element_tag, element_prompt) = match self.site {
            Site::Root => {
                return Err(LlmXmlError::unsupported(
                    "sequence at the document root; the root value must be a record",
                ));
            }
            Site::Item { .. } => return unsupported!("a sequence nested in a sequence"),
            Site::Field { tag } => (tag, None, None, None),
            Site::List {
                tag,
                prompt,
                element_tag,
                element_prompt,
            } => (tag, prompt, element_tag, element_prompt),
        };

        debug!(tag, ?len, "encoding list");
        let ser = self.ser;
        ser.composer.append_line();
        ser.open(tag);
        ser.composer.indent();
        if let Some(prompt) = prompt {
            ser.composer.append_line();
            ser.prompt(prompt);
        }

        Ok(ListSerializer {
            ser,
            tag,
            element_tag,
            element_prompt,
            rendered: None,
            seen: 0,
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        unsupported!("a tuple")
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        unsupported!("a tuple struct")
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        unsupported!("an enum variant with data")
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        unsupported!("a map")
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        let (tag, item) = match self.site {
            Site::Root => (name, false),
            Site::Field { tag } => (tag, false),
            Site::List { .. } => return Err(LlmXmlError::type_mismatch("sequence", "record")),
            Site::Item { tag, .. } => (tag.unwrap_or(name), true),
        };

        let ser = self.ser;
        let schema = ser.schemas.get(name);
        debug!(record = name, tag, fields = len, declared = schema.is_some(), "encoding record");

        if !matches!(self.site, Site::Root) {
            ser.composer.append_line();
        }
        ser.open(tag);
        ser.composer.indent();

        Ok(StructSerializer {
            ser,
            schema,
            tag,
            item,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        unsupported!("an enum variant with data")
    }
}

struct StructSerializer<'a, 's, C> {
    ser: &'a mut Serializer<'s, C>,
    schema: Option<&'s RecordSchema>,
    tag: &'s str,
    item: bool,
}

impl<'a, 's, C: Composer> SerializeStruct for StructSerializer<'a, 's, C> {
    type Ok = ();
    type Error = LlmXmlError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        let site = match self.schema.and_then(|schema| schema.get(key)) {
            None => Site::Field { tag: key },
            Some(decl) => match decl.kind() {
                FieldKind::Scalar => match decl.prompt_text() {
                    Some(prompt) => {
                        self.ser.placeholder(decl.tag_name(), prompt);
                        return Ok(());
                    }
                    None => Site::Field {
                        tag: decl.tag_name(),
                    },
                },
                FieldKind::List {
                    element_tag,
                    element_prompt,
                } => Site::List {
                    tag: decl.tag_name(),
                    prompt: decl.prompt_text(),
                    element_tag: element_tag.as_deref(),
                    element_prompt: element_prompt.as_deref(),
                },
            },
        };

        value.serialize(ValueSerializer {
            ser: &mut *self.ser,
            site,
        })
    }

    fn end(self) -> Result<()> {
        self.ser.composer.unindent().append_line();
        self.ser.close(self.tag);
        if self.item {
            self.ser.last_item = Some(self.tag);
        }
        Ok(())
    }
}

struct ListSerializer<'a, 's, C> {
    ser: &'a mut Serializer<'s, C>,
    tag: &'s str,
    element_tag: Option<&'s str>,
    element_prompt: Option<&'s str>,
    rendered: Option<&'s str>,
    seen: usize,
}

impl<'a, 's, C: Composer> SerializeSeq for ListSerializer<'a, 's, C> {
    type Ok = ();
    type Error = LlmXmlError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.seen += 1;
        if self.seen > 1 {
            return Ok(());
        }

        value.serialize(ValueSerializer {
            ser: &mut *self.ser,
            site: Site::Item {
                tag: self.element_tag,
                prompt: self.element_prompt,
            },
        })?;
        self.rendered = self.ser.last_item.take();
        Ok(())
    }

    fn end(self) -> Result<()> {
        trace!(tag = self.tag, items = self.seen, "list example written");
        if let Some(item) = self.rendered {
            self.ser.composer.append_line();
            self.ser
                .composer
                .append("{... other \"")
                .append(item)
                .append("\" entries ...}");
        }
        self.ser.composer.unindent().append_line();
        self.ser.close(self.tag);
        Ok(())
    }
}
