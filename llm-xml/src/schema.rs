//! Field declarations: tag names, prompt descriptions and list shapes.
//!
//! serde decides which fields a record has and in which order they are
//! visited. A [`RecordSchema`] adds what serde can't express: the tag an
//! element is written under, the prompt text shown to the model in place of
//! a value, and whether a field is a repeated list.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::debug;

/// Types that describe their fields for the LLM XML format.
///
/// ```
/// use llm_xml::{FieldDecl, LlmSchema, RecordSchema};
///
/// struct Step {
///     description: String,
/// }
///
/// impl LlmSchema for Step {
///     fn llm_schema() -> RecordSchema {
///         RecordSchema::new("Step")
///             .field(FieldDecl::scalar("description").prompt("what to do next"))
///     }
/// }
///
/// let schema = Step::llm_schema();
/// assert_eq!(schema.get("description").and_then(|f| f.prompt_text()), Some("what to do next"));
/// ```
pub trait LlmSchema {
    /// Declarations for this record.
    fn llm_schema() -> RecordSchema;
}

/// Whether a field holds one value or a repeated list of elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// One value, written as `<tag>value</tag>`.
    Scalar,
    /// A wrapper element holding repeated item elements.
    List {
        /// Tag of each item element.
        element_tag: Option<Cow<'static, str>>,
        /// Prompt shown inside the example item.
        element_prompt: Option<Cow<'static, str>>,
    },
}

/// Declaration of one record field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: &'static str,
    tag: Option<Cow<'static, str>>,
    prompt: Option<Cow<'static, str>>,
    kind: FieldKind,
    nested: Option<fn() -> RecordSchema>,
}

fn non_empty(text: impl Into<Cow<'static, str>>) -> Option<Cow<'static, str>> {
    let text = text.into();
    (!text.is_empty()).then_some(text)
}

impl FieldDecl {
    /// A single-value field with the serde name `name`.
    pub fn scalar(name: &'static str) -> Self {
        FieldDecl {
            name,
            tag: None,
            prompt: None,
            kind: FieldKind::Scalar,
            nested: None,
        }
    }

    /// A list field with the serde name `name`.
    pub fn list(name: &'static str) -> Self {
        FieldDecl {
            kind: FieldKind::List {
                element_tag: None,
                element_prompt: None,
            },
            ..FieldDecl::scalar(name)
        }
    }

    /// Element tag to use instead of the serde name. Empty means "use the name".
    pub fn tag(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.tag = non_empty(tag);
        self
    }

    /// Prompt text. On a scalar field it replaces the value in the template;
    /// on a list field it is written as a line above the example item.
    pub fn prompt(mut self, prompt: impl Into<Cow<'static, str>>) -> Self {
        self.prompt = non_empty(prompt);
        self
    }

    /// Tag of the list's item elements. Makes this a list field.
    pub fn element_tag(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        let tag = non_empty(tag);
        match &mut self.kind {
            FieldKind::List { element_tag, .. } => *element_tag = tag,
            FieldKind::Scalar => {
                self.kind = FieldKind::List {
                    element_tag: tag,
                    element_prompt: None,
                }
            }
        }
        self
    }

    /// Prompt shown inside the list's example item. Makes this a list field.
    pub fn element_prompt(mut self, prompt: impl Into<Cow<'static, str>>) -> Self {
        let prompt = non_empty(prompt);
        match &mut self.kind {
            FieldKind::List { element_prompt, .. } => *element_prompt = prompt,
            FieldKind::Scalar => {
                self.kind = FieldKind::List {
                    element_tag: None,
                    element_prompt: prompt,
                }
            }
        }
        self
    }

    /// Link the declarations of the record type this field holds (or, for a
    /// list, the type of its items).
    pub fn nested<T: LlmSchema>(mut self) -> Self {
        self.nested = Some(T::llm_schema);
        self
    }

    /// The serde field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The element tag: the declared tag, else the serde name.
    pub fn tag_name(&self) -> &str {
        self.tag.as_deref().unwrap_or(self.name)
    }

    /// Prompt text, if declared.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// The resolved field kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether this is a list field.
    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::List { .. })
    }

    /// Declarations of the nested record type, if linked.
    pub fn nested_schema(&self) -> Option<RecordSchema> {
        self.nested.map(|f| f())
    }
}

/// Ordered field declarations of one record type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: Cow<'static, str>,
    fields: Vec<FieldDecl>,
}

impl RecordSchema {
    /// Declarations for the record serde knows as `name`.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        RecordSchema {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field declaration.
    pub fn field(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    /// The record's serialized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All declarations, in the order they were added.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Declaration for the serde field `name`.
    pub fn get(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declaration whose element tag is `tag`.
    pub fn by_tag(&self, tag: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.tag_name() == tag)
    }
}

/// Registry of record schemas keyed by record name.
#[derive(Debug, Clone, Default)]
pub struct Schemas {
    records: HashMap<String, RecordSchema>,
}

impl Schemas {
    /// An empty registry. Every record behaves as if it had no annotations.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `T` and every record reachable from it.
    pub fn of<T: LlmSchema>() -> Self {
        let mut schemas = Self::new();
        schemas.register::<T>();
        schemas
    }

    /// Add `T` and every record reachable from it.
    pub fn register<T: LlmSchema>(&mut self) -> &mut Self {
        self.insert(T::llm_schema());
        self
    }

    /// Add `schema` and every record reachable from it. Records already
    /// present are left alone, so recursive types terminate.
    pub fn insert(&mut self, mut schema: RecordSchema) -> &mut Self {
        if self.records.contains_key(schema.name()) {
            return self;
        }

        let mut nested = Vec::new();
        for decl in &mut schema.fields {
            let Some(nested_schema) = decl.nested_schema() else {
                continue;
            };
            if let FieldKind::List { element_tag, .. } = &mut decl.kind {
                element_tag.get_or_insert_with(|| Cow::Owned(nested_schema.name().to_string()));
            }
            nested.push(nested_schema);
        }

        debug!(record = %schema.name(), fields = schema.fields.len(), "registering schema");
        self.records.insert(schema.name().to_string(), schema);
        for schema in nested {
            self.insert(schema);
        }
        self
    }

    /// Declarations for the record named `name`.
    pub fn get(&self, name: &str) -> Option<&RecordSchema> {
        self.records.get(name)
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
