//! Index schema types.
//!
//! An [`IndexSchema`] is owned by the host application and only read by the
//! connector. Field ids are unique within an index; adding a field with an
//! existing id replaces the earlier definition in place.

use serde::{Deserialize, Serialize};

/// Reserved field holding the document id.
pub const ID_FIELD: &str = "id";

/// Reserved field holding the item language.
pub const LANGUAGE_FIELD: &str = "_language";

/// Semantic type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Exact-match string.
    String,
    /// Analyzed fulltext.
    Text,
    /// Boolean flag.
    Boolean,
    /// Whole number.
    Integer,
    /// Floating point number.
    Decimal,
    /// Date or timestamp.
    Date,
    /// Object with sub-fields.
    Object,
    /// Nested object with sub-fields, matched per entry.
    NestedObject,
    /// Geographic point.
    Location,
}

impl FieldType {
    /// Returns `true` for types whose sub-fields are mapped recursively.
    pub fn is_complex(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::NestedObject)
    }

    /// Returns `true` for types searched by fulltext keywords.
    pub fn is_fulltext(&self) -> bool {
        matches!(self, FieldType::Text)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::Object => "object",
            FieldType::NestedObject => "nested_object",
            FieldType::Location => "location",
        };
        write!(f, "{}", name)
    }
}

/// Definition of a single indexed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field id, unique within its parent.
    pub id: String,

    /// Semantic type.
    pub field_type: FieldType,

    /// Relevance boost for fulltext matching.
    #[serde(default)]
    pub boost: Option<f32>,

    /// Sub-fields, only meaningful for object types.
    #[serde(default)]
    pub sub_fields: Vec<FieldSpec>,
}

impl FieldSpec {
    /// Creates a field definition.
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            field_type,
            boost: None,
            sub_fields: Vec::new(),
        }
    }

    /// Sets the fulltext boost.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Adds a sub-field.
    pub fn with_sub_field(mut self, field: FieldSpec) -> Self {
        self.sub_fields.push(field);
        self
    }
}

/// Per-index options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Number of primary shards (default: 5).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards (default: 2).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Fields backing autocomplete suggestions.
    #[serde(default)]
    pub autocomplete_fields: Vec<String>,
}

fn default_shards() -> u32 {
    5
}

fn default_replicas() -> u32 {
    2
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            autocomplete_fields: Vec::new(),
        }
    }
}

/// Schema of a logical index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Logical index identifier.
    pub id: String,

    /// Fields in definition order.
    #[serde(default)]
    fields: Vec<FieldSpec>,

    /// Index options.
    #[serde(default)]
    pub options: IndexOptions,

    /// Read-only indexes are never recreated or removed.
    #[serde(default)]
    pub read_only: bool,
}

impl IndexSchema {
    /// Creates an empty schema for a logical index.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            options: IndexOptions::default(),
            read_only: false,
        }
    }

    /// Adds a field, replacing any field with the same id.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.add_field(field);
        self
    }

    /// Adds a field, replacing any field with the same id.
    pub fn add_field(&mut self, field: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.id == field.id) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Sets the index options.
    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Marks the index read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns all fields in definition order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a top-level field by id.
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Returns the semantic type of a top-level field.
    pub fn field_type(&self, id: &str) -> Option<FieldType> {
        self.field(id).map(|f| f.field_type)
    }

    /// Returns the ids of all fulltext fields.
    pub fn fulltext_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type.is_fulltext())
            .map(|f| f.id.as_str())
            .collect()
    }
}
