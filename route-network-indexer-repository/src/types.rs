//! Schema types for search index collections.

/// Type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text, searchable.
    String,
}

/// A single indexed field in a collection schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// The document property name.
    pub name: String,
    /// The field type.
    pub field_type: FieldType,
    /// Whether the field is used for faceting (exact-value aggregation).
    pub facet: bool,
    /// Whether results can be sorted on the field.
    pub sort: bool,
}

impl SchemaField {
    /// Create a searchable string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            facet: false,
            sort: false,
        }
    }

    /// Mark the field as sortable.
    pub fn sortable(mut self) -> Self {
        self.sort = true;
        self
    }
}

/// The set of indexed fields for a collection.
///
/// Document properties not listed here are stored but not indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub fields: Vec<SchemaField>,
}

impl CollectionSchema {
    /// The route node schema: a single sortable, searchable `name` field.
    pub fn route_node() -> Self {
        Self {
            fields: vec![SchemaField::string("name").sortable()],
        }
    }
}
