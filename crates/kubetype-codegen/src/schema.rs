//! Schema nodes as they appear in OpenAPI documents and CRDs.
//!
//! A [`SchemaNode`] is a loosely-typed JSON-Schema fragment. Before compiling,
//! each node is classified once into a [`SchemaNodeKind`], which fixes the
//! order in which the shapes are tried.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, serde_as, skip_serializing_none};
use std::collections::BTreeMap;

/// The `type` keyword: a single name or a JSON-Schema type list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// The effective type name; for a list, the first entry that isn't `null`
    pub fn name(&self) -> Option<&str> {
        match self {
            SchemaType::Single(name) => Some(name.as_str()),
            SchemaType::Multiple(names) => names
                .iter()
                .map(String::as_str)
                .find(|name| *name != "null"),
        }
    }
}

/// The `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaNode>),
}

/// A schema fragment. Each keyword is read on its own: a keyword with an
/// unexpected shape (a tuple-form `items`, a numeric `format`) is dropped
/// instead of failing the whole node.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaNode {
    #[serde(rename = "$ref")]
    #[serde_as(as = "DefaultOnError")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    #[serde_as(as = "DefaultOnError")]
    pub schema_type: Option<SchemaType>,
    #[serde_as(as = "DefaultOnError<Option<BTreeMap<_, DefaultOnError>>>")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde_as(as = "DefaultOnError")]
    pub required: Option<Vec<String>>,
    #[serde_as(as = "DefaultOnError")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde_as(as = "DefaultOnError")]
    pub items: Option<Box<SchemaNode>>,
    #[serde_as(as = "DefaultOnError<Option<Vec<DefaultOnError>>>")]
    pub all_of: Option<Vec<SchemaNode>>,
    #[serde_as(as = "DefaultOnError<Option<Vec<DefaultOnError>>>")]
    pub any_of: Option<Vec<SchemaNode>>,
    #[serde_as(as = "DefaultOnError<Option<Vec<DefaultOnError>>>")]
    pub one_of: Option<Vec<SchemaNode>>,
    #[serde(rename = "enum")]
    #[serde_as(as = "DefaultOnError")]
    pub enum_values: Option<Vec<Value>>,
    #[serde_as(as = "DefaultOnError")]
    pub description: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    pub format: Option<String>,
    pub example: Option<Value>,
    #[serde_as(as = "DefaultOnError")]
    pub nullable: Option<bool>,
    #[serde_as(as = "DefaultOnError")]
    pub deprecated: Option<bool>,
    #[serde_as(as = "DefaultOnError")]
    pub pattern: Option<String>,
    pub default: Option<Value>,
}

/// Value schema of a map-shaped object
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapValue<'a> {
    /// `additionalProperties: true`
    Any,
    Schema(&'a SchemaNode),
}

/// The shape of a schema node, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaNodeKind<'a> {
    /// `$ref` pointer, checked before anything else
    Ref(&'a str),
    /// `type: object` with explicit `properties`
    Object {
        properties: &'a BTreeMap<String, SchemaNode>,
        required: &'a [String],
    },
    /// `type: object` with `additionalProperties` and no `properties`
    Map(MapValue<'a>),
    AllOf(&'a [SchemaNode]),
    AnyOf(&'a [SchemaNode]),
    OneOf(&'a [SchemaNode]),
    /// `type: string` with `enum`
    StringEnum(&'a [Value]),
    /// `type: array`; `items` may be missing
    Array(Option<&'a SchemaNode>),
    /// Anything else, with the raw type name (`any` when absent)
    Scalar(&'a str),
}

impl SchemaNode {
    /// Effective `type` name, if any
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::name)
    }

    /// Required property names
    pub fn required(&self) -> &[String] {
        self.required.as_deref().unwrap_or(&[])
    }

    /// Classify this node. Empty composition lists count as absent.
    pub fn kind(&self) -> SchemaNodeKind<'_> {
        if let Some(reference) = &self.reference {
            return SchemaNodeKind::Ref(reference);
        }

        let type_name = self.type_name();

        if type_name == Some("object") {
            if let Some(properties) = &self.properties {
                return SchemaNodeKind::Object {
                    properties,
                    required: self.required(),
                };
            }
            match &self.additional_properties {
                Some(AdditionalProperties::Schema(value)) => {
                    return SchemaNodeKind::Map(MapValue::Schema(value));
                }
                Some(AdditionalProperties::Bool(true)) => {
                    return SchemaNodeKind::Map(MapValue::Any);
                }
                Some(AdditionalProperties::Bool(false)) | None => {}
            }
        }

        if let Some(branches) = non_empty(&self.all_of) {
            return SchemaNodeKind::AllOf(branches);
        }
        if let Some(branches) = non_empty(&self.any_of) {
            return SchemaNodeKind::AnyOf(branches);
        }
        if let Some(branches) = non_empty(&self.one_of) {
            return SchemaNodeKind::OneOf(branches);
        }

        if type_name == Some("string") {
            if let Some(values) = non_empty(&self.enum_values) {
                return SchemaNodeKind::StringEnum(values);
            }
        }

        if type_name == Some("array") {
            return SchemaNodeKind::Array(self.items.as_deref());
        }

        SchemaNodeKind::Scalar(type_name.unwrap_or("any"))
    }
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|items| !items.is_empty())
}

/// Definition map of a merged document, keyed by dotted definition key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    definitions: BTreeMap<String, SchemaNode>,
}

impl SchemaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract definitions from a raw OpenAPI v3 (`components.schemas`) or
    /// Swagger v2 (`definitions`) document.
    ///
    /// A definition that isn't a JSON object is kept as an empty node, which
    /// compiles to `Any`.
    pub fn from_value(document: &Value) -> Self {
        let mut result = Self::new();

        let Some(definitions) = definitions_of(document) else {
            tracing::warn!("document has neither components.schemas nor definitions");
            return result;
        };

        for (key, value) in definitions {
            let node = match serde_json::from_value::<SchemaNode>(value.clone()) {
                Ok(node) => node,
                Err(e) => {
                    tracing::warn!(definition = %key, error = %e, "unparseable schema, using any");
                    SchemaNode::default()
                }
            };
            result.definitions.insert(key.clone(), node);
        }

        result
    }

    pub fn insert(&mut self, key: impl Into<String>, node: SchemaNode) {
        self.definitions.insert(key.into(), node);
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.definitions.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<(String, SchemaNode)> for SchemaDocument {
    fn from_iter<I: IntoIterator<Item = (String, SchemaNode)>>(iter: I) -> Self {
        Self {
            definitions: iter.into_iter().collect(),
        }
    }
}

/// The definition map of a raw document, wherever it lives
pub fn definitions_of(document: &Value) -> Option<&serde_json::Map<String, Value>> {
    document
        .pointer("/components/schemas")
        .or_else(|| document.get("definitions"))
        .and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> SchemaNode {
        serde_json::from_value(value).expect("schema node")
    }

    #[test]
    fn test_ref_wins_over_everything() {
        let n = node(json!({
            "$ref": "#/components/schemas/io.k8s.api.core.v1.PodSpec",
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "allOf": [{ "type": "string" }]
        }));
        assert_eq!(
            n.kind(),
            SchemaNodeKind::Ref("#/components/schemas/io.k8s.api.core.v1.PodSpec")
        );
    }

    #[test]
    fn test_object_with_properties_beats_additional_properties() {
        let n = node(json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "required": ["a"],
            "additionalProperties": { "type": "string" }
        }));
        match n.kind() {
            SchemaNodeKind::Object { properties, required } => {
                assert!(properties.contains_key("a"));
                assert_eq!(required, ["a".to_string()]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_map_shapes() {
        let n = node(json!({ "type": "object", "additionalProperties": { "type": "string" } }));
        assert!(matches!(n.kind(), SchemaNodeKind::Map(MapValue::Schema(_))));

        let n = node(json!({ "type": "object", "additionalProperties": true }));
        assert_eq!(n.kind(), SchemaNodeKind::Map(MapValue::Any));

        let n = node(json!({ "type": "object", "additionalProperties": false }));
        assert_eq!(n.kind(), SchemaNodeKind::Scalar("object"));
    }

    #[test]
    fn test_compositions_in_order() {
        let n = node(json!({ "allOf": [{ "type": "string" }], "anyOf": [{ "type": "integer" }] }));
        assert!(matches!(n.kind(), SchemaNodeKind::AllOf(b) if b.len() == 1));

        let n = node(json!({ "anyOf": [{ "type": "integer" }, { "type": "string" }] }));
        assert!(matches!(n.kind(), SchemaNodeKind::AnyOf(b) if b.len() == 2));

        let n = node(json!({ "oneOf": [{ "type": "integer" }] }));
        assert!(matches!(n.kind(), SchemaNodeKind::OneOf(_)));

        let n = node(json!({ "allOf": [], "type": "string" }));
        assert_eq!(n.kind(), SchemaNodeKind::Scalar("string"));
    }

    #[test]
    fn test_enum_only_for_strings() {
        let n = node(json!({ "type": "string", "enum": ["A", "B"] }));
        assert!(matches!(n.kind(), SchemaNodeKind::StringEnum(v) if v.len() == 2));

        let n = node(json!({ "type": "integer", "enum": [1, 2] }));
        assert_eq!(n.kind(), SchemaNodeKind::Scalar("integer"));
    }

    #[test]
    fn test_array_and_fallback() {
        let n = node(json!({ "type": "array", "items": { "type": "string" } }));
        assert!(matches!(n.kind(), SchemaNodeKind::Array(Some(_))));

        let n = node(json!({ "type": "array" }));
        assert_eq!(n.kind(), SchemaNodeKind::Array(None));

        assert_eq!(SchemaNode::default().kind(), SchemaNodeKind::Scalar("any"));
        assert_eq!(
            node(json!({ "type": ["null", "boolean"] })).kind(),
            SchemaNodeKind::Scalar("boolean")
        );
    }

    #[test]
    fn test_document_from_openapi_v3_and_swagger() {
        let v3 = json!({
            "openapi": "3.0.0",
            "components": { "schemas": { "io.k8s.A": { "type": "string" } } }
        });
        let doc = SchemaDocument::from_value(&v3);
        assert_eq!(doc.len(), 1);
        assert!(doc.get("io.k8s.A").is_some());

        let v2 = json!({ "swagger": "2.0", "definitions": { "io.k8s.B": { "type": "integer" } } });
        let doc = SchemaDocument::from_value(&v2);
        assert!(doc.get("io.k8s.B").is_some());

        assert!(SchemaDocument::from_value(&json!({ "paths": {} })).is_empty());
    }

    #[test]
    fn test_non_object_definition_degrades() {
        let doc = SchemaDocument::from_value(&json!({
            "definitions": { "io.k8s.Broken": "not-a-schema" }
        }));
        assert_eq!(doc.get("io.k8s.Broken"), Some(&SchemaNode::default()));
    }

    #[test]
    fn test_malformed_keywords_are_dropped_individually() {
        let doc = SchemaDocument::from_value(&json!({ "definitions": { "io.foo.Thing": {
            "type": "object",
            "description": "A thing",
            "required": "name",
            "properties": {
                "name": { "type": "string", "format": 5, "nullable": "true" },
                "tuple": { "type": "array", "items": [{ "type": "string" }] },
                "flag": true
            }
        } } }));

        let thing = doc.get("io.foo.Thing").expect("definition kept");
        assert_eq!(thing.description.as_deref(), Some("A thing"));
        assert!(thing.required.is_none());

        let properties = thing.properties.as_ref().expect("properties");
        assert_eq!(properties.len(), 3);

        let name = &properties["name"];
        assert_eq!(name.type_name(), Some("string"));
        assert_eq!(name.format, None);
        assert_eq!(name.nullable, None);

        assert_eq!(properties["tuple"].kind(), SchemaNodeKind::Array(None));
        assert_eq!(properties["flag"], SchemaNode::default());
    }
}
