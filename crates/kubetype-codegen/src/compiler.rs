//! The recursive schema compiler.
//!
//! [`SchemaCompiler::compile`] turns one schema node into a [`TypeExpr`],
//! creating or extending record declarations in the target module as a side
//! effect. Records are memoized by `(module, name)`: compiling an object under
//! a name that already has a record extends that record instead of declaring
//! a second one.
//!
//! `$ref` nodes always compile to a reference and are never inlined, so
//! self-referential schemas terminate.

use crate::declarations::{
    AliasDecl, Declaration, Field, ModuleSet, RecordDecl, TypeExpr,
};
use crate::description::describe;
use crate::names::{
    map_scalar_type, nested_name, to_declaration_name, to_property_name, to_type_ref,
};
use crate::schema::{MapValue, SchemaNode, SchemaNodeKind};
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::BTreeMap;

pub struct SchemaCompiler<'m> {
    modules: &'m mut ModuleSet,
}

impl<'m> SchemaCompiler<'m> {
    pub fn new(modules: &'m mut ModuleSet) -> Self {
        Self { modules }
    }

    /// Compile a top-level definition.
    ///
    /// The result is bound as a type alias named after the definition unless
    /// compiling it already declared something under that name.
    pub fn compile_definition(&mut self, module: &str, name: &str, node: &SchemaNode) -> TypeExpr {
        let ty = self.compile(module, name, node);

        let alias_name = to_declaration_name(name);
        let target = self.modules.module_mut(module);
        if !target.contains(&alias_name) {
            tracing::debug!(module, name = %alias_name, "generating type alias");
            target.declare(Declaration::Alias(AliasDecl {
                name: alias_name.into(),
                ty: ty.clone(),
                docs: describe(node),
            }));
        }

        ty
    }

    /// Compile a schema node that lives in `module` under `name`
    pub fn compile(&mut self, module: &str, name: &str, node: &SchemaNode) -> TypeExpr {
        match node.kind() {
            SchemaNodeKind::Ref(pointer) => TypeExpr::Reference(to_type_ref(pointer)),
            SchemaNodeKind::Object {
                properties,
                required,
            } => self.compile_record(module, name, node, properties, required),
            SchemaNodeKind::Map(value) => self.compile_map(module, name, value),
            SchemaNodeKind::AllOf(branches) => {
                TypeExpr::Intersection(self.compile_branches(module, name, branches))
            }
            SchemaNodeKind::AnyOf(branches) | SchemaNodeKind::OneOf(branches) => {
                TypeExpr::Union(self.compile_branches(module, name, branches))
            }
            SchemaNodeKind::StringEnum(values) => {
                TypeExpr::LiteralUnion(values.iter().map(literal_text).collect())
            }
            SchemaNodeKind::Array(items) => {
                let item = match items {
                    Some(items) => self.compile(module, name, items),
                    None => TypeExpr::Any,
                };
                TypeExpr::Array(Box::new(item))
            }
            SchemaNodeKind::Scalar(raw_type) => map_scalar_type(raw_type),
        }
    }

    fn compile_record(
        &mut self,
        module: &str,
        name: &str,
        node: &SchemaNode,
        properties: &BTreeMap<String, SchemaNode>,
        required: &[String],
    ) -> TypeExpr {
        let record_name = to_declaration_name(name);
        let reference = TypeExpr::reference(module, record_name.as_str());

        let target = self.modules.module_mut(module);
        match target.get(&record_name) {
            Some(Declaration::Record(_)) => {}
            Some(Declaration::Alias(_)) => {
                tracing::warn!(
                    module,
                    name = %record_name,
                    "object schema shares its name with an alias, keeping the alias"
                );
                return reference;
            }
            None => {
                tracing::debug!(module, name = %record_name, "generating record");
                target.declare(Declaration::Record(RecordDecl {
                    name: SmolStr::new(&record_name),
                    docs: describe(node),
                    fields: Vec::new(),
                }));
            }
        }

        for (property, schema) in properties {
            let ty = self.compile(module, &nested_name(&record_name, property), schema);
            let field = Field {
                name: to_property_name(property),
                ty,
                docs: describe(schema),
                optional: !required.contains(property),
            };

            if let Some(Declaration::Record(record)) =
                self.modules.module_mut(module).get_mut(&record_name)
            {
                record.upsert_field(field);
            }
        }

        reference
    }

    fn compile_map(&mut self, module: &str, name: &str, value: MapValue<'_>) -> TypeExpr {
        let value_type = match value {
            MapValue::Any => TypeExpr::Any,
            MapValue::Schema(schema) => match schema.kind() {
                // An inline object is the map's value record and takes the
                // current name. References compile without declaring anything,
                // whatever name they're given.
                SchemaNodeKind::Object { .. } => self.compile(module, name, schema),
                _ => {
                    let value_name = format!("{}_value", to_declaration_name(name));
                    self.compile(module, &value_name, schema)
                }
            },
        };
        TypeExpr::MapOf(Box::new(value_type))
    }

    fn compile_branches(
        &mut self,
        module: &str,
        name: &str,
        branches: &[SchemaNode],
    ) -> Vec<TypeExpr> {
        branches
            .iter()
            .map(|branch| self.compile(module, name, branch))
            .collect()
    }
}

fn literal_text(value: &Value) -> SmolStr {
    match value {
        Value::String(s) => to_property_name(s),
        other => SmolStr::new(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::{ScalarType, TypeRef};
    use serde_json::json;

    fn node(value: Value) -> SchemaNode {
        serde_json::from_value(value).expect("schema node")
    }

    #[test]
    fn test_required_field_mapping() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "type": "object",
            "description": "A thing",
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "integer" }
            },
            "required": ["a"]
        }));

        let ty = SchemaCompiler::new(&mut modules).compile_definition("io.foo", "Thing", &schema);
        assert_eq!(ty, TypeExpr::reference("io.foo", "Thing"));

        let module = modules.get("io.foo").expect("module");
        assert_eq!(module.len(), 1);
        let record = module.record("Thing").expect("record, not alias");
        assert_eq!(record.docs.body.as_deref(), Some("A thing"));
        assert!(!record.field("a").expect("a").optional);
        assert!(record.field("b").expect("b").optional);
        assert_eq!(
            record.field("b").expect("b").ty,
            TypeExpr::Scalar(ScalarType::Number)
        );
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "type": "object",
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": { "replicas": { "type": "integer" } }
                },
                "name": { "type": "string" }
            }
        }));

        let mut compiler = SchemaCompiler::new(&mut modules);
        let first = compiler.compile_definition("io.foo", "Thing", &schema);
        let second = compiler.compile_definition("io.foo", "Thing", &schema);
        assert_eq!(first, second);

        let module = modules.get("io.foo").expect("module");
        assert_eq!(module.len(), 2);
        let names: Vec<_> = module
            .record("Thing")
            .expect("record")
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "spec"]);
        assert_eq!(module.record("Thing_spec").expect("nested").fields.len(), 1);
    }

    #[test]
    fn test_nested_objects_get_synthesized_names() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "type": "object",
            "properties": {
                "private-key": {
                    "type": "object",
                    "properties": {
                        "rotation.policy": { "type": "string", "enum": ["Never", "Always"] }
                    }
                },
                "containers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "image": { "type": "string" } }
                    }
                }
            }
        }));

        SchemaCompiler::new(&mut modules).compile_definition("io.foo.v1", "Certificate", &schema);

        let module = modules.get("io.foo.v1").expect("module");
        let record = module.record("Certificate").expect("record");
        assert_eq!(
            record.field("private-key").expect("field").ty,
            TypeExpr::reference("io.foo.v1", "Certificate_private_key")
        );
        assert_eq!(
            record.field("containers").expect("field").ty,
            TypeExpr::Array(Box::new(TypeExpr::reference(
                "io.foo.v1",
                "Certificate_containers"
            )))
        );
        assert!(module.record("Certificate_private_key").is_some());
        assert!(module.record("Certificate_containers").is_some());
    }

    #[test]
    fn test_string_enum_compilation() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({ "type": "string", "enum": ["Foo", "Bar-Baz"] }));

        let ty = SchemaCompiler::new(&mut modules).compile("io.foo", "Policy", &schema);
        assert_eq!(
            ty,
            TypeExpr::LiteralUnion(vec![SmolStr::new("Foo"), SmolStr::new("Bar-Baz")])
        );
        assert!(modules.is_empty() || modules.declaration_count() == 0);
    }

    #[test]
    fn test_map_of_reference_declares_nothing() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "type": "object",
            "additionalProperties": {
                "$ref": "#/components/schemas/io.k8s.apimachinery.pkg.api.resource.Quantity"
            }
        }));

        let ty = SchemaCompiler::new(&mut modules).compile("io.k8s.api.core.v1", "ResourceList", &schema);
        assert_eq!(
            ty,
            TypeExpr::MapOf(Box::new(TypeExpr::reference(
                "io.k8s.apimachinery.pkg.api.resource",
                "Quantity"
            )))
        );
        assert_eq!(modules.declaration_count(), 0);
    }

    #[test]
    fn test_map_of_inline_object_uses_current_name() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "type": "object",
            "additionalProperties": {
                "type": "object",
                "properties": { "port": { "type": "integer" } }
            }
        }));

        let ty = SchemaCompiler::new(&mut modules).compile("io.foo", "Owner_ports", &schema);
        assert_eq!(
            ty,
            TypeExpr::MapOf(Box::new(TypeExpr::reference("io.foo", "Owner_ports")))
        );
        assert!(modules.get("io.foo").and_then(|m| m.record("Owner_ports")).is_some());
    }

    #[test]
    fn test_map_of_other_values() {
        let mut modules = ModuleSet::new();
        let mut compiler = SchemaCompiler::new(&mut modules);

        let strings = node(json!({ "type": "object", "additionalProperties": { "type": "string" } }));
        assert_eq!(
            compiler.compile("io.foo", "Labels", &strings),
            TypeExpr::MapOf(Box::new(TypeExpr::Scalar(ScalarType::String)))
        );

        let anything = node(json!({ "type": "object", "additionalProperties": true }));
        assert_eq!(
            compiler.compile("io.foo", "Bag", &anything),
            TypeExpr::MapOf(Box::new(TypeExpr::Any))
        );

        let lists = node(json!({
            "type": "object",
            "additionalProperties": {
                "type": "array",
                "items": { "type": "object", "properties": { "x": { "type": "string" } } }
            }
        }));
        assert_eq!(
            compiler.compile("io.foo", "Groups", &lists),
            TypeExpr::MapOf(Box::new(TypeExpr::Array(Box::new(TypeExpr::reference(
                "io.foo",
                "Groups_value"
            )))))
        );
    }

    #[test]
    fn test_all_of_and_unions() {
        let mut modules = ModuleSet::new();
        let mut compiler = SchemaCompiler::new(&mut modules);

        let all_of = node(json!({
            "allOf": [
                { "$ref": "#/components/schemas/io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta" }
            ],
            "description": "Standard object's metadata."
        }));
        assert_eq!(
            compiler.compile("io.foo", "Thing_metadata", &all_of),
            TypeExpr::Intersection(vec![TypeExpr::reference(
                "io.k8s.apimachinery.pkg.apis.meta.v1",
                "ObjectMeta"
            )])
        );

        let any_of = node(json!({ "anyOf": [{ "type": "integer" }, { "type": "string" }] }));
        let one_of = node(json!({ "oneOf": [{ "type": "integer" }, { "type": "string" }] }));
        let expected = TypeExpr::Union(vec![
            TypeExpr::Scalar(ScalarType::Number),
            TypeExpr::Scalar(ScalarType::String),
        ]);
        assert_eq!(compiler.compile("io.foo", "IntOrString", &any_of), expected);
        assert_eq!(compiler.compile("io.foo", "IntOrString", &one_of), expected);
    }

    #[test]
    fn test_all_of_branches_extend_one_record() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "allOf": [
                { "type": "object", "properties": { "a": { "type": "string" } } },
                { "type": "object", "properties": { "b": { "type": "string" } }, "required": ["b"] }
            ]
        }));

        let ty = SchemaCompiler::new(&mut modules).compile_definition("io.foo", "Merged", &schema);
        let reference = TypeExpr::reference("io.foo", "Merged");
        assert_eq!(ty, TypeExpr::Intersection(vec![reference.clone(), reference]));

        let module = modules.get("io.foo").expect("module");
        assert_eq!(module.len(), 1);
        let record = module.record("Merged").expect("record");
        assert_eq!(record.fields.len(), 2);
        assert!(!record.field("b").expect("b").optional);
    }

    #[test]
    fn test_top_level_alias_for_non_records() {
        let mut modules = ModuleSet::new();
        let mut compiler = SchemaCompiler::new(&mut modules);

        compiler.compile_definition(
            "io.k8s.apimachinery.pkg.apis.meta.v1",
            "Time",
            &node(json!({ "type": "string", "format": "date-time" })),
        );
        compiler.compile_definition(
            "io.k8s.api.core.v1",
            "PodAlias",
            &node(json!({ "$ref": "#/components/schemas/io.k8s.api.core.v1.Pod" })),
        );

        let time = modules
            .get("io.k8s.apimachinery.pkg.apis.meta.v1")
            .and_then(|m| m.alias("Time"))
            .expect("alias");
        assert_eq!(time.ty, TypeExpr::Scalar(ScalarType::String));
        assert_eq!(time.docs.tags[0].text.as_deref(), Some("date-time"));

        let alias = modules
            .get("io.k8s.api.core.v1")
            .and_then(|m| m.alias("PodAlias"))
            .expect("alias");
        assert_eq!(alias.ty, TypeExpr::reference("io.k8s.api.core.v1", "Pod"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut modules = ModuleSet::new();
        let schema = node(json!({
            "type": "object",
            "properties": {
                "not": { "$ref": "#/definitions/io.k8s.JSONSchemaProps" },
                "properties": {
                    "type": "object",
                    "additionalProperties": { "$ref": "#/definitions/io.k8s.JSONSchemaProps" }
                },
                "items": {
                    "anyOf": [
                        { "$ref": "#/definitions/io.k8s.JSONSchemaProps" },
                        { "type": "array", "items": { "$ref": "#/definitions/io.k8s.JSONSchemaProps" } }
                    ]
                }
            }
        }));

        SchemaCompiler::new(&mut modules).compile_definition("io.k8s", "JSONSchemaProps", &schema);
        assert_eq!(modules.declaration_count(), 1);
        assert!(modules.unresolved_references().is_empty());
    }

    #[test]
    fn test_malformed_nodes_become_any() {
        let mut modules = ModuleSet::new();
        let mut compiler = SchemaCompiler::new(&mut modules);

        assert_eq!(compiler.compile("io.foo", "X", &SchemaNode::default()), TypeExpr::Any);
        assert_eq!(
            compiler.compile("io.foo", "X", &node(json!({ "type": "file" }))),
            TypeExpr::Any
        );
        assert_eq!(
            compiler.compile("io.foo", "X", &node(json!({ "type": "array" }))),
            TypeExpr::Array(Box::new(TypeExpr::Any))
        );
        assert_eq!(
            compiler.compile("io.foo", "X", &node(json!({ "properties": { "a": {} } }))),
            TypeExpr::Any
        );
    }

    #[test]
    fn test_alias_name_is_not_replaced_by_record() {
        let mut modules = ModuleSet::new();
        let mut compiler = SchemaCompiler::new(&mut modules);

        compiler.compile_definition("io.foo", "Thing", &node(json!({ "type": "string" })));
        let ty = compiler.compile(
            "io.foo",
            "Thing",
            &node(json!({ "type": "object", "properties": { "a": { "type": "string" } } })),
        );

        assert_eq!(ty, TypeExpr::Reference(TypeRef::new("io.foo", "Thing")));
        assert!(modules.get("io.foo").and_then(|m| m.alias("Thing")).is_some());
    }
}
