//! Identifier sanitization for schema keys, references and property names.
//!
//! Definition keys look like `io.k8s.api.core.v1.Pod` and references like
//! `#/components/schemas/io.k8s.api.core.v1.Pod`. Everything before the final
//! dot is the namespace (module path), the final segment is the declaration.

use crate::declarations::{ScalarType, TypeExpr, TypeRef};
use smol_str::SmolStr;

/// Split a reference or definition key into `(namespace, leaf)`.
///
/// Any URI or JSON-pointer prefix is dropped, `-` in the namespace becomes `_`.
/// The leaf is returned unsanitized.
///
/// - `#/definitions/io.cert-manager.v1.Certificate` → (`io.cert_manager.v1`, `Certificate`)
/// - `Pod` → (``, `Pod`)
pub fn split_ref(pointer: &str) -> (String, String) {
    let key = pointer.rsplit('/').next().unwrap_or(pointer);
    match key.rsplit_once('.') {
        Some((namespace, leaf)) => (namespace.replace('-', "_"), leaf.to_string()),
        None => (String::new(), key.to_string()),
    }
}

/// Module path for a raw definition key
pub fn to_module_path(raw_key: &str) -> String {
    split_ref(raw_key).0
}

/// Declaration name for a raw leaf: `.` and `-` become `_`
pub fn to_declaration_name(raw_leaf: &str) -> String {
    raw_leaf.replace(['.', '-'], "_")
}

/// Property names keep their exact text.
///
/// Schema properties such as `x-kubernetes-preserve-unknown-fields` or `$ref`
/// are not legal bare identifiers anywhere, so emitters quote or rename them
/// rather than the compiler rewriting them.
pub fn to_property_name(raw_name: &str) -> SmolStr {
    SmolStr::new(raw_name)
}

/// Fully qualified `module.Declaration` reference text for a pointer
pub fn to_reference_expression(pointer: &str) -> String {
    let type_ref = to_type_ref(pointer);
    if type_ref.module.is_empty() {
        type_ref.name.to_string()
    } else {
        format!("{}.{}", type_ref.module, type_ref.name)
    }
}

/// Structured form of [`to_reference_expression`]
pub fn to_type_ref(pointer: &str) -> TypeRef {
    let (module, leaf) = split_ref(pointer);
    TypeRef::new(module, to_declaration_name(&leaf))
}

/// Map a schema scalar type onto the output type vocabulary.
///
/// `integer` and `number` both become [`ScalarType::Number`].
pub fn map_scalar_type(raw_type: &str) -> TypeExpr {
    match raw_type {
        "string" => TypeExpr::Scalar(ScalarType::String),
        "integer" | "number" => TypeExpr::Scalar(ScalarType::Number),
        "boolean" => TypeExpr::Scalar(ScalarType::Boolean),
        "object" => TypeExpr::Scalar(ScalarType::Object),
        "array" => TypeExpr::Array(Box::new(TypeExpr::Any)),
        _ => TypeExpr::Any,
    }
}

/// Join a parent declaration name and a property into a nested declaration name
pub fn nested_name(parent: &str, property: &str) -> String {
    format!(
        "{}_{}",
        to_declaration_name(parent),
        to_declaration_name(property)
    )
}
