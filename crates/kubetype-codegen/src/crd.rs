//! CustomResourceDefinition handling.
//!
//! CRDs embed one OpenAPI schema per served version. They are turned into an
//! ordinary OpenAPI v3 document whose definition keys follow the Kubernetes
//! convention of a reversed group domain: group `cert-manager.io`, version
//! `v1`, kind `Certificate` becomes `io.cert-manager.v1.Certificate`.

use crate::error::{CodegenError, Result};
use serde::Deserialize;
use serde_json::{Value, json};

const CRD_KIND: &str = "CustomResourceDefinition";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrdFile {
    pub spec: CrdSpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrdSpec {
    pub group: String,
    pub names: CrdNames,
    #[serde(default)]
    pub versions: Vec<CrdVersion>,
    /// `apiextensions.k8s.io/v1beta1` single version
    pub version: Option<String>,
    /// `apiextensions.k8s.io/v1beta1` schema shared by all versions
    pub validation: Option<CrdValidation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrdNames {
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrdVersion {
    pub name: String,
    pub schema: Option<CrdValidation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrdValidation {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: Option<Value>,
}

impl CrdFile {
    /// `(version, schema)` pairs, falling back to the legacy top-level
    /// validation schema for versions that don't carry their own.
    pub fn version_schemas(&self) -> Vec<(&str, &Value)> {
        let shared = self
            .spec
            .validation
            .as_ref()
            .and_then(|v| v.open_api_v3_schema.as_ref());

        let mut result = Vec::new();
        for version in &self.spec.versions {
            let schema = version
                .schema
                .as_ref()
                .and_then(|s| s.open_api_v3_schema.as_ref())
                .or(shared);
            match schema {
                Some(schema) => result.push((version.name.as_str(), schema)),
                None => tracing::debug!(
                    kind = %self.spec.names.kind,
                    version = %version.name,
                    "version has no schema, skipping"
                ),
            }
        }

        if self.spec.versions.is_empty() {
            if let (Some(version), Some(schema)) = (&self.spec.version, shared) {
                result.push((version.as_str(), schema));
            }
        }

        result
    }
}

/// Definition key for one CRD version
pub fn crd_definition_key(group: &str, version: &str, kind: &str) -> String {
    let domain: Vec<&str> = group.split('.').rev().collect();
    format!("{}.{}.{}", domain.join("."), version, kind)
}

/// Parse a (possibly multi-document) YAML stream, keeping only CRDs.
///
/// Empty documents and other resource kinds are skipped.
pub fn parse_crds(yaml: &str, origin: &str) -> Result<Vec<CrdFile>> {
    let mut crds = Vec::new();

    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value =
            Value::deserialize(document).map_err(|e| CodegenError::yaml_error(e, origin))?;

        if value.is_null() {
            continue;
        }

        let kind = value.get("kind").and_then(Value::as_str);
        if kind != Some(CRD_KIND) {
            tracing::debug!(origin, kind = ?kind, "skipping non-CRD document");
            continue;
        }

        let crd: CrdFile = serde_json::from_value(value)
            .map_err(|e| CodegenError::parse_error(e, origin))?;
        crds.push(crd);
    }

    Ok(crds)
}

/// Collect every version of every CRD into one OpenAPI v3 document
pub fn crds_to_document(crds: &[CrdFile]) -> Value {
    let mut schemas = serde_json::Map::new();

    for crd in crds {
        for (version, schema) in crd.version_schemas() {
            let key = crd_definition_key(&crd.spec.group, version, &crd.spec.names.kind);
            schemas.insert(key, schema.clone());
        }
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Kubernetes",
            "version": "1.0.0",
        },
        "paths": {},
        "components": {
            "schemas": schemas,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERTIFICATE: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: certificates.cert-manager.io
spec:
  group: cert-manager.io
  names:
    kind: Certificate
    plural: certificates
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                secretName:
                  type: string
"#;

    #[test]
    fn test_definition_key() {
        assert_eq!(
            crd_definition_key("cert-manager.io", "v1", "Certificate"),
            "io.cert-manager.v1.Certificate"
        );
        assert_eq!(
            crd_definition_key("keda.sh", "v1alpha1", "ScaledObject"),
            "sh.keda.v1alpha1.ScaledObject"
        );
    }

    #[test]
    fn test_certificate_synthesis() {
        let crds = parse_crds(CERTIFICATE, "certificate.yaml").expect("parse");
        assert_eq!(crds.len(), 1);

        let doc = crds_to_document(&crds);
        let schema = doc
            .pointer("/components/schemas/io.cert-manager.v1.Certificate")
            .expect("synthesized definition");
        assert_eq!(schema["type"], "object");
        assert!(schema.pointer("/properties/spec/properties/secretName").is_some());
    }

    #[test]
    fn test_multi_document_stream_skips_other_kinds() {
        let stream = format!(
            "---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: cert-manager\n---\n{CERTIFICATE}"
        );
        let crds = parse_crds(&stream, "bundle.yaml").expect("parse");
        assert_eq!(crds.len(), 1);
        assert_eq!(crds[0].spec.names.kind, "Certificate");
    }

    #[test]
    fn test_legacy_validation_fallback() {
        let legacy = r#"
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
spec:
  group: example.com
  version: v1alpha1
  names:
    kind: Widget
  validation:
    openAPIV3Schema:
      type: object
"#;
        let crds = parse_crds(legacy, "legacy.yaml").expect("parse");
        let doc = crds_to_document(&crds);
        assert!(
            doc.pointer("/components/schemas/com.example.v1alpha1.Widget")
                .is_some()
        );
    }

    #[test]
    fn test_every_version_is_synthesized() {
        let yaml = r#"
kind: CustomResourceDefinition
spec:
  group: keda.sh
  names:
    kind: ScaledJob
  versions:
    - name: v1alpha1
      schema:
        openAPIV3Schema:
          type: object
    - name: v1beta1
      schema:
        openAPIV3Schema:
          type: string
    - name: v1
"#;
        let crds = parse_crds(yaml, "scaledjob.yaml").expect("parse");
        let doc = crds_to_document(&crds);
        let schemas = doc.pointer("/components/schemas").and_then(Value::as_object).expect("schemas");
        assert_eq!(schemas.len(), 2);
        assert!(schemas.contains_key("sh.keda.v1alpha1.ScaledJob"));
        assert!(schemas.contains_key("sh.keda.v1beta1.ScaledJob"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(parse_crds("kind: [unterminated", "bad.yaml").is_err());
    }
}
