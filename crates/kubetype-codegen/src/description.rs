//! Documentation payloads extracted from schema nodes.

use crate::schema::SchemaNode;
use serde_json::Value;

/// A single documentation tag such as `@format int32` or `@nullable`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    pub name: &'static str,
    /// `None` for flag tags
    pub text: Option<String>,
}

impl DocTag {
    fn flag(name: &'static str) -> Self {
        Self { name, text: None }
    }

    fn with_text(name: &'static str, text: impl Into<String>) -> Self {
        Self {
            name,
            text: Some(text.into()),
        }
    }
}

/// Free text plus ordered tags describing one declaration or field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub body: Option<String>,
    pub tags: Vec<DocTag>,
}

impl DocComment {
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.tags.is_empty()
    }

    /// Render as documentation lines: the body, a blank separator, then one
    /// `@tag value` line per tag.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .body
            .as_deref()
            .map(|body| body.lines().map(str::to_string).collect())
            .unwrap_or_default();

        if !lines.is_empty() && !self.tags.is_empty() {
            lines.push(String::new());
        }

        for tag in &self.tags {
            match &tag.text {
                Some(text) => lines.push(format!("@{} {}", tag.name, text)),
                None => lines.push(format!("@{}", tag.name)),
            }
        }

        lines
    }
}

/// Extract the documentation payload of a schema node
pub fn describe(node: &SchemaNode) -> DocComment {
    let body = node.description.as_deref().map(clean_description);

    let mut tags = Vec::new();
    if let Some(format) = &node.format {
        tags.push(DocTag::with_text("format", format.clone()));
    }
    if let Some(example) = present(node.example.as_ref()) {
        tags.push(DocTag::with_text("example", value_text(example)));
    }
    if node.nullable == Some(true) {
        tags.push(DocTag::flag("nullable"));
    }
    if node.deprecated == Some(true) {
        tags.push(DocTag::flag("deprecated"));
    }
    if let Some(pattern) = &node.pattern {
        tags.push(DocTag::with_text("pattern", pattern.clone()));
    }
    if let Some(default) = present(node.default.as_ref()) {
        let empty_object = default.as_object().is_some_and(|map| map.is_empty());
        if !empty_object {
            tags.push(DocTag::with_text("default", value_text(default)));
        }
    }

    DocComment { body, tags }
}

/// Escape comment terminators and normalize non-breaking spaces
fn clean_description(description: &str) -> String {
    description.replace("*/", "*\\/").replace('\u{00A0}', " ")
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
