use crate::description::DocComment;
use heck::{ToPascalCase, ToSnakeCase};
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashSet;

/// Convert a value string to a valid Rust variant name
pub(super) fn value_to_variant_name(value: &str) -> String {
    // Remove leading special chars and convert to pascal case
    let clean = value.trim_start_matches(|c: char| !c.is_alphanumeric());
    let variant = clean.replace(['-', '.', '/'], "_").to_pascal_case();

    if variant.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{}", variant)
    } else if variant.is_empty() {
        "Unknown".to_string()
    } else {
        variant
    }
}

/// Sanitize a string to be safe for identifiers
pub(super) fn sanitize_name(s: &str) -> String {
    if s.is_empty() {
        return "unknown".to_string();
    }

    // Replace invalid characters with underscores
    let mut sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Ensure it doesn't start with a digit
    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized = format!("_{}", sanitized);
    }

    // Keywords that can't be raw identifiers
    if matches!(sanitized.as_str(), "self" | "Self" | "super" | "crate" | "_") {
        sanitized.push('_');
    }

    sanitized
}

/// Create an identifier, using raw identifier if necessary for keywords
pub(super) fn make_ident(s: &str) -> syn::Ident {
    let sanitized = sanitize_name(s);

    syn::parse_str::<syn::Ident>(&sanitized).unwrap_or_else(|_| {
        syn::Ident::new_raw(&sanitized, proc_macro2::Span::call_site())
    })
}

/// Snake-cased field identifier for a schema property name
pub(super) fn field_ident(property: &str) -> syn::Ident {
    let snake = property.to_snake_case();
    if snake.is_empty() {
        make_ident("field")
    } else {
        make_ident(&snake)
    }
}

/// The text of an identifier without any `r#` prefix
pub(super) fn ident_text(ident: &syn::Ident) -> String {
    let text = ident.to_string();
    match text.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// `#[doc]` attributes for a documentation payload, one per line
pub(super) fn generate_doc_comment(docs: &DocComment) -> TokenStream {
    let lines = docs.lines().into_iter().map(|line| {
        if line.is_empty() {
            line
        } else {
            format!(" {}", line)
        }
    });
    quote! {
        #(#[doc = #lines])*
    }
}

/// Hands out names that are unique within one scope by appending a counter
#[derive(Debug, Default)]
pub(super) struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Mark a name as used without renaming it
    pub(super) fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// `base`, or `base2`, `base3`... if it's taken
    pub(super) fn claim(&mut self, base: &str) -> String {
        self.claim_with(base, "")
    }

    /// Like [`claim`](Self::claim), with a separator before the counter
    pub(super) fn claim_with(&mut self, base: &str, separator: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}{}{}", base, separator, counter);
            counter += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
