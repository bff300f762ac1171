use crate::declarations::{
    AliasDecl, Declaration, Module, ModuleSet, RecordDecl, ScalarType, TypeExpr, TypeRef,
};
use crate::description::DocComment;
use proc_macro2::TokenStream;
use quote::quote;
use smol_str::SmolStr;
use std::collections::HashSet;

use super::RustEmitter;
use super::utils::{
    UniqueNames, field_ident, generate_doc_comment, ident_text, make_ident,
    value_to_variant_name,
};

/// Emits the items of a single module.
///
/// Unions, intersections and literal unions that appear inside another type
/// are hoisted into their own items; `names` keeps those unique within the
/// module.
pub(super) struct ModuleEmitter<'e, 'm> {
    emitter: &'e RustEmitter<'m>,
    module: &'m Module,
    names: UniqueNames,
    hoisted: Vec<TokenStream>,
}

impl<'e, 'm> ModuleEmitter<'e, 'm> {
    pub(super) fn new(emitter: &'e RustEmitter<'m>, module: &'m Module) -> Self {
        let mut names = UniqueNames::new();
        for declaration in module.declarations() {
            names.reserve(ident_text(&make_ident(declaration.name())));
        }
        Self {
            emitter,
            module,
            names,
            hoisted: Vec::new(),
        }
    }

    /// All items of the module, declarations first, hoisted types after
    pub(super) fn generate(mut self) -> Vec<TokenStream> {
        let mut items = Vec::with_capacity(self.module.len());
        for declaration in self.module.declarations() {
            let item = match declaration {
                Declaration::Record(record) => self.generate_record(record),
                Declaration::Alias(alias) => self.generate_alias(alias),
            };
            items.push(item);
        }
        items.append(&mut self.hoisted);
        items
    }

    fn generate_record(&mut self, record: &RecordDecl) -> TokenStream {
        let ident = make_ident(&record.name);
        let doc = generate_doc_comment(&record.docs);

        let mut field_names = UniqueNames::new();
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let base = field_ident(&field.name);
            let field_name = field_names.claim_with(&ident_text(&base), "_");
            let member = make_ident(&field_name);

            let owner = format!("{}_{}", record.name, field_name);
            let ty = self.rust_type(&field.ty, &owner, true);
            let field_doc = generate_doc_comment(&field.docs);

            let rename = if field_name != field.name.as_str() {
                let raw = field.name.as_str();
                quote! { #[serde(rename = #raw)] }
            } else {
                quote! {}
            };

            fields.push(if field.optional {
                quote! {
                    #field_doc
                    #rename
                    #[serde(skip_serializing_if = "std::option::Option::is_none")]
                    pub #member: std::option::Option<#ty>,
                }
            } else {
                quote! {
                    #field_doc
                    #rename
                    pub #member: #ty,
                }
            });
        }

        quote! {
            #doc
            #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
            pub struct #ident {
                #(#fields)*
            }
        }
    }

    fn generate_alias(&mut self, alias: &AliasDecl) -> TokenStream {
        let name = ident_text(&make_ident(&alias.name));

        match &alias.ty {
            TypeExpr::Union(parts) if !parts.is_empty() => {
                self.generate_union(&name, parts, &alias.docs)
            }
            TypeExpr::Intersection(parts) if !parts.is_empty() => {
                self.generate_intersection(&name, parts, &alias.docs)
            }
            TypeExpr::LiteralUnion(values) => {
                self.generate_literal_union(&name, values, &alias.docs)
            }
            ty => {
                let ident = make_ident(&name);
                let doc = generate_doc_comment(&alias.docs);
                let start = TypeRef::new(self.module.path().clone(), alias.name.clone());

                match alias_cycle(self.emitter.modules, &start, ty) {
                    Some(AliasCycle::Direct) => {
                        tracing::warn!(
                            module = %self.module.path(),
                            name = %alias.name,
                            "alias expands to itself, emitting untyped value"
                        );
                        quote! {
                            #doc
                            pub type #ident = serde_json::Value;
                        }
                    }
                    Some(AliasCycle::ThroughContainer) => {
                        tracing::debug!(
                            module = %self.module.path(),
                            name = %alias.name,
                            "recursive alias, emitting newtype"
                        );
                        let rust_type = self.rust_type(ty, &name, true);
                        quote! {
                            #doc
                            #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
                            pub struct #ident(pub #rust_type);
                        }
                    }
                    None => {
                        let rust_type = self.rust_type(ty, &name, false);
                        quote! {
                            #doc
                            pub type #ident = #rust_type;
                        }
                    }
                }
            }
        }
    }

    /// An untagged enum with one variant per branch
    fn generate_union(&mut self, name: &str, parts: &[TypeExpr], docs: &DocComment) -> TokenStream {
        let ident = make_ident(name);
        let doc = generate_doc_comment(docs);

        let mut variant_names = UniqueNames::new();
        let variants: Vec<_> = distinct(parts)
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let variant_name = variant_names.claim(&variant_base_name(part, i));
                let variant_ident = make_ident(&variant_name);
                let owner = format!("{}_{}", name, variant_name);
                let ty = self.rust_type(part, &owner, true);
                quote! { #variant_ident(#ty) }
            })
            .collect();

        quote! {
            #doc
            #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
            #[serde(untagged)]
            pub enum #ident {
                #(#variants,)*
            }
        }
    }

    /// A struct flattening every part into one object
    fn generate_intersection(
        &mut self,
        name: &str,
        parts: &[TypeExpr],
        docs: &DocComment,
    ) -> TokenStream {
        let ident = make_ident(name);
        let doc = generate_doc_comment(docs);

        let fields: Vec<_> = distinct(parts)
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let member = make_ident(&format!("part{}", i));
                let owner = format!("{}_part{}", name, i);
                let ty = self.rust_type(part, &owner, true);
                quote! {
                    #[serde(flatten)]
                    pub #member: #ty,
                }
            })
            .collect();

        quote! {
            #doc
            #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
            pub struct #ident {
                #(#fields)*
            }
        }
    }

    /// A fieldless enum whose variants serialize as the exact literal texts
    fn generate_literal_union(
        &mut self,
        name: &str,
        values: &[SmolStr],
        docs: &DocComment,
    ) -> TokenStream {
        let ident = make_ident(name);
        let doc = generate_doc_comment(docs);

        let mut variant_names = UniqueNames::new();
        let variants: Vec<_> = distinct(values)
            .into_iter()
            .map(|value| {
                let variant_ident = make_ident(&variant_names.claim(&value_to_variant_name(value)));
                let literal = value.as_str();
                quote! {
                    #[serde(rename = #literal)]
                    #variant_ident
                }
            })
            .collect();

        quote! {
            #doc
            #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum #ident {
                #(#variants,)*
            }
        }
    }

    /// Rust type for a type expression.
    ///
    /// `owner` names any item hoisted out of this position. References are
    /// boxed when `direct` is set, since they may be recursive.
    fn rust_type(&mut self, ty: &TypeExpr, owner: &str, direct: bool) -> TokenStream {
        match ty {
            TypeExpr::Reference(target) => {
                let path = self.emitter.reference_path(target);
                if direct {
                    quote! { std::boxed::Box<#path> }
                } else {
                    path
                }
            }
            TypeExpr::Array(inner) => {
                let inner = self.rust_type(inner, owner, false);
                quote! { std::vec::Vec<#inner> }
            }
            TypeExpr::MapOf(inner) => {
                let inner = self.rust_type(inner, owner, false);
                quote! { std::collections::BTreeMap<std::string::String, #inner> }
            }
            TypeExpr::Scalar(ScalarType::String) => quote! { std::string::String },
            TypeExpr::Scalar(ScalarType::Number) => quote! { f64 },
            TypeExpr::Scalar(ScalarType::Boolean) => quote! { bool },
            TypeExpr::Scalar(ScalarType::Object) => {
                quote! { serde_json::Map<std::string::String, serde_json::Value> }
            }
            TypeExpr::Union(parts) | TypeExpr::Intersection(parts) if parts.is_empty() => {
                quote! { serde_json::Value }
            }
            TypeExpr::Any => quote! { serde_json::Value },
            TypeExpr::Union(parts) => {
                let name = self.claim_item_name(owner);
                let item = self.generate_union(&name, parts, &DocComment::default());
                self.hoist(&name, item)
            }
            TypeExpr::Intersection(parts) => {
                let name = self.claim_item_name(owner);
                let item = self.generate_intersection(&name, parts, &DocComment::default());
                self.hoist(&name, item)
            }
            TypeExpr::LiteralUnion(values) => {
                let name = self.claim_item_name(owner);
                let item = self.generate_literal_union(&name, values, &DocComment::default());
                self.hoist(&name, item)
            }
        }
    }

    fn claim_item_name(&mut self, owner: &str) -> String {
        self.names.claim(&ident_text(&make_ident(owner)))
    }

    fn hoist(&mut self, name: &str, item: TokenStream) -> TokenStream {
        tracing::trace!(module = %self.module.path(), name, "hoisting nested type");
        self.hoisted.push(item);
        let ident = make_ident(name);
        quote! { #ident }
    }
}

/// Parts in first-seen order, without repeats. Merged documents concatenate
/// `allOf` and `enum` lists, so the same part can appear several times.
fn distinct<T: PartialEq>(parts: &[T]) -> Vec<&T> {
    let mut unique: Vec<&T> = Vec::with_capacity(parts.len());
    for part in parts {
        if !unique.contains(&part) {
            unique.push(part);
        }
    }
    unique
}

/// How an alias refers back to itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliasCycle {
    /// Only through other aliases; the type has no finite expansion
    Direct,
    /// Through a `Vec` or map, so a newtype can break it
    ThroughContainer,
}

/// Follow `ty` through references to plain aliases and into arrays and maps,
/// looking for `start`.
///
/// Records and aliases emitted as enums or structs are nominal types and end
/// the walk.
fn alias_cycle(modules: &ModuleSet, start: &TypeRef, ty: &TypeExpr) -> Option<AliasCycle> {
    fn walk(
        modules: &ModuleSet,
        start: &TypeRef,
        ty: &TypeExpr,
        contained: bool,
        visited: &mut HashSet<TypeRef>,
    ) -> Option<AliasCycle> {
        match ty {
            TypeExpr::Reference(target) if target == start => Some(if contained {
                AliasCycle::ThroughContainer
            } else {
                AliasCycle::Direct
            }),
            TypeExpr::Reference(target) => {
                if !visited.insert(target.clone()) {
                    return None;
                }
                match modules.resolve(target) {
                    Some(Declaration::Alias(alias)) if !is_nominal(&alias.ty) => {
                        walk(modules, start, &alias.ty, contained, visited)
                    }
                    _ => None,
                }
            }
            TypeExpr::Array(inner) | TypeExpr::MapOf(inner) => {
                walk(modules, start, inner, true, visited)
            }
            _ => None,
        }
    }

    walk(modules, start, ty, false, &mut HashSet::new())
}

/// Alias types that are emitted as their own enum or struct
fn is_nominal(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Union(parts) | TypeExpr::Intersection(parts) => !parts.is_empty(),
        TypeExpr::LiteralUnion(_) => true,
        _ => false,
    }
}

/// Base variant name for one union branch
fn variant_base_name(part: &TypeExpr, index: usize) -> String {
    match part {
        TypeExpr::Reference(target) => value_to_variant_name(&target.name),
        TypeExpr::Scalar(ScalarType::String) => "String".to_string(),
        TypeExpr::Scalar(ScalarType::Number) => "Number".to_string(),
        TypeExpr::Scalar(ScalarType::Boolean) => "Boolean".to_string(),
        TypeExpr::Scalar(ScalarType::Object) => "Object".to_string(),
        TypeExpr::Array(_) => "Array".to_string(),
        TypeExpr::MapOf(_) => "Map".to_string(),
        TypeExpr::Any => "Value".to_string(),
        _ => format!("Variant{}", index),
    }
}
