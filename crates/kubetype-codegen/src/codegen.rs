//! Rust source generation for compiled modules.
//!
//! Every module path segment becomes a nested `pub mod`, records become
//! serde structs and aliases become type aliases, or enums for unions and
//! literal unions. References are written as absolute paths under the
//! configured root module so the output can be mounted anywhere in a crate.

use crate::declarations::{ModuleSet, TypeRef};
use crate::error::{CodegenError, Result};
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::BTreeMap;

mod output;
mod types;
mod utils;

use types::ModuleEmitter;
use utils::{ident_text, make_ident};

/// Code generator for a compiled [`ModuleSet`]
pub struct RustEmitter<'m> {
    modules: &'m ModuleSet,
    root: syn::Path,
}

/// Nested module tree, built from dotted module paths
#[derive(Default)]
struct ModuleTree {
    items: Vec<TokenStream>,
    children: BTreeMap<String, ModuleTree>,
}

impl ModuleTree {
    fn child(&mut self, segments: &[&str]) -> &mut ModuleTree {
        match segments.split_first() {
            Some((first, rest)) => self
                .children
                .entry(ident_text(&make_ident(first)))
                .or_default()
                .child(rest),
            None => self,
        }
    }

    fn to_tokens(&self) -> TokenStream {
        let children = self.children.iter().map(|(name, child)| {
            let ident = make_ident(name);
            let body = child.to_tokens();
            quote! {
                pub mod #ident {
                    #body
                }
            }
        });
        let items = &self.items;
        quote! {
            #(#children)*
            #(#items)*
        }
    }
}

impl<'m> RustEmitter<'m> {
    /// Create an emitter; `root_module` is the Rust path the output is
    /// mounted at, such as `crate` or `crate::generated`.
    pub fn new(modules: &'m ModuleSet, root_module: &str) -> Result<Self> {
        let root = syn::parse_str::<syn::Path>(root_module)
            .map_err(|source| CodegenError::FormatError { source })?;
        Ok(Self { modules, root })
    }

    /// Generate tokens for the whole module set
    pub fn generate(&self) -> TokenStream {
        let mut tree = ModuleTree::default();

        for module in self.modules.iter() {
            let segments = module_segments(module.path());
            let items = ModuleEmitter::new(self, module).generate();
            tracing::debug!(
                module = %module.path(),
                declarations = module.len(),
                items = items.len(),
                "generated module"
            );
            tree.child(&segments).items.extend(items);
        }

        let body = tree.to_tokens();
        quote! {
            #![allow(
                non_camel_case_types,
                non_snake_case,
                clippy::large_enum_variant,
                clippy::enum_variant_names
            )]

            #body
        }
    }

    /// Absolute path of a referenced declaration
    pub(crate) fn reference_path(&self, target: &TypeRef) -> TokenStream {
        let root = &self.root;
        let segments = module_segments(&target.module)
            .into_iter()
            .map(make_ident);
        let ident = make_ident(&target.name);
        quote! { #root #(:: #segments)* :: #ident }
    }
}

fn module_segments(path: &str) -> Vec<&str> {
    path.split('.').filter(|segment| !segment.is_empty()).collect()
}
