//! # Kubernetes schema compilation and Rust code generation for kubetype
//!
//! This crate discovers OpenAPI documents and CustomResourceDefinitions,
//! merges them and compiles every definition into namespaced Rust types.
//!
//! ## Usage
//!
//! ### Fetch and generate
//!
//! The `schema-fetch` binary acquires schemas from the sources configured in
//! `schemas.kdl` and runs the compile/emit pipeline on them:
//!
//! ```bash
//! cargo run -p kubetype-codegen --bin schema-fetch -- -c schemas.kdl
//! ```
//!
//! ### Generate from a local directory
//!
//! ```bash
//! cargo run -p kubetype-codegen --bin kubetype-codegen -- \
//!     -i ./schemas \
//!     -o ./crates/kubetype/src/generated.rs
//! ```
//!
//! ## Modules
//!
//! - [`names`] - Identifier sanitization for keys, references and properties
//! - [`description`] - Documentation payloads extracted from schema nodes
//! - [`schema`] - Schema nodes, shape classification and schema documents
//! - [`merge`] - Deep merge of raw schema documents
//! - [`crd`] - CustomResourceDefinition to schema document synthesis
//! - [`declarations`] - Modules, declarations and type expressions
//! - [`compiler`] - The recursive schema compiler
//! - [`modules`] - Partitioning definitions into modules
//! - [`codegen`] - Rust source emission for a compiled module set
//! - [`fetch`] - Acquires schema documents from GitHub and local sources

pub mod cli;
pub mod codegen;
pub mod compiler;
pub mod crd;
pub mod declarations;
pub mod description;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod modules;
pub mod names;
pub mod schema;
