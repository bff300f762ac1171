use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch Kubernetes schemas and generate Rust types")]
pub struct SchemaFetchArgs {
    /// Path to KDL config file
    #[arg(short = 'c', long, default_value = "schemas.kdl")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate Rust types from a directory of Kubernetes schemas")]
pub struct CodegenArgs {
    /// Directory containing OpenAPI JSON files, CRD YAML files or a kustomization
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output file for generated Rust code
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Rust path the generated file is mounted at
    #[arg(short = 'r', long, default_value = "crate")]
    pub root_module: String,

    /// Template expansion program used for kustomization directories
    #[arg(long, default_value = "kustomize")]
    pub expander: String,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
