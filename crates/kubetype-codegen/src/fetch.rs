//! Schema acquisition and the fetch-compile-emit pipeline.

pub mod acquire;
pub mod config;
pub mod expand;
pub mod sources;

pub use acquire::Acquirer;
pub use config::Config;
pub use expand::{Kustomize, TemplateExpander};
pub use sources::{DirectoryEntry, DirectorySource, EntryKind, Source, SourceType};

use crate::codegen::RustEmitter;
use crate::declarations::ModuleSet;
use crate::merge::merge_documents;
use crate::modules::build_modules;
use crate::schema::SchemaDocument;
use miette::Result;
use tracing::Instrument;

/// Acquire the documents at `location`, merge them and compile the result
/// into `modules`
pub async fn compile_location(
    source: &dyn DirectorySource,
    expander: &dyn TemplateExpander,
    location: &str,
    modules: &mut ModuleSet,
) -> Result<()> {
    let documents = Acquirer::new(source, expander).acquire(location).await?;
    let merged = merge_documents(documents);
    let document = SchemaDocument::from_value(&merged);
    build_modules(&document, modules);
    Ok(())
}

/// Log every reference that doesn't resolve to a declaration
pub fn report_unresolved(modules: &ModuleSet) {
    for reference in modules.unresolved_references() {
        tracing::warn!(%reference, "reference does not resolve to any declaration");
    }
}

/// Runs every configured source through the pipeline
pub struct Fetcher {
    config: Config,
}

impl Fetcher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Compile all sources, in config order, into one module set
    pub async fn fetch_all(&self) -> Result<ModuleSet> {
        let expander = Kustomize::new(self.config.expander.program.clone());
        let mut modules = ModuleSet::new();

        for source in &self.config.sources {
            let span = tracing::info_span!("source", name = %source.name);
            let location = source.location();
            compile_location(&source.source_type, &expander, &location, &mut modules)
                .instrument(span)
                .await?;
        }

        report_unresolved(&modules);
        tracing::info!(
            sources = self.config.sources.len(),
            modules = modules.len(),
            declarations = modules.declaration_count(),
            "compiled all sources"
        );

        Ok(modules)
    }

    /// Compile all sources and write the generated code
    pub async fn run(&self) -> Result<()> {
        let modules = self.fetch_all().await?;
        let emitter = RustEmitter::new(&modules, &self.config.output.root_module)?;
        emitter.write_to_disk(&self.config.output.file)?;
        Ok(())
    }
}
