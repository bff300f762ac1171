//! Turning a listed location into raw schema documents.

use super::expand::TemplateExpander;
use super::sources::{DirectoryEntry, DirectorySource, EntryKind};
use crate::crd::{CrdFile, crds_to_document, parse_crds};
use crate::error::CodegenError;
use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Entry name prefix marking a directory for template expansion
pub const TEMPLATE_MARKER: &str = "kustomization";

pub struct Acquirer<'a> {
    source: &'a dyn DirectorySource,
    expander: &'a dyn TemplateExpander,
}

impl<'a> Acquirer<'a> {
    pub fn new(source: &'a dyn DirectorySource, expander: &'a dyn TemplateExpander) -> Self {
        Self { source, expander }
    }

    /// Fetch every schema document at `location`.
    ///
    /// JSON files are returned as they are. YAML files, or the output of
    /// template expansion when the location holds a kustomization, are read
    /// as CustomResourceDefinitions and gathered into one synthesized
    /// document, which comes last.
    ///
    /// A failed fetch or parse is an error. A failed expansion only drops
    /// the expanded documents.
    pub async fn acquire(&self, location: &str) -> Result<Vec<Value>> {
        tracing::info!(location, "fetching schema documents");

        let entries = self.source.list(location).await?;
        let mut documents = Vec::new();
        let mut crds = Vec::new();

        if entries.iter().any(|e| e.name.starts_with(TEMPLATE_MARKER)) {
            crds = self.expand_directory(&entries).await?;
        } else {
            for entry in entries.iter().filter(|e| e.kind == EntryKind::File) {
                if entry.name.ends_with(".json") {
                    let text = self.source.fetch(&entry.path).await?;
                    let document: Value = serde_json::from_str(&text).map_err(|e| {
                        CodegenError::parse_error_with_source(e, &entry.path, text.clone())
                    })?;
                    documents.push(document);
                } else if entry.name.ends_with(".yaml") || entry.name.ends_with(".yml") {
                    let text = self.source.fetch(&entry.path).await?;
                    crds.extend(parse_crds(&text, &entry.path)?);
                } else {
                    tracing::debug!(name = %entry.name, "skipping non-schema file");
                }
            }
        }

        if !crds.is_empty() {
            tracing::debug!(count = crds.len(), "synthesizing document from CRDs");
            documents.push(crds_to_document(&crds));
        }

        tracing::info!(location, documents = documents.len(), "fetched schema documents");
        Ok(documents)
    }

    /// Download the directory into a scratch dir, expand it and parse the
    /// resulting stream
    async fn expand_directory(&self, entries: &[DirectoryEntry]) -> Result<Vec<CrdFile>> {
        let scratch = tempfile::Builder::new()
            .prefix("kubetype-expand-")
            .tempdir()
            .into_diagnostic()?;

        self.download(entries, scratch.path()).await?;

        let crds = match self.expander.expand(scratch.path()).await {
            Ok(output) => parse_crds(&output, "template expansion output").map_err(Into::into),
            Err(e) => {
                tracing::error!(error = ?e, "template expansion failed, skipping its documents");
                Ok(Vec::new())
            }
        };

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::warn!(path = %scratch_path.display(), error = %e, "failed to remove scratch directory");
        }

        crds
    }

    fn download<'s>(
        &'s self,
        entries: &'s [DirectoryEntry],
        target: &'s Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 's>> {
        Box::pin(async move {
            for entry in entries {
                if entry.name.is_empty() || entry.name.contains(['/', '\\']) || entry.name == ".." {
                    tracing::warn!(name = %entry.name, "skipping entry with unusable name");
                    continue;
                }

                let destination = target.join(&entry.name);
                match entry.kind {
                    EntryKind::File => {
                        let text = self.source.fetch(&entry.path).await?;
                        tokio::fs::write(&destination, text).await.into_diagnostic()?;
                    }
                    EntryKind::Directory => {
                        tokio::fs::create_dir_all(&destination)
                            .await
                            .into_diagnostic()?;
                        let children = self.source.list(&entry.path).await?;
                        self.download(&children, &destination).await?;
                    }
                }
            }
            Ok(())
        })
    }
}
