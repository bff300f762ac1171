mod github;
mod local;

pub use github::{DEFAULT_TIMEOUT, GitHubDirectory};
pub use local::LocalDirectory;

use async_trait::async_trait;
use miette::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a listed location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File or directory name, without any parent path
    pub name: String,
    /// Location to pass back to [`DirectorySource::list`] or
    /// [`DirectorySource::fetch`]
    pub path: String,
    pub kind: EntryKind,
}

/// A remote or local tree of schema files
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// List the entries directly under `location`
    async fn list(&self, location: &str) -> Result<Vec<DirectoryEntry>>;

    /// Fetch the text of the file at `path`
    async fn fetch(&self, path: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub source_type: SourceType,
}

impl Source {
    /// Location the acquisition for this source starts from
    pub fn location(&self) -> String {
        self.source_type.location()
    }
}

#[derive(Debug, Clone)]
pub enum SourceType {
    GitHub(GitHubDirectory),
    Local(LocalDirectory),
}

impl SourceType {
    pub fn location(&self) -> String {
        match self {
            SourceType::GitHub(s) => s.url.clone(),
            SourceType::Local(s) => s.path.to_string_lossy().into_owned(),
        }
    }
}

#[async_trait]
impl DirectorySource for SourceType {
    async fn list(&self, location: &str) -> Result<Vec<DirectoryEntry>> {
        match self {
            SourceType::GitHub(s) => s.list(location).await,
            SourceType::Local(s) => s.list(location).await,
        }
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        match self {
            SourceType::GitHub(s) => s.fetch(path).await,
            SourceType::Local(s) => s.fetch(path).await,
        }
    }
}
