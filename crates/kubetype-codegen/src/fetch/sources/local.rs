use super::{DirectoryEntry, DirectorySource, EntryKind};
use async_trait::async_trait;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;

/// A directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    pub path: PathBuf,
    /// Glob matched against file names; directories are always listed
    pub pattern: Option<String>,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pattern: None,
        }
    }
}

#[async_trait]
impl DirectorySource for LocalDirectory {
    async fn list(&self, location: &str) -> Result<Vec<DirectoryEntry>> {
        let pattern = self
            .pattern
            .as_deref()
            .map(glob::Pattern::new)
            .transpose()
            .into_diagnostic()
            .wrap_err("Invalid file pattern")?;

        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(location)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to list {}", location))?;

            let name = entry.file_name().to_string_lossy().into_owned();
            let kind = if entry.file_type().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            if kind == EntryKind::File {
                if let Some(pattern) = &pattern {
                    if !pattern.matches(&name) {
                        continue;
                    }
                }
            }

            entries.push(DirectoryEntry {
                name,
                path: entry.path().to_string_lossy().into_owned(),
                kind,
            });
        }

        Ok(entries)
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_and_fetch() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.yaml"), "kind: Foo").expect("write");
        std::fs::write(dir.path().join("a.json"), "{}").expect("write");
        std::fs::create_dir(dir.path().join("bases")).expect("mkdir");

        let location = dir.path().to_string_lossy().into_owned();
        let source = LocalDirectory::new(dir.path());
        let entries = source.list(&location).await.expect("list");

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "b.yaml", "bases"]);
        assert_eq!(entries[2].kind, EntryKind::Directory);

        let text = source.fetch(&entries[1].path).await.expect("fetch");
        assert_eq!(text, "kind: Foo");
    }

    #[tokio::test]
    async fn test_pattern_filters_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.json"), "{}").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "").expect("write");
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");

        let source = LocalDirectory {
            path: dir.path().to_path_buf(),
            pattern: Some("*.json".to_string()),
        };
        let entries = source
            .list(&dir.path().to_string_lossy())
            .await
            .expect("list");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "nested"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let source = LocalDirectory::new("/definitely/not/here");
        assert!(source.list("/definitely/not/here").await.is_err());
        assert!(source.fetch("/definitely/not/here/a.json").await.is_err());
    }
}
