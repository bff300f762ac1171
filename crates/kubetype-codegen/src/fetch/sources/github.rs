use super::{DirectoryEntry, DirectorySource, EntryKind};
use crate::error::CodegenError;
use async_trait::async_trait;
use miette::Result;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A directory in a GitHub repository, addressed by its `/tree/` URL
#[derive(Debug, Clone)]
pub struct GitHubDirectory {
    pub url: String,
    pub timeout: Duration,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TreePage {
    payload: TreePayload,
}

#[derive(Deserialize)]
struct TreePayload {
    tree: Tree,
}

#[derive(Deserialize)]
struct Tree {
    items: Vec<TreeItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeItem {
    name: String,
    content_type: String,
}

impl GitHubDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header(USER_AGENT, concat!("kubetype-codegen/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CodegenError::http(e, url))?;
        Ok(response)
    }
}

/// Tree URL of a child entry
fn child_url(location: &str, name: &str) -> String {
    format!("{}/{}", location.trim_end_matches('/'), name)
}

/// Raw file URL for a tree URL
fn raw_url(tree_url: &str) -> String {
    tree_url.replacen("/tree/", "/raw/", 1)
}

#[async_trait]
impl DirectorySource for GitHubDirectory {
    async fn list(&self, location: &str) -> Result<Vec<DirectoryEntry>> {
        tracing::debug!(url = location, "listing GitHub directory");

        let page: TreePage = self
            .get(location, "application/json")
            .await?
            .json()
            .await
            .map_err(|e| CodegenError::http(e, location))?;

        let entries = page
            .payload
            .tree
            .items
            .into_iter()
            .filter_map(|item| {
                let kind = match item.content_type.as_str() {
                    "file" => EntryKind::File,
                    "directory" => EntryKind::Directory,
                    other => {
                        tracing::debug!(name = %item.name, content_type = other, "skipping tree item");
                        return None;
                    }
                };
                Some(DirectoryEntry {
                    path: child_url(location, &item.name),
                    name: item.name,
                    kind,
                })
            })
            .collect();

        Ok(entries)
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        let url = raw_url(path);
        tracing::debug!(url = %url, "fetching file");

        let text = self
            .get(&url, "text/plain")
            .await?
            .text()
            .await
            .map_err(|e| CodegenError::http(e, &url))?;
        Ok(text)
    }
}
