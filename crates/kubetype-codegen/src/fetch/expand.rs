//! Template expansion of kustomize-style directories.

use async_trait::async_trait;
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use std::path::Path;
use tokio::process::Command;

pub const DEFAULT_PROGRAM: &str = "kustomize";

/// Renders a directory of templates into a multi-document YAML stream
#[async_trait]
pub trait TemplateExpander: Send + Sync {
    async fn expand(&self, dir: &Path) -> Result<String>;
}

/// Runs `<program> build <dir>`
#[derive(Debug, Clone)]
pub struct Kustomize {
    pub program: String,
}

impl Kustomize {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Kustomize {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl TemplateExpander for Kustomize {
    async fn expand(&self, dir: &Path) -> Result<String> {
        tracing::debug!(program = %self.program, dir = %dir.display(), "running template expansion");

        let output = Command::new(&self.program)
            .arg("build")
            .arg(dir)
            .output()
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(miette!("{} build failed: {}", self.program, stderr.trim()));
        }

        String::from_utf8(output.stdout)
            .into_diagnostic()
            .wrap_err("Expansion output is not valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let expander = Kustomize::new("kubetype-no-such-program");
        assert!(expander.expand(dir.path()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        // `false build <dir>` exits 1
        let dir = tempfile::tempdir().expect("tempdir");
        let expander = Kustomize::new("false");
        assert!(expander.expand(dir.path()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_returned() {
        // `echo build <dir>` prints its arguments
        let dir = tempfile::tempdir().expect("tempdir");
        let expander = Kustomize::new("echo");
        let output = expander.expand(dir.path()).await.expect("expand");
        assert!(output.starts_with("build "));
    }
}
