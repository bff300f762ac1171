use miette::{Diagnostic, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading schema documents or generating code
#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    /// IO error when reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse a JSON schema document
    #[error("Failed to parse schema JSON in {}", path.display())]
    #[diagnostic(
        code(schema::parse_error),
        help("Check that the document is valid JSON and is an OpenAPI or Swagger document")
    )]
    ParseError {
        #[source]
        source: serde_json::Error,
        /// Path or URL of the document that failed to parse
        path: PathBuf,
        /// Source text that failed to parse
        #[source_code]
        src: Option<String>,
        /// Location of the error in the source
        #[label("parse error here")]
        span: Option<SourceSpan>,
    },

    /// Failed to parse a YAML document
    #[error("Failed to parse YAML in {}", path.display())]
    #[diagnostic(
        code(schema::yaml_error),
        help("CustomResourceDefinition files must be valid YAML")
    )]
    YamlError {
        #[source]
        source: serde_yaml::Error,
        /// Path or URL of the document that failed to parse
        path: PathBuf,
    },

    /// HTTP request failed
    #[error("Request to {url} failed")]
    #[diagnostic(code(schema::http_error))]
    Http {
        #[source]
        source: reqwest::Error,
        url: String,
    },

    /// Code formatting error
    #[error("Failed to format generated code")]
    #[diagnostic(code(schema::format_error))]
    FormatError {
        #[source]
        source: syn::Error,
    },

    /// Generic error with context
    #[error("{message}")]
    #[diagnostic(code(schema::error))]
    Other {
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CodegenError {
    /// Create a parse error with context
    pub fn parse_error(source: serde_json::Error, path: impl Into<PathBuf>) -> Self {
        Self::ParseError {
            source,
            path: path.into(),
            src: None,
            span: None,
        }
    }

    /// Create a parse error with source text
    pub fn parse_error_with_source(
        source: serde_json::Error,
        path: impl Into<PathBuf>,
        src: String,
    ) -> Self {
        let span = line_col_to_offset(&src, source.line(), source.column())
            .map(|offset| (offset, 1).into());

        Self::ParseError {
            source,
            path: path.into(),
            src: Some(src),
            span,
        }
    }

    /// Create a YAML parse error
    pub fn yaml_error(source: serde_yaml::Error, path: impl Into<PathBuf>) -> Self {
        Self::YamlError {
            source,
            path: path.into(),
        }
    }

    /// Create an HTTP error for a url
    pub fn http(source: reqwest::Error, url: impl Into<String>) -> Self {
        Self::Http {
            source,
            url: url.into(),
        }
    }

    /// Create a generic error from a message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }
}

/// Byte offset of a 1-based line/column pair, if it lies inside `src`
fn line_col_to_offset(src: &str, line: usize, column: usize) -> Option<usize> {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.checked_sub(1)?)
        .map(str::len)
        .sum();
    let offset = line_start + column.saturating_sub(1);
    (offset <= src.len()).then_some(offset)
}

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;
