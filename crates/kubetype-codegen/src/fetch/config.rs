use super::expand::DEFAULT_PROGRAM;
use super::sources::{DEFAULT_TIMEOUT, GitHubDirectory, LocalDirectory, Source, SourceType};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ROOT_MODULE: &str = "crate";

#[derive(Debug, Clone)]
pub struct Config {
    pub output: OutputConfig,
    pub expander: ExpanderConfig,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Generated Rust source file
    pub file: PathBuf,
    /// Rust path the generated file is mounted at
    pub root_module: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpanderConfig {
    pub program: String,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl Config {
    /// Read and parse a KDL config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        Self::from_kdl(&text)
    }

    pub fn from_kdl(text: &str) -> Result<Self> {
        let doc = text
            .parse::<kdl::KdlDocument>()
            .map_err(|e| miette!("Failed to parse KDL: {}", e))?;

        let mut output: Option<OutputConfig> = None;
        let mut expander: Option<ExpanderConfig> = None;
        let mut sources = Vec::new();

        for node in doc.nodes() {
            match node.name().value() {
                "output" => {
                    if output.is_some() {
                        return Err(miette!("Multiple output blocks found"));
                    }
                    output = Some(parse_output(node)?);
                }
                "expander" => {
                    if expander.is_some() {
                        return Err(miette!("Multiple expander blocks found"));
                    }
                    expander = Some(parse_expander(node)?);
                }
                "source" => {
                    sources.push(parse_source(node)?);
                }
                other => {
                    return Err(miette!("Unknown config node: {}", other));
                }
            }
        }

        let output = output.ok_or_else(|| miette!("Missing output block"))?;

        Ok(Config {
            output,
            expander: expander.unwrap_or_default(),
            sources,
        })
    }
}

/// First argument of a node as a string
fn string_arg<'n>(node: &'n kdl::KdlNode) -> Result<&'n str> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| miette!("{} expects a string value", node.name().value()))
}

fn parse_output(node: &kdl::KdlNode) -> Result<OutputConfig> {
    let children = node
        .children()
        .ok_or_else(|| miette!("output block has no children"))?;

    let mut file: Option<PathBuf> = None;
    let mut root_module: Option<String> = None;

    for child in children.nodes() {
        match child.name().value() {
            "file" => file = Some(PathBuf::from(string_arg(child)?)),
            "root-module" => root_module = Some(string_arg(child)?.to_string()),
            other => {
                return Err(miette!("Unknown output field: {}", other));
            }
        }
    }

    Ok(OutputConfig {
        file: file.ok_or_else(|| miette!("Missing output file"))?,
        root_module: root_module.unwrap_or_else(|| DEFAULT_ROOT_MODULE.to_string()),
    })
}

fn parse_expander(node: &kdl::KdlNode) -> Result<ExpanderConfig> {
    let mut config = ExpanderConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "program" => config.program = string_arg(child)?.to_string(),
                other => {
                    return Err(miette!("Unknown expander field: {}", other));
                }
            }
        }
    }

    Ok(config)
}

fn parse_source(node: &kdl::KdlNode) -> Result<Source> {
    let name = node
        .entries()
        .first()
        .filter(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| miette!("source expects a name as first argument"))?
        .to_string();

    let type_str = node
        .get("type")
        .and_then(|v| v.as_string())
        .ok_or_else(|| miette!("source {} missing type attribute", name))?;

    let children = node
        .children()
        .ok_or_else(|| miette!("source {} has no children", name))?;

    let source_type = match type_str {
        "github" => parse_github_source(children)?,
        "local" => parse_local_source(children)?,
        other => return Err(miette!("Unknown source type: {}", other)),
    };

    Ok(Source { name, source_type })
}

fn parse_github_source(children: &kdl::KdlDocument) -> Result<SourceType> {
    let mut url: Option<String> = None;
    let mut timeout = DEFAULT_TIMEOUT;

    for child in children.nodes() {
        match child.name().value() {
            "url" => url = Some(string_arg(child)?.to_string()),
            "timeout-secs" => {
                let secs = child
                    .entries()
                    .first()
                    .and_then(|e| e.value().as_integer())
                    .and_then(|i| u64::try_from(i).ok())
                    .ok_or_else(|| miette!("timeout-secs expects a non-negative integer"))?;
                timeout = Duration::from_secs(secs);
            }
            other => {
                return Err(miette!("Unknown github source field: {}", other));
            }
        }
    }

    let url = url.ok_or_else(|| miette!("Missing url"))?;
    Ok(SourceType::GitHub(GitHubDirectory::new(url, timeout)))
}

fn parse_local_source(children: &kdl::KdlDocument) -> Result<SourceType> {
    let mut path: Option<PathBuf> = None;
    let mut pattern: Option<String> = None;

    for child in children.nodes() {
        match child.name().value() {
            "path" => path = Some(PathBuf::from(string_arg(child)?)),
            "pattern" => pattern = Some(string_arg(child)?.to_string()),
            other => {
                return Err(miette!("Unknown local source field: {}", other));
            }
        }
    }

    Ok(SourceType::Local(LocalDirectory {
        path: path.ok_or_else(|| miette!("Missing path"))?,
        pattern,
    }))
}
