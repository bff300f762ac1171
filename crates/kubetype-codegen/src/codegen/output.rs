use crate::error::{CodegenError, Result};
use std::path::Path;

use super::RustEmitter;

const HEADER: &str = "// @generated by kubetype-codegen. DO NOT EDIT.\n//\n// This file was automatically generated from Kubernetes API schemas.\n// Any manual changes will be overwritten on the next regeneration.\n\n";

impl<'m> RustEmitter<'m> {
    /// Generate and format the complete source file
    pub fn render(&self) -> Result<String> {
        let tokens = self.generate();
        let file: syn::File =
            syn::parse2(tokens).map_err(|source| CodegenError::FormatError { source })?;
        let formatted = prettyplease::unparse(&file);

        // Add blank lines after closing braces of items for readability
        let lines: Vec<&str> = formatted.lines().collect();
        let mut result_lines = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            result_lines.push(*line);

            let closes_item = line.trim_start() == "}";
            if closes_item && i + 1 < lines.len() {
                let next = lines[i + 1].trim_start();
                if !next.is_empty() && next != "}" {
                    result_lines.push("");
                }
            }
        }

        let mut output = String::with_capacity(HEADER.len() + formatted.len());
        output.push_str(HEADER);
        output.push_str(&result_lines.join("\n"));
        output.push('\n');
        Ok(output)
    }

    /// Render and write the generated source to `path`, creating parent
    /// directories as needed
    pub fn write_to_disk(&self, path: &Path) -> Result<()> {
        let source = self.render()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CodegenError::Other {
                message: format!("Failed to create directory {:?}: {}", parent, e),
                source: Some(Box::new(e)),
            })?;
        }

        std::fs::write(path, source).map_err(|e| CodegenError::Other {
            message: format!("Failed to write file {:?}: {}", path, e),
            source: Some(Box::new(e)),
        })?;

        tracing::info!(
            path = %path.display(),
            modules = self.modules.len(),
            declarations = self.modules.declaration_count(),
            "wrote generated code"
        );
        Ok(())
    }
}
