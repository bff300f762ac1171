//! Partitioning of a schema document into namespace modules.

use crate::compiler::SchemaCompiler;
use crate::declarations::ModuleSet;
use crate::names::split_ref;
use crate::schema::SchemaDocument;

/// Compile every definition of `document` into `modules`.
///
/// Each definition lands in the module named by its key's namespace. Modules
/// already present in the set are extended, so several documents can be
/// compiled into one set.
pub fn build_modules(document: &SchemaDocument, modules: &mut ModuleSet) {
    let before = modules.declaration_count();

    for (key, node) in document.iter() {
        let (namespace, leaf) = split_ref(key);
        modules.module_mut(&namespace);
        SchemaCompiler::new(modules).compile_definition(&namespace, &leaf, node);
    }

    tracing::info!(
        definitions = document.len(),
        modules = modules.len(),
        declarations = modules.declaration_count() - before,
        "compiled schema document"
    );
}
