//! Compiler output: modules of declarations and the type expressions inside them.

use crate::description::DocComment;
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A fully qualified declaration reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    pub module: SmolStr,
    pub name: SmolStr,
}

impl TypeRef {
    pub fn new(module: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.module, self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    /// Both `integer` and `number`
    Number,
    Boolean,
    /// An object with no known shape
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Reference(TypeRef),
    Array(Box<TypeExpr>),
    MapOf(Box<TypeExpr>),
    Intersection(Vec<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// Exact literal texts
    LiteralUnion(Vec<SmolStr>),
    Scalar(ScalarType),
    Any,
}

impl TypeExpr {
    pub fn reference(module: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        TypeExpr::Reference(TypeRef::new(module, name))
    }

    /// Visit every reference in this expression, depth first
    pub fn for_each_reference(&self, f: &mut impl FnMut(&TypeRef)) {
        match self {
            TypeExpr::Reference(type_ref) => f(type_ref),
            TypeExpr::Array(inner) | TypeExpr::MapOf(inner) => inner.for_each_reference(f),
            TypeExpr::Intersection(parts) | TypeExpr::Union(parts) => {
                for part in parts {
                    part.for_each_reference(f);
                }
            }
            TypeExpr::LiteralUnion(_) | TypeExpr::Scalar(_) | TypeExpr::Any => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Exact property name from the schema
    pub name: SmolStr,
    pub ty: TypeExpr,
    pub docs: DocComment,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub name: SmolStr,
    pub docs: DocComment,
    pub fields: Vec<Field>,
}

impl RecordDecl {
    /// Add a field, replacing an existing field of the same name in place
    pub fn upsert_field(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub name: SmolStr,
    pub ty: TypeExpr,
    pub docs: DocComment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Record(RecordDecl),
    Alias(AliasDecl),
}

impl Declaration {
    pub fn name(&self) -> &SmolStr {
        match self {
            Declaration::Record(record) => &record.name,
            Declaration::Alias(alias) => &alias.name,
        }
    }

    pub fn as_record(&self) -> Option<&RecordDecl> {
        match self {
            Declaration::Record(record) => Some(record),
            Declaration::Alias(_) => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasDecl> {
        match self {
            Declaration::Alias(alias) => Some(alias),
            Declaration::Record(_) => None,
        }
    }
}

/// One namespace and the declarations it owns, in creation order
#[derive(Debug, Clone, Default)]
pub struct Module {
    path: SmolStr,
    declarations: Vec<Declaration>,
    index: HashMap<SmolStr, usize>,
}

impl Module {
    pub fn new(path: impl Into<SmolStr>) -> Self {
        Self {
            path: path.into(),
            declarations: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Sanitized dotted path, empty for the root namespace
    pub fn path(&self) -> &SmolStr {
        &self.path
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.index.get(name).map(|&i| &self.declarations[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Declaration> {
        self.index.get(name).map(|&i| &mut self.declarations[i])
    }

    pub fn record(&self, name: &str) -> Option<&RecordDecl> {
        self.get(name).and_then(Declaration::as_record)
    }

    pub fn alias(&self, name: &str) -> Option<&AliasDecl> {
        self.get(name).and_then(Declaration::as_alias)
    }

    /// Add a declaration unless one with the same name already exists.
    ///
    /// Returns `false` when the name was taken.
    pub fn declare(&mut self, declaration: Declaration) -> bool {
        let name = declaration.name().clone();
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name, self.declarations.len());
        self.declarations.push(declaration);
        true
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// All modules produced by a compilation run, keyed by path
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    modules: BTreeMap<SmolStr, Module>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the module for a path
    pub fn module_mut(&mut self, path: &str) -> &mut Module {
        self.modules
            .entry(SmolStr::new(path))
            .or_insert_with(|| Module::new(path))
    }

    pub fn get(&self, path: &str) -> Option<&Module> {
        self.modules.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn declaration_count(&self) -> usize {
        self.modules.values().map(Module::len).sum()
    }

    pub fn resolve(&self, type_ref: &TypeRef) -> Option<&Declaration> {
        self.get(&type_ref.module)?.get(&type_ref.name)
    }

    /// References that don't point at any declaration, sorted and deduplicated
    pub fn unresolved_references(&self) -> Vec<TypeRef> {
        let mut missing = Vec::new();
        let mut check = |type_ref: &TypeRef| {
            if self.resolve(type_ref).is_none() {
                missing.push(type_ref.clone());
            }
        };

        for module in self.modules.values() {
            for declaration in module.declarations() {
                match declaration {
                    Declaration::Record(record) => {
                        for field in &record.fields {
                            field.ty.for_each_reference(&mut check);
                        }
                    }
                    Declaration::Alias(alias) => alias.ty.for_each_reference(&mut check),
                }
            }
        }

        missing.sort();
        missing.dedup();
        missing
    }
}
