//! Built-in grammars and their language profiles
//!
//! A [`LanguageProfile`] tells the chunk builder and the graph extractor
//! which node kinds are logical units, imports and calls. Supporting a new
//! language means adding a [`LanguageSpec`] and registering it; neither
//! consumer branches on language ids.

mod go;
mod javascript;
mod python;
mod rust;

pub use go::GO;
pub use javascript::{JAVASCRIPT, TSX, TYPESCRIPT};
pub use python::PYTHON;
pub use rust::RUST;

use super::tree::{NodeId, SyntaxTree};

/// Reads one import node into import specs
pub type ImportReader = fn(&SyntaxTree, NodeId, &str) -> Vec<ImportSpec>;

/// Node-kind tables for one grammar
#[derive(Debug)]
pub struct LanguageProfile {
    /// Function and method definitions
    pub function_kinds: &'static [&'static str],
    /// Class/type definitions; these produce DEFINES triples
    pub type_kinds: &'static [&'static str],
    /// Blocks that group functions without defining a type (e.g. `impl`)
    pub container_kinds: &'static [&'static str],
    /// `(wrapper kind, field holding the wrapped definition)`
    pub wrapper_kinds: &'static [(&'static str, &'static str)],
    /// Fields tried in order when naming a unit
    pub name_fields: &'static [&'static str],
    /// Nodes directly above a unit that belong to it (comments, attributes)
    pub leading_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
    /// `(call kind, field holding the callee)`
    pub call_kinds: &'static [(&'static str, &'static str)],
    /// Joins nested names, e.g. `Class.method` or `Type::method`
    pub separator: &'static str,
    /// Receivers that refer to the enclosing type
    pub self_receivers: &'static [&'static str],
    pub read_import: ImportReader,
}

impl LanguageProfile {
    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }

    pub fn is_type(&self, kind: &str) -> bool {
        self.type_kinds.contains(&kind)
    }

    pub fn is_container(&self, kind: &str) -> bool {
        self.container_kinds.contains(&kind)
    }

    pub fn wrapped_field(&self, kind: &str) -> Option<&'static str> {
        self.wrapper_kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, field)| *field)
    }

    pub fn is_import(&self, kind: &str) -> bool {
        self.import_kinds.contains(&kind)
    }

    pub fn callee_field(&self, kind: &str) -> Option<&'static str> {
        self.call_kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, field)| *field)
    }

    pub fn is_leading(&self, kind: &str) -> bool {
        self.leading_kinds.contains(&kind)
    }
}

/// A grammar plus its profile, ready for registration
pub struct LanguageSpec {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> tree_sitter::Language,
    pub profile: &'static LanguageProfile,
}

/// One name bound by an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Name visible in the importing file
    pub local: String,
    /// Fully qualified target
    pub qualified: String,
}

/// One imported module or path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub module: String,
    pub bindings: Vec<ImportBinding>,
    /// `from m import *`, `use m::*`, Go dot imports
    pub wildcard: bool,
    pub line: usize,
}

impl ImportSpec {
    pub fn new(module: impl Into<String>, line: usize) -> Self {
        Self {
            module: module.into(),
            bindings: Vec::new(),
            wildcard: false,
            line,
        }
    }

    pub fn bind(mut self, local: impl Into<String>, qualified: impl Into<String>) -> Self {
        self.bindings.push(ImportBinding {
            local: local.into(),
            qualified: qualified.into(),
        });
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }
}

/// Every grammar compiled into the crate
pub fn builtin_languages() -> [&'static LanguageSpec; 6] {
    [&RUST, &PYTHON, &JAVASCRIPT, &TYPESCRIPT, &TSX, &GO]
}

/// Strip matching quotes from a string literal
pub(crate) fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}
