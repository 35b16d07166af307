//! JavaScript and TypeScript grammar profiles
//!
//! The three grammars share one profile: TypeScript adds declaration kinds
//! that simply never occur in JavaScript trees.

use super::{unquote, ImportSpec, LanguageProfile, LanguageSpec};
use crate::parse::tree::{NodeId, SyntaxTree};

pub static JAVASCRIPT: LanguageSpec = LanguageSpec {
    id: "javascript",
    extensions: &["js", "mjs", "cjs", "jsx"],
    grammar: javascript_grammar,
    profile: &ECMASCRIPT_PROFILE,
};

pub static TYPESCRIPT: LanguageSpec = LanguageSpec {
    id: "typescript",
    extensions: &["ts", "mts", "cts"],
    grammar: typescript_grammar,
    profile: &ECMASCRIPT_PROFILE,
};

pub static TSX: LanguageSpec = LanguageSpec {
    id: "tsx",
    extensions: &["tsx"],
    grammar: tsx_grammar,
    profile: &ECMASCRIPT_PROFILE,
};

static ECMASCRIPT_PROFILE: LanguageProfile = LanguageProfile {
    function_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    type_kinds: &[
        "class_declaration",
        "class",
        "abstract_class_declaration",
        "interface_declaration",
        "type_alias_declaration",
        "enum_declaration",
    ],
    container_kinds: &[],
    wrapper_kinds: &[("export_statement", "declaration")],
    name_fields: &["name"],
    leading_kinds: &["comment"],
    import_kinds: &["import_statement"],
    call_kinds: &[("call_expression", "function"), ("new_expression", "constructor")],
    separator: ".",
    self_receivers: &["this"],
    read_import: read_ecmascript_import,
};

fn javascript_grammar() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn typescript_grammar() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_grammar() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn read_ecmascript_import(tree: &SyntaxTree, node: NodeId, source: &str) -> Vec<ImportSpec> {
    let Some(module) = tree
        .child_by_field(node, "source")
        .and_then(|id| tree.text(id, source))
        .map(|text| unquote(text).to_string())
    else {
        return Vec::new();
    };

    let text = |id: NodeId| tree.text(id, source).unwrap_or_default().to_string();
    let mut spec = ImportSpec::new(module.clone(), tree.node(node).start_line);

    let Some(clause) = tree.child_of_kind(node, "import_clause") else {
        // side-effect import: `import "./polyfill"`
        return vec![spec];
    };

    for &part in tree.children(clause) {
        match tree.kind(part) {
            "identifier" => {
                spec = spec.bind(text(part), module.clone());
            }
            "namespace_import" => {
                if let Some(alias) = tree.child_of_kind(part, "identifier") {
                    spec = spec.bind(text(alias), module.clone());
                }
            }
            "named_imports" => {
                for specifier in tree.children(part).iter().copied() {
                    if tree.kind(specifier) != "import_specifier" {
                        continue;
                    }
                    let Some(name) = tree.child_by_field(specifier, "name").map(text) else {
                        continue;
                    };
                    let local = tree
                        .child_by_field(specifier, "alias")
                        .map(text)
                        .unwrap_or_else(|| name.clone());
                    spec = spec.bind(local, format!("{}.{}", module, name));
                }
            }
            _ => {}
        }
    }

    vec![spec]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(spec: &LanguageSpec, source: &str) -> Vec<ImportSpec> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&(spec.grammar)()).unwrap();
        let ts = parser.parse(source, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts, spec.id, spec.profile);
        tree.descendants(tree.root())
            .filter(|&id| spec.profile.is_import(tree.kind(id)))
            .flat_map(|id| read_ecmascript_import(&tree, id, source))
            .collect()
    }

    #[test]
    fn test_named_and_default_imports() {
        let specs = imports(
            &JAVASCRIPT,
            "import React, { useState as state, useEffect } from 'react';\n",
        );
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].module, "react");
        let locals: Vec<_> = specs[0].bindings.iter().map(|b| b.local.as_str()).collect();
        assert_eq!(locals, vec!["React", "state", "useEffect"]);
        assert_eq!(specs[0].bindings[1].qualified, "react.useState");
    }

    #[test]
    fn test_namespace_import_typescript() {
        let specs = imports(&TYPESCRIPT, "import * as path from \"node:path\";\n");
        assert_eq!(specs[0].module, "node:path");
        assert_eq!(specs[0].bindings[0].local, "path");
    }

    #[test]
    fn test_side_effect_import() {
        let specs = imports(&JAVASCRIPT, "import './setup.js';\n");
        assert_eq!(specs[0].module, "./setup.js");
        assert!(specs[0].bindings.is_empty());
    }
}
