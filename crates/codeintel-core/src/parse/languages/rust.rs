//! Rust grammar profile

use super::{ImportSpec, LanguageProfile, LanguageSpec};
use crate::parse::tree::{NodeId, SyntaxTree};

pub static RUST: LanguageSpec = LanguageSpec {
    id: "rust",
    extensions: &["rs"],
    grammar: rust_grammar,
    profile: &RUST_PROFILE,
};

static RUST_PROFILE: LanguageProfile = LanguageProfile {
    function_kinds: &["function_item", "function_signature_item"],
    type_kinds: &[
        "struct_item",
        "enum_item",
        "trait_item",
        "union_item",
        "type_item",
    ],
    container_kinds: &["impl_item", "mod_item"],
    wrapper_kinds: &[],
    name_fields: &["name", "type"],
    leading_kinds: &["line_comment", "block_comment", "attribute_item"],
    import_kinds: &["use_declaration"],
    call_kinds: &[("call_expression", "function")],
    separator: "::",
    self_receivers: &["self", "Self"],
    read_import: read_rust_import,
};

fn rust_grammar() -> tree_sitter::Language {
    tree_sitter_rust::LANGUAGE.into()
}

fn read_rust_import(tree: &SyntaxTree, node: NodeId, source: &str) -> Vec<ImportSpec> {
    let line = tree.node(node).start_line;
    let mut specs = Vec::new();
    if let Some(argument) = tree.child_by_field(node, "argument") {
        collect_use(tree, argument, "", source, line, &mut specs);
    }
    specs
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}::{}", prefix, segment)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Flatten one use tree into a spec per imported path
fn collect_use(
    tree: &SyntaxTree,
    node: NodeId,
    prefix: &str,
    source: &str,
    line: usize,
    out: &mut Vec<ImportSpec>,
) {
    let text = |id: NodeId| tree.text(id, source).unwrap_or_default().trim().to_string();

    match tree.kind(node) {
        "use_as_clause" => {
            let Some(path) = tree.child_by_field(node, "path") else {
                return;
            };
            let full = join_path(prefix, &text(path));
            let alias = tree
                .child_by_field(node, "alias")
                .map(text)
                .unwrap_or_else(|| last_segment(&full).to_string());
            out.push(ImportSpec::new(full.clone(), line).bind(alias, full));
        }
        "scoped_use_list" => {
            let nested = match tree.child_by_field(node, "path") {
                Some(path) => join_path(prefix, &text(path)),
                None => prefix.to_string(),
            };
            if let Some(list) = tree.child_by_field(node, "list") {
                collect_use(tree, list, &nested, source, line, out);
            }
        }
        "use_list" => {
            for &child in tree.children(node) {
                collect_use(tree, child, prefix, source, line, out);
            }
        }
        "use_wildcard" => {
            let base = match tree.children(node).first() {
                Some(&path) => join_path(prefix, &text(path)),
                None => prefix.to_string(),
            };
            out.push(ImportSpec::new(base, line).wildcard());
        }
        // `use a::b::{self}` binds `b`
        "self" if !prefix.is_empty() => {
            let local = last_segment(prefix).to_string();
            out.push(ImportSpec::new(prefix, line).bind(local, prefix));
        }
        "identifier" | "scoped_identifier" | "crate" | "super" | "self" => {
            let full = join_path(prefix, &text(node));
            let local = last_segment(&full).to_string();
            out.push(ImportSpec::new(full.clone(), line).bind(local, full));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(source: &str) -> Vec<ImportSpec> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&rust_grammar()).unwrap();
        let ts = parser.parse(source, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts, "rust", &RUST_PROFILE);
        tree.descendants(tree.root())
            .filter(|&id| RUST_PROFILE.is_import(tree.kind(id)))
            .flat_map(|id| read_rust_import(&tree, id, source))
            .collect()
    }

    #[test]
    fn test_simple_use() {
        let specs = imports("use std::collections::HashMap;\n");
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].module, "std::collections::HashMap");
        assert_eq!(specs[0].bindings[0].local, "HashMap");
    }

    #[test]
    fn test_use_list_and_alias() {
        let specs = imports("use std::io::{self, Read as R, Write};\n");
        let modules: Vec<_> = specs.iter().map(|s| s.module.as_str()).collect();
        assert_eq!(
            modules,
            vec!["std::io", "std::io::Read", "std::io::Write"]
        );
        assert_eq!(specs[0].bindings[0].local, "io");
        assert_eq!(specs[1].bindings[0].local, "R");
    }

    #[test]
    fn test_wildcard_use() {
        let specs = imports("use crate::prelude::*;\n");
        assert_eq!(specs.len(), 1);
        assert!(specs[0].wildcard);
        assert_eq!(specs[0].module, "crate::prelude");
    }
}
