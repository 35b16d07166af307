//! Go grammar profile

use super::{unquote, ImportSpec, LanguageProfile, LanguageSpec};
use crate::parse::tree::{NodeId, SyntaxTree};

pub static GO: LanguageSpec = LanguageSpec {
    id: "go",
    extensions: &["go"],
    grammar: go_grammar,
    profile: &GO_PROFILE,
};

static GO_PROFILE: LanguageProfile = LanguageProfile {
    function_kinds: &["function_declaration", "method_declaration"],
    // `type_spec` rather than `type_declaration`: the name lives on the spec
    type_kinds: &["type_spec"],
    container_kinds: &[],
    wrapper_kinds: &[],
    name_fields: &["name"],
    leading_kinds: &["comment"],
    import_kinds: &["import_spec"],
    call_kinds: &[("call_expression", "function")],
    separator: ".",
    self_receivers: &[],
    read_import: read_go_import,
};

fn go_grammar() -> tree_sitter::Language {
    tree_sitter_go::LANGUAGE.into()
}

fn read_go_import(tree: &SyntaxTree, node: NodeId, source: &str) -> Vec<ImportSpec> {
    let Some(path) = tree
        .child_by_field(node, "path")
        .and_then(|id| tree.text(id, source))
        .map(|text| unquote(text).to_string())
    else {
        return Vec::new();
    };

    let spec = ImportSpec::new(path.clone(), tree.node(node).start_line);
    let alias = tree.child_by_field(node, "name");

    let spec = match alias.map(|id| (tree.kind(id), id)) {
        Some(("dot", _)) => spec.wildcard(),
        Some(("blank_identifier", _)) => spec,
        Some((_, id)) => {
            let local = tree.text(id, source).unwrap_or_default().to_string();
            spec.bind(local, path)
        }
        None => {
            let local = path.rsplit('/').next().unwrap_or(&path).to_string();
            spec.bind(local, path)
        }
    };

    vec![spec]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(source: &str) -> Vec<ImportSpec> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&go_grammar()).unwrap();
        let ts = parser.parse(source, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts, "go", &GO_PROFILE);
        tree.descendants(tree.root())
            .filter(|&id| GO_PROFILE.is_import(tree.kind(id)))
            .flat_map(|id| read_go_import(&tree, id, source))
            .collect()
    }

    #[test]
    fn test_import_block() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\tjson \"encoding/json\"\n\t. \"strings\"\n\t_ \"embed\"\n)\n";
        let specs = imports(source);
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0].bindings[0].local, "fmt");
        assert_eq!(specs[1].bindings[0].local, "json");
        assert_eq!(specs[1].bindings[0].qualified, "encoding/json");
        assert!(specs[2].wildcard);
        assert!(specs[3].bindings.is_empty());
        assert_eq!(specs[0].line, 4);
    }

    #[test]
    fn test_nested_package_binding() {
        let specs = imports("package main\nimport \"net/http\"\n");
        assert_eq!(specs[0].bindings[0].local, "http");
    }
}
