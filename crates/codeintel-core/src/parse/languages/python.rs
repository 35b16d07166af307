//! Python grammar profile

use super::{ImportSpec, LanguageProfile, LanguageSpec};
use crate::parse::tree::{NodeId, SyntaxTree};

pub static PYTHON: LanguageSpec = LanguageSpec {
    id: "python",
    extensions: &["py", "pyi", "pyw"],
    grammar: python_grammar,
    profile: &PYTHON_PROFILE,
};

static PYTHON_PROFILE: LanguageProfile = LanguageProfile {
    function_kinds: &["function_definition"],
    type_kinds: &["class_definition"],
    container_kinds: &[],
    wrapper_kinds: &[("decorated_definition", "definition")],
    name_fields: &["name"],
    leading_kinds: &["comment"],
    import_kinds: &["import_statement", "import_from_statement"],
    call_kinds: &[("call", "function")],
    separator: ".",
    self_receivers: &["self", "cls"],
    read_import: read_python_import,
};

fn python_grammar() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

fn read_python_import(tree: &SyntaxTree, node: NodeId, source: &str) -> Vec<ImportSpec> {
    let line = tree.node(node).start_line;
    let text = |id: NodeId| tree.text(id, source).unwrap_or_default().to_string();

    match tree.kind(node) {
        "import_statement" => tree
            .children_by_field(node, "name")
            .map(|name| {
                let (module, alias) = split_alias(tree, name, source);
                let local = alias.unwrap_or_else(|| {
                    module.split('.').next().unwrap_or_default().to_string()
                });
                let qualified = if local == module || module.starts_with(&format!("{}.", local))
                {
                    local.clone()
                } else {
                    module.clone()
                };
                ImportSpec::new(module.clone(), line).bind(local, qualified)
            })
            .collect(),
        "import_from_statement" => {
            let Some(module_node) = tree.child_by_field(node, "module_name") else {
                return Vec::new();
            };
            let module = text(module_node);
            let mut spec = ImportSpec::new(module.clone(), line);

            if tree.child_of_kind(node, "wildcard_import").is_some() {
                spec = spec.wildcard();
            }

            for name in tree.children_by_field(node, "name") {
                let (imported, alias) = split_alias(tree, name, source);
                let local = alias.unwrap_or_else(|| imported.clone());
                let qualified = join_module(&module, &imported);
                spec = spec.bind(local, qualified);
            }
            vec![spec]
        }
        _ => Vec::new(),
    }
}

/// `a.b as c` -> ("a.b", Some("c")); `a.b` -> ("a.b", None)
fn split_alias(tree: &SyntaxTree, node: NodeId, source: &str) -> (String, Option<String>) {
    if tree.kind(node) == "aliased_import" {
        let name = tree
            .child_by_field(node, "name")
            .and_then(|n| tree.text(n, source))
            .unwrap_or_default()
            .to_string();
        let alias = tree
            .child_by_field(node, "alias")
            .and_then(|n| tree.text(n, source))
            .map(str::to_string);
        (name, alias)
    } else {
        (
            tree.text(node, source).unwrap_or_default().to_string(),
            None,
        )
    }
}

fn join_module(module: &str, name: &str) -> String {
    if module.ends_with('.') {
        format!("{}{}", module, name)
    } else {
        format!("{}.{}", module, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(source: &str) -> Vec<ImportSpec> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&python_grammar()).unwrap();
        let ts = parser.parse(source, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts, "python", &PYTHON_PROFILE);
        tree.descendants(tree.root())
            .filter(|&id| PYTHON_PROFILE.is_import(tree.kind(id)))
            .flat_map(|id| read_python_import(&tree, id, source))
            .collect()
    }

    #[test]
    fn test_plain_import() {
        let specs = imports("import os.path\nimport numpy as np\n");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].module, "os.path");
        assert_eq!(specs[0].bindings[0].local, "os");
        assert_eq!(specs[1].module, "numpy");
        assert_eq!(specs[1].bindings[0].local, "np");
        assert_eq!(specs[1].bindings[0].qualified, "numpy");
    }

    #[test]
    fn test_from_import() {
        let specs = imports("from pkg.util import load, save as store\n");
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].module, "pkg.util");
        assert_eq!(specs[0].bindings.len(), 2);
        assert_eq!(specs[0].bindings[1].local, "store");
        assert_eq!(specs[0].bindings[1].qualified, "pkg.util.save");
    }

    #[test]
    fn test_wildcard_and_relative() {
        let specs = imports("from . import sibling\nfrom helpers import *\n");
        assert_eq!(specs[0].module, ".");
        assert_eq!(specs[0].bindings[0].qualified, ".sibling");
        assert!(specs[1].wildcard);
        assert_eq!(specs[1].line, 2);
    }
}
