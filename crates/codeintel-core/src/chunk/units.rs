//! Logical unit discovery over a syntax tree

use crate::parse::{node_name, NodeId, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Function,
    Type,
    /// Groups functions without being a type (`impl`, `mod`)
    Container,
}

/// A function, type or container definition and its nested units
#[derive(Debug, Clone)]
pub struct Unit {
    pub node: NodeId,
    pub kind: UnitKind,
    pub name: Option<String>,
    /// Includes wrappers and leading comments/attributes
    pub start_line: usize,
    pub end_line: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Units of one file, flattened; `roots` lists the outermost in source order
#[derive(Debug, Default)]
pub struct UnitForest {
    pub units: Vec<Unit>,
    pub roots: Vec<usize>,
}

impl UnitForest {
    /// Nearest enclosing type or container
    pub fn owner(&self, unit: usize) -> Option<&Unit> {
        let mut current = self.units[unit].parent;
        while let Some(idx) = current {
            let candidate = &self.units[idx];
            if candidate.kind != UnitKind::Function {
                return Some(candidate);
            }
            current = candidate.parent;
        }
        None
    }
}

pub fn collect_units(tree: &SyntaxTree, source: &str) -> UnitForest {
    let profile = tree.profile();
    let mut forest = UnitForest::default();
    let mut stack: Vec<(NodeId, Option<usize>)> = tree
        .children(tree.root())
        .iter()
        .rev()
        .map(|&id| (id, None))
        .collect();

    while let Some((id, parent)) = stack.pop() {
        let (outer, definition) = match profile.wrapped_field(tree.kind(id)) {
            Some(field) => match tree.child_by_field(id, field) {
                Some(inner) => (id, inner),
                None => (id, id),
            },
            None => (id, id),
        };

        let kind = tree.kind(definition);
        let unit_kind = if profile.is_function(kind) {
            Some(UnitKind::Function)
        } else if profile.is_type(kind) {
            Some(UnitKind::Type)
        } else if profile.is_container(kind) {
            Some(UnitKind::Container)
        } else {
            None
        };

        let Some(unit_kind) = unit_kind else {
            stack.extend(tree.children(id).iter().rev().map(|&c| (c, parent)));
            continue;
        };

        let index = forest.units.len();
        forest.units.push(Unit {
            node: definition,
            kind: unit_kind,
            name: node_name(tree, definition, source),
            start_line: leading_start(tree, outer),
            end_line: tree.node(outer).end_line,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => forest.units[p].children.push(index),
            None => forest.roots.push(index),
        }

        stack.extend(
            tree.children(definition)
                .iter()
                .rev()
                .map(|&c| (c, Some(index))),
        );
    }

    forest
}

/// First line of the comments/attributes stacked directly above `node`
fn leading_start(tree: &SyntaxTree, node: NodeId) -> usize {
    let profile = tree.profile();
    let mut start = tree.node(node).start_line;
    let mut current = node;
    while let Some(prev) = tree.prev_sibling(current) {
        let prev_node = tree.node(prev);
        if !profile.is_leading(prev_node.kind) || prev_node.end_line + 1 < start {
            break;
        }
        start = start.min(prev_node.start_line);
        current = prev;
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::languages::{JAVASCRIPT, PYTHON, RUST};
    use crate::parse::{SourceParser, TreeSitterParser};
    use std::time::Duration;

    fn parse(spec: &'static crate::parse::LanguageSpec, source: &str) -> SyntaxTree {
        TreeSitterParser::new(spec, Duration::from_secs(5))
            .unwrap()
            .parse(source)
            .unwrap()
    }

    #[test]
    fn test_python_class_with_methods() {
        let source = "class A:\n    def one(self):\n        pass\n\n    def two(self):\n        pass\n\ndef free():\n    pass\n";
        let tree = parse(&PYTHON, source);
        let forest = collect_units(&tree, source);
        assert_eq!(forest.roots.len(), 2);
        let class = &forest.units[forest.roots[0]];
        assert_eq!(class.kind, UnitKind::Type);
        assert_eq!(class.name.as_deref(), Some("A"));
        assert_eq!(class.children.len(), 2);
        let second = &forest.units[class.children[1]];
        assert_eq!(second.name.as_deref(), Some("two"));
        assert_eq!((second.start_line, second.end_line), (5, 6));
        assert_eq!(forest.owner(class.children[1]).and_then(|u| u.name.as_deref()), Some("A"));
    }

    #[test]
    fn test_decorator_and_comment_belong_to_unit() {
        let source = "import os\n\n# helper\n@cache\ndef f():\n    return 1\n";
        let tree = parse(&PYTHON, source);
        let forest = collect_units(&tree, source);
        let f = &forest.units[forest.roots[0]];
        assert_eq!(f.name.as_deref(), Some("f"));
        assert_eq!((f.start_line, f.end_line), (3, 6));
    }

    #[test]
    fn test_detached_comment_is_not_leading() {
        let source = "# module note\n\ndef f():\n    pass\n";
        let tree = parse(&PYTHON, source);
        let forest = collect_units(&tree, source);
        assert_eq!(forest.units[forest.roots[0]].start_line, 3);
    }

    #[test]
    fn test_rust_impl_and_attributes() {
        let source = "struct S;\n\n/// Builds it\n#[inline]\nimpl S {\n    fn new() -> Self { S }\n}\n";
        let tree = parse(&RUST, source);
        let forest = collect_units(&tree, source);
        assert_eq!(forest.roots.len(), 2);
        let imp = &forest.units[forest.roots[1]];
        assert_eq!(imp.kind, UnitKind::Container);
        assert_eq!(imp.name.as_deref(), Some("S"));
        assert_eq!(imp.start_line, 3);
        assert_eq!(imp.children.len(), 1);
    }

    #[test]
    fn test_export_wrapper() {
        let source = "export class Store {\n  get(k) { return k; }\n}\n";
        let tree = parse(&JAVASCRIPT, source);
        let forest = collect_units(&tree, source);
        let class = &forest.units[forest.roots[0]];
        assert_eq!(class.kind, UnitKind::Type);
        assert_eq!(class.name.as_deref(), Some("Store"));
        let method = &forest.units[class.children[0]];
        assert_eq!(method.name.as_deref(), Some("get"));
    }
}
