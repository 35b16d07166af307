//! Arena syntax tree
//!
//! Parsed trees are flattened into a vector of nodes addressed by index.
//! Parents and children are plain indices, so a tree is `Send`, cheap to
//! move between worker threads, and free of back-reference cycles.

use super::languages::LanguageProfile;

/// Index of a node inside its [`SyntaxTree`]
pub type NodeId = usize;

/// One named node of a parsed tree
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    /// Field name this node occupies in its parent, if any
    pub field: Option<&'static str>,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-indexed, inclusive
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub is_error: bool,
}

/// Parsed source as an index-addressed arena
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    language: String,
    profile: &'static LanguageProfile,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Build a tree from pre-assembled nodes; node 0 is the root
    pub fn from_nodes(
        language: &str,
        profile: &'static LanguageProfile,
        nodes: Vec<SyntaxNode>,
    ) -> Self {
        Self {
            language: language.to_string(),
            profile,
            nodes,
        }
    }

    /// Flatten a tree-sitter tree, keeping named nodes only
    pub fn from_tree_sitter(
        tree: &tree_sitter::Tree,
        language: &str,
        profile: &'static LanguageProfile,
    ) -> Self {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut cursor = tree.walk();
        // One entry per node on the current path; None for anonymous nodes
        let mut path: Vec<Option<NodeId>> = Vec::new();

        'walk: loop {
            let node = cursor.node();
            let parent = path.iter().rev().find_map(|id| *id);

            let this = if node.is_named() || parent.is_none() {
                let id = nodes.len();
                let start = node.start_position();
                let end = node.end_position();
                let end_line = if end.column == 0 && end.row > start.row {
                    end.row
                } else {
                    end.row + 1
                };
                nodes.push(SyntaxNode {
                    kind: node.kind(),
                    field: cursor.field_name(),
                    start_byte: node.start_byte(),
                    end_byte: node.end_byte(),
                    start_line: start.row + 1,
                    end_line,
                    parent,
                    children: Vec::new(),
                    is_error: node.is_error() || node.is_missing(),
                });
                if let Some(p) = parent {
                    nodes[p].children.push(id);
                }
                Some(id)
            } else {
                None
            };

            if cursor.goto_first_child() {
                path.push(this);
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                path.pop();
            }
        }

        Self::from_nodes(language, profile, nodes)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn profile(&self) -> &'static LanguageProfile {
        self.profile
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.nodes[id].kind
    }

    /// First child occupying `field`
    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.nodes[c].field == Some(field))
    }

    /// All children occupying `field`
    pub fn children_by_field<'a>(
        &'a self,
        id: NodeId,
        field: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.nodes[c].field == Some(field))
    }

    /// First child of a given kind
    pub fn child_of_kind(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.nodes[c].kind == kind)
    }

    /// Source text of a node; `None` when the range does not fit `source`
    pub fn text<'s>(&self, id: NodeId, source: &'s str) -> Option<&'s str> {
        let node = self.nodes.get(id)?;
        source.get(node.start_byte..node.end_byte)
    }

    /// Previous sibling under the same parent
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(id)?.parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&s| s == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Pre-order traversal of the subtree rooted at `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.is_error)
    }
}

/// Pre-order iterator driven by an explicit stack
pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
