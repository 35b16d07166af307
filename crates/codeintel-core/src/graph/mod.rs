//! Static relationship extraction
//!
//! Walks a syntax tree once to collect imports, definitions and call sites,
//! then resolves every call against the file's symbol table. Nothing is
//! evaluated; ambiguous calls are kept with reduced confidence.

mod resolve;

pub use resolve::{
    split_callee, Resolution, SymbolTable, CONFIDENCE_DYNAMIC, CONFIDENCE_EXACT,
    CONFIDENCE_FLOOR, CONFIDENCE_IMPORTED_RECEIVER, CONFIDENCE_SELF_METHOD,
    CONFIDENCE_UNIQUE_METHOD, CONFIDENCE_UNRESOLVED,
};

use crate::error::{Error, Result};
use crate::parse::{node_name, NodeId, SyntaxTree};
use crate::types::{GraphTriple, Predicate, Resource};
use std::collections::HashSet;

/// Callee texts longer than this are anonymous expressions, not names
const MAX_CALLEE_LEN: usize = 256;

/// Triples plus the error that cut extraction short, if any
#[derive(Debug, Default)]
pub struct Extraction {
    pub triples: Vec<GraphTriple>,
    pub error: Option<Error>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Type,
    Function,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    qualified: String,
    parent: Option<usize>,
}

#[derive(Debug)]
struct CallSite {
    callee: String,
    line: usize,
    scope: Option<usize>,
}

/// Per-walk state
struct Walk<'a> {
    tree: &'a SyntaxTree,
    source: &'a str,
    resource: &'a Resource,
    scopes: Vec<Scope>,
    symbols: SymbolTable,
    calls: Vec<CallSite>,
    triples: Vec<GraphTriple>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphExtractor;

impl GraphExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Triples for one file in line order; no tree means no triples
    pub fn extract(
        &self,
        resource: &Resource,
        tree: Option<&SyntaxTree>,
        source: &str,
    ) -> Vec<GraphTriple> {
        self.extract_with_diagnostics(resource, tree, source).triples
    }

    /// Like [`extract`](Self::extract), also reporting a failure that
    /// stopped the walk early
    pub fn extract_with_diagnostics(
        &self,
        resource: &Resource,
        tree: Option<&SyntaxTree>,
        source: &str,
    ) -> Extraction {
        let Some(tree) = tree else {
            return Extraction::default();
        };

        let mut walk = Walk {
            tree,
            source,
            resource,
            scopes: Vec::new(),
            symbols: SymbolTable::new(),
            calls: Vec::new(),
            triples: Vec::new(),
        };

        let error = walk.collect().err();
        if let Some(e) = &error {
            tracing::warn!(
                path = %resource.relative_path,
                error = %e,
                collected = walk.triples.len() + walk.calls.len(),
                "Graph extraction stopped early"
            );
        }

        let mut triples = walk.resolve_calls();
        // stable: keeps walk order for triples on the same line
        triples.sort_by_key(|t| t.line_number);
        let mut seen = HashSet::new();
        triples.retain(|t| seen.insert(t.id()));

        tracing::debug!(
            path = %resource.relative_path,
            triples = triples.len(),
            "Extracted graph"
        );
        Extraction { triples, error }
    }
}

impl Walk<'_> {
    fn text(&self, id: NodeId) -> Result<&str> {
        self.tree.text(id, self.source).ok_or_else(|| {
            let node = self.tree.node(id);
            Error::Extraction(format!(
                "{} node at line {} lies outside the source text",
                node.kind, node.start_line
            ))
        })
    }

    fn qualify(&self, parent: Option<usize>, name: &str) -> String {
        match parent {
            Some(idx) => format!(
                "{}{}{}",
                self.scopes[idx].qualified,
                self.tree.profile().separator,
                name
            ),
            None => name.to_string(),
        }
    }

    fn enclosing(&self, mut scope: Option<usize>, kind: ScopeKind) -> Option<usize> {
        while let Some(idx) = scope {
            if self.scopes[idx].kind == kind {
                return Some(idx);
            }
            scope = self.scopes[idx].parent;
        }
        None
    }

    fn push_triple(
        &mut self,
        subject: String,
        predicate: Predicate,
        object: String,
        target_symbol: String,
        line_number: usize,
        confidence: f32,
    ) {
        self.triples.push(GraphTriple {
            resource_id: self.resource.id.clone(),
            subject,
            predicate,
            object,
            source_file: self.resource.relative_path.clone(),
            target_symbol,
            line_number,
            confidence,
        });
    }

    /// Single pre-order pass with an explicit stack
    fn collect(&mut self) -> Result<()> {
        let tree = self.tree;
        let profile = tree.profile();
        let mut stack: Vec<(NodeId, Option<usize>)> = vec![(tree.root(), None)];

        while let Some((id, scope)) = stack.pop() {
            let node = tree.node(id);
            let kind = node.kind;
            let mut child_scope = scope;

            if profile.is_import(kind) {
                let specs = (profile.read_import)(tree, id, self.source);
                for spec in specs {
                    self.symbols.import(&spec);
                    self.push_triple(
                        self.resource.relative_path.clone(),
                        Predicate::Imports,
                        spec.module.clone(),
                        spec.module.clone(),
                        spec.line,
                        CONFIDENCE_EXACT,
                    );
                }
                continue;
            }

            let is_type = profile.is_type(kind) || profile.is_container(kind);
            if is_type || profile.is_function(kind) {
                if let Some(name) = node_name(tree, id, self.source) {
                    let qualified = self.qualify(scope, &name);
                    self.symbols.define(&name, &qualified);

                    if profile.is_type(kind) {
                        self.push_triple(
                            self.resource.relative_path.clone(),
                            Predicate::Defines,
                            name.clone(),
                            qualified.clone(),
                            node.start_line,
                            CONFIDENCE_EXACT,
                        );
                    } else if !is_type {
                        if let Some(owner) = scope.filter(|&s| self.scopes[s].kind == ScopeKind::Type) {
                            let owner_name = self.scopes[owner].qualified.clone();
                            self.symbols.define_method(&owner_name, &name);
                        }
                    }

                    self.scopes.push(Scope {
                        kind: if is_type {
                            ScopeKind::Type
                        } else {
                            ScopeKind::Function
                        },
                        qualified,
                        parent: scope,
                    });
                    child_scope = Some(self.scopes.len() - 1);
                }
            } else if let Some(field) = profile.callee_field(kind) {
                if let Some(callee_node) = tree.child_by_field(id, field) {
                    let callee: String = self
                        .text(callee_node)?
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect();
                    if !callee.is_empty() && callee.len() <= MAX_CALLEE_LEN && !callee.contains('{') {
                        self.calls.push(CallSite {
                            callee,
                            line: node.start_line,
                            scope,
                        });
                    }
                }
            }

            stack.extend(tree.children(id).iter().rev().map(|&c| (c, child_scope)));
        }

        Ok(())
    }

    fn resolve_calls(mut self) -> Vec<GraphTriple> {
        let profile = self.tree.profile();
        let calls = std::mem::take(&mut self.calls);
        for call in calls {
            let function = self.enclosing(call.scope, ScopeKind::Function);
            let owner = self.enclosing(call.scope, ScopeKind::Type);
            let owner_name = owner.map(|idx| self.scopes[idx].qualified.as_str());
            let resolution = self.symbols.resolve(&call.callee, owner_name, profile);

            let subject = match function {
                Some(idx) => self.scopes[idx].qualified.clone(),
                None => self.resource.relative_path.clone(),
            };
            self.push_triple(
                subject,
                Predicate::Calls,
                call.callee,
                resolution.target_symbol,
                call.line,
                resolution.confidence,
            );
        }
        self.triples
    }
}
