//! Call-target resolution and confidence scoring

use crate::parse::{ImportSpec, LanguageProfile};
use std::collections::HashMap;

pub const CONFIDENCE_EXACT: f32 = 1.0;
pub const CONFIDENCE_SELF_METHOD: f32 = 0.9;
pub const CONFIDENCE_IMPORTED_RECEIVER: f32 = 0.8;
pub const CONFIDENCE_UNIQUE_METHOD: f32 = 0.5;
pub const CONFIDENCE_UNRESOLVED: f32 = 0.4;
pub const CONFIDENCE_DYNAMIC: f32 = 0.3;
pub const CONFIDENCE_FLOOR: f32 = 0.2;

/// Resolved target of one call site
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target_symbol: String,
    pub confidence: f32,
}

impl Resolution {
    fn exact(target: &str, confidence: f32) -> Self {
        Self {
            target_symbol: target.to_string(),
            confidence,
        }
    }
}

/// Names defined and imported by one file
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Simple name -> qualified names of local functions and types
    definitions: HashMap<String, Vec<String>>,
    /// Qualified type -> method names defined in it
    methods: HashMap<String, Vec<String>>,
    /// Local binding -> qualified import targets
    bindings: HashMap<String, Vec<String>>,
    wildcard_imports: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, qualified: &str) {
        let entry = self.definitions.entry(name.to_string()).or_default();
        if !entry.iter().any(|q| q == qualified) {
            entry.push(qualified.to_string());
        }
    }

    pub fn define_method(&mut self, owner: &str, name: &str) {
        self.methods
            .entry(owner.to_string())
            .or_default()
            .push(name.to_string());
    }

    pub fn import(&mut self, spec: &ImportSpec) {
        if spec.wildcard {
            self.wildcard_imports += 1;
        }
        for binding in &spec.bindings {
            let entry = self.bindings.entry(binding.local.clone()).or_default();
            if !entry.contains(&binding.qualified) {
                entry.push(binding.qualified.clone());
            }
        }
    }

    /// Resolve a callee as written, e.g. `helper`, `self.save`, `os.path.join`
    pub fn resolve(
        &self,
        callee: &str,
        enclosing_type: Option<&str>,
        profile: &LanguageProfile,
    ) -> Resolution {
        match split_callee(callee) {
            None => self.resolve_plain(callee),
            Some((receiver, name)) => {
                self.resolve_member(callee, receiver, name, enclosing_type, profile)
            }
        }
    }

    fn resolve_plain(&self, name: &str) -> Resolution {
        let mut candidates: Vec<&str> = Vec::new();
        let locals = self.definitions.get(name).into_iter().flatten();
        let imported = self.bindings.get(name).into_iter().flatten();
        for qualified in locals.chain(imported) {
            if !candidates.contains(&qualified.as_str()) {
                candidates.push(qualified);
            }
        }

        match candidates.len() {
            1 => Resolution::exact(candidates[0], CONFIDENCE_EXACT),
            0 if self.wildcard_imports > 0 => Resolution::exact(
                name,
                (0.5 / self.wildcard_imports as f32).max(CONFIDENCE_FLOOR),
            ),
            0 => Resolution::exact(name, CONFIDENCE_UNRESOLVED),
            n => Resolution::exact(name, (1.0 / n as f32).max(CONFIDENCE_FLOOR)),
        }
    }

    fn resolve_member(
        &self,
        callee: &str,
        receiver: &str,
        name: &str,
        enclosing_type: Option<&str>,
        profile: &LanguageProfile,
    ) -> Resolution {
        if profile.self_receivers.contains(&receiver) {
            if let Some(owner) = enclosing_type {
                let defined = self
                    .methods
                    .get(owner)
                    .map(|names| names.iter().filter(|n| n.as_str() == name).count())
                    .unwrap_or(0);
                if defined == 1 {
                    let target = format!("{}{}{}", owner, profile.separator, name);
                    return Resolution::exact(&target, CONFIDENCE_SELF_METHOD);
                }
            }
        }

        let root = receiver_root(receiver);
        match self.bindings.get(root).map(Vec::as_slice) {
            Some([]) | None => {}
            Some([only]) => {
                let rest = &callee[root.len()..];
                return Resolution::exact(&format!("{}{}", only, rest), CONFIDENCE_IMPORTED_RECEIVER);
            }
            // One local name bound to several modules
            Some(targets) => {
                let confidence =
                    (CONFIDENCE_IMPORTED_RECEIVER / targets.len() as f32).max(CONFIDENCE_FLOOR);
                return Resolution::exact(callee, confidence);
            }
        }

        match self.definitions.get(name).map(Vec::as_slice) {
            Some([only]) => Resolution::exact(only, CONFIDENCE_UNIQUE_METHOD),
            _ => Resolution::exact(callee, CONFIDENCE_DYNAMIC),
        }
    }
}

/// Split `a.b.c` / `A::b` into receiver and member name
pub fn split_callee(callee: &str) -> Option<(&str, &str)> {
    let dot = callee.rfind('.').map(|i| (i, 1));
    let path = callee.rfind("::").map(|i| (i, 2));
    let (pos, width) = match (dot, path) {
        (Some(d), Some(p)) => {
            if d.0 > p.0 {
                d
            } else {
                p
            }
        }
        (Some(d), None) => d,
        (None, Some(p)) => p,
        (None, None) => return None,
    };
    let receiver = &callee[..pos];
    let name = &callee[pos + width..];
    if receiver.is_empty() || name.is_empty() {
        None
    } else {
        Some((receiver, name))
    }
}

/// Leading identifier of a receiver expression: `os.path` -> `os`
fn receiver_root(receiver: &str) -> &str {
    let end = receiver
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(receiver.len());
    &receiver[..end]
}
