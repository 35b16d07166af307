//! Rule-based file classification
//!
//! Maps a file path and a sniff of its content to THEORY, PRACTICE or
//! GOVERNANCE. Rules are evaluated in order and the first match wins;
//! anything unmatched is PRACTICE.

mod academic;
mod rules;

pub use academic::{academic_score, is_academic, ACADEMIC_THRESHOLD};
pub use rules::{default_rules, ClassifierRule};

use crate::error::Result;
use crate::types::Classification;
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Bytes of content inspected by the academic heuristic
pub const SNIFF_BYTES: usize = 8 * 1024;

/// Classification assigned when no rule matches
pub const DEFAULT_CLASSIFICATION: Classification = Classification::Practice;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

enum Matcher {
    FileName(Pattern),
    Path(Pattern),
    Extensions(Vec<String>),
}

struct CompiledRule {
    matcher: Matcher,
    classification: Classification,
    academic: bool,
}

/// Deterministic classifier over a compiled rule table
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Classifier {
    /// Compile a rule table; invalid globs are rejected here, never at classify time
    pub fn new(rules: &[ClassifierRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            compiled.push(CompiledRule {
                matcher: rule.compile()?,
                classification: rule.classification,
                academic: rule.academic,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Classifier over the built-in rule table
    pub fn with_defaults() -> Self {
        let rules = default_rules()
            .iter()
            .filter_map(|rule| {
                Some(CompiledRule {
                    matcher: rule.compile().ok()?,
                    classification: rule.classification,
                    academic: rule.academic,
                })
            })
            .collect();
        Self { rules }
    }

    /// Classify a relative path given the leading bytes of its content
    pub fn classify(&self, path: &str, content_sniff: &[u8]) -> Classification {
        let normalized = path.replace('\\', "/");
        let file_name = Path::new(&normalized)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = Path::new(&normalized)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        // Computed lazily: only academic rules need to look at content
        let mut academic: Option<bool> = None;

        for rule in &self.rules {
            let matched = match &rule.matcher {
                Matcher::FileName(p) => p.matches_with(&file_name, MATCH_OPTIONS),
                Matcher::Path(p) => p.matches_with(&normalized, MATCH_OPTIONS),
                Matcher::Extensions(exts) => extension
                    .as_deref()
                    .map(|ext| exts.iter().any(|e| e == ext))
                    .unwrap_or(false),
            };
            if !matched {
                continue;
            }
            if rule.academic {
                let is_academic = *academic.get_or_insert_with(|| {
                    let sniff = &content_sniff[..content_sniff.len().min(SNIFF_BYTES)];
                    is_academic(&String::from_utf8_lossy(sniff))
                });
                if !is_academic {
                    continue;
                }
            }
            return rule.classification;
        }

        DEFAULT_CLASSIFICATION
    }
}

impl ClassifierRule {
    fn compile(&self) -> Result<Matcher> {
        if let Some(name) = &self.file_name {
            return Ok(Matcher::FileName(Pattern::new(name)?));
        }
        if let Some(path) = &self.path {
            return Ok(Matcher::Path(Pattern::new(path)?));
        }
        let exts = self
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        Ok(Matcher::Extensions(exts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governance_files() {
        let classifier = Classifier::with_defaults();
        for path in [
            "LICENSE",
            "LICENSE-MIT",
            "docs/CONTRIBUTING.md",
            "CODE_OF_CONDUCT.md",
            ".github/CODEOWNERS",
            "SECURITY.md",
        ] {
            assert_eq!(
                classifier.classify(path, b""),
                Classification::Governance,
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_source_is_practice() {
        let classifier = Classifier::with_defaults();
        assert_eq!(
            classifier.classify("src/main.rs", b"fn main() {}"),
            Classification::Practice
        );
        assert_eq!(
            classifier.classify("lib/util.py", b"def f(): pass"),
            Classification::Practice
        );
    }

    #[test]
    fn test_latex_is_theory() {
        let classifier = Classifier::with_defaults();
        assert_eq!(
            classifier.classify("paper/main.tex", b""),
            Classification::Theory
        );
        assert_eq!(classifier.classify("refs.bib", b""), Classification::Theory);
    }

    #[test]
    fn test_markdown_depends_on_content() {
        let classifier = Classifier::with_defaults();
        let academic = b"# Abstract\n\nWe prove the following theorem.\n\n## Theorem 1\n\nSee arXiv:2101.00001.";
        let plain = b"# Getting started\n\nRun `make install`.";
        assert_eq!(
            classifier.classify("docs/notes.md", academic),
            Classification::Theory
        );
        assert_eq!(
            classifier.classify("docs/notes.md", plain),
            Classification::Practice
        );
    }

    #[test]
    fn test_unknown_extension_defaults_to_practice() {
        let classifier = Classifier::with_defaults();
        assert_eq!(
            classifier.classify("data/blob.xyz", b"\x00\x01"),
            Classification::Practice
        );
        assert_eq!(classifier.classify("", b""), Classification::Practice);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            ClassifierRule::file_name("README*", Classification::Governance),
            ClassifierRule::extensions(&["md"], Classification::Theory),
        ];
        let classifier = Classifier::new(&rules).unwrap();
        assert_eq!(
            classifier.classify("README.md", b""),
            Classification::Governance
        );
        assert_eq!(
            classifier.classify("guide.md", b""),
            Classification::Theory
        );
    }

    #[test]
    fn test_invalid_glob_rejected_at_build() {
        let rules = vec![ClassifierRule::file_name("[", Classification::Theory)];
        assert!(Classifier::new(&rules).is_err());
    }

    #[test]
    fn test_windows_separators() {
        let classifier = Classifier::with_defaults();
        assert_eq!(
            classifier.classify("papers\\draft.md", b""),
            Classification::Theory
        );
    }
}
