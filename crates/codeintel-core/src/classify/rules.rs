//! Classifier rule table

use crate::types::Classification;
use serde::{Deserialize, Serialize};

const GOVERNANCE_NAMES: &[&str] = &[
    "LICENSE*",
    "LICENCE*",
    "COPYING*",
    "NOTICE*",
    "CODE_OF_CONDUCT*",
    "CONTRIBUTING*",
    "SECURITY*",
    "GOVERNANCE*",
    "CODEOWNERS",
    "MAINTAINERS*",
    "CHANGELOG*",
];

const THEORY_EXTENSIONS: &[&str] = &["tex", "bib", "ltx"];

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "pyi", "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx", "go", "java", "kt",
    "c", "h", "cc", "cpp", "hpp", "cs", "rb", "php", "swift", "scala", "sh", "sql", "toml",
    "yaml", "yml", "json",
];

const THEORY_PATHS: &[&str] = &["**/papers/**", "**/paper/**", "**/research/**", "**/rfcs/**"];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt", "adoc", "org"];

/// One entry of the classifier rule table
///
/// Exactly one matcher is used, checked in the order `file_name`, `path`,
/// `extensions`. Rules flagged `academic` only match when the content sniff
/// looks like academic writing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierRule {
    /// Glob against the file name only (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Glob against the full relative path (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Extensions without the leading dot
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,

    pub classification: Classification,

    #[serde(default)]
    pub academic: bool,
}

impl ClassifierRule {
    pub fn file_name(pattern: &str, classification: Classification) -> Self {
        Self {
            file_name: Some(pattern.to_string()),
            path: None,
            extensions: Vec::new(),
            classification,
            academic: false,
        }
    }

    pub fn path(pattern: &str, classification: Classification) -> Self {
        Self {
            file_name: None,
            path: Some(pattern.to_string()),
            extensions: Vec::new(),
            classification,
            academic: false,
        }
    }

    pub fn extensions(exts: &[&str], classification: Classification) -> Self {
        Self {
            file_name: None,
            path: None,
            extensions: exts.iter().map(|e| e.to_string()).collect(),
            classification,
            academic: false,
        }
    }

    pub fn when_academic(mut self) -> Self {
        self.academic = true;
        self
    }
}

/// Built-in rule table
pub fn default_rules() -> Vec<ClassifierRule> {
    let mut rules: Vec<ClassifierRule> = GOVERNANCE_NAMES
        .iter()
        .map(|name| ClassifierRule::file_name(name, Classification::Governance))
        .collect();

    rules.push(ClassifierRule::extensions(
        THEORY_EXTENSIONS,
        Classification::Theory,
    ));
    rules.push(ClassifierRule::extensions(
        SOURCE_EXTENSIONS,
        Classification::Practice,
    ));
    rules.extend(
        THEORY_PATHS
            .iter()
            .map(|p| ClassifierRule::path(p, Classification::Theory)),
    );
    rules.push(
        ClassifierRule::extensions(DOC_EXTENSIONS, Classification::Theory).when_academic(),
    );

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_order() {
        let rules = default_rules();
        assert_eq!(rules[0].classification, Classification::Governance);
        assert!(rules.last().unwrap().academic);
    }

    #[test]
    fn test_rule_yaml_roundtrip_shape() {
        let rule = ClassifierRule::extensions(&["md"], Classification::Theory).when_academic();
        let yaml = serde_yaml::to_string(&rule).unwrap();
        assert!(yaml.contains("extensions"));
        assert!(!yaml.contains("file_name"));
        assert!(yaml.contains("THEORY"));
    }
}
