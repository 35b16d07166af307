//! Parser registry
//!
//! Maps language ids to parser factories. Parsers are stateful and not
//! shareable, so the registry hands out fresh instances and callers keep
//! one per language per worker.

pub mod languages;
pub mod tree;
mod treesitter;

pub use languages::{builtin_languages, ImportBinding, ImportSpec, LanguageProfile, LanguageSpec};
pub use tree::{NodeId, SyntaxNode, SyntaxTree};
pub use treesitter::{TreeSitterFactory, TreeSitterParser};

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A parser instance producing syntax trees for one language
pub trait SourceParser: Send {
    fn language(&self) -> &str;

    /// Parse a whole file; timeouts and grammar failures are errors
    fn parse(&mut self, content: &str) -> Result<SyntaxTree>;
}

/// Registry entry: knows its language and creates parser instances
pub trait ParserFactory: Send + Sync {
    fn language(&self) -> &str;

    fn extensions(&self) -> &[&'static str];

    fn create(&self) -> Result<Box<dyn SourceParser>>;
}

/// Result of a registry lookup
pub enum ParserLookup {
    Available(Box<dyn SourceParser>),
    /// No grammar registered; route the file to fallback chunking
    Unsupported,
}

impl ParserLookup {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

/// Language id -> parser factory table
#[derive(Clone, Default)]
pub struct ParserRegistry {
    factories: HashMap<String, Arc<dyn ParserFactory>>,
    extensions: HashMap<String, String>,
}

impl ParserRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tree-sitter grammar
    pub fn with_defaults(parse_timeout: Duration) -> Self {
        let mut registry = Self::new();
        for spec in builtin_languages() {
            registry.register(Arc::new(TreeSitterFactory::new(spec, parse_timeout)));
        }
        registry
    }

    /// Add or replace a language
    pub fn register(&mut self, factory: Arc<dyn ParserFactory>) {
        let language = factory.language().to_string();
        for ext in factory.extensions() {
            self.extensions
                .insert(ext.to_ascii_lowercase(), language.clone());
        }
        tracing::debug!(language = %language, "Registered parser");
        self.factories.insert(language, factory);
    }

    /// Fresh parser for `language`, or `Unsupported`
    pub fn get_parser(&self, language: &str) -> Result<ParserLookup> {
        match self.factories.get(language) {
            Some(factory) => Ok(ParserLookup::Available(factory.create()?)),
            None => Ok(ParserLookup::Unsupported),
        }
    }

    /// Language id claiming the path's extension
    pub fn language_for_path(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extensions.get(&ext).map(String::as_str)
    }

    pub fn supports(&self, language: &str) -> bool {
        self.factories.contains_key(language)
    }

    /// Registered language ids, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// Extensions registered for `language`, sorted
    pub fn extensions_for(&self, language: &str) -> Vec<&str> {
        let mut exts: Vec<&str> = self
            .extensions
            .iter()
            .filter(|(_, lang)| lang.as_str() == language)
            .map(|(ext, _)| ext.as_str())
            .collect();
        exts.sort_unstable();
        exts
    }
}

/// Name of a unit node, using the profile's name fields
///
/// Generic parameters are dropped so `impl<T> Foo<T>` is named `Foo`.
pub fn node_name(tree: &SyntaxTree, id: NodeId, source: &str) -> Option<String> {
    let profile = tree.profile();
    let name_node = profile
        .name_fields
        .iter()
        .find_map(|field| tree.child_by_field(id, field))?;
    let text = tree.text(name_node, source)?.trim();
    let base = text.split('<').next().unwrap_or(text).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct BrokenFactory;

    impl ParserFactory for BrokenFactory {
        fn language(&self) -> &str {
            "broken"
        }

        fn extensions(&self) -> &[&'static str] {
            &["brk"]
        }

        fn create(&self) -> Result<Box<dyn SourceParser>> {
            Err(Error::Parse("grammar unavailable".to_string()))
        }
    }

    #[test]
    fn test_defaults_cover_builtin_languages() {
        let registry = ParserRegistry::with_defaults(Duration::from_secs(1));
        assert_eq!(
            registry.languages(),
            vec!["go", "javascript", "python", "rust", "tsx", "typescript"]
        );
    }

    #[test]
    fn test_language_for_path() {
        let registry = ParserRegistry::with_defaults(Duration::from_secs(1));
        assert_eq!(registry.language_for_path(Path::new("src/lib.rs")), Some("rust"));
        assert_eq!(registry.language_for_path(Path::new("App.TSX")), Some("tsx"));
        assert_eq!(registry.language_for_path(Path::new("a/b.mjs")), Some("javascript"));
        assert_eq!(registry.language_for_path(Path::new("notes.xyz")), None);
        assert_eq!(registry.language_for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_unsupported_language() {
        let registry = ParserRegistry::with_defaults(Duration::from_secs(1));
        assert!(registry.get_parser("cobol").unwrap().is_unsupported());
    }

    #[test]
    fn test_each_lookup_creates_fresh_parser() {
        let registry = ParserRegistry::with_defaults(Duration::from_secs(1));
        let first = registry.get_parser("python").unwrap();
        let second = registry.get_parser("python").unwrap();
        match (first, second) {
            (ParserLookup::Available(a), ParserLookup::Available(b)) => {
                assert_eq!(a.language(), "python");
                assert_eq!(b.language(), "python");
            }
            _ => panic!("python should be available"),
        }
    }

    #[test]
    fn test_registration_is_the_only_step() {
        let mut registry = ParserRegistry::new();
        registry.register(Arc::new(BrokenFactory));
        assert!(registry.supports("broken"));
        assert_eq!(registry.language_for_path(Path::new("x.brk")), Some("broken"));
        assert!(registry.get_parser("broken").is_err());
    }

    #[test]
    fn test_node_name_strips_generics() {
        let source = "impl<T> Wrapper<T> { fn get(&self) {} }";
        let mut parser = TreeSitterParser::new(&languages::RUST, Duration::from_secs(1)).unwrap();
        let tree = parser.parse(source).unwrap();
        let imp = tree.children(tree.root())[0];
        assert_eq!(tree.kind(imp), "impl_item");
        assert_eq!(node_name(&tree, imp, source).as_deref(), Some("Wrapper"));
    }
}
