//! Tree-sitter backed parsers

use super::languages::LanguageSpec;
use super::tree::SyntaxTree;
use super::{ParserFactory, SourceParser};
use crate::error::{Error, Result};
use std::time::Duration;
use tree_sitter::Parser;

/// One tree-sitter parser bound to one grammar
///
/// Not shared between threads; every worker creates its own.
pub struct TreeSitterParser {
    spec: &'static LanguageSpec,
    parser: Parser,
    timeout: Duration,
}

impl TreeSitterParser {
    pub fn new(spec: &'static LanguageSpec, timeout: Duration) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&(spec.grammar)())
            .map_err(|e| Error::Parse(format!("{}: {}", spec.id, e)))?;
        parser.set_timeout_micros(timeout.as_micros().min(u64::MAX as u128) as u64);
        Ok(Self {
            spec,
            parser,
            timeout,
        })
    }
}

impl SourceParser for TreeSitterParser {
    fn language(&self) -> &str {
        self.spec.id
    }

    fn parse(&mut self, content: &str) -> Result<SyntaxTree> {
        match self.parser.parse(content, None) {
            Some(tree) => Ok(SyntaxTree::from_tree_sitter(
                &tree,
                self.spec.id,
                self.spec.profile,
            )),
            None => {
                // A timed-out parse leaves state behind that would resume on the next call
                self.parser.reset();
                Err(Error::ParseTimeout(self.timeout.as_millis() as u64))
            }
        }
    }
}

/// Registry entry creating [`TreeSitterParser`]s for one grammar
pub struct TreeSitterFactory {
    spec: &'static LanguageSpec,
    timeout: Duration,
}

impl TreeSitterFactory {
    pub fn new(spec: &'static LanguageSpec, timeout: Duration) -> Self {
        Self { spec, timeout }
    }
}

impl ParserFactory for TreeSitterFactory {
    fn language(&self) -> &str {
        self.spec.id
    }

    fn extensions(&self) -> &[&'static str] {
        self.spec.extensions
    }

    fn create(&self) -> Result<Box<dyn SourceParser>> {
        Ok(Box::new(TreeSitterParser::new(self.spec, self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::languages::{GO, RUST, TSX, TYPESCRIPT};

    #[test]
    fn test_parse_rust() {
        let mut parser = TreeSitterParser::new(&RUST, Duration::from_secs(5)).unwrap();
        let tree = parser.parse("fn main() { println!(\"hi\"); }").unwrap();
        assert_eq!(tree.kind(tree.root()), "source_file");
        assert_eq!(tree.language(), "rust");
    }

    #[test]
    fn test_parse_typescript_variants() {
        let mut ts = TreeSitterParser::new(&TYPESCRIPT, Duration::from_secs(5)).unwrap();
        let tree = ts.parse("function f(): void {}").unwrap();
        assert_eq!(tree.kind(tree.root()), "program");

        let mut tsx = TreeSitterParser::new(&TSX, Duration::from_secs(5)).unwrap();
        let tree = tsx.parse("const a = <div>hi</div>;").unwrap();
        assert!(!tree.has_errors());
    }

    #[test]
    fn test_parser_is_reusable() {
        let mut parser = TreeSitterParser::new(&GO, Duration::from_secs(5)).unwrap();
        for _ in 0..3 {
            let tree = parser.parse("package main\nfunc main() {}\n").unwrap();
            assert_eq!(tree.kind(tree.root()), "source_file");
        }
    }

    #[test]
    fn test_factory_metadata() {
        let factory = TreeSitterFactory::new(&RUST, Duration::from_millis(100));
        assert_eq!(factory.language(), "rust");
        assert_eq!(factory.extensions(), &["rs"]);
        assert!(factory.create().is_ok());
    }
}
