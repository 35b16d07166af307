//! Chunk builder
//!
//! Turns a file into an ordered, non-overlapping list of chunks. With a
//! syntax tree, chunks follow logical units (functions, types, `impl`
//! blocks) and oversized units are split at nested units. Without one, the
//! file is cut into line-aligned windows.

mod lines;
mod units;

pub use lines::{estimate_tokens, LineIndex, LineSpan};
pub use units::{collect_units, Unit, UnitForest, UnitKind};

use crate::config::{ChunkingConfig, MAX_CHUNK_TOKENS};
use crate::parse::{SourceParser, SyntaxTree};
use crate::types::{compute_chunk_id, compute_content_hash, ChunkType, CodeChunk, Resource};

/// Default line count for fallback windows
pub const DEFAULT_WINDOW_LINES: usize = 80;

/// Output of one build: chunks plus what the graph step can reuse
#[derive(Debug, Default)]
pub struct ChunkBuild {
    pub chunks: Vec<CodeChunk>,
    /// Present when parsing succeeded
    pub tree: Option<SyntaxTree>,
    pub warnings: Vec<String>,
}

impl ChunkBuild {
    pub fn is_fallback(&self) -> bool {
        self.tree.is_none()
    }
}

/// Metadata attached to a span before it becomes a chunk
#[derive(Debug, Clone)]
struct Piece {
    start: usize,
    end: usize,
    chunk_type: ChunkType,
    function_name: Option<String>,
    class_name: Option<String>,
    oversized: bool,
}

/// Who owns the non-unit lines of a region
#[derive(Debug, Clone, Copy)]
enum Scope<'f> {
    File,
    Unit(&'f Unit),
}

#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    max_tokens: usize,
    window_lines: usize,
}

impl Default for ChunkBuilder {
    fn default() -> Self {
        Self::new(MAX_CHUNK_TOKENS, DEFAULT_WINDOW_LINES)
    }
}

impl ChunkBuilder {
    pub fn new(max_tokens: usize, window_lines: usize) -> Self {
        Self {
            max_tokens: max_tokens.max(1),
            window_lines: window_lines.max(1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chunk_tokens, config.fallback_window_lines)
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Chunk a file, recording any parse-fallback warning on the resource
    pub fn build_chunks(
        &self,
        resource: &mut Resource,
        parser: Option<&mut (dyn SourceParser + '_)>,
        content: &str,
    ) -> Vec<CodeChunk> {
        let build = self.build(resource, parser, content);
        for warning in build.warnings {
            resource.add_warning(warning);
        }
        build.chunks
    }

    /// Chunk a file; never fails
    ///
    /// A parser error or timeout falls back to line windows and adds a
    /// warning. `parser = None` (unsupported language) falls back silently.
    pub fn build(
        &self,
        resource: &Resource,
        parser: Option<&mut (dyn SourceParser + '_)>,
        content: &str,
    ) -> ChunkBuild {
        let index = LineIndex::new(content);
        let mut warnings = Vec::new();

        let tree = match parser {
            Some(parser) => match parser.parse(content) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    tracing::warn!(
                        path = %resource.relative_path,
                        language = %resource.language,
                        error = %e,
                        "Parse failed, using line-window fallback"
                    );
                    warnings.push(format!("parse failed, fallback chunking used: {}", e));
                    None
                }
            },
            None => {
                tracing::debug!(
                    path = %resource.relative_path,
                    language = %resource.language,
                    "No parser registered, using line-window fallback"
                );
                None
            }
        };

        let pieces = match &tree {
            Some(tree) => {
                if tree.has_errors() {
                    warnings.push("syntax errors recovered during parsing".to_string());
                }
                self.semantic_pieces(tree, content, &index)
            }
            None => self.fallback_pieces(&index),
        };

        let chunks = self.materialize(resource, &index, content, pieces, tree.is_none());
        tracing::debug!(
            path = %resource.relative_path,
            chunks = chunks.len(),
            fallback = tree.is_none(),
            "Chunked file"
        );

        ChunkBuild {
            chunks,
            tree,
            warnings,
        }
    }

    fn semantic_pieces(&self, tree: &SyntaxTree, content: &str, index: &LineIndex) -> Vec<Piece> {
        let forest = collect_units(tree, content);
        let mut pieces = Vec::new();
        self.emit_region(
            index,
            &forest,
            1,
            index.len(),
            &forest.roots,
            Scope::File,
            &mut pieces,
        );
        pieces
    }

    /// Cover `start..=end`: units become unit chunks, the lines between
    /// them become scope chunks
    #[allow(clippy::too_many_arguments)]
    fn emit_region(
        &self,
        index: &LineIndex,
        forest: &UnitForest,
        start: usize,
        end: usize,
        units: &[usize],
        scope: Scope<'_>,
        out: &mut Vec<Piece>,
    ) {
        let mut cursor = start;
        for &unit_idx in units {
            let unit = &forest.units[unit_idx];
            let unit_start = unit.start_line.max(cursor);
            let unit_end = unit.end_line.min(end);
            if unit_end < unit_start {
                // shares its only line with the previous unit
                continue;
            }
            if unit_start > cursor {
                self.emit_gap(index, cursor, unit_start - 1, scope, out);
            }
            self.emit_unit(index, forest, unit_idx, unit_start, unit_end, out);
            cursor = unit_end + 1;
        }
        if cursor <= end {
            self.emit_gap(index, cursor, end, scope, out);
        }
    }

    fn emit_unit(
        &self,
        index: &LineIndex,
        forest: &UnitForest,
        unit_idx: usize,
        start: usize,
        end: usize,
        out: &mut Vec<Piece>,
    ) {
        let unit = &forest.units[unit_idx];
        if index.tokens(start, end) <= self.max_tokens {
            out.push(self.unit_piece(forest, unit_idx, start, end, false));
            return;
        }
        if unit.children.is_empty() {
            tracing::debug!(
                name = unit.name.as_deref().unwrap_or("<anonymous>"),
                start,
                end,
                "Unit exceeds token budget and has no nested boundary"
            );
            out.push(self.unit_piece(forest, unit_idx, start, end, true));
            return;
        }
        self.emit_region(
            index,
            forest,
            start,
            end,
            &unit.children,
            Scope::Unit(unit),
            out,
        );
    }

    fn unit_piece(
        &self,
        forest: &UnitForest,
        unit_idx: usize,
        start: usize,
        end: usize,
        oversized: bool,
    ) -> Piece {
        let unit = &forest.units[unit_idx];
        let owner = forest.owner(unit_idx).and_then(|o| o.name.clone());
        let (chunk_type, function_name, class_name) = match unit.kind {
            UnitKind::Function if owner.is_some() => {
                (ChunkType::Method, unit.name.clone(), owner)
            }
            UnitKind::Function => (ChunkType::Function, unit.name.clone(), None),
            UnitKind::Type | UnitKind::Container => (ChunkType::Class, None, unit.name.clone()),
        };
        Piece {
            start,
            end,
            chunk_type,
            function_name,
            class_name,
            oversized,
        }
    }

    /// Lines outside any unit; blank edges are dropped and long regions are
    /// windowed within the budget
    fn emit_gap(
        &self,
        index: &LineIndex,
        start: usize,
        end: usize,
        scope: Scope<'_>,
        out: &mut Vec<Piece>,
    ) {
        let Some((start, end)) = index.trim(start, end) else {
            return;
        };
        let (chunk_type, function_name, class_name) = match scope {
            Scope::File => (ChunkType::Module, None, None),
            Scope::Unit(unit) if unit.kind == UnitKind::Function => {
                (ChunkType::Function, unit.name.clone(), None)
            }
            Scope::Unit(unit) => (ChunkType::Class, None, unit.name.clone()),
        };
        for span in index.windows(start, end, usize::MAX, self.max_tokens) {
            out.push(Piece {
                start: span.start,
                end: span.end,
                chunk_type,
                function_name: function_name.clone(),
                class_name: class_name.clone(),
                oversized: span.oversized,
            });
        }
    }

    fn fallback_pieces(&self, index: &LineIndex) -> Vec<Piece> {
        index
            .windows(1, index.len(), self.window_lines, self.max_tokens)
            .into_iter()
            .map(|span| Piece {
                start: span.start,
                end: span.end,
                chunk_type: ChunkType::Text,
                function_name: None,
                class_name: None,
                oversized: span.oversized,
            })
            .collect()
    }

    fn materialize(
        &self,
        resource: &Resource,
        index: &LineIndex,
        content: &str,
        mut pieces: Vec<Piece>,
        is_fallback: bool,
    ) -> Vec<CodeChunk> {
        if pieces.is_empty() {
            // empty or whitespace-only file: one chunk keeps it covered
            pieces.push(Piece {
                start: 1,
                end: 1,
                chunk_type: if is_fallback {
                    ChunkType::Text
                } else {
                    ChunkType::Module
                },
                function_name: None,
                class_name: None,
                oversized: false,
            });
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(seq, piece)| {
                let text = if index.is_empty() {
                    content
                } else {
                    index.slice(piece.start, piece.end)
                };
                let content_hash = compute_content_hash(text.as_bytes());
                CodeChunk {
                    id: compute_chunk_id(&resource.id, piece.start, piece.end, &content_hash),
                    resource_id: resource.id.clone(),
                    seq,
                    chunk_type: piece.chunk_type,
                    function_name: piece.function_name,
                    class_name: piece.class_name,
                    start_line: piece.start,
                    end_line: piece.end,
                    language: resource.language.clone(),
                    token_count: estimate_tokens(text),
                    is_fallback,
                    oversized: piece.oversized,
                    content_hash,
                    content: text.to_string(),
                }
            })
            .collect()
    }
}
