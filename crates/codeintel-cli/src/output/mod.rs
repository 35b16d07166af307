//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use codeintel_core::{CodeChunk, GraphTriple, IngestionTaskView};

pub fn format_task(view: &IngestionTaskView, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(view),
        OutputFormat::Cli => terminal::format_task(view),
    }
}

pub fn format_chunks(chunks: &[CodeChunk], format: OutputFormat, content: bool) -> String {
    match format {
        OutputFormat::Json => json::format_chunks(chunks, content),
        OutputFormat::Cli => terminal::format_chunks(chunks, content),
    }
}

pub fn format_triples(triples: &[GraphTriple], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(triples),
        OutputFormat::Cli => terminal::format_triples(triples),
    }
}
