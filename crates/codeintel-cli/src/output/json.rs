//! JSON output formatter

use codeintel_core::CodeChunk;
use serde::Serialize;

pub fn format_value<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

pub fn format_chunks(chunks: &[CodeChunk], content: bool) -> String {
    if content {
        return format_value(chunks);
    }
    let output: Vec<serde_json::Value> = chunks
        .iter()
        .map(|c| {
            serde_json::json!({
                "id": c.id,
                "seq": c.seq,
                "chunk_type": c.chunk_type,
                "function_name": c.function_name,
                "class_name": c.class_name,
                "start_line": c.start_line,
                "end_line": c.end_line,
                "token_count": c.token_count,
                "is_fallback": c.is_fallback,
                "oversized": c.oversized,
            })
        })
        .collect();
    format_value(&output)
}
