//! Terminal output formatter

use codeintel_core::{CodeChunk, GraphTriple, IngestionTaskView};

pub fn format_task(view: &IngestionTaskView) -> String {
    let mut output = String::new();
    output.push_str(&format!("Task:        {}\n", view.id));
    output.push_str(&format!("Source:      {}\n", view.source_ref));
    if let Some(branch) = &view.branch {
        output.push_str(&format!("Branch:      {}\n", branch));
    }
    output.push_str(&format!("Status:      {}\n", view.status));
    output.push_str(&format!(
        "Files:       {}/{} ({} failed)\n",
        view.files_processed, view.total_files, view.files_failed
    ));
    output.push_str(&format!("Chunks:      {}\n", view.chunks_emitted));
    output.push_str(&format!("Triples:     {}\n", view.triples_emitted));
    if let (Some(start), Some(end)) = (view.started_at, view.finished_at) {
        let ms = (end - start).num_milliseconds();
        output.push_str(&format!("Duration:    {}.{:03}s\n", ms / 1000, ms % 1000));
    }
    if let Some(error) = &view.error {
        output.push_str(&format!("Error:       {}\n", error));
    }
    output
}

pub fn format_chunks(chunks: &[CodeChunk], content: bool) -> String {
    let mut output = String::new();

    for chunk in chunks {
        let name = match (&chunk.class_name, &chunk.function_name) {
            (Some(class), Some(function)) => format!("{}.{}", class, function),
            (Some(class), None) => class.clone(),
            (None, Some(function)) => function.clone(),
            (None, None) => String::new(),
        };
        let mut flags = Vec::new();
        if chunk.is_fallback {
            flags.push("fallback");
        }
        if chunk.oversized {
            flags.push("oversized");
        }
        output.push_str(&format!(
            "{:>3} {:>5}-{:<5} {:<8} {:>5} tok  {}{}\n",
            chunk.seq,
            chunk.start_line,
            chunk.end_line,
            chunk.chunk_type.as_str(),
            chunk.token_count,
            name,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        ));

        if content {
            for (i, line) in chunk.content.lines().enumerate() {
                output.push_str(&format!("      {:>5} {}\n", chunk.start_line + i, line));
            }
            output.push('\n');
        }
    }

    output
}

pub fn format_triples(triples: &[GraphTriple]) -> String {
    let mut output = String::new();

    for triple in triples {
        output.push_str(&format!(
            "{:>5}  {} {} {} -> {} ({:.2})\n",
            triple.line_number,
            triple.subject,
            triple.predicate,
            triple.object,
            triple.target_symbol,
            triple.confidence
        ));
    }

    output
}
