//! Chunks command

use super::load_file;
use crate::app::{ChunksArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use codeintel_core::{ChunkBuilder, Config};

pub fn run(args: ChunksArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let mut file = load_file(&args.file, config)?;

    let mut chunking = config.chunking.clone();
    if let Some(max_tokens) = args.max_tokens {
        chunking.max_chunk_tokens = max_tokens;
    }
    let builder = ChunkBuilder::from_config(&chunking);

    let build = builder.build(&file.resource, file.parser.as_deref_mut(), &file.content);
    for warning in &build.warnings {
        eprintln!("Warning: {}", warning);
    }

    print!(
        "{}",
        output::format_chunks(&build.chunks, format, args.content)
    );
    Ok(())
}
