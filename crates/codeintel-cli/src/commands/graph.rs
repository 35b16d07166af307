//! Graph command

use super::load_file;
use crate::app::{FileArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use codeintel_core::{Config, GraphExtractor};

pub fn run(args: FileArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let mut file = load_file(&args.file, config)?;

    let tree = match file.parser.as_mut() {
        Some(parser) => match parser.parse(&file.content) {
            Ok(tree) => Some(tree),
            Err(e) => {
                eprintln!("Warning: parse failed, no graph extracted: {}", e);
                None
            }
        },
        None => {
            tracing::info!(
                language = %file.resource.language,
                "No grammar for file, no graph extracted"
            );
            None
        }
    };

    let extraction =
        GraphExtractor::new().extract_with_diagnostics(&file.resource, tree.as_ref(), &file.content);
    if let Some(e) = &extraction.error {
        eprintln!("Warning: graph extraction incomplete: {}", e);
    }

    print!("{}", output::format_triples(&extraction.triples, format));
    Ok(())
}
