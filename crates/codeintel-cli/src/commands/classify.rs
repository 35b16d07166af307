//! Classify command

use super::{classification_path, current_dir};
use crate::app::{ClassifyArgs, OutputFormat};
use anyhow::{Context, Result};
use codeintel_core::classify::SNIFF_BYTES;
use codeintel_core::{Classifier, Config};
use std::io::Read;

pub fn run(args: ClassifyArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let classifier = Classifier::new(&config.classifier.rules)?;
    let cwd = current_dir();
    let mut results = Vec::with_capacity(args.files.len());

    for path in &args.files {
        let mut sniff = Vec::with_capacity(SNIFF_BYTES);
        let absolute = std::fs::canonicalize(path)
            .and_then(|absolute| {
                std::fs::File::open(&absolute)?
                    .take(SNIFF_BYTES as u64)
                    .read_to_end(&mut sniff)?;
                Ok(absolute)
            })
            .with_context(|| format!("Cannot read {}", path.display()))?;

        let display = path.to_string_lossy().replace('\\', "/");
        let class = classifier.classify(&classification_path(&absolute, cwd.as_deref()), &sniff);
        results.push((display, class));
    }

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = results
                .iter()
                .map(|(path, class)| serde_json::json!({ "path": path, "classification": class }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            for (path, class) in &results {
                println!("{:<10} {}", class.as_str(), path);
            }
        }
    }
    Ok(())
}
