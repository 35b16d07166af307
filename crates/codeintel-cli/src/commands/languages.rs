//! Languages command

use super::parser_registry;
use crate::app::OutputFormat;
use anyhow::Result;
use codeintel_core::Config;

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let registry = parser_registry(config);
    let languages: Vec<(&str, Vec<&str>)> = registry
        .languages()
        .into_iter()
        .map(|lang| (lang, registry.extensions_for(lang)))
        .collect();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = languages
                .iter()
                .map(|(lang, exts)| serde_json::json!({ "language": lang, "extensions": exts }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            for (lang, exts) in &languages {
                println!("{:<12} {}", lang, exts.join(", "));
            }
        }
    }
    Ok(())
}
