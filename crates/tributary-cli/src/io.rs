//! Reading and writing pipeline JSON files.

use anyhow::{Context, Result};
use std::path::Path;
use tributary_core::{PipelineGraph, PipelineItem, PipelineItemDef};

/// Parse a pipeline item from its JSON form.
pub fn parse_item(json: &str) -> Result<PipelineItem> {
    let def: PipelineItemDef =
        serde_json::from_str(json).context("Failed to parse pipeline JSON")?;
    let item = PipelineItem::from_def(def).context("Pipeline graph is malformed")?;
    Ok(item)
}

/// Load a pipeline item from a JSON file.
pub fn load_item(path: &Path) -> Result<PipelineItem> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline from {}", path.display()))?;
    parse_item(&json).with_context(|| format!("Failed to load pipeline from {}", path.display()))
}

/// Render `item` with its graph replaced by `graph` as pretty JSON.
pub fn render_item(item: &PipelineItem, graph: &PipelineGraph) -> Result<String> {
    let def = PipelineItemDef {
        id: item.id.clone(),
        fetch: item.fetch.clone(),
        graph: graph.to_def(),
    };
    let mut json = serde_json::to_string_pretty(&def).context("Failed to serialize pipeline")?;
    json.push('\n');
    Ok(json)
}

/// Write text to a file, or to stdout when no path is given.
pub fn write_output(output_path: Option<&Path>, contents: &str) -> Result<()> {
    match output_path {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{contents}"),
    }
    Ok(())
}
