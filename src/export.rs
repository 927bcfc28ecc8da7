//! Export of a run's output items to a JSON file.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::Run;

/// File name an export of `run_id` is written under.
pub fn file_name(run_id: &str) -> String {
    let safe: String = run_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("apify-results-{safe}.json")
}

/// Pretty-printed JSON of the run's output. A run without output exports `[]`.
pub fn render(run: &Run) -> serde_json::Result<String> {
    let empty = Vec::new();
    let items: &Vec<Value> = run.output.as_ref().unwrap_or(&empty);
    serde_json::to_string_pretty(items)
}

/// Write the run's output into `dir`, returning the file path.
pub async fn write(run: &Run, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(file_name(&run.run_id));
    let body = render(run).map_err(std::io::Error::other)?;
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, body).await?;
    Ok(path)
}
