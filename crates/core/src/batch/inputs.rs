//! Input collection: turns user-supplied paths into the batch's file list.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands directories into the files they contain whose extension is in
/// `extensions` (case-insensitive), sorted by path. Other paths are kept
/// as given, even when they do not exist; the batch reports those.
pub async fn expand_inputs(
    paths: &[PathBuf],
    extensions: &[String],
) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::with_capacity(paths.len());

    for path in paths {
        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);

        if !is_dir {
            inputs.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let entry_path = entry.path();
            if entry.file_type().await?.is_file() && has_extension(&entry_path, extensions) {
                found.push(entry_path);
            }
        }
        found.sort();

        debug!(dir = %path.display(), files = found.len(), "Expanded input directory");
        inputs.extend(found);
    }

    Ok(inputs)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
