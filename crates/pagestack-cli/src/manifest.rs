use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pagestack_engine::io::{ExportJob, ExportOutcome, Exporter, IoError};

pub const MANIFEST_NAME: &str = "pagestack-export.toml";

/// Writes the export job as a TOML manifest for an external merge tool.
/// Sources missing on disk are listed as failed rather than aborting.
pub struct ManifestExporter;

impl Exporter for ManifestExporter {
    fn export(&self, job: &ExportJob) -> Result<ExportOutcome, IoError> {
        let content = toml::to_string_pretty(job).map_err(|e| IoError::Export(e.to_string()))?;
        if let Some(parent) = job.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&job.output, content)?;

        let mut seen = HashSet::new();
        let failed_files: Vec<PathBuf> = job
            .entries
            .iter()
            .filter(|entry| !entry.path.exists() && seen.insert(&entry.path))
            .map(|entry| entry.path.clone())
            .collect();
        Ok(ExportOutcome { failed_files })
    }
}

/// Manifest location: the preferred export directory, else beside the first
/// source
pub fn manifest_path(export_dir: Option<&Path>, first_source: Option<&Path>) -> PathBuf {
    let dir = export_dir
        .map(Path::to_path_buf)
        .or_else(|| first_source.and_then(Path::parent).map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(MANIFEST_NAME)
}
