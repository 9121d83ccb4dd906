use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::warn;
use regex::bytes::Regex;
use serde::Serialize;

use crate::models::{Rotation, SourceKind};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file type: {0}")]
    Unsupported(PathBuf),
    #[error("No pages found in {0}")]
    Unreadable(PathBuf),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Nothing to export")]
    EmptyDocument,
}

/// What a probe learned about one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub kind: SourceKind,
    pub page_count: usize,
}

/// Answers how many pages a source has and what kind it is
pub trait SourceProbe {
    fn probe(&self, path: &Path) -> Result<SourceInfo, IoError>;
}

/// A source ready to be added to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSource {
    pub path: PathBuf,
    /// Display name; also the key used to skip repeat imports
    pub name: String,
    pub kind: SourceKind,
    pub page_count: usize,
}

impl ImportedSource {
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind, page_count: usize) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            kind,
            page_count,
        }
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Probe every path, substituting a single image page for any that fail
pub fn probe_sources(paths: &[PathBuf], probe: &dyn SourceProbe) -> Vec<ImportedSource> {
    paths
        .iter()
        .map(|path| match probe.probe(path) {
            Ok(info) => ImportedSource::new(path.clone(), info.kind, info.page_count),
            Err(e) => {
                warn!("Falling back to a single page for {}: {e}", path.display());
                ImportedSource::new(path.clone(), SourceKind::Image, 1)
            }
        })
        .collect()
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

static PAGE_OBJECT_REGEX: OnceLock<Regex> = OnceLock::new();

/// Filesystem probe: classifies by extension and counts PDF page objects.
///
/// Counting `/Type /Page` dictionaries is a heuristic; it does not follow
/// the page tree, so compressed object streams report no pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl FsProbe {
    pub fn count_pdf_pages(bytes: &[u8]) -> usize {
        let regex = PAGE_OBJECT_REGEX.get_or_init(|| {
            Regex::new(r"/Type\s*/Page(?-u:[^s]|$)").expect("Invalid page object regex")
        });
        regex.find_iter(bytes).count()
    }
}

impl SourceProbe for FsProbe {
    fn probe(&self, path: &Path) -> Result<SourceInfo, IoError> {
        if !path.exists() {
            return Err(IoError::NotFound(path.to_path_buf()));
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            let bytes = fs::read(path)?;
            let page_count = Self::count_pdf_pages(&bytes);
            if page_count == 0 {
                return Err(IoError::Unreadable(path.to_path_buf()));
            }
            return Ok(SourceInfo {
                kind: SourceKind::File,
                page_count,
            });
        }

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Ok(SourceInfo {
                kind: SourceKind::Image,
                page_count: 1,
            });
        }

        Err(IoError::Unsupported(path.to_path_buf()))
    }
}

/// One output page of an export, in final order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    pub path: PathBuf,
    pub source_index: usize,
    pub rotation: u16,
    pub kind: SourceKind,
}

impl ExportEntry {
    pub fn new(path: PathBuf, source_index: usize, rotation: Rotation, kind: SourceKind) -> Self {
        Self {
            path,
            source_index,
            rotation: rotation.degrees(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Everything an exporter needs to produce the final file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportJob {
    pub output: PathBuf,
    pub resize_to_fit: bool,
    pub metadata: ExportMetadata,
    pub entries: Vec<ExportEntry>,
}

/// Completed export. Sources that could not be read are listed, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutcome {
    pub failed_files: Vec<PathBuf>,
}

pub trait Exporter {
    fn export(&self, job: &ExportJob) -> Result<ExportOutcome, IoError>;
}
