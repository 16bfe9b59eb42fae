//! One-shot zip export of a dashboard's widgets.
//!
//! The archive holds a single folder named after the dashboard. Text kinds
//! become `<kind>_<n>.txt`, todo lists become checklists, and images are
//! downloaded as `image_<n>.<ext>`. Numbering is per kind and starts at 1.
//! An image that cannot be downloaded is logged and left out.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::collections::HashMap;
use std::io::{Cursor, Write};

use canvas::content::Content;
use canvas::doc::{Widget, WidgetKind};
use tracing::{info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ErrorCode;
use crate::store::ImageFetcher;

const DEFAULT_FOLDER: &str = "dashboard";
const DEFAULT_IMAGE_EXTENSION: &str = "png";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for ExportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Zip(_) => "E_EXPORT_ZIP",
            Self::Io(_) => "E_EXPORT_IO",
        }
    }
}

/// A file to place inside the export folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Turn widgets into archive entries, downloading image content.
pub async fn collect_entries(widgets: &[Widget], fetcher: &dyn ImageFetcher) -> Vec<ExportEntry> {
    let mut counters: HashMap<WidgetKind, usize> = HashMap::new();
    let mut entries = Vec::with_capacity(widgets.len());

    for widget in widgets {
        let (extension, bytes) = match widget.interpret() {
            Content::Text(text) => ("txt".to_owned(), text.into_bytes()),
            Content::Todo(list) => ("txt".to_owned(), list.to_checklist().into_bytes()),
            Content::Image(None) => continue,
            Content::Image(Some(url)) => match fetcher.fetch_image(&url).await {
                Ok(bytes) => (image_extension(&url), bytes),
                Err(e) => {
                    warn!(id = %widget.id, url = %url, error = %e, "image download failed; skipping");
                    continue;
                }
            },
        };
        let n = counters.entry(widget.kind).or_insert(0);
        *n += 1;
        entries.push(ExportEntry { name: format!("{}_{}.{}", widget.kind.as_tag(), n, extension), bytes });
    }

    entries
}

/// Extension of the last path segment of `url`, ignoring any query or fragment.
#[must_use]
pub fn image_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => DEFAULT_IMAGE_EXTENSION.to_owned(),
    }
}

/// Folder name for a dashboard title. Path separators are replaced; empty
/// and dot-only titles fall back to the default folder.
#[must_use]
pub fn folder_name(title: &str) -> String {
    let cleaned: String = title.trim().chars().map(|c| if matches!(c, '/' | '\\') { '_' } else { c }).collect();
    if cleaned.chars().all(|c| c == '.') { DEFAULT_FOLDER.to_owned() } else { cleaned }
}

/// Write entries into a zip under one folder and return the archive bytes.
///
/// # Errors
///
/// Returns `Zip` or `Io` if the archive cannot be written.
pub fn write_archive(title: &str, entries: &[ExportEntry]) -> Result<Vec<u8>, ExportError> {
    let folder = folder_name(title);
    let options = SimpleFileOptions::default();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.add_directory(format!("{folder}/"), options)?;
    for entry in entries {
        zip.start_file(format!("{folder}/{}", entry.name), options)?;
        zip.write_all(&entry.bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Collect and archive every widget in one call.
///
/// # Errors
///
/// As [`write_archive`]. Failed image downloads are not errors.
pub async fn export_archive(title: &str, widgets: &[Widget], fetcher: &dyn ImageFetcher) -> Result<Vec<u8>, ExportError> {
    let entries = collect_entries(widgets, fetcher).await;
    let archive = write_archive(title, &entries)?;
    info!(files = entries.len(), bytes = archive.len(), "dashboard exported");
    Ok(archive)
}
