// src/scanner.rs - Folder scan for printable PDFs
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::platform::file_name_of;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("folder not found: {path}")]
    FolderNotFound { path: String },
    #[error("failed to read folder: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Collect the PDF files of `folder`, sorted case-insensitively by file name.
///
/// The extension match is case-insensitive (`.pdf` and `.PDF` both count);
/// subdirectories are not descended into.
pub async fn collect_pdfs(folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !folder.is_dir() {
        return Err(ScanError::FolderNotFound {
            path: folder.display().to_string(),
        });
    }

    let io_err = |source| ScanError::Io {
        path: folder.display().to_string(),
        source,
    };

    let mut entries = fs::read_dir(folder).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }

    files.sort_by_key(|path| file_name_of(path).to_lowercase());
    tracing::debug!(folder = %folder.display(), count = files.len(), "scanned for PDFs");
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
