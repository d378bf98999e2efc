//! Export layer: turn the current view into downloadable documents.
//!
//! ```text
//!   TablePage / DashboardAggregates
//!        │
//!        ├──► csv     header + rows, RFC 4180 quoting
//!        │
//!        └──► pdf     table report / dashboard report (lopdf)
//! ```
//!
//! Both writers build the whole document in memory; [`write_file`] puts the
//! bytes on disk.

use std::path::Path;

use thiserror::Error;

pub mod csv;
pub mod format;
pub mod pdf;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("PDF generation failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("exported text is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("writing document: {0}")]
    Write(#[from] std::io::Error),

    #[error("writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which rows of the table an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportScope {
    /// Only the rows on the current page.
    #[default]
    CurrentPage,
    /// Every row matching the current search, in sorted order.
    AllMatching,
}

impl ExportScope {
    pub fn label(self) -> &'static str {
        match self {
            ExportScope::CurrentPage => "Current page",
            ExportScope::AllMatching => "All matching rows",
        }
    }
}

/// Write an exported document to disk.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing-dir").join("ev_data.csv");
        let err = write_file(&target, b"x").unwrap_err();
        assert!(err.to_string().contains("missing-dir"));

        let ok = dir.path().join("ev_data.csv");
        write_file(&ok, b"Make\n").unwrap();
        assert_eq!(std::fs::read(&ok).unwrap(), b"Make\n");
    }
}
