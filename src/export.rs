//! CSV export of the filtered table.

use std::path::{Path, PathBuf};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

pub const CSV_MIME: &str = "text/csv";

/// An export ready to be written: file name, MIME type and encoded bytes.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `"{sheet}_filtered.csv"`
pub fn export_file_name(sheet: &str) -> String {
    format!("{}_filtered.csv", sheet)
}

/// UTF-8 CSV with a header row and no row index.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut df = df.clone();
    let mut bytes = Vec::new();
    CsvWriter::new(&mut bytes)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| eyre!("CSV encoding failed: {}", e))?;
    Ok(bytes)
}

impl ExportArtifact {
    pub fn csv(sheet: &str, df: &DataFrame) -> Result<Self> {
        Ok(Self {
            file_name: export_file_name(sheet),
            mime: CSV_MIME,
            bytes: to_csv_bytes(df)?,
        })
    }

    /// Write into `dir` (created when missing) and return the full path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .map_err(|e| eyre!("Could not write {}: {}", path.display(), e))?;
        tracing::info!(
            path = %path.display(),
            bytes = self.bytes.len(),
            mime = self.mime,
            "exported"
        );
        Ok(path)
    }
}
