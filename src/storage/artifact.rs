use crate::error::{MigrationError, Result};
use crate::storage::models::WriteRequest;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Zwischenablage des Exports auf der lokalen Platte.
///
/// Wird einmal vom Exporter geschrieben, vom Batch Loader und vom Bucket
/// Copier gelesen und am Ende eines erfolgreichen Laufs gelöscht.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    path: PathBuf,
}

impl ExportArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, requests: &[WriteRequest]) -> Result<()> {
        let file = fs::File::create(&self.path)
            .map_err(|e| MigrationError::artifact(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, requests)?;
        writer
            .flush()
            .map_err(|e| MigrationError::artifact(&self.path, e))?;
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<WriteRequest>> {
        let file =
            fs::File::open(&self.path).map_err(|e| MigrationError::artifact(&self.path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            MigrationError::MalformedArtifact(format!("{}: {}", self.path.display(), e))
        })
    }

    pub fn remove(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| MigrationError::artifact(&self.path, e))
    }
}
