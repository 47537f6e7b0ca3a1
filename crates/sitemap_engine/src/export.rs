use std::path::PathBuf;

use chrono::{DateTime, Utc};
use crawl_logging::crawl_info;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::sitemap_filename;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("invalid export name {0:?}")]
    InvalidName(String),
}

/// Writes finished documents into one output directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    writer: AtomicFileWriter,
}

impl FileSink {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(output_dir),
        }
    }

    pub fn output_dir(&self) -> &std::path::Path {
        self.writer.dir()
    }

    /// Persists a sitemap document under its timestamped name.
    pub fn export(
        &self,
        base_url: &str,
        completed_at: DateTime<Utc>,
        document: &str,
    ) -> Result<PathBuf, ExportError> {
        let filename = sitemap_filename(base_url, completed_at);
        let path = self.writer.write(&filename, document)?;
        crawl_info!("Sitemap written to {}", path.display());
        Ok(path)
    }

    /// Persists an auxiliary document next to the sitemap, e.g. a crawl report.
    pub fn write_named(&self, filename: &str, content: &str) -> Result<PathBuf, ExportError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            return Err(ExportError::InvalidName(filename.to_string()));
        }
        Ok(self.writer.write(filename, content)?)
    }
}
