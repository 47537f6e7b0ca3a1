//! Crash-safe placement of finished sitemaps and crawl reports.
//!
//! A document is staged as a hidden `.partial` file beside its destination and
//! renamed into place, so readers see either the previous export or the new
//! one, never a truncated file.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("output path {0} exists but is not a directory")]
    NotADirectory(PathBuf),
    #[error("output directory {path} is not writable: {source}")]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates the export directory when missing and checks that files can be
/// staged in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(PersistError::NotADirectory(dir.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Err(source) => {
            return Err(PersistError::NotWritable {
                path: dir.to_path_buf(),
                source,
            })
        }
    }
    stage_in(dir).map_err(|source| PersistError::NotWritable {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn stage_in(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new()
        .prefix(".sitemap-")
        .suffix(".partial")
        .tempfile_in(dir)
}

/// Places documents in one export directory, replacing any previous file of
/// the same name in a single rename.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(filename);
        let failed = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut staged = stage_in(&self.dir).map_err(failed)?;
        staged.write_all(content.as_bytes()).map_err(failed)?;
        staged.as_file_mut().sync_all().map_err(failed)?;
        staged
            .persist(&target)
            .map_err(|err| failed(err.error))?;
        Ok(target)
    }
}
