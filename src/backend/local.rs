use std::path::{Path, PathBuf};

use tracing::info;

use crate::{job::service::upload, record};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create directory ({path:?}): {error}")]
    CreateDir {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to copy {from:?} to {to:?}: {error}")]
    Copy {
        error: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Publishes scenes by copying them into a directory served elsewhere.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    dir: PathBuf,
    base_url: String,
}

impl LocalUploader {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }
}

impl upload::Client for LocalUploader {
    type Error = Error;

    async fn put(&self, local_path: &Path, filename: &str) -> Result<String, Self::Error> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|error| Error::CreateDir {
                error,
                path: self.dir.clone(),
            })?;
        let target = self.dir.join(filename);
        if target != local_path {
            tokio::fs::copy(local_path, &target)
                .await
                .map_err(|error| Error::Copy {
                    error,
                    from: local_path.to_owned(),
                    to: target.clone(),
                })?;
        }
        info!(path = ?target, "published scene");
        Ok(record::public_url(&self.base_url, filename))
    }
}
