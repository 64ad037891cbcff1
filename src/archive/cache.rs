use crate::utils::ensure_cache_dir_exists;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;

/// On-disk store of archive response bodies, keyed by request parameters.
///
/// Historical data does not change, so entries never expire. The cache is
/// best effort: read and write failures are logged and treated as misses.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a key to a file name made of ASCII alphanumerics, `-`, `.` and `_`.
    fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                info!("Cache hit for {} at {:?}", key, path);
                Some(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cache miss for {}", key);
                None
            }
            Err(e) => {
                warn!("Failed to read cache file {:?}: {}", path, e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, body: &[u8]) {
        let path = self.path_for(key);
        if let Err(e) = self.write(&path, body).await {
            warn!("Failed to write cache file {:?}: {}", path, e);
            return;
        }
        info!("Cached {} bytes for {} to {:?}", body.len(), key, path);
    }

    /// Writes to a sibling `.part` file first so readers never see half a body.
    async fn write(&self, path: &Path, body: &[u8]) -> std::io::Result<()> {
        ensure_cache_dir_exists(&self.dir).await?;
        let partial = path.with_extension("json.part");
        fs::write(&partial, body).await?;
        fs::rename(&partial, path).await
    }
}
