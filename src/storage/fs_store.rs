use super::blob_store::{BlobStore, StorageError};
use super::models::{ObjectMeta, ObjectPage};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::io::ErrorKind;
use walkdir::WalkDir;

/// Local-directory bucket.
///
/// Objects are plain files under a root directory, keys are the
/// `/`-separated relative paths. Signed URLs follow the nginx secure-link
/// convention: `{base}/{key}?exp={unix}&sig={hex sha256(key:exp:secret)}`,
/// so a reverse proxy in front of the media directory can verify them
/// without talking to this process.
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
    signing_secret: String,
}

impl FsBlobStore {
    pub fn new(root: PathBuf, public_base_url: String, signing_secret: String) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            signing_secret,
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys are bucket paths, never filesystem escapes.
        if key.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(StorageError::Unavailable(anyhow::anyhow!(
                "invalid object key: {key}"
            )));
        }
        Ok(self.root.join(key))
    }

    /// Signature token for `key` expiring at `exp` (unix seconds).
    pub fn sign_token(key: &str, exp: i64, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{key}:{exp}:{secret}"));
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn map_io(key: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Unavailable(err.into())
    }
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut key = String::new();
    for seg in rel.components() {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(seg.as_os_str().to_str()?);
    }
    Some(key)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(key)?;
        tokio::fs::read(&path).await.map_err(|err| map_io(key, err))
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Unavailable(err.into()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| StorageError::Unavailable(err.into()))
    }

    async fn list_prefixes(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.object_path(prefix.trim_end_matches('/'))?
        };
        let mut prefixes = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(prefixes),
            Err(err) => return Err(StorageError::Unavailable(err.into())),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StorageError::Unavailable(err.into()))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| StorageError::Unavailable(err.into()))?;
            if let (true, Some(name)) = (file_type.is_dir(), entry.file_name().to_str()) {
                prefixes.push(format!("{prefix}{name}/"));
            }
        }
        prefixes.sort();
        Ok(prefixes)
    }

    async fn list_objects(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage, StorageError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        let cursor = cursor.map(str::to_string);
        // Directory walks are synchronous; keep them off the runtime threads.
        tokio::task::spawn_blocking(move || {
            let mut keys = Vec::new();
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        if err
                            .io_error()
                            .is_some_and(|io| io.kind() == ErrorKind::NotFound)
                        {
                            continue;
                        }
                        return Err(StorageError::Unavailable(err.into()));
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(key) = relative_key(&root, entry.path()) else {
                    continue;
                };
                if !key.starts_with(&prefix) {
                    continue;
                }
                let meta = entry
                    .metadata()
                    .map_err(|err| StorageError::Unavailable(err.into()))?;
                let last_modified = meta.modified().ok().map(|t| {
                    DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true)
                });
                keys.push(ObjectMeta {
                    key,
                    size: meta.len(),
                    last_modified,
                });
            }
            keys.sort_by(|a, b| a.key.cmp(&b.key));
            let objects: Vec<ObjectMeta> = keys
                .into_iter()
                .filter(|o| cursor.as_deref().is_none_or(|c| o.key.as_str() > c))
                .collect();
            let truncated = objects.len() > max_keys;
            let mut page = objects;
            page.truncate(max_keys);
            let next_cursor = if truncated {
                page.last().map(|o| o.key.clone())
            } else {
                None
            };
            Ok(ObjectPage {
                objects: page,
                next_cursor,
            })
        })
        .await
        .map_err(|err| StorageError::Unavailable(err.into()))?
    }

    async fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let exp = Utc::now().timestamp() + ttl.as_secs() as i64;
        let sig = Self::sign_token(key, exp, &self.signing_secret);
        Ok(format!("{}/{key}?exp={exp}&sig={sig}", self.public_base_url))
    }
}
