use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Result, SlarchiveError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierCache {
    #[serde(rename = "Channels", default, deserialize_with = "null_as_empty")]
    pub channels: BTreeMap<String, String>,
    #[serde(rename = "Users", default, deserialize_with = "null_as_empty")]
    pub users: BTreeMap<String, String>,
}

impl IdentifierCache {
    pub fn channel_id(&self, name: &str) -> Option<&str> {
        self.channels.get(name).map(String::as_str)
    }

    pub fn user_name(&self, id: &str) -> Option<&str> {
        self.users.get(id).map(String::as_str)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<IdentifierCache> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no identifier cache yet");
                return Ok(IdentifierCache::default());
            }
            Err(source) => {
                return Err(SlarchiveError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| SlarchiveError::CacheDecode {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, cache: &IdentifierCache) -> Result<()> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SlarchiveError::Io { path, source }
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let bytes = serde_json::to_vec(cache)
            .map_err(|err| SlarchiveError::Serialization(err.to_string()))?;

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, bytes).map_err(io_error(&staging))?;
        fs::rename(&staging, &self.path).map_err(io_error(&self.path))?;

        debug!(
            path = %self.path.display(),
            channels = cache.channels.len(),
            users = cache.users.len(),
            "saved identifier cache"
        );
        Ok(())
    }
}
