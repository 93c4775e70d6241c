use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use dirs::home_dir;

use crate::error::{Result, SlarchiveError};

const APP_DIR: &str = "slarchive";
const CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    pub cache_path: PathBuf,
}

impl ArchiveConfig {
    pub fn from_env_or_home() -> Result<Self> {
        // Precedence:
        // 1) XDG_DATA_HOME/slarchive/cache.json
        // 2) ~/.local/share/slarchive/cache.json
        let data_home = match env::var_os("XDG_DATA_HOME").filter(|path| !path.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => home_dir()
                .ok_or(SlarchiveError::HomeDirectoryNotFound)?
                .join(".local/share"),
        };

        Ok(Self {
            cache_path: data_home.join(APP_DIR).join(CACHE_FILE),
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Tz::UTC);
    }
    Tz::from_str(name).map_err(|_| SlarchiveError::InvalidTimezone(name.to_string()))
}
