use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlarchiveError {
    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("missing Slack token: pass --token or set SLACK_TOKEN")]
    MissingToken,

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("{endpoint} response not OK: {body}")]
    RemoteNotOk { endpoint: String, body: String },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid json from {endpoint}: {source}")]
    InvalidResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no such user: {id}")]
    UserNotFound {
        id: String,
        #[source]
        source: Option<Box<SlarchiveError>>,
    },

    #[error("no channel named {name}")]
    ChannelNotFound { name: String },

    #[error("timestamp '{0}' is not in <seconds>.<fraction> format")]
    MalformedTimestamp(String),

    #[error("{endpoint} returned no messages")]
    EmptyResult { endpoint: String },

    #[error("cannot determine home directory")]
    HomeDirectoryNotFound,

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cache file {path}: {source}")]
    CacheDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, SlarchiveError>;
