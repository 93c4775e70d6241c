pub mod api;
pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod history;
pub mod model;
pub mod permalink;
pub mod render;
pub mod service;

#[cfg(test)]
mod testing;

pub use api::{HttpTransport, SlackApi, Verb};
pub use cache::{CacheFile, IdentifierCache};
pub use config::{ArchiveConfig, parse_timezone};
pub use directory::Directory;
pub use error::{Result, SlarchiveError};
pub use model::{Attachment, HistoryBatch, Message, Timestamp};
pub use permalink::Permalink;
pub use render::{IdentityUsers, RenderOptions, UserDirectory, render_messages, wrap_in_details};
pub use service::{ArchiveRequest, archive_channel, archive_permalink};
