use tracing::info;

use crate::api::SlackApi;
use crate::directory::Directory;
use crate::error::Result;
use crate::history::{self, DEFAULT_HISTORY_LIMIT};
use crate::model::Timestamp;
use crate::permalink::Permalink;
use crate::render::{self, IdentityUsers, RenderOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub limit: usize,
    pub details: bool,
    pub resolve_names: bool,
    pub render: RenderOptions,
}

impl Default for ArchiveRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            details: false,
            resolve_names: true,
            render: RenderOptions::default(),
        }
    }
}

pub fn archive_permalink<A: SlackApi>(
    directory: &mut Directory<A>,
    link: &Permalink,
    request: &ArchiveRequest,
) -> Result<String> {
    archive(directory, link, None, request)
}

pub fn archive_channel<A: SlackApi>(
    directory: &mut Directory<A>,
    team: &str,
    channel_name: &str,
    since: &str,
    request: &ArchiveRequest,
) -> Result<String> {
    let since = Timestamp::parse(since)?;
    let channel_id = directory.resolve_channel_id(channel_name)?;
    let link = Permalink::new(team, &channel_id, since.as_str());
    archive(directory, &link, Some(channel_name), request)
}

fn archive<A: SlackApi>(
    directory: &mut Directory<A>,
    link: &Permalink,
    channel_name: Option<&str>,
    request: &ArchiveRequest,
) -> Result<String> {
    let batch = history::fetch(
        directory.api(),
        &link.channel_id,
        &link.timestamp,
        &link.thread_ts,
        request.limit,
    )?;
    info!(
        channel = %link.channel_id,
        messages = batch.messages.len(),
        has_more = batch.has_more,
        "fetched conversation"
    );

    let body = if request.resolve_names {
        render::render_messages(&mut *directory, &batch.messages, &request.render)?
    } else {
        render::render_messages(&mut IdentityUsers, &batch.messages, &request.render)?
    };

    if !request.details {
        return Ok(body);
    }

    let channel_name = match channel_name {
        Some(name) => name.to_string(),
        None => directory.channel_info(&link.channel_id)?.name,
    };
    Ok(render::wrap_in_details(&channel_name, &link.to_url(), &body))
}
