use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::api::{
    ApiRequest, ConversationsInfoRequest, ConversationsListRequest, SlackApi, UsersInfoRequest,
    send,
};
use crate::cache::{CacheFile, IdentifierCache};
use crate::error::{Result, SlarchiveError};
use crate::model::{Channel, ChannelInfo, ConversationsPage, UserInfo, UsersPage};
use crate::render::UserDirectory;

pub const CONVERSATIONS_PAGE_LIMIT: usize = 1000;

#[derive(Debug)]
pub struct Directory<A> {
    api: A,
    cache: IdentifierCache,
    store: CacheFile,
}

impl<A: SlackApi> Directory<A> {
    pub fn open(api: A, store: CacheFile) -> Result<Self> {
        let cache = store.load()?;
        Ok(Self::with_cache(api, cache, store))
    }

    pub fn with_cache(api: A, cache: IdentifierCache, store: CacheFile) -> Self {
        Self { api, cache, store }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    pub fn into_cache(self) -> IdentifierCache {
        self.cache
    }

    pub fn resolve_user_name(&mut self, id: &str) -> Result<String> {
        if let Some(name) = self.cache.user_name(id) {
            return Ok(name.to_string());
        }

        self.cache.users = fetch_user_map(&self.api)?;
        self.store.save(&self.cache)?;

        if let Some(name) = self.cache.user_name(id) {
            return Ok(name.to_string());
        }

        debug!(user = id, "user missing from users.list, trying users.info");
        let info = send::<UserInfo>(
            &self.api,
            &ApiRequest::UsersInfo(UsersInfoRequest {
                user: id.to_string(),
            }),
        )
        .map_err(|source| SlarchiveError::UserNotFound {
            id: id.to_string(),
            source: Some(Box::new(source)),
        })?;

        let name = info.user.name;
        self.cache.users.insert(id.to_string(), name.clone());
        self.store.save(&self.cache)?;

        Ok(name)
    }

    pub fn resolve_channel_id(&mut self, name: &str) -> Result<String> {
        if let Some(id) = self.cache.channel_id(name) {
            return Ok(id.to_string());
        }

        let conversations = fetch_conversations(&self.api, CONVERSATIONS_PAGE_LIMIT)?;
        self.cache.channels = channel_map(conversations);
        self.store.save(&self.cache)?;

        self.cache
            .channel_id(name)
            .map(ToString::to_string)
            .ok_or_else(|| SlarchiveError::ChannelNotFound {
                name: name.to_string(),
            })
    }

    pub fn channel_info(&self, id: &str) -> Result<Channel> {
        let info = send::<ChannelInfo>(
            &self.api,
            &ApiRequest::ConversationsInfo(ConversationsInfoRequest {
                channel: id.to_string(),
            }),
        )?;
        Ok(info.channel)
    }
}

impl<A: SlackApi> UserDirectory for Directory<A> {
    fn username_for_id(&mut self, id: &str) -> Result<String> {
        self.resolve_user_name(id)
    }
}

fn fetch_user_map(api: &dyn SlackApi) -> Result<BTreeMap<String, String>> {
    info!("populating user cache");
    let page = send::<UsersPage>(api, &ApiRequest::UsersList)?;
    Ok(page
        .members
        .into_iter()
        .map(|user| (user.id, user.name))
        .collect())
}

pub fn fetch_conversations(api: &dyn SlackApi, page_limit: usize) -> Result<Vec<Channel>> {
    info!("populating channel cache (this may take a while)");

    let mut channels = Vec::new();
    let mut cursor = String::new();
    loop {
        debug!(cursor = %cursor, "fetching conversations page");
        let page = send::<ConversationsPage>(
            api,
            &ApiRequest::ConversationsList(ConversationsListRequest {
                cursor,
                limit: page_limit,
            }),
        )?;

        channels.extend(page.channels);
        debug!(count = channels.len(), "conversations fetched so far");

        if page.response_metadata.next_cursor.is_empty() {
            break;
        }
        cursor = page.response_metadata.next_cursor;
    }

    Ok(channels)
}

fn channel_map(conversations: Vec<Channel>) -> BTreeMap<String, String> {
    let mut channels = BTreeMap::new();
    for conversation in conversations {
        if !conversation.is_channel {
            warn!(name = %conversation.name, "skipping non-channel conversation");
            continue;
        }
        channels.insert(conversation.name, conversation.id);
    }
    channels
}
