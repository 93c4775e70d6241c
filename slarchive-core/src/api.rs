use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, SlarchiveError};
use crate::model::ApiPayload;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

pub type Params = Vec<(&'static str, String)>;

pub trait SlackApi {
    fn call(&self, verb: Verb, endpoint: &str, params: &Params, body: &[u8]) -> Result<Vec<u8>>;
}

impl<T: SlackApi + ?Sized> SlackApi for &T {
    fn call(&self, verb: Verb, endpoint: &str, params: &Params, body: &[u8]) -> Result<Vec<u8>> {
        (**self).call(verb, endpoint, params, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepliesRequest {
    pub channel: String,
    pub ts: String,
    pub oldest: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub channel: String,
    pub oldest: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationsListRequest {
    pub cursor: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersInfoRequest {
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationsInfoRequest {
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Replies(RepliesRequest),
    History(HistoryRequest),
    ConversationsList(ConversationsListRequest),
    ConversationsInfo(ConversationsInfoRequest),
    UsersList,
    UsersInfo(UsersInfoRequest),
}

impl ApiRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Replies(_) => "conversations.replies",
            Self::History(_) => "conversations.history",
            Self::ConversationsList(_) => "conversations.list",
            Self::ConversationsInfo(_) => "conversations.info",
            Self::UsersList => "users.list",
            Self::UsersInfo(_) => "users.info",
        }
    }

    pub fn params(&self) -> Params {
        match self {
            Self::Replies(req) => {
                let mut params = vec![
                    ("channel", req.channel.clone()),
                    ("ts", req.ts.clone()),
                    ("inclusive", "true".to_string()),
                    ("limit", req.limit.to_string()),
                ];
                if let Some(oldest) = &req.oldest {
                    params.push(("oldest", oldest.clone()));
                }
                params
            }
            Self::History(req) => vec![
                ("channel", req.channel.clone()),
                ("oldest", req.oldest.clone()),
                ("inclusive", "true".to_string()),
                ("limit", req.limit.to_string()),
            ],
            Self::ConversationsList(req) => vec![
                ("cursor", req.cursor.clone()),
                ("exclude_archived", "true".to_string()),
                ("limit", req.limit.to_string()),
                ("types", "public_channel,private_channel".to_string()),
            ],
            Self::ConversationsInfo(req) => vec![("channel", req.channel.clone())],
            Self::UsersList => Vec::new(),
            Self::UsersInfo(req) => vec![("user", req.user.clone())],
        }
    }
}

pub fn send<T>(api: &dyn SlackApi, request: &ApiRequest) -> Result<T>
where
    T: DeserializeOwned + ApiPayload,
{
    let endpoint = request.endpoint();
    debug!(endpoint, params = ?request.params(), "calling slack api");

    let body = api.call(Verb::Get, endpoint, &request.params(), b"{}")?;
    let payload =
        serde_json::from_slice::<T>(&body).map_err(|source| SlarchiveError::InvalidResponse {
            endpoint: endpoint.to_string(),
            source,
        })?;

    if !payload.is_ok() {
        return Err(SlarchiveError::RemoteNotOk {
            endpoint: endpoint.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(payload)
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
    cookie: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None)
            .build()
            .map_err(|source| SlarchiveError::Transport {
                endpoint: base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            cookie: None,
        })
    }

    pub fn for_team(team: &str, token: impl Into<String>) -> Result<Self> {
        Self::new(team_api_base(team), token)
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

pub fn team_api_base(team: &str) -> String {
    format!("https://{team}.slack.com/api")
}

impl SlackApi for HttpTransport {
    fn call(&self, verb: Verb, endpoint: &str, params: &Params, body: &[u8]) -> Result<Vec<u8>> {
        let url = format!("{}/{endpoint}", self.base_url);
        let transport_error = |source| SlarchiveError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let mut request = match verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self
                .client
                .post(&url)
                .header("Content-Type", "application/json; charset=utf-8")
                .body(body.to_vec()),
        }
        .query(params)
        .bearer_auth(&self.token);

        if let Some(cookie) = &self.cookie {
            request = request.header("Cookie", format!("d={cookie}"));
        }

        let response = request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(transport_error)?;

        let bytes = response.bytes().map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}
