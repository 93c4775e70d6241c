use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlarchiveError};

pub const TIMESTAMP_FRACTION_DIGITS: usize = 6;

const NANOS_DIGITS: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bot_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub ts: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reply_count: u32,
}

impl Message {
    pub fn speaker_id(&self) -> &str {
        if self.user.is_empty() {
            &self.bot_id
        } else {
            &self.user
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub next_cursor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryBatch {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_metadata: Cursor,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl HistoryBatch {
    pub fn next_cursor(&self) -> &str {
        &self.response_metadata.next_cursor
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_channel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationsPage {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub response_metadata: Cursor,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersPage {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub members: Vec<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub channel: Channel,
}

pub trait ApiPayload {
    fn is_ok(&self) -> bool;
}

macro_rules! impl_api_payload {
    ($($ty:ty),* $(,)?) => {
        $(impl ApiPayload for $ty {
            fn is_ok(&self) -> bool {
                self.ok
            }
        })*
    };
}

impl_api_payload!(HistoryBatch, ConversationsPage, UsersPage, UserInfo, ChannelInfo);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || SlarchiveError::MalformedTimestamp(raw.to_string());

        let mut parts = raw.split('.');
        let (Some(seconds), Some(fraction), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if !is_digits(seconds) || !is_digits(fraction) {
            return Err(malformed());
        }

        // Digits past nanosecond precision are dropped.
        let fraction = &fraction[..fraction.len().min(NANOS_DIGITS)];
        let seconds = seconds.parse::<i64>().map_err(|_| malformed())?;
        let nanos = format!("{fraction:0<9}")
            .parse::<u32>()
            .map_err(|_| malformed())?;
        let instant = DateTime::from_timestamp(seconds, nanos).ok_or_else(malformed)?;

        Ok(Self {
            raw: raw.to_string(),
            instant,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::model::{HistoryBatch, Message, Timestamp};

    #[test]
    fn parses_compound_timestamp() {
        let ts = Timestamp::parse("1700000000.123456").expect("parse");
        assert_eq!(
            ts.instant(),
            Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap()
        );
        assert_eq!(ts.as_str(), "1700000000.123456");
    }

    #[test]
    fn rejects_malformed_timestamps() {
        for raw in ["1700000000", "1.2.3", "abc.123456", "1700000000.", ".123456", "-1.000001"] {
            let err = Timestamp::parse(raw).expect_err("must reject");
            assert!(format!("{err}").contains("is not in <seconds>.<fraction> format"));
        }
    }

    #[test]
    fn truncates_fraction_beyond_nanoseconds() {
        let ts = Timestamp::parse("1700000000.1234567890").expect("parse");
        assert_eq!(
            ts.instant(),
            Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap()
        );
        assert_eq!(ts.as_str(), "1700000000.1234567890");
    }

    #[test]
    fn decodes_history_batch() {
        let raw = r#"{"ok":true,"has_more":true,"response_metadata":{"next_cursor":"abc"},"messages":[{"type":"message","user":"U1","text":"hi","ts":"1.000001","reply_count":2,"attachments":[{"id":1,"text":"att"}]},{"type":"message","bot_id":"B1","ts":"2.000001"}]}"#;

        let batch: HistoryBatch = serde_json::from_str(raw).expect("decode");
        assert!(batch.ok);
        assert!(batch.has_more);
        assert_eq!(batch.next_cursor(), "abc");
        assert_eq!(batch.messages.len(), 2);
        assert_eq!(batch.messages[0].reply_count, 2);
        assert_eq!(batch.messages[0].attachments[0].text, "att");
        assert_eq!(batch.messages[1].speaker_id(), "B1");
        assert_eq!(batch.messages[1].kind, "message");
    }

    #[test]
    fn anonymous_message_has_empty_speaker() {
        assert_eq!(Message::default().speaker_id(), "");
    }
}
