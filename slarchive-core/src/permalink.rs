use std::str::FromStr;

use url::Url;

use crate::error::{Result, SlarchiveError};
use crate::model::TIMESTAMP_FRACTION_DIGITS;

const SLACK_HOST_SUFFIX: &str = ".slack.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permalink {
    pub team: String,
    pub channel_id: String,
    pub timestamp: String,
    pub thread_ts: String,
}

impl Permalink {
    pub fn parse(input: &str) -> Result<Self> {
        input.parse()
    }

    pub fn new(team: &str, channel_id: &str, timestamp: &str) -> Self {
        Self {
            team: team.to_string(),
            channel_id: channel_id.to_string(),
            timestamp: timestamp.to_string(),
            thread_ts: String::new(),
        }
    }

    pub fn to_url(&self) -> String {
        let mut url = format!(
            "https://{}{SLACK_HOST_SUFFIX}/archives/{}/p{}",
            self.team,
            self.channel_id,
            self.timestamp.replace('.', "")
        );
        if !self.thread_ts.is_empty() {
            url.push_str("?thread_ts=");
            url.push_str(&self.thread_ts);
        }
        url
    }
}

impl FromStr for Permalink {
    type Err = SlarchiveError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| SlarchiveError::InvalidLink(format!("{reason}: {input:?}"));

        let url = Url::parse(input).map_err(|_| invalid("not a url"))?;

        let team = url
            .host_str()
            .and_then(|host| host.strip_suffix(SLACK_HOST_SUFFIX))
            .filter(|team| !team.is_empty())
            .ok_or_else(|| invalid("expected slack.com subdomain"))?;

        let segments = url
            .path()
            .trim_start_matches('/')
            .split('/')
            .collect::<Vec<_>>();
        let [archives, channel, message] = segments.as_slice() else {
            return Err(invalid(
                "expected path of the form /archives/<channel>/p<timestamp>",
            ));
        };
        if *archives != "archives" || channel.is_empty() {
            return Err(invalid(
                "expected path of the form /archives/<channel>/p<timestamp>",
            ));
        }

        let timestamp = message
            .strip_prefix('p')
            .and_then(split_permalink_timestamp)
            .ok_or_else(|| invalid("expected message segment p<digits>"))?;

        let thread_ts = url
            .query_pairs()
            .find(|(key, _)| key == "thread_ts")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        Ok(Self {
            team: team.to_string(),
            channel_id: (*channel).to_string(),
            timestamp,
            thread_ts,
        })
    }
}

fn split_permalink_timestamp(digits: &str) -> Option<String> {
    if digits.len() <= TIMESTAMP_FRACTION_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (seconds, fraction) = digits.split_at(digits.len() - TIMESTAMP_FRACTION_DIGITS);
    Some(format!("{seconds}.{fraction}"))
}
