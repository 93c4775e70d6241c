use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::model::{Message, Timestamp};

static USER_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@([A-Z0-9]+)>").expect("valid regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(https?://[^|>]+)\|([^>]+)>").expect("valid regex"));
static OPEN_CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```").expect("valid regex"));
static CLOSE_CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(.)```$").expect("valid regex"));

pub const SPEAKER_GAP: TimeDelta = TimeDelta::minutes(60);

const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M %Z";

pub trait UserDirectory {
    fn username_for_id(&mut self, id: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityUsers;

impl UserDirectory for IdentityUsers {
    fn username_for_id(&mut self, id: &str) -> Result<String> {
        Ok(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub timezone: Tz,
    pub speaker_gap: TimeDelta,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            speaker_gap: SPEAKER_GAP,
        }
    }
}

pub fn username_for_message(users: &mut dyn UserDirectory, message: &Message) -> Result<String> {
    if !message.user.is_empty() {
        return users.username_for_id(&message.user);
    }
    if !message.bot_id.is_empty() {
        return Ok(format!("bot {}", message.bot_id));
    }
    Ok("ghost".to_string())
}

pub fn render_messages(
    users: &mut dyn UserDirectory,
    messages: &[Message],
    options: &RenderOptions,
) -> Result<String> {
    let mut timeline = messages
        .iter()
        .map(|message| Ok((Timestamp::parse(&message.ts)?.instant(), message)))
        .collect::<Result<Vec<_>>>()?;
    timeline.sort_by_key(|(instant, _)| *instant);

    let mut seen = HashSet::new();
    timeline.retain(|&(_, message)| seen.insert(message.ts.as_str()));

    let mut output = String::new();
    let mut previous: Option<(&str, DateTime<Utc>)> = None;

    for (instant, message) in timeline {
        let speaker = message.speaker_id();
        let starts_group = previous.is_none_or(|(last_speaker, last_instant)| {
            speaker != last_speaker
                || (instant - last_instant).num_minutes() > options.speaker_gap.num_minutes()
        });

        if starts_group {
            if previous.is_some() {
                output.push('\n');
            }
            let name = username_for_message(users, message)?;
            let local = instant.with_timezone(&options.timezone);
            output.push_str(&format!(
                "> **{name}** at {}\n",
                local.format(HEADER_TIME_FORMAT)
            ));
        }
        output.push_str(">\n");

        if !message.text.is_empty() {
            push_quoted(&mut output, users, &message.text)?;
        }
        for attachment in &message.attachments {
            push_quoted(&mut output, users, &attachment.text)?;
        }

        if !starts_group {
            output.push('\n');
        }

        previous = Some((speaker, instant));
    }

    Ok(output)
}

pub fn wrap_in_details(channel_name: &str, link: &str, body: &str) -> String {
    format!(
        "Slack conversation archive of [`#{channel_name}`]({link})\n\n<details>\n  <summary>Click to expand</summary>\n\n{body}\n</details>"
    )
}

pub fn rewrite_inline(users: &mut dyn UserDirectory, text: &str) -> Result<String> {
    let text = interpolate_users(users, text)?;
    let text = LINK_RE.replace_all(&text, "[${2}](${1})");
    let text = OPEN_CODE_FENCE_RE.replace_all(&text, "```\n");
    let text = CLOSE_CODE_FENCE_RE.replace_all(&text, "${1}\n```");
    Ok(text.into_owned())
}

fn push_quoted(output: &mut String, users: &mut dyn UserDirectory, text: &str) -> Result<()> {
    let text = rewrite_inline(users, text)?;
    for line in text.split('\n') {
        output.push_str("> ");
        output.push_str(line);
        output.push('\n');
    }
    Ok(())
}

fn interpolate_users(users: &mut dyn UserDirectory, text: &str) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for captures in USER_MENTION_RE.captures_iter(text) {
        let (Some(whole), Some(id)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = users.username_for_id(id.as_str())?;
        output.push_str(&text[last..whole.start()]);
        output.push_str("`@");
        output.push_str(&name);
        output.push('`');
        last = whole.end();
    }
    output.push_str(&text[last..]);

    Ok(output)
}
