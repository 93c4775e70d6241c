use tracing::debug;

use crate::api::{ApiRequest, HistoryRequest, RepliesRequest, SlackApi, send};
use crate::error::{Result, SlarchiveError};
use crate::model::HistoryBatch;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Thread(HistoryBatch),
    ChannelWindow,
}

pub fn fetch(
    api: &dyn SlackApi,
    channel_id: &str,
    start_ts: &str,
    thread_ts: &str,
    limit: usize,
) -> Result<HistoryBatch> {
    let probe = replies_request(channel_id, start_ts, thread_ts, limit);
    let endpoint = probe.endpoint();
    let batch = send::<HistoryBatch>(api, &probe)?;

    match classify_probe(batch, !thread_ts.is_empty(), endpoint)? {
        ProbeOutcome::Thread(batch) => {
            debug!(
                channel = channel_id,
                messages = batch.messages.len(),
                "using thread replies"
            );
            Ok(batch)
        }
        ProbeOutcome::ChannelWindow => {
            debug!(channel = channel_id, "start is not a thread root, reading channel history");
            send::<HistoryBatch>(
                api,
                &ApiRequest::History(HistoryRequest {
                    channel: channel_id.to_string(),
                    oldest: start_ts.to_string(),
                    limit,
                }),
            )
        }
    }
}

pub fn replies_request(channel_id: &str, start_ts: &str, thread_ts: &str, limit: usize) -> ApiRequest {
    let (ts, oldest) = if thread_ts.is_empty() {
        (start_ts.to_string(), None)
    } else {
        (thread_ts.to_string(), Some(start_ts.to_string()))
    };

    ApiRequest::Replies(RepliesRequest {
        channel: channel_id.to_string(),
        ts,
        oldest,
        limit,
    })
}

pub fn classify_probe(
    mut batch: HistoryBatch,
    anchored: bool,
    endpoint: &str,
) -> Result<ProbeOutcome> {
    let Some(first) = batch.messages.first() else {
        return Err(SlarchiveError::EmptyResult {
            endpoint: endpoint.to_string(),
        });
    };
    let first_has_replies = first.reply_count != 0;

    // An anchored probe starts with the thread root; drop it unless it is all we got.

    if anchored && first_has_replies && batch.messages.len() > 1 {
        batch.messages.remove(0);
    }

    if anchored || first_has_replies {
        return Ok(ProbeOutcome::Thread(batch));
    }

    Ok(ProbeOutcome::ChannelWindow)
}

#[cfg(test)]
mod tests {
    use crate::history::{ProbeOutcome, classify_probe, fetch};
    use crate::model::{HistoryBatch, Message};
    use crate::testing::ScriptedApi;

    fn message(ts: &str, reply_count: u32) -> Message {
        Message {
            user: "U1".to_string(),
            ts: ts.to_string(),
            reply_count,
            ..Message::default()
        }
    }

    fn batch(messages: Vec<Message>) -> HistoryBatch {
        HistoryBatch {
            ok: true,
            messages,
            ..HistoryBatch::default()
        }
    }

    fn kept(outcome: ProbeOutcome) -> Vec<String> {
        match outcome {
            ProbeOutcome::Thread(batch) => batch.messages.into_iter().map(|m| m.ts).collect(),
            ProbeOutcome::ChannelWindow => panic!("expected thread outcome"),
        }
    }

    #[test]
    fn anchored_drops_root_with_replies() {
        let outcome = classify_probe(
            batch(vec![message("1.000000", 3), message("2.000000", 0), message("3.000000", 0)]),
            true,
            "conversations.replies",
        )
        .expect("classify");
        assert_eq!(kept(outcome), vec!["2.000000", "3.000000"]);
    }

    #[test]
    fn anchored_single_message_is_never_dropped() {
        let outcome = classify_probe(
            batch(vec![message("1.000000", 5)]),
            true,
            "conversations.replies",
        )
        .expect("classify");
        assert_eq!(kept(outcome), vec!["1.000000"]);
    }

    #[test]
    fn anchored_first_without_replies_is_kept() {
        let outcome = classify_probe(
            batch(vec![message("1.000000", 0), message("2.000000", 0)]),
            true,
            "conversations.replies",
        )
        .expect("classify");
        assert_eq!(kept(outcome), vec!["1.000000", "2.000000"]);
    }

    #[test]
    fn unanchored_thread_root_keeps_whole_thread() {
        let outcome = classify_probe(
            batch(vec![message("1.000000", 2), message("2.000000", 0), message("3.000000", 0)]),
            false,
            "conversations.replies",
        )
        .expect("classify");
        assert_eq!(kept(outcome), vec!["1.000000", "2.000000", "3.000000"]);
    }

    #[test]
    fn unanchored_plain_message_falls_back() {
        let outcome = classify_probe(
            batch(vec![message("1.000000", 0)]),
            false,
            "conversations.replies",
        )
        .expect("classify");
        assert_eq!(outcome, ProbeOutcome::ChannelWindow);
    }

    #[test]
    fn empty_probe_is_boundary_error() {
        for anchored in [true, false] {
            let err = classify_probe(batch(Vec::new()), anchored, "conversations.replies")
                .expect_err("must fail");
            assert!(format!("{err}").contains("conversations.replies returned no messages"));
        }
    }

    #[test]
    fn fetch_thread_window_uses_anchor_and_oldest() {
        let api = ScriptedApi::new().respond(
            "conversations.replies",
            r#"{"ok":true,"messages":[{"user":"U1","ts":"100.000000","reply_count":4},{"user":"U2","ts":"150.000000"}]}"#,
        );

        let result = fetch(&api, "C1", "150.000000", "100.000000", 10).expect("fetch");
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].ts, "150.000000");

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].param("ts"), Some("100.000000"));
        assert_eq!(calls[0].param("oldest"), Some("150.000000"));
        assert_eq!(calls[0].param("inclusive"), Some("true"));
        assert_eq!(calls[0].param("limit"), Some("10"));
    }

    #[test]
    fn fetch_plain_message_reads_channel_history() {
        let api = ScriptedApi::new()
            .respond(
                "conversations.replies",
                r#"{"ok":true,"messages":[{"user":"U1","ts":"100.000000"}]}"#,
            )
            .respond(
                "conversations.history",
                r#"{"ok":true,"has_more":true,"messages":[{"user":"U2","ts":"101.000000"},{"user":"U1","ts":"100.000000"}]}"#,
            );

        let result = fetch(&api, "C1", "100.000000", "", 5).expect("fetch");
        assert_eq!(result.messages.len(), 2);
        assert!(result.has_more);

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].param("ts"), Some("100.000000"));
        assert_eq!(calls[0].param("oldest"), None);
        assert_eq!(calls[1].endpoint, "conversations.history");
        assert_eq!(calls[1].param("oldest"), Some("100.000000"));
        assert_eq!(calls[1].param("limit"), Some("5"));
    }

    #[test]
    fn fetch_thread_root_skips_channel_history() {
        let api = ScriptedApi::new().respond(
            "conversations.replies",
            r#"{"ok":true,"messages":[{"user":"U1","ts":"100.000000","reply_count":1},{"user":"U2","ts":"101.000000"}]}"#,
        );

        let result = fetch(&api, "C1", "100.000000", "", 10).expect("fetch");
        assert_eq!(result.messages.len(), 2);
        assert_eq!(api.calls_to("conversations.history"), 0);
    }

    #[test]
    fn fetch_surfaces_not_ok_body() {
        let api = ScriptedApi::new()
            .respond(
                "conversations.replies",
                r#"{"ok":true,"messages":[{"user":"U1","ts":"100.000000"}]}"#,
            )
            .respond(
                "conversations.history",
                r#"{"ok":false,"error":"channel_not_found"}"#,
            );

        let err = fetch(&api, "C1", "100.000000", "", 10).expect_err("must fail");
        let message = format!("{err}");
        assert!(message.contains("conversations.history response not OK"));
        assert!(message.contains("channel_not_found"));
    }
}
