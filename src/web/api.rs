//! JSON API handlers for the local chat host.
//!
//! Handlers are plain functions over [`WebState`] returning an [`ApiReply`];
//! the server loop in the parent module turns those into HTTP responses.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analytics::reporter;
use crate::chat::ChatMessage;
use crate::optimizer::{OptimizerClient, ScheduleOutcome};
use crate::utils::process;

use super::WebState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A handler result: status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: serde_json::Value,
}

#[derive(Deserialize)]
struct SendRequest {
    text: String,
}

#[derive(Deserialize)]
struct QuickReplyRequest {
    label: String,
}

#[derive(Serialize)]
struct MessagesResponse<'a> {
    messages: &'a [ChatMessage],
}

/// Result of a chat turn.
#[derive(Serialize)]
struct TurnResponse {
    message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<ScheduleOutcome>,
    simulated: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    platform: String,
    enabled: bool,
    optimizer_enabled: bool,
    optimizer_url: String,
    /// `None` when the optimizer is disabled and was not checked.
    optimizer_reachable: Option<bool>,
    history_path: Option<String>,
    history_exists: bool,
    message_count: usize,
    speech: crate::capability::SpeechCapability,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a 200 JSON reply.
fn json_reply<T: Serialize>(data: &T) -> Result<ApiReply> {
    let body = serde_json::to_value(data).context("failed to serialize JSON response")?;
    Ok(ApiReply { status: 200, body })
}

fn bad_request(message: impl Into<String>) -> ApiReply {
    ApiReply {
        status: 400,
        body: serde_json::json!({ "error": message.into() }),
    }
}

/// Parse the `?days=N` query parameter from a URL.
fn parse_days_param(url: &str) -> Option<u32> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == "days" { v.parse().ok() } else { None }
    })
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/messages`: the full chat log.
pub fn get_messages(state: &WebState) -> Result<ApiReply> {
    json_reply(&MessagesResponse {
        messages: state.assistant.messages(),
    })
}

/// `POST /api/messages` with `{"text": "..."}`.
pub fn post_message(state: &mut WebState, body: &str) -> Result<ApiReply> {
    let Ok(req) = serde_json::from_str::<SendRequest>(body) else {
        return Ok(bad_request("expected JSON body {\"text\": \"...\"}"));
    };

    match state.assistant.send(&req.text) {
        Some(turn) => json_reply(&TurnResponse {
            simulated: turn.outcome.as_ref().is_some_and(|o| o.is_simulated()),
            message: turn.bot,
            schedule: turn.outcome,
        }),
        None => Ok(bad_request("message text is empty")),
    }
}

/// `POST /api/quick-reply` with `{"label": "..."}`.
pub fn post_quick_reply(state: &mut WebState, body: &str) -> Result<ApiReply> {
    let Ok(req) = serde_json::from_str::<QuickReplyRequest>(body) else {
        return Ok(bad_request("expected JSON body {\"label\": \"...\"}"));
    };

    match state.assistant.quick_reply(&req.label) {
        Some(turn) => json_reply(&TurnResponse {
            simulated: turn.outcome.as_ref().is_some_and(|o| o.is_simulated()),
            message: turn.bot,
            schedule: turn.outcome,
        }),
        None => Ok(bad_request("quick reply label is empty")),
    }
}

/// `POST /api/clear`: reset to the welcome message.
pub fn post_clear(state: &mut WebState) -> Result<ApiReply> {
    state.assistant.clear();
    get_messages(state)
}

/// `GET /api/stats?days=N`: turn analytics from the event log.
pub fn get_stats(state: &WebState, url: &str) -> Result<ApiReply> {
    let entries = state
        .assistant
        .events()
        .read_since_days(parse_days_param(url));
    json_reply(&reporter::build_stats(&entries))
}

/// `GET /api/health`: configuration and collaborator status.
pub fn get_health(state: &WebState) -> Result<ApiReply> {
    let config = state.assistant.config();
    let optimizer_reachable = config
        .optimizer
        .enabled
        .then(|| OptimizerClient::from_config(&config.optimizer).is_healthy());

    let history = state.assistant.history_file();

    json_reply(&HealthResponse {
        platform: process::platform_name().to_string(),
        enabled: config.general.enabled,
        optimizer_enabled: config.optimizer.enabled,
        optimizer_url: config.optimizer.api_url.clone(),
        optimizer_reachable,
        history_path: history.map(|h| h.path().display().to_string()),
        history_exists: history.is_some_and(|h| h.exists()),
        message_count: state.assistant.messages().len(),
        speech: state.speech.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::analytics::EventLog;
    use crate::assistant::Assistant;
    use crate::capability::SpeechCapability;
    use crate::config::AuraConfig;

    fn state() -> WebState {
        let mut config = AuraConfig::default();
        config.optimizer.enabled = false;
        WebState {
            assistant: Assistant::with_parts(
                config,
                None,
                None,
                EventLog::disabled(),
                StdRng::seed_from_u64(9),
            ),
            speech: SpeechCapability::Unavailable {
                reason: "no speech_command configured".into(),
            },
        }
    }

    #[test]
    fn parse_days_param_extracts_value() {
        assert_eq!(parse_days_param("/api/stats?days=7"), Some(7));
        assert_eq!(parse_days_param("/api/stats?foo=bar&days=14"), Some(14));
        assert_eq!(parse_days_param("/api/stats"), None);
        assert_eq!(parse_days_param("/api/stats?days=abc"), None);
    }

    #[test]
    fn messages_start_with_welcome() {
        let state = state();
        let reply = get_messages(&state).unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(reply.body["messages"][0]["role"], "bot");
    }

    #[test]
    fn post_message_returns_schedule() {
        let mut state = state();
        let reply = post_message(&mut state, r#"{"text": "I need to do laundry"}"#).unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["simulated"], true);
        assert_eq!(reply.body["schedule"]["source"]["kind"], "simulated");
        assert_eq!(reply.body["message"]["role"], "bot");
        assert_eq!(state.assistant.messages().len(), 3);
    }

    #[test]
    fn post_message_rejects_bad_bodies() {
        let mut state = state();
        assert_eq!(post_message(&mut state, "not json").unwrap().status, 400);
        assert_eq!(
            post_message(&mut state, r#"{"text": "   "}"#).unwrap().status,
            400
        );
        assert_eq!(state.assistant.messages().len(), 1);
    }

    #[test]
    fn quick_reply_and_clear() {
        let mut state = state();
        let reply = post_quick_reply(&mut state, r#"{"label": "Help"}"#).unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.get("schedule").is_none());

        let cleared = post_clear(&mut state).unwrap();
        assert_eq!(cleared.body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn health_skips_api_check_when_disabled() {
        let state = state();
        let reply = get_health(&state).unwrap();
        assert_eq!(reply.body["optimizer_enabled"], false);
        assert!(reply.body["optimizer_reachable"].is_null());
        assert_eq!(reply.body["speech"]["status"], "unavailable");
    }
}
