//! Frame decoder for orchestrator stream events

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::event::{RawFrame, StreamEvent};
use crate::error::DecodeError;
use crate::types::identifiers::ThreadId;
use crate::types::messages::{
    AgentProgressEvent, Message, Role, VisualizationArtifact, VisualizationKind,
};

/// Sentinel some backends send in place of a `done` frame
const DONE_SENTINEL: &str = "[DONE]";

/// SSE default event name when the server sends no `event:` line
const SSE_DEFAULT_EVENT: &str = "message";

/// Event name of a fatal backend error
const ERROR_EVENT: &str = "error";

/// Shown when an `error` frame carries no message
const GENERIC_BACKEND_ERROR: &str = "The agent service reported an error";

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Text(String),
}

#[derive(Deserialize)]
struct ConnectedFrame {
    thread_id: ThreadId,
}

#[derive(Deserialize)]
struct MessageFrame {
    role: Role,
    content: String,
    #[serde(default)]
    timestamp: Option<WireTimestamp>,
}

#[derive(Deserialize)]
struct AgentProgressFrame {
    agent_id: String,
    agent_name: String,
    response: String,
    #[serde(default)]
    timestamp: Option<WireTimestamp>,
}

#[derive(Deserialize)]
struct VisualizationFrame {
    #[serde(rename = "type")]
    kind: VisualizationKind,
    title: String,
    data: Value,
    #[serde(default)]
    config: Map<String, Value>,
    #[serde(default)]
    timestamp: Option<WireTimestamp>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a raw frame into a typed event
///
/// Frames without a timestamp are stamped with the current time.
///
/// # Errors
/// Returns `DecodeError` if the frame is not JSON, has no recognizable
/// discriminant, or is missing required fields. Callers drop such frames.
pub fn decode(frame: &RawFrame) -> Result<StreamEvent, DecodeError> {
    decode_at(frame, Utc::now())
}

/// Decode a raw frame, using `received_at` for frames without a timestamp
///
/// Pure: performs no I/O and reads no clock.
///
/// # Errors
/// See [`decode`].
pub fn decode_at(frame: &RawFrame, received_at: DateTime<Utc>) -> Result<StreamEvent, DecodeError> {
    let data = frame.data.trim();
    if data == DONE_SENTINEL {
        return Ok(StreamEvent::StreamCompleted);
    }

    let body = if data.is_empty() {
        Value::Object(Map::new())
    } else {
        match serde_json::from_str::<Value>(data) {
            Ok(body) => body,
            // A fatal frame is never dropped, whatever its body looks like
            Err(_) if frame.event.as_deref() == Some(ERROR_EVENT) => {
                return Ok(StreamEvent::StreamError {
                    message: data.to_string(),
                });
            }
            Err(e) => return Err(DecodeError::InvalidJson(e)),
        }
    };

    let tag = discriminant(frame, &body)
        .ok_or(DecodeError::MissingDiscriminant)?
        .to_string();

    match tag.as_str() {
        "connected" => {
            let ConnectedFrame { thread_id } = fields("connected", body)?;
            Ok(StreamEvent::Connected { thread_id })
        }
        "message" => {
            let f: MessageFrame = fields("message", body)?;
            Ok(StreamEvent::MessageReceived(Message {
                role: f.role,
                content: f.content,
                timestamp: resolve_timestamp(f.timestamp, received_at)?,
            }))
        }
        "agent_progress" => {
            let f: AgentProgressFrame = fields("agent_progress", body)?;
            Ok(StreamEvent::AgentProgress(AgentProgressEvent {
                agent_id: f.agent_id,
                agent_name: f.agent_name,
                response: f.response,
                timestamp: resolve_timestamp(f.timestamp, received_at)?,
            }))
        }
        "visualization" => {
            let f: VisualizationFrame = fields("visualization", body)?;
            Ok(StreamEvent::VisualizationReady(VisualizationArtifact {
                kind: f.kind,
                title: f.title,
                data: f.data,
                config: f.config,
                timestamp: resolve_timestamp(f.timestamp, received_at)?,
            }))
        }
        ERROR_EVENT => Ok(StreamEvent::StreamError {
            message: error_message(&body),
        }),
        "done" => Ok(StreamEvent::StreamCompleted),
        _ => Err(DecodeError::UnknownType(tag)),
    }
}

/// Resolve the event discriminant
///
/// Precedence: a non-default SSE event name, then an in-band `event` field,
/// then an in-band `type` field, then the SSE default name itself.
fn discriminant<'a>(frame: &'a RawFrame, body: &'a Value) -> Option<&'a str> {
    let sse_name = frame.event.as_deref().filter(|name| !name.is_empty());
    if let Some(name) = sse_name
        && name != SSE_DEFAULT_EVENT
    {
        return Some(name);
    }

    ["event", "type"]
        .into_iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .or(sse_name)
}

/// Display text of an `error` frame
///
/// Only a non-empty string is taken; any other shape gets the generic text.
fn error_message(body: &Value) -> String {
    let text = match body {
        Value::String(text) => Some(text.as_str()),
        _ => body.get("message").and_then(Value::as_str),
    };
    text.map(str::trim)
        .filter(|text| !text.is_empty())
        .map_or_else(|| GENERIC_BACKEND_ERROR.to_string(), str::to_string)
}

fn fields<T: DeserializeOwned>(kind: &'static str, body: Value) -> Result<T, DecodeError> {
    serde_json::from_value(body).map_err(|source| DecodeError::Malformed { kind, source })
}

fn resolve_timestamp(
    raw: Option<WireTimestamp>,
    received_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, DecodeError> {
    match raw {
        None => Ok(received_at),
        Some(WireTimestamp::Millis(ms)) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| DecodeError::InvalidTimestamp(ms.to_string())),
        Some(WireTimestamp::Text(text)) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
                return Ok(parsed.with_timezone(&Utc));
            }
            // Python's isoformat() omits the offset; those are UTC
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| DecodeError::InvalidTimestamp(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    #[test]
    fn decodes_named_connected_frame() {
        let frame = RawFrame::named("connected", r#"{"thread_id":"t1"}"#);
        let event = decode_at(&frame, at()).unwrap();
        assert_eq!(
            event,
            StreamEvent::Connected {
                thread_id: ThreadId::new("t1")
            }
        );
    }

    #[test]
    fn decodes_in_band_type_discriminant() {
        let frame = RawFrame::from(json!({
            "type": "agent_progress",
            "agent_id": "goal_planner",
            "agent_name": "Goal Planner",
            "response": "Calculating...",
            "timestamp": "2024-05-01T12:00:00Z"
        }));
        match decode_at(&frame, at()).unwrap() {
            StreamEvent::AgentProgress(update) => {
                assert_eq!(update.agent_name, "Goal Planner");
                assert_eq!(update.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn sse_default_name_falls_back_to_message() {
        let frame = RawFrame::named("message", r#"{"role":"agent","content":"Based on your inputs..."}"#);
        match decode_at(&frame, at()).unwrap() {
            StreamEvent::MessageReceived(msg) => {
                assert_eq!(msg.role, Role::Agent);
                assert_eq!(msg.timestamp, at());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn sse_name_wins_over_in_band_type() {
        let frame = RawFrame::named(
            "visualization",
            json!({
                "type": "fan_chart",
                "title": "Retirement projection",
                "data": {"p50": [1, 2, 3]},
                "timestamp": 1_714_564_800_000_i64
            })
            .to_string(),
        );
        match decode_at(&frame, at()).unwrap() {
            StreamEvent::VisualizationReady(viz) => {
                assert_eq!(viz.kind, VisualizationKind::FanChart);
                assert!(viz.config.is_empty());
                assert_eq!(viz.data, json!({"p50": [1, 2, 3]}));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unknown_visualization_kind_passes_through() {
        let frame = RawFrame::from(json!({
            "event": "visualization",
            "type": "sankey",
            "title": "Cash flow",
            "data": [],
            "config": {"stacked": true}
        }));
        match decode_at(&frame, at()).unwrap() {
            StreamEvent::VisualizationReady(viz) => {
                assert_eq!(viz.kind, VisualizationKind::Other("sankey".into()));
                assert_eq!(viz.config.get("stacked"), Some(&json!(true)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn assistant_role_is_agent() {
        let frame = RawFrame::from(json!({"type": "message", "role": "assistant", "content": "hi"}));
        assert!(matches!(
            decode_at(&frame, at()),
            Ok(StreamEvent::MessageReceived(Message { role: Role::Agent, .. }))
        ));
    }

    #[test]
    fn naive_timestamp_is_utc() {
        let frame = RawFrame::from(json!({
            "type": "message",
            "role": "system",
            "content": "x",
            "timestamp": "2024-05-01T12:00:00.250000"
        }));
        match decode_at(&frame, at()).unwrap() {
            StreamEvent::MessageReceived(msg) => {
                assert_eq!(msg.timestamp.timestamp_millis(), 1_714_564_800_250);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn done_variants() {
        assert_eq!(
            decode_at(&RawFrame::named("done", ""), at()).unwrap(),
            StreamEvent::StreamCompleted
        );
        assert_eq!(
            decode_at(&RawFrame::data("[DONE]"), at()).unwrap(),
            StreamEvent::StreamCompleted
        );
        assert_eq!(
            decode_at(&RawFrame::from(json!({"type": "done"})), at()).unwrap(),
            StreamEvent::StreamCompleted
        );
    }

    #[test]
    fn error_frame_without_message_gets_generic_text() {
        let event = decode_at(&RawFrame::named("error", "{}"), at()).unwrap();
        assert_eq!(
            event,
            StreamEvent::StreamError {
                message: GENERIC_BACKEND_ERROR.to_string()
            }
        );
    }

    #[test]
    fn error_frame_with_structured_message_is_still_fatal() {
        for body in [r#"{"message":{"detail":"x"}}"#, r#"{"message":42}"#, "[1,2]"] {
            let event = decode_at(&RawFrame::named("error", body), at()).unwrap();
            assert_eq!(
                event,
                StreamEvent::StreamError {
                    message: GENERIC_BACKEND_ERROR.to_string()
                },
                "body: {body}"
            );
        }
    }

    #[test]
    fn error_frame_with_plain_text_body() {
        let event = decode_at(&RawFrame::named("error", "  simulation timeout \n"), at()).unwrap();
        assert_eq!(
            event,
            StreamEvent::StreamError {
                message: "simulation timeout".to_string()
            }
        );

        let event = decode_at(&RawFrame::named("error", r#""simulation timeout""#), at()).unwrap();
        assert_eq!(
            event,
            StreamEvent::StreamError {
                message: "simulation timeout".to_string()
            }
        );
    }

    #[test]
    fn in_band_error_message_is_trimmed() {
        let frame = RawFrame::from(json!({"type": "error", "message": " quota exceeded "}));
        assert_eq!(
            decode_at(&frame, at()).unwrap(),
            StreamEvent::StreamError {
                message: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = decode_at(&RawFrame::named("heartbeat", "{}"), at());
        assert!(matches!(result, Err(DecodeError::UnknownType(tag)) if tag == "heartbeat"));
    }

    #[test]
    fn missing_field_is_malformed() {
        let frame = RawFrame::from(json!({"type": "agent_progress", "agent_name": "Tax Advisor"}));
        assert!(matches!(
            decode_at(&frame, at()),
            Err(DecodeError::Malformed {
                kind: "agent_progress",
                ..
            })
        ));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            decode_at(&RawFrame::named("message", "{not json"), at()),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn missing_discriminant_is_rejected() {
        assert!(matches!(
            decode_at(&RawFrame::data(r#"{"content":"orphan"}"#), at()),
            Err(DecodeError::MissingDiscriminant)
        ));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let frame = RawFrame::from(json!({
            "type": "message",
            "role": "user",
            "content": "x",
            "timestamp": "yesterday"
        }));
        assert!(matches!(
            decode_at(&frame, at()),
            Err(DecodeError::InvalidTimestamp(text)) if text == "yesterday"
        ));
    }
}
