//! View projection

use crate::types::session::StreamSession;
use crate::types::view::ViewModel;

/// Project a session into the read-only view model
#[must_use]
pub fn project(session: &StreamSession) -> ViewModel {
    ViewModel {
        is_streaming: session.status.is_active(),
        status: session.status,
        thread_id: session.thread_id.clone(),
        current_agent: session.current_agent.clone(),
        messages: session.messages.clone(),
        agent_updates: session.agent_updates.clone(),
        visualizations: session.visualizations.clone(),
        error: session.error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::messages::AgentProgressEvent;
    use crate::types::session::SessionStatus;
    use chrono::Utc;

    #[test]
    fn is_streaming_follows_status() {
        let cases = [
            (SessionStatus::Idle, false),
            (SessionStatus::Connecting, true),
            (SessionStatus::Streaming, true),
            (SessionStatus::Completed, false),
            (SessionStatus::Errored, false),
            (SessionStatus::Cancelled, false),
        ];
        for (status, expected) in cases {
            let session = StreamSession {
                status,
                ..StreamSession::idle()
            };
            assert_eq!(project(&session).is_streaming, expected, "{status:?}");
        }
    }

    #[test]
    fn agent_join_helpers() {
        let mut session = StreamSession::connecting(None);
        for (name, response) in [
            ("Goal Planner", "Calculating..."),
            ("Tax Advisor", "Reviewing brackets"),
            ("Goal Planner", "Done"),
        ] {
            session.agent_updates.push(AgentProgressEvent {
                agent_id: name.to_string(),
                agent_name: name.to_string(),
                response: response.to_string(),
                timestamp: Utc::now(),
            });
        }

        let view = project(&session);
        assert!(view.has_agent_responded("Tax Advisor"));
        assert!(!view.has_agent_responded("Risk Analyst"));
        assert_eq!(
            view.latest_update_for("Goal Planner").map(|u| u.response.as_str()),
            Some("Done")
        );
    }

    #[test]
    fn serializes_in_camel_case() {
        let view = project(&StreamSession::connecting(None));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isStreaming"], serde_json::json!(true));
        assert_eq!(json["status"], serde_json::json!("connecting"));
        assert!(json.get("agentUpdates").is_some());
        assert!(json.get("currentAgent").is_some());
    }
}
