//! Wire message format for the agent fabric: a small envelope carrying a
//! message type, JSON payload, and correlation id, used to route task
//! requests and responses between the orchestrator and its specialists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Message kinds exchanged between agents. `Task` carries work in; the
/// remaining variants are an agent's possible replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Task,
    TaskResponse,
    TaskComplete,
    TaskError,
    AgentStatus,
    StreamChunk,
    StreamEnd,
}

/// A message passed between agents or from the orchestrator to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub message_type: MessageType,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<String>,
}

impl AgentMessage {
    pub fn task(source: impl Into<String>, destination: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            destination: destination.into(),
            message_type: MessageType::Task,
            payload,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Build the synchronous acknowledgment returned in-line from
    /// `process_message`, mirroring `Message.create_response` in the Python
    /// reference.
    pub fn create_response(&self, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: self.destination.clone(),
            destination: self.source.clone(),
            message_type: MessageType::TaskResponse,
            payload,
            timestamp: Utc::now(),
            correlation_id: Some(self.id.clone()),
        }
    }

    pub fn task_complete(&self, result: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: self.destination.clone(),
            destination: self.source.clone(),
            message_type: MessageType::TaskComplete,
            payload: result,
            timestamp: Utc::now(),
            correlation_id: Some(self.id.clone()),
        }
    }

    pub fn task_error(&self, error: impl std::fmt::Display) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: self.destination.clone(),
            destination: self.source.clone(),
            message_type: MessageType::TaskError,
            payload: serde_json::json!({ "error": error.to_string() }),
            timestamp: Utc::now(),
            correlation_id: Some(self.id.clone()),
        }
    }

    pub fn agent_status(source: impl Into<String>, status: impl std::fmt::Display) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            destination: "*".into(),
            message_type: MessageType::AgentStatus,
            payload: serde_json::json!({ "status": status.to_string() }),
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    pub fn task_id(&self) -> Option<String> {
        self.payload.get("task_id").and_then(|v| v.as_str()).map(String::from)
    }

    pub fn task_name(&self) -> Option<String> {
        self.payload.get("task").and_then(|v| v.as_str()).map(String::from)
    }

    pub fn params(&self) -> Value {
        self.payload.get("params").cloned().unwrap_or_else(|| serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_response_swaps_source_and_destination() {
        let task = AgentMessage::task("orchestrator", "processing", serde_json::json!({"task_id": "t1"}));
        let response = task.create_response(serde_json::json!({"status": "processing"}));
        assert_eq!(response.source, "processing");
        assert_eq!(response.destination, "orchestrator");
        assert_eq!(response.correlation_id.as_deref(), Some(task.id.as_str()));
    }

    #[test]
    fn task_id_and_name_are_extracted_from_payload() {
        let task = AgentMessage::task(
            "orchestrator",
            "processing",
            serde_json::json!({"task_id": "t1", "task": "process_document"}),
        );
        assert_eq!(task.task_id().as_deref(), Some("t1"));
        assert_eq!(task.task_name().as_deref(), Some("process_document"));
    }
}
