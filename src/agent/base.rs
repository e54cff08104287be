//! Common agent interface implemented by every specialist agent and by the
//! orchestrator itself.

use super::message::AgentMessage;
use crate::error::Result;
use async_trait::async_trait;

/// Implemented by every specialist agent and by the orchestrator itself.
/// `process_message` is the synchronous entry point: for a `Task` message it
/// dispatches the work (spawning it if asynchronous) and returns an
/// immediate acknowledgment, a "handle then ack" pattern rather than
/// blocking the caller on completion.
#[async_trait]
pub trait BaseAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn process_message(&self, message: AgentMessage) -> Result<AgentMessage>;
}
