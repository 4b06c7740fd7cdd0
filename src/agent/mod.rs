// src/agent/mod.rs
//! Approval-gated generation.
//!
//! A [`GenerationEngine`] produces assistant output and may pause on tools flagged for
//! approval, emitting [`ApprovalRequest`]s. [`ApprovalLoop`] collects one decision per
//! request from a [`DecisionSource`] and resumes the engine until nothing is pending.

pub mod approval_loop;
pub mod decision;
pub mod engine;

pub use approval_loop::{ApprovalLoop, LoopConfig, LoopError, LoopOutcome};
pub use decision::{
    AutoApprove, DecisionSource, HumanApprovals, PendingApproval, PolicyDecisionSource,
};
pub use engine::ResponsesEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One transcript entry. Transcripts are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: Vec<MessageContent>,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![MessageContent::Text { text: text.into() }],
        }
    }

    pub fn assistant(content: Vec<MessageContent>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// The single tool-role message answering one batch of approval requests.
    pub fn approval_responses(responses: Vec<ApprovalResponse>) -> Self {
        Self {
            role: Role::Tool,
            content: responses
                .into_iter()
                .map(MessageContent::ApprovalResponse)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    /// A tool the engine already ran through the gateway.
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ApprovalRequest(ApprovalRequest),
    ApprovalResponse(ApprovalResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub approval_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApprovalDecision {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            approved: true,
            reason: Some(reason.into()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub approval_id: String,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApprovalResponse {
    pub fn new(request: &ApprovalRequest, decision: ApprovalDecision) -> Self {
        Self {
            approval_id: request.approval_id.clone(),
            approved: decision.approved,
            reason: decision.reason,
        }
    }
}

/// Engine-native approval setting for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeApproval {
    Always,
    Never,
}

/// A tool as offered to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    /// Catalog marker: this tool needs approval.
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_approval: Option<NativeApproval>,
}

impl AgentTool {
    /// Give a marked tool the engine's approval flag unless it already carries one.
    pub fn normalized(mut self) -> Self {
        if self.requires_approval && self.native_approval.is_none() {
            self.native_approval = Some(NativeApproval::Always);
        }
        self
    }
}

impl From<ToolDefinition> for AgentTool {
    fn from(definition: ToolDefinition) -> Self {
        Self {
            name: definition.name,
            description: definition.description,
            input_schema: definition.input_schema,
            requires_approval: definition.approval_policy,
            native_approval: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub instructions: Option<String>,
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<AgentTool>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationResponse {
    pub response_id: Option<String>,
    /// Engine output, in production order.
    pub messages: Vec<ConversationMessage>,
}

impl GenerationResponse {
    pub fn approval_requests(&self) -> Vec<ApprovalRequest> {
        self.messages
            .iter()
            .flat_map(|message| message.content.iter())
            .filter_map(|part| match part {
                MessageContent::ApprovalRequest(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn output_text(&self) -> String {
        self.messages
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .flat_map(|message| message.content.iter())
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("generation engine returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("generation engine unreachable: {0}")]
    Transport(String),
    #[error("unexpected generation engine response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait GenerationEngine: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, EngineError>;
}
