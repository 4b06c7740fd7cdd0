// src/agent/engine.rs
//! Generation engine speaking a Responses-style HTTP API.
//!
//! The gateway's own raw tool surface is registered with the engine as a remote tool
//! server. The engine calls tools there directly, except for those flagged for approval,
//! which come back as `mcp_approval_request` items for the loop to decide.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{
    AgentTool, ApprovalRequest, ConversationMessage, EngineError, GenerationEngine,
    GenerationRequest, GenerationResponse, MessageContent, NativeApproval, Role,
};
use crate::core::auth_context::current_context;
use crate::environment::AgentSettings;
use crate::utils::{display_value, join_url, truncate_for_log};

pub struct ResponsesEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    tool_server_url: String,
    tool_server_label: String,
}

impl ResponsesEngine {
    pub fn new(settings: &AgentSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.engine_timeout_secs))
            .build()
            .context("Failed to create HTTP client for the generation engine")?;

        Ok(Self {
            client,
            endpoint: join_url(&settings.engine_url, "responses"),
            api_key: settings.api_key(),
            model: settings.model.clone(),
            tool_server_url: settings.tool_server_url.clone(),
            tool_server_label: settings.tool_server_label.clone(),
        })
    }

    fn tool_server(&self, tools: &[AgentTool]) -> Value {
        let (gated, open): (Vec<&AgentTool>, Vec<&AgentTool>) = tools
            .iter()
            .partition(|tool| tool.native_approval == Some(NativeApproval::Always));
        let names = |tools: &[&AgentTool]| -> Vec<String> {
            tools.iter().map(|tool| tool.name.clone()).collect()
        };

        let mut server = json!({
            "type": "mcp",
            "server_label": self.tool_server_label,
            "server_url": self.tool_server_url,
            "allowed_tools": tools.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>(),
            "require_approval": {
                "always": { "tool_names": names(&gated) },
                "never": { "tool_names": names(&open) },
            },
        });
        // The engine calls back into the gateway as the caller who started the run.
        if let Some(context) = current_context() {
            server["headers"] = json!({ "Authorization": context.bearer() });
        }
        server
    }

    fn input_items(&self, messages: &[ConversationMessage]) -> Vec<Value> {
        let mut items = Vec::new();
        for message in messages {
            let role = match message.role {
                Role::Assistant => "assistant",
                Role::User | Role::Tool => "user",
            };
            for part in &message.content {
                let item = match part {
                    MessageContent::Text { text } => json!({ "role": role, "content": text }),
                    MessageContent::ToolCall {
                        id,
                        name,
                        arguments,
                        output,
                        error,
                    } => {
                        let mut call = json!({
                            "type": "mcp_call",
                            "id": id,
                            "name": name,
                            "arguments": arguments.to_string(),
                            "server_label": self.tool_server_label,
                        });
                        if let Some(output) = output {
                            call["output"] = json!(output);
                        }
                        if let Some(error) = error {
                            call["error"] = json!(error);
                        }
                        call
                    }
                    MessageContent::ApprovalRequest(request) => json!({
                        "type": "mcp_approval_request",
                        "id": request.approval_id,
                        "name": request.tool_name,
                        "arguments": request.tool_input.to_string(),
                        "server_label": self.tool_server_label,
                    }),
                    MessageContent::ApprovalResponse(response) => {
                        let mut item = json!({
                            "type": "mcp_approval_response",
                            "approval_request_id": response.approval_id,
                            "approve": response.approved,
                        });
                        if let Some(reason) = &response.reason {
                            item["reason"] = json!(reason);
                        }
                        item
                    }
                };
                items.push(item);
            }
        }
        items
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    McpApprovalRequest {
        id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    McpCall {
        id: String,
        name: String,
        #[serde(default)]
        arguments: String,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        error: Option<Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

/// Tool arguments travel as a JSON string; keep them as text if they do not parse.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl From<ResponsesReply> for GenerationResponse {
    fn from(reply: ResponsesReply) -> Self {
        let mut content = Vec::new();
        for item in reply.output {
            match item {
                OutputItem::Message { content: parts } => {
                    for part in parts {
                        match part {
                            OutputContent::OutputText { text } => {
                                content.push(MessageContent::Text { text })
                            }
                            OutputContent::Refusal { refusal } => {
                                content.push(MessageContent::Text { text: refusal })
                            }
                            OutputContent::Other => {}
                        }
                    }
                }
                OutputItem::McpApprovalRequest {
                    id,
                    name,
                    arguments,
                } => content.push(MessageContent::ApprovalRequest(ApprovalRequest {
                    approval_id: id,
                    tool_name: name,
                    tool_input: parse_arguments(&arguments),
                })),
                OutputItem::McpCall {
                    id,
                    name,
                    arguments,
                    output,
                    error,
                } => content.push(MessageContent::ToolCall {
                    id,
                    name,
                    arguments: parse_arguments(&arguments),
                    output,
                    error: error.as_ref().map(display_value),
                }),
                OutputItem::Other => {}
            }
        }

        let messages = if content.is_empty() {
            Vec::new()
        } else {
            vec![ConversationMessage::assistant(content)]
        };
        GenerationResponse {
            response_id: reply.id,
            messages,
        }
    }
}

#[async_trait]
impl GenerationEngine for ResponsesEngine {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, EngineError> {
        let mut body = json!({
            "model": self.model,
            "input": self.input_items(&request.messages),
            "tools": [self.tool_server(&request.tools)],
        });
        if let Some(instructions) = &request.instructions {
            body["instructions"] = json!(instructions);
        }

        info!(
            "Sending {} messages to generation engine ({} tools)",
            request.messages.len(),
            request.tools.len()
        );

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            http = http.bearer_auth(api_key);
        }

        let response = http
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!(
                "Generation engine error {}: {}",
                status,
                truncate_for_log(&text, 300)
            );
            return Err(EngineError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply: ResponsesReply =
            serde_json::from_str(&text).map_err(|e| EngineError::Decode(e.to_string()))?;
        debug!("Engine response {:?} with {} output items", reply.id, reply.output.len());
        Ok(reply.into())
    }
}
