// src/tools/mod.rs
//! Tool catalog and dispatch.
//!
//! A tool is a named, schema-described operation backed by one downstream service call.
//! Tools are grouped by domain; each [`ToolGroup`] owns its definitions and decides
//! whether a requested name belongs to it. [`ToolRegistry`] asks the groups in a fixed
//! order and returns the first answer.
//!
//! Results carry structured JSON. The raw protocol surface serializes them to text with
//! [`ToolResult::to_wire`]; the chat surface hands the structured payload to the card
//! renderer without a text round-trip.

pub mod args;
pub mod candidates;
pub mod jobs;
pub mod matching;
pub mod meetings;
pub mod registry;
pub mod reports;

pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::core::ServiceError;
use crate::utils::pretty_json;

/// Arguments of one tool call, by name.
pub type Arguments = Map<String, Value>;

/// Catalog entry advertised to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    /// Executing this tool needs a human sign-off when driven by an agent.
    #[serde(default)]
    pub approval_policy: bool,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            approval_policy: false,
        }
    }

    pub fn requires_approval(mut self) -> Self {
        self.approval_policy = true;
        self
    }
}

/// Build a JSON-schema object from `(name, type, description)` triples.
pub fn object_schema(properties: &[(&str, &str, &str)], required: &[&str]) -> Value {
    let mut props = Map::new();
    for (name, kind, description) in properties {
        let property = match *kind {
            "string[]" => json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description,
            }),
            "id" => json!({
                "type": ["string", "integer"],
                "description": description,
            }),
            other => json!({ "type": other, "description": description }),
        };
        props.insert(name.to_string(), property);
    }
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

/// One piece of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Json { data: Value },
}

/// Outcome of one tool call. `is_error` means the tool ran and reported a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentPart>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn structured(data: Value) -> Self {
        Self {
            content: vec![ContentPart::Json { data }],
            is_error: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Convert a downstream response into a result. Empty bodies read as success.
    pub fn from_service(outcome: Result<Value, ServiceError>) -> Self {
        match outcome {
            Ok(Value::Null) => Self::structured(json!({ "success": true })),
            Ok(data) => Self::structured(data),
            Err(err @ ServiceError::Domain { .. }) => Self::error(format!("Error: {}", err)),
            Err(err @ ServiceError::Transport { .. }) => {
                Self::error(format!("Transport error: {}", err))
            }
        }
    }

    /// First structured part, if any.
    pub fn structured_data(&self) -> Option<&Value> {
        self.content.iter().find_map(|part| match part {
            ContentPart::Json { data } => Some(data),
            ContentPart::Text { .. } => None,
        })
    }

    /// All content flattened to text, structured parts pretty-printed.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text.clone(),
                ContentPart::Json { data } => pretty_json(data),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Machine-readable form for the raw protocol surface.
    pub fn to_wire(&self) -> WireToolResult {
        WireToolResult {
            content: self
                .content
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => WireContent::text(text.clone()),
                    ContentPart::Json { data } => WireContent::text(pretty_json(data)),
                })
                .collect(),
            is_error: self.is_error,
        }
    }
}

/// `{content: [{type: "text", text}], isError?}` as sent over the raw surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireToolResult {
    pub content: Vec<WireContent>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl WireContent {
    pub fn text(text: String) -> Self {
        Self {
            content_type: "text".to_string(),
            text,
        }
    }
}

/// Faults that end a dispatch instead of producing a [`ToolResult`].
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },
    #[error("Tool '{name}' is defined by both '{first}' and '{second}' groups")]
    DuplicateTool {
        name: String,
        first: &'static str,
        second: &'static str,
    },
}

/// A domain's set of tools.
#[async_trait]
pub trait ToolGroup: Send + Sync {
    /// Group name, used in logs and catalog diagnostics.
    fn name(&self) -> &'static str;

    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run `tool` if it belongs to this group, `None` otherwise.
    async fn call(&self, tool: &str, arguments: &Arguments) -> Option<ToolResult>;
}
