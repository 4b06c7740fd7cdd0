// src/web/types.rs
use rocket::serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::ConversationMessage;
use crate::tools::{Arguments, ToolDefinition, WireToolResult};

/// `{method, params: {name, arguments}}`, optionally with a JSON-RPC style `id`.
#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ToolEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<ToolParams>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

pub const METHOD_LIST: &str = "tools/list";
pub const METHOD_CALL: &str = "tools/call";

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ToolListing {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", untagged)]
pub enum RawBody {
    Listing(ToolListing),
    Result(WireToolResult),
}

/// Reply body with the caller's `id` echoed next to the payload fields.
#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct EnvelopeReply<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AgentRunRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AgentRunData {
    pub output_text: String,
    pub generation_calls: usize,
    pub transcript: Vec<ConversationMessage>,
}

// Request types with conversation_id support
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Data,
    Action,
    Error,
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            conversation_id,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolResult;
    use serde_json::json;

    #[test]
    fn test_envelope_accepts_missing_arguments() {
        let envelope: ToolEnvelope = serde_json::from_value(json!({
            "id": 3,
            "method": "tools/call",
            "params": {"name": "list_jobs"}
        }))
        .unwrap();
        let params = envelope.params.unwrap();
        assert_eq!(params.name, "list_jobs");
        assert!(params.arguments.is_empty());
        assert_eq!(envelope.id, Some(json!(3)));
    }

    #[test]
    fn test_reply_flattens_result() {
        let reply = EnvelopeReply {
            id: Some(json!("req-1")),
            body: ToolResult::error("boom").to_wire(),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["id"], json!("req-1"));
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["content"][0]["text"], json!("boom"));
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(StandardErrorResponse::new(
            "Unknown method".to_string(),
            "UNKNOWN_METHOD".to_string(),
            vec![],
            None,
        ))
        .unwrap();
        assert_eq!(value["type"], json!("error"));
        assert_eq!(value["success"], json!(false));
        assert!(value.get("conversation_id").is_none());
    }
}
