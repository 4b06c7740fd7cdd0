// src/web/handlers/chat_handlers.rs
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{debug, info};

use super::mcp_handlers::bad_request_reply;
use crate::core::auth_context::run_with_optional_context;
use crate::tools::{ToolResult, WireContent, WireToolResult};
use crate::web::types::*;
use crate::web::GatewayState;

/// Chat clients have no tenant token; calls run as the configured service identity.
pub async fn chat_call_handler(
    envelope: ToolEnvelope,
    state: &State<GatewayState>,
) -> Result<Json<WireToolResult>, Custom<Json<StandardErrorResponse>>> {
    if let Some(method) = envelope.method.as_deref() {
        if method != METHOD_CALL {
            return Err(bad_request_reply(
                format!("Unknown method '{}'", method),
                "UNKNOWN_METHOD",
                vec![format!("The chat surface only accepts '{}'", METHOD_CALL)],
            ));
        }
    }

    let params = envelope.params.ok_or_else(|| {
        bad_request_reply(
            "Missing params.name".to_string(),
            "MISSING_PARAMS",
            vec!["Send {\"params\": {\"name\": ..., \"arguments\": {...}}}".to_string()],
        )
    })?;

    info!(
        "Chat tool call '{}' (service identity: {})",
        params.name,
        state.chat_identity.is_some()
    );

    let result = run_with_optional_context(state.chat_identity.clone(), async {
        state
            .registry
            .call_tool(&params.name, &params.arguments)
            .await
            .unwrap_or_else(|e| ToolResult::error(e.to_string()))
    })
    .await;

    let rendered = state.cards.render_result(&params.name, &result);
    debug!("Chat result for '{}' rendered as card: {}", params.name, rendered.is_card());

    Ok(Json(WireToolResult {
        content: vec![WireContent::text(rendered.payload())],
        is_error: result.is_error,
    }))
}

pub async fn chat_list_handler(state: &State<GatewayState>) -> Json<ToolListing> {
    Json(ToolListing {
        tools: state.registry.list_tools(),
    })
}
