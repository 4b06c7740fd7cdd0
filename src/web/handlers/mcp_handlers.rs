// src/web/handlers/mcp_handlers.rs
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AuthenticatedTenant;
use crate::core::run_with_context;
use crate::tools::ToolResult;
use crate::web::types::*;
use crate::web::GatewayState;

pub type RawReply = Result<Json<EnvelopeReply<RawBody>>, Custom<Json<StandardErrorResponse>>>;

pub async fn mcp_handler(
    envelope: ToolEnvelope,
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> RawReply {
    let ToolEnvelope { id, method, params } = envelope;

    match method.as_deref() {
        Some(METHOD_LIST) => {
            let listing = ToolListing {
                tools: state.registry.list_tools(),
            };
            info!("Raw tool listing for tenant {}", auth.tenant_id);
            Ok(reply(id, RawBody::Listing(listing)))
        }
        Some(METHOD_CALL) => {
            let params = params.ok_or_else(|| {
                bad_request_reply(
                    "tools/call needs params.name".to_string(),
                    "MISSING_PARAMS",
                    vec!["Send {\"params\": {\"name\": ..., \"arguments\": {...}}}".to_string()],
                )
            })?;

            let result = run_with_context(auth.context(), async {
                state
                    .registry
                    .call_tool(&params.name, &params.arguments)
                    .await
                    .unwrap_or_else(|e| ToolResult::error(e.to_string()))
            })
            .await;

            Ok(reply(id, RawBody::Result(result.to_wire())))
        }
        Some(other) => {
            warn!("Unknown raw method '{}'", other);
            Err(bad_request_reply(
                format!("Unknown method '{}'", other),
                "UNKNOWN_METHOD",
                vec![format!("Use '{}' or '{}'", METHOD_LIST, METHOD_CALL)],
            ))
        }
        None => Err(bad_request_reply(
            "Missing 'method'".to_string(),
            "MISSING_METHOD",
            vec![format!("Use '{}' or '{}'", METHOD_LIST, METHOD_CALL)],
        )),
    }
}

pub async fn mcp_list_handler(
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> Json<ToolListing> {
    info!("Raw tool listing for tenant {}", auth.tenant_id);
    Json(ToolListing {
        tools: state.registry.list_tools(),
    })
}

fn reply(id: Option<Value>, body: RawBody) -> Json<EnvelopeReply<RawBody>> {
    Json(EnvelopeReply { id, body })
}

pub(crate) fn bad_request_reply(
    error: String,
    code: &str,
    suggestions: Vec<String>,
) -> Custom<Json<StandardErrorResponse>> {
    Custom(
        Status::BadRequest,
        Json(StandardErrorResponse::new(
            error,
            code.to_string(),
            suggestions,
            None,
        )),
    )
}
