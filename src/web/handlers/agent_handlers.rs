// src/web/handlers/agent_handlers.rs
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Shutdown, State};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::agent::{AgentTool, ApprovalDecision, ConversationMessage, LoopError, PendingApproval};
use crate::auth::AuthenticatedTenant;
use crate::core::run_with_context;
use crate::web::types::*;
use crate::web::{AgentState, GatewayState};

type ErrorReply = Custom<Json<StandardErrorResponse>>;

fn error_reply(
    status: Status,
    error: String,
    code: &str,
    suggestions: Vec<String>,
    conversation_id: Option<String>,
) -> ErrorReply {
    Custom(
        status,
        Json(StandardErrorResponse::new(
            error,
            code.to_string(),
            suggestions,
            conversation_id,
        )),
    )
}

fn agent_state<'a>(
    state: &'a GatewayState,
    conversation_id: Option<String>,
) -> Result<&'a AgentState, ErrorReply> {
    state.agent.as_ref().ok_or_else(|| {
        error_reply(
            Status::ServiceUnavailable,
            "The agent is not configured on this gateway".to_string(),
            "AGENT_DISABLED",
            vec!["Add an 'agent' section to config.yaml".to_string()],
            conversation_id,
        )
    })
}

pub async fn run_agent_handler(
    request: StandardRequest<AgentRunRequest>,
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
    shutdown: Shutdown,
) -> Result<Json<DataResponse<AgentRunData>>, ErrorReply> {
    let conversation_id = request.conversation_id;
    let agent = agent_state(state, conversation_id.clone())?;

    let mut messages = request.data.history;
    messages.push(ConversationMessage::user(request.data.message));
    let tools: Vec<AgentTool> = state
        .registry
        .list_tools()
        .into_iter()
        .map(AgentTool::from)
        .collect();

    info!(
        "Agent run for tenant {} ({} messages, {} tools)",
        auth.tenant_id,
        messages.len(),
        tools.len()
    );

    let cancel = CancellationToken::new();
    let run = run_with_context(auth.context(), agent.runner.run(messages, tools, &cancel));
    let outcome = tokio::select! {
        outcome = run => outcome,
        _ = shutdown => {
            cancel.cancel();
            Err(LoopError::Cancelled)
        }
    };

    match outcome {
        Ok(outcome) => Ok(Json(DataResponse::success(
            format!("Completed after {} generation calls", outcome.generation_calls),
            AgentRunData {
                output_text: outcome.response.output_text(),
                generation_calls: outcome.generation_calls,
                transcript: outcome.transcript,
            },
            conversation_id,
        ))),
        Err(e) => {
            let (status, code) = match &e {
                LoopError::TurnLimit { .. } | LoopError::Stalled { .. } => {
                    (Status::Conflict, "APPROVAL_STALLED")
                }
                LoopError::Cancelled => (Status::ServiceUnavailable, "RUN_CANCELLED"),
                LoopError::Engine(_) => (Status::BadGateway, "ENGINE_ERROR"),
            };
            error!("Agent run failed for tenant {}: {}", auth.tenant_id, e);
            Err(error_reply(
                status,
                e.to_string(),
                code,
                vec!["Retry the request or rephrase it".to_string()],
                conversation_id,
            ))
        }
    }
}

pub async fn list_approvals_handler(
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> Result<Json<DataResponse<Vec<PendingApproval>>>, ErrorReply> {
    let agent = agent_state(state, None)?;
    let pending = agent.approvals.pending_for(Some(&auth.tenant_id)).await;
    Ok(Json(DataResponse::success(
        format!("{} approvals pending", pending.len()),
        pending,
        None,
    )))
}

pub async fn resolve_approval_handler(
    approval_id: String,
    decision: ApprovalDecision,
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> Result<Json<ActionResponse>, ErrorReply> {
    let agent = agent_state(state, None)?;
    let approved = decision.approved;

    match agent
        .approvals
        .resolve(&approval_id, Some(&auth.tenant_id), decision)
        .await
    {
        Ok(()) => Ok(Json(ActionResponse::success(
            format!(
                "Approval {} {}",
                approval_id,
                if approved { "granted" } else { "denied" }
            ),
            if approved { "approved" } else { "denied" }.to_string(),
            None,
        ))),
        Err(e) => {
            warn!("Could not resolve approval {}: {}", approval_id, e);
            Err(error_reply(
                Status::NotFound,
                e.to_string(),
                "APPROVAL_NOT_FOUND",
                vec!["List pending approvals with GET /api/agent/approvals".to_string()],
                None,
            ))
        }
    }
}
