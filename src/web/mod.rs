// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::agent::{
    ApprovalDecision, ApprovalLoop, DecisionSource, HumanApprovals, LoopConfig, PendingApproval,
    ResponsesEngine,
};
use crate::auth::{AuthConfig, AuthFailure, AuthenticatedTenant, OptionalAuth};
use crate::cards::CardRenderer;
use crate::clients::ServiceClients;
use crate::core::AuthContext;
use crate::environment::{AgentSettings, GatewayConfig};
use crate::tools::{ToolRegistry, WireToolResult};
use anyhow::{Context, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{
    catchers, get, options, post, routes, Build, Request, Response, Rocket, Shutdown, State,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

const AGENT_INSTRUCTIONS: &str = "You are a recruiting assistant. Use the recruitment tools to \
answer questions about jobs, candidates, matches, interviews and reports. Ask before guessing \
identifiers.";

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/// Generation loop plus the human approvals it waits on.
pub struct AgentState {
    pub runner: ApprovalLoop,
    pub approvals: Arc<HumanApprovals>,
}

impl AgentState {
    pub fn from_settings(settings: &AgentSettings) -> Result<Self> {
        let engine = ResponsesEngine::new(settings)?;
        let approvals = Arc::new(HumanApprovals::new(Duration::from_secs(
            settings.decision_timeout_secs,
        )));
        let decisions: Arc<dyn DecisionSource> = approvals.clone();
        let runner = ApprovalLoop::new(
            Arc::new(engine),
            Some(decisions),
            LoopConfig {
                max_turns: settings.max_turns,
            },
        )
        .with_instructions(AGENT_INSTRUCTIONS);

        Ok(Self { runner, approvals })
    }
}

/// Everything the routes share. Read-only after start-up apart from pending approvals.
pub struct GatewayState {
    pub auth: AuthConfig,
    pub registry: ToolRegistry,
    pub cards: CardRenderer,
    /// Identity for chat-surface calls; `None` sends them without credentials.
    pub chat_identity: Option<AuthContext>,
    pub agent: Option<AgentState>,
}

impl GatewayState {
    /// Fails if the card formatter table does not match the catalog.
    pub fn new(
        auth: AuthConfig,
        registry: ToolRegistry,
        chat_identity: Option<AuthContext>,
    ) -> Result<Self> {
        let cards = CardRenderer::new(&registry.list_tools())
            .context("Card formatters do not match the tool catalog")?;
        Ok(Self {
            auth,
            registry,
            cards,
            chat_identity,
            agent: None,
        })
    }

    pub fn with_agent(mut self, agent: AgentState) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let auth = AuthConfig::from_settings(&config.auth)?;
        let clients = ServiceClients::from_config(&config.services)?;
        let registry = ToolRegistry::from_clients(clients).context("Invalid tool catalog")?;
        let chat_identity = config
            .chat
            .service_token()
            .map(|token| AuthContext::new(token, None));

        let state = Self::new(auth, registry, chat_identity)?;
        match &config.agent {
            Some(settings) => Ok(state.with_agent(AgentState::from_settings(settings)?)),
            None => Ok(state),
        }
    }
}

fn request_span(route: &'static str) -> tracing::Span {
    info_span!("request", request_id = %Uuid::new_v4(), route)
}

// Raw protocol surface

#[post("/mcp", data = "<envelope>")]
pub async fn mcp(
    envelope: Json<ToolEnvelope>,
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> RawReply {
    handlers::mcp_handler(envelope.into_inner(), auth, state)
        .instrument(request_span("mcp"))
        .await
}

#[get("/mcp/tools")]
pub async fn mcp_tools(
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> Json<ToolListing> {
    handlers::mcp_list_handler(auth, state)
        .instrument(request_span("mcp_tools"))
        .await
}

// Chat surface

#[post("/chat/tools/call", data = "<envelope>")]
pub async fn chat_call(
    envelope: Json<ToolEnvelope>,
    state: &State<GatewayState>,
) -> Result<Json<WireToolResult>, Custom<Json<StandardErrorResponse>>> {
    handlers::chat_call_handler(envelope.into_inner(), state)
        .instrument(request_span("chat_call"))
        .await
}

#[get("/chat/tools")]
pub async fn chat_tools(state: &State<GatewayState>) -> Json<ToolListing> {
    handlers::chat_list_handler(state)
        .instrument(request_span("chat_tools"))
        .await
}

// Agent

#[post("/agent/run", data = "<request>")]
pub async fn agent_run(
    request: Json<StandardRequest<AgentRunRequest>>,
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
    shutdown: Shutdown,
) -> Result<Json<DataResponse<AgentRunData>>, Custom<Json<StandardErrorResponse>>> {
    handlers::run_agent_handler(request.into_inner(), auth, state, shutdown)
        .instrument(request_span("agent_run"))
        .await
}

#[get("/agent/approvals")]
pub async fn agent_approvals(
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> Result<Json<DataResponse<Vec<PendingApproval>>>, Custom<Json<StandardErrorResponse>>> {
    handlers::list_approvals_handler(auth, state)
        .instrument(request_span("agent_approvals"))
        .await
}

#[post("/agent/approvals/<approval_id>", data = "<decision>")]
pub async fn agent_resolve_approval(
    approval_id: String,
    decision: Json<ApprovalDecision>,
    auth: AuthenticatedTenant,
    state: &State<GatewayState>,
) -> Result<Json<ActionResponse>, Custom<Json<StandardErrorResponse>>> {
    handlers::resolve_approval_handler(approval_id, decision.into_inner(), auth, state)
        .instrument(request_span("agent_resolve_approval"))
        .await
}

#[get("/health")]
pub async fn health(auth: OptionalAuth) -> Json<&'static str> {
    handlers::health_handler(auth).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(401)]
pub fn unauthorized(req: &Request) -> Json<StandardErrorResponse> {
    let failure = req.local_cache(AuthFailure::default);
    let (error, code) = match failure.0 {
        Some(error) => (error.message(), error.code()),
        None => ("Authorization token required", "UNAUTHORIZED"),
    };
    Json(StandardErrorResponse::new(
        error.to_string(),
        code.to_string(),
        vec![
            "Send 'Authorization: Bearer <token>' with a token issued for your tenant".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found(req: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {} {}", req.method(), req.uri()),
        "NOT_FOUND".to_string(),
        vec!["Tool calls go to POST /mcp or POST /chat/tools/call".to_string()],
        None,
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "UNPROCESSABLE".to_string(),
        vec![
            "Tool calls look like {\"method\": \"tools/call\", \"params\": {\"name\": ..., \"arguments\": {...}}}"
                .to_string(),
        ],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
        None,
    ))
}

/// The configured rocket instance, unlaunched.
pub fn build_rocket(state: GatewayState) -> Rocket<Build> {
    let catchers = catchers![bad_request, unauthorized, not_found, unprocessable, internal_error];

    rocket::build()
        .attach(Cors)
        .manage(state)
        .register("/", catchers.clone())
        .register("/api", catchers)
        .mount("/", routes![mcp, mcp_tools, chat_call, chat_tools, options])
        .mount(
            "/api",
            routes![agent_run, agent_approvals, agent_resolve_approval, health],
        )
}

// Main server start function
pub async fn start_web_server(config: GatewayConfig) -> Result<()> {
    let state = GatewayState::from_config(&config)?;

    info!("Starting recruitment tool gateway");
    info!(
        "Catalog: {} tools, agent {}",
        state.registry.list_tools().len(),
        if state.agent.is_some() { "enabled" } else { "disabled" }
    );
    info!(
        "Chat surface identity: {}",
        if state.chat_identity.is_some() { "service token" } else { "none" }
    );
    info!("Server: http://0.0.0.0:{}", config.port);

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", "0.0.0.0"));

    let _rocket = build_rocket(state)
        .configure(figment)
        .launch()
        .await
        .context("Rocket failed to launch")?;

    Ok(())
}
