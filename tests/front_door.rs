use recruit_gateway::auth::AuthConfig;
use recruit_gateway::build_rocket;
use recruit_gateway::clients::ServiceClients;
use recruit_gateway::core::AuthContext;
use recruit_gateway::environment::AgentSettings;
use recruit_gateway::tools::ToolRegistry;
use recruit_gateway::web::{AgentState, GatewayState};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "front-door-secret";
const CHAT_TOKEN: &str = "chat-service-token";

fn tenant_token(tenant: &str) -> String {
    AuthConfig::new(SECRET, None)
        .issue_token("recruiter-1", tenant, 1)
        .unwrap()
}

fn gateway_state(services: &MockServer) -> GatewayState {
    let registry =
        ToolRegistry::from_clients(ServiceClients::single_host(&services.uri()).unwrap()).unwrap();
    GatewayState::new(
        AuthConfig::new(SECRET, None),
        registry,
        Some(AuthContext::new(CHAT_TOKEN, None)),
    )
    .unwrap()
}

async fn client_for(state: GatewayState) -> Client {
    Client::tracked(build_rocket(state)).await.unwrap()
}

async fn body_json(response: LocalResponse<'_>) -> Value {
    let body = response.into_string().await.unwrap_or_default();
    serde_json::from_str(&body).unwrap()
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

#[tokio::test]
async fn test_raw_surface_requires_token() {
    let services = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&services)
        .await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/mcp")
        .header(ContentType::JSON)
        .body(json!({"method": "tools/call", "params": {"name": "list_jobs"}}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "MISSING_TOKEN");
    assert_eq!(body["success"], false);

    let response = client
        .post("/mcp")
        .header(ContentType::JSON)
        .header(bearer("not-a-jwt"))
        .body(json!({"method": "tools/list"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(
        body_json(response).await["error_code"],
        "TOKEN_VERIFICATION_FAILED"
    );
}

#[tokio::test]
async fn test_raw_call_forwards_tenant_token() {
    let services = MockServer::start().await;
    let token = tenant_token("acme");
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [{"id": "j-1", "title": "Backend Engineer"}]
        })))
        .expect(1)
        .mount(&services)
        .await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/mcp")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(
            json!({
                "id": 7,
                "method": "tools/call",
                "params": {"name": "list_jobs", "arguments": {}}
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = body_json(response).await;
    assert_eq!(body["id"], 7);
    assert!(body.get("isError").is_none());
    let text = body["content"][0]["text"].as_str().unwrap();
    assert_eq!(body["content"][0]["type"], "text");
    assert!(text.contains("Backend Engineer"));
}

#[tokio::test]
async fn test_unknown_tool_is_error_content() {
    let services = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&services)
        .await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/mcp")
        .header(ContentType::JSON)
        .header(bearer(&tenant_token("acme")))
        .body(json!({"method": "tools/call", "params": {"name": "hire_everyone"}}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = body_json(response).await;
    assert_eq!(body["isError"], true);
    assert!(body["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("hire_everyone"));
}

#[tokio::test]
async fn test_unknown_method_is_bad_request() {
    let services = MockServer::start().await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/mcp")
        .header(ContentType::JSON)
        .header(bearer(&tenant_token("acme")))
        .body(json!({"method": "resources/list"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(body_json(response).await["error_code"], "UNKNOWN_METHOD");

    let response = client
        .post("/chat/tools/call")
        .header(ContentType::JSON)
        .body(json!({"method": "tools/list"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn test_both_surfaces_list_the_same_catalog() {
    let services = MockServer::start().await;
    let client = client_for(gateway_state(&services)).await;
    let token = tenant_token("acme");

    let raw = client
        .get("/mcp/tools")
        .header(bearer(&token))
        .dispatch()
        .await;
    let raw = body_json(raw).await;

    let via_method = client
        .post("/mcp")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(json!({"method": "tools/list"}).to_string())
        .dispatch()
        .await;
    let via_method = body_json(via_method).await;

    let chat = client.get("/chat/tools").dispatch().await;
    let chat = body_json(chat).await;

    assert_eq!(raw["tools"].as_array().unwrap().len(), 18);
    assert_eq!(raw["tools"], chat["tools"]);
    assert_eq!(raw["tools"], via_method["tools"]);
}

#[tokio::test]
async fn test_chat_call_renders_card_with_service_identity() {
    let services = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j-1"))
        .and(header("authorization", format!("Bearer {}", CHAT_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "j-1",
            "title": "Backend Engineer",
            "location": "Lausanne",
            "status": "open"
        })))
        .expect(1)
        .mount(&services)
        .await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/chat/tools/call")
        .header(ContentType::JSON)
        .body(json!({"params": {"name": "get_job", "arguments": {"job_id": "j-1"}}}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = body_json(response).await;
    assert_eq!(body["content"].as_array().unwrap().len(), 1);
    let card: Value = serde_json::from_str(body["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(card["type"], "card");
    assert_eq!(card["title"], "Backend Engineer");
}

#[tokio::test]
async fn test_chat_call_downstream_failure_is_raw_text() {
    let services = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/candidates/c-9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such candidate"))
        .mount(&services)
        .await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/chat/tools/call")
        .header(ContentType::JSON)
        .body(
            json!({
                "method": "tools/call",
                "params": {"name": "delete_candidate", "arguments": {"candidate_id": "c-9"}}
            })
            .to_string(),
        )
        .dispatch()
        .await;
    let body = body_json(response).await;
    assert_eq!(body["isError"], true);
    assert!(body["content"][0]["text"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_health_and_catchers() {
    let services = MockServer::start().await;
    let client = client_for(gateway_state(&services)).await;

    let response = client.get("/api/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(body_json(response).await, json!("OK"));

    let response = client.get("/nowhere").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(body_json(response).await["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_agent_disabled_without_settings() {
    let services = MockServer::start().await;
    let client = client_for(gateway_state(&services)).await;

    let response = client
        .post("/api/agent/run")
        .header(ContentType::JSON)
        .header(bearer(&tenant_token("acme")))
        .body(json!({"message": "list open jobs"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::ServiceUnavailable);
    assert_eq!(body_json(response).await["error_code"], "AGENT_DISABLED");
}

fn agent_settings(engine: &MockServer) -> AgentSettings {
    AgentSettings {
        engine_url: format!("{}/v1", engine.uri()),
        api_key_env: "FRONT_DOOR_TEST_KEY_UNSET".to_string(),
        model: "test-model".to_string(),
        tool_server_url: "http://gateway.test/mcp".to_string(),
        tool_server_label: "recruit".to_string(),
        max_turns: Some(4),
        decision_timeout_secs: 5,
        engine_timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_agent_run_waits_for_human_approval() {
    let services = MockServer::start().await;
    let engine = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "output": [{
                "type": "mcp_approval_request",
                "id": "mcpr_1",
                "name": "delete_job",
                "arguments": "{\"job_id\": \"j-4\"}",
                "server_label": "recruit"
            }]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&engine)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_2",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "Job j-4 deleted."}]
            }]
        })))
        .expect(1)
        .mount(&engine)
        .await;

    let state = gateway_state(&services)
        .with_agent(AgentState::from_settings(&agent_settings(&engine)).unwrap());
    let client = client_for(state).await;
    let token = tenant_token("acme");
    let other_tenant = tenant_token("globex");

    let run = async {
        let response = client
            .post("/api/agent/run")
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(json!({"message": "delete job j-4", "conversation_id": "conv-1"}).to_string())
            .dispatch()
            .await;
        (response.status(), body_json(response).await)
    };

    let approve = async {
        for _ in 0..100 {
            let listing = client
                .get("/api/agent/approvals")
                .header(bearer(&token))
                .dispatch()
                .await;
            let listing = body_json(listing).await;
            if let Some(pending) = listing["data"].as_array().and_then(|items| items.first()) {
                assert_eq!(pending["approvalId"], "mcpr_1");
                assert_eq!(pending["toolName"], "delete_job");

                let foreign = client
                    .post("/api/agent/approvals/mcpr_1")
                    .header(ContentType::JSON)
                    .header(bearer(&other_tenant))
                    .body(json!({"approved": false}).to_string())
                    .dispatch()
                    .await;
                assert_eq!(foreign.status(), Status::NotFound);

                let response = client
                    .post("/api/agent/approvals/mcpr_1")
                    .header(ContentType::JSON)
                    .header(bearer(&token))
                    .body(json!({"approved": true, "reason": "confirmed"}).to_string())
                    .dispatch()
                    .await;
                return response.status();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Status::RequestTimeout
    };

    let ((status, body), approval_status) = tokio::join!(run, approve);
    assert_eq!(approval_status, Status::Ok);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["conversation_id"], "conv-1");
    assert_eq!(body["data"]["output_text"], "Job j-4 deleted.");
    assert_eq!(body["data"]["generation_calls"], 2);

    let transcript = body["data"]["transcript"].as_array().unwrap();
    let tool_messages: Vec<&Value> = transcript
        .iter()
        .filter(|message| message["role"] == "tool")
        .collect();
    assert_eq!(tool_messages.len(), 1);
    assert_eq!(tool_messages[0]["content"][0]["type"], "approval_response");
}
