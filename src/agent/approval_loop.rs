// src/agent/approval_loop.rs
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::decision::{AutoApprove, DecisionSource};
use super::{
    AgentTool, ApprovalRequest, ApprovalResponse, ConversationMessage, EngineError,
    GenerationEngine, GenerationRequest, GenerationResponse,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopConfig {
    /// Upper bound on generation calls per run. `None` runs until nothing is pending.
    pub max_turns: Option<usize>,
}

#[derive(Debug)]
pub struct LoopOutcome {
    /// The final engine response, which carries no approval requests.
    pub response: GenerationResponse,
    /// Input messages followed by everything the run appended.
    pub transcript: Vec<ConversationMessage>,
    pub generation_calls: usize,
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("approval loop exceeded {max_turns} generation calls")]
    TurnLimit { max_turns: usize },
    #[error("engine asked again for approval '{approval_id}' after it was decided")]
    Stalled { approval_id: String },
    #[error("approval loop cancelled")]
    Cancelled,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub struct ApprovalLoop {
    engine: Arc<dyn GenerationEngine>,
    decisions: Arc<dyn DecisionSource>,
    config: LoopConfig,
    instructions: Option<String>,
}

impl ApprovalLoop {
    /// Without a decision source every request is auto-approved.
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        decisions: Option<Arc<dyn DecisionSource>>,
        config: LoopConfig,
    ) -> Self {
        Self {
            engine,
            decisions: decisions.unwrap_or_else(|| Arc::new(AutoApprove)),
            config,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub async fn run(
        &self,
        messages: Vec<ConversationMessage>,
        tools: Vec<AgentTool>,
        cancel: &CancellationToken,
    ) -> Result<LoopOutcome, LoopError> {
        let tools: Vec<AgentTool> = tools.into_iter().map(AgentTool::normalized).collect();
        let mut transcript = messages;
        let mut decided: HashSet<String> = HashSet::new();
        let mut generation_calls = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(LoopError::Cancelled);
            }
            if let Some(max_turns) = self.config.max_turns {
                if generation_calls >= max_turns {
                    warn!("Approval loop hit its limit of {} generation calls", max_turns);
                    return Err(LoopError::TurnLimit { max_turns });
                }
            }

            let request = GenerationRequest {
                instructions: self.instructions.clone(),
                messages: transcript.clone(),
                tools: tools.clone(),
            };
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LoopError::Cancelled),
                response = self.engine.generate(&request) => response?,
            };
            generation_calls += 1;

            let pending = response.approval_requests();
            if pending.is_empty() {
                debug!("Generation finished after {} calls", generation_calls);
                transcript.extend(response.messages.iter().cloned());
                return Ok(LoopOutcome {
                    response,
                    transcript,
                    generation_calls,
                });
            }

            // One decision per id; a repeat inside a batch is the same request echoed.
            let mut batch: HashSet<String> = HashSet::new();
            let pending: Vec<ApprovalRequest> = pending
                .into_iter()
                .filter(|request| batch.insert(request.approval_id.clone()))
                .collect();
            if let Some(repeat) = pending.iter().find(|r| decided.contains(&r.approval_id)) {
                warn!("Approval {} requested again after a decision", repeat.approval_id);
                return Err(LoopError::Stalled {
                    approval_id: repeat.approval_id.clone(),
                });
            }
            decided.extend(batch);

            info!("Awaiting {} approval decision(s)", pending.len());
            let gathered = join_all(pending.iter().map(|request| self.decisions.decide(request)));
            let decisions = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LoopError::Cancelled),
                decisions = gathered => decisions,
            };
            // Decisions that land after cancellation are never sent to the engine.
            if cancel.is_cancelled() {
                return Err(LoopError::Cancelled);
            }

            let responses: Vec<ApprovalResponse> = pending
                .iter()
                .zip(decisions)
                .map(|(request, decision)| {
                    info!(
                        "Approval {} for '{}': approved={}",
                        request.approval_id, request.tool_name, decision.approved
                    );
                    ApprovalResponse::new(request, decision)
                })
                .collect();

            transcript.extend(response.messages);
            transcript.push(ConversationMessage::approval_responses(responses));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::decision::{PolicyDecisionSource, AUTO_APPROVE_REASON};
    use crate::agent::{ApprovalDecision, MessageContent, NativeApproval, Role};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request it saw.
    struct ScriptedEngine {
        script: Mutex<VecDeque<GenerationResponse>>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedEngine {
        fn new(script: Vec<GenerationResponse>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationEngine for ScriptedEngine {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, EngineError> {
            self.seen.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| EngineError::Decode("script exhausted".to_string()))
        }
    }

    fn text(text: &str) -> GenerationResponse {
        GenerationResponse {
            response_id: None,
            messages: vec![ConversationMessage::assistant(vec![MessageContent::Text {
                text: text.to_string(),
            }])],
        }
    }

    fn asks(ids: &[(&str, &str)]) -> GenerationResponse {
        GenerationResponse {
            response_id: None,
            messages: vec![ConversationMessage::assistant(
                ids.iter()
                    .map(|(id, tool)| {
                        MessageContent::ApprovalRequest(ApprovalRequest {
                            approval_id: id.to_string(),
                            tool_name: tool.to_string(),
                            tool_input: json!({}),
                        })
                    })
                    .collect(),
            )],
        }
    }

    fn tools() -> Vec<AgentTool> {
        vec![AgentTool {
            name: "delete_job".to_string(),
            description: "Delete a job opening".to_string(),
            input_schema: json!({"type": "object"}),
            requires_approval: true,
            native_approval: None,
        }]
    }

    #[tokio::test]
    async fn test_no_approvals_single_call() {
        let engine = ScriptedEngine::new(vec![text("Three jobs are open.")]);
        let agent = ApprovalLoop::new(engine.clone(), None, LoopConfig::default());

        let outcome = agent
            .run(vec![ConversationMessage::user("jobs?")], tools(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(engine.calls(), 1);
        assert_eq!(outcome.generation_calls, 1);
        assert_eq!(outcome.response, text("Three jobs are open."));
        assert_eq!(outcome.transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_two_approvals_one_tool_message() {
        let engine = ScriptedEngine::new(vec![
            asks(&[("apr_1", "delete_job"), ("apr_2", "delete_job")]),
            text("Both jobs deleted."),
        ]);
        let agent = ApprovalLoop::new(engine.clone(), None, LoopConfig::default());
        let input = vec![ConversationMessage::user("delete jobs 1 and 2")];

        let outcome = agent
            .run(input.clone(), tools(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(engine.calls(), 2);

        let seen = engine.seen.lock().unwrap();
        let first = &seen[0].messages;
        let second = &seen[1].messages;
        assert_eq!(first, &input);
        // user, engine output, one tool message
        assert_eq!(second.len(), first.len() + 2);
        let tool_message = second.last().unwrap();
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(tool_message.content.len(), 2);
        for part in &tool_message.content {
            match part {
                MessageContent::ApprovalResponse(response) => {
                    assert!(response.approved);
                    assert_eq!(response.reason.as_deref(), Some(AUTO_APPROVE_REASON));
                }
                other => panic!("unexpected content {:?}", other),
            }
        }
        assert_eq!(outcome.response.output_text(), "Both jobs deleted.");
    }

    #[tokio::test]
    async fn test_tools_normalized_before_first_call() {
        let engine = ScriptedEngine::new(vec![text("ok")]);
        let agent = ApprovalLoop::new(engine.clone(), None, LoopConfig::default());
        agent
            .run(vec![ConversationMessage::user("hi")], tools(), &CancellationToken::new())
            .await
            .unwrap();
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen[0].tools[0].native_approval, Some(NativeApproval::Always));
    }

    #[tokio::test]
    async fn test_denial_is_forwarded() {
        let engine =
            ScriptedEngine::new(vec![asks(&[("apr_1", "delete_job")]), text("Understood.")]);
        let policy: Arc<dyn DecisionSource> =
            Arc::new(PolicyDecisionSource::new(true).deny(["delete_job"]));
        let agent = ApprovalLoop::new(engine.clone(), Some(policy), LoopConfig::default());

        let outcome = agent
            .run(
                vec![ConversationMessage::user("delete job 1")],
                tools(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let responses: Vec<&ApprovalResponse> = outcome
            .transcript
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|part| match part {
                MessageContent::ApprovalResponse(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].approved);
    }

    #[tokio::test]
    async fn test_repeated_approval_id_stalls() {
        let engine = ScriptedEngine::new(vec![
            asks(&[("apr_1", "delete_job")]),
            asks(&[("apr_1", "delete_job")]),
        ]);
        let agent = ApprovalLoop::new(engine.clone(), None, LoopConfig::default());

        let err = agent
            .run(vec![ConversationMessage::user("go")], tools(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::Stalled { ref approval_id } if approval_id == "apr_1"));
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let engine = ScriptedEngine::new(vec![
            asks(&[("apr_1", "delete_job")]),
            asks(&[("apr_2", "delete_job")]),
            text("done"),
        ]);
        let agent = ApprovalLoop::new(
            engine.clone(),
            None,
            LoopConfig { max_turns: Some(2) },
        );

        let err = agent
            .run(vec![ConversationMessage::user("go")], tools(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::TurnLimit { max_turns: 2 }));
        assert_eq!(engine.calls(), 2);
    }

    /// Never answers; lets the test cancel while decisions are outstanding.
    struct Silent;

    #[async_trait]
    impl DecisionSource for Silent {
        async fn decide(&self, _request: &ApprovalRequest) -> ApprovalDecision {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancel_while_awaiting_decisions() {
        let engine = ScriptedEngine::new(vec![asks(&[("apr_1", "delete_job")]), text("unused")]);
        let agent =
            ApprovalLoop::new(engine.clone(), Some(Arc::new(Silent)), LoopConfig::default());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = agent
            .run(vec![ConversationMessage::user("go")], tools(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::Cancelled));
        assert_eq!(engine.calls(), 1);
    }

    /// Cancels the run from inside the decision, then approves anyway.
    struct CancelThenApprove(CancellationToken);

    #[async_trait]
    impl DecisionSource for CancelThenApprove {
        async fn decide(&self, _request: &ApprovalRequest) -> ApprovalDecision {
            self.0.cancel();
            ApprovalDecision::approve("too late")
        }
    }

    #[tokio::test]
    async fn test_decision_after_cancel_is_not_sent() {
        for _ in 0..50 {
            let engine =
                ScriptedEngine::new(vec![asks(&[("apr_1", "delete_job")]), text("deleted")]);
            let cancel = CancellationToken::new();
            let late: Arc<dyn DecisionSource> = Arc::new(CancelThenApprove(cancel.clone()));
            let agent = ApprovalLoop::new(engine.clone(), Some(late), LoopConfig::default());

            let err = agent
                .run(vec![ConversationMessage::user("go")], tools(), &cancel)
                .await
                .unwrap_err();
            assert!(matches!(err, LoopError::Cancelled));
            assert_eq!(engine.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_call() {
        let engine = ScriptedEngine::new(vec![text("unused")]);
        let agent = ApprovalLoop::new(engine.clone(), None, LoopConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = agent
            .run(vec![ConversationMessage::user("go")], tools(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::Cancelled));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeat_within_one_batch_decided_once() {
        let engine = ScriptedEngine::new(vec![
            asks(&[("apr_1", "delete_job"), ("apr_1", "delete_job")]),
            text("deleted"),
        ]);
        let agent = ApprovalLoop::new(engine.clone(), None, LoopConfig::default());

        let outcome = agent
            .run(vec![ConversationMessage::user("go")], tools(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.generation_calls, 2);
        let seen = engine.seen.lock().unwrap();
        let tool_message = seen[1].messages.last().unwrap();
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(tool_message.content.len(), 1);
    }

    #[tokio::test]
    async fn test_engine_error_propagates() {
        let engine = ScriptedEngine::new(vec![]);
        let agent = ApprovalLoop::new(engine, None, LoopConfig::default());
        let err = agent
            .run(vec![ConversationMessage::user("go")], tools(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::Engine(EngineError::Decode(_))));
    }
}
