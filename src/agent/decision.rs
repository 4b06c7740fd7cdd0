// src/agent/decision.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

use super::{ApprovalDecision, ApprovalRequest};
use crate::core::auth_context::current_tenant;

pub const AUTO_APPROVE_REASON: &str = "Auto-approved: no decision source configured";

/// Decides whether a flagged tool may run.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

/// Approves everything with a fixed reason.
pub struct AutoApprove;

#[async_trait]
impl DecisionSource for AutoApprove {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        info!("Auto-approving '{}' ({})", request.tool_name, request.approval_id);
        ApprovalDecision::approve(AUTO_APPROVE_REASON)
    }
}

/// Static allow/deny lists by tool name. Deny wins over allow.
pub struct PolicyDecisionSource {
    allow: HashSet<String>,
    deny: HashSet<String>,
    approve_unlisted: bool,
}

impl PolicyDecisionSource {
    pub fn new(approve_unlisted: bool) -> Self {
        Self {
            allow: HashSet::new(),
            deny: HashSet::new(),
            approve_unlisted,
        }
    }

    pub fn allow<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn deny<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny.extend(tools.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl DecisionSource for PolicyDecisionSource {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        let name = &request.tool_name;
        if self.deny.contains(name) {
            ApprovalDecision::deny(format!("Policy denies '{}'", name))
        } else if self.allow.contains(name) {
            ApprovalDecision::approve(format!("Policy allows '{}'", name))
        } else if self.approve_unlisted {
            ApprovalDecision::approve("Policy default: approve")
        } else {
            ApprovalDecision::deny("Policy default: deny")
        }
    }
}

/// An approval waiting for a person, as listed over HTTP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub approval_id: String,
    pub tool_name: String,
    pub tool_input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub requested_at: DateTime<Utc>,
}

/// Pending approvals are keyed by owning tenant and approval id.
type WaitingKey = (Option<String>, String);

struct Waiting {
    approval: PendingApproval,
    sender: oneshot::Sender<ApprovalDecision>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("No pending approval '{0}'")]
    NotFound(String),
    #[error("Approval '{0}' is no longer awaited")]
    Abandoned(String),
}

/// Decisions made by people through the approvals endpoints.
///
/// Each request is parked under its approval id and the tenant bound at the time it was
/// raised; only the same tenant can see or resolve it. Unanswered requests are denied after
/// `timeout`. A second request for an id its tenant already has pending is denied at once.
pub struct HumanApprovals {
    pending: Mutex<HashMap<WaitingKey, Waiting>>,
    timeout: Duration,
}

impl HumanApprovals {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub async fn pending_for(&self, tenant_id: Option<&str>) -> Vec<PendingApproval> {
        let mut pending = self.pending.lock().await;
        // Waiters whose run has gone away can never receive a decision.
        pending.retain(|_, waiting| !waiting.sender.is_closed());

        let mut approvals: Vec<PendingApproval> = pending
            .values()
            .filter(|waiting| waiting.approval.tenant_id.as_deref() == tenant_id)
            .map(|waiting| waiting.approval.clone())
            .collect();
        approvals.sort_by_key(|approval| approval.requested_at);
        approvals
    }

    pub async fn resolve(
        &self,
        approval_id: &str,
        tenant_id: Option<&str>,
        decision: ApprovalDecision,
    ) -> Result<(), ResolveError> {
        let key = (tenant_id.map(str::to_string), approval_id.to_string());
        let waiting = self
            .pending
            .lock()
            .await
            .remove(&key)
            .ok_or_else(|| ResolveError::NotFound(approval_id.to_string()))?;
        info!(
            "Approval {} for '{}' resolved: approved={}",
            approval_id, waiting.approval.tool_name, decision.approved
        );
        waiting
            .sender
            .send(decision)
            .map_err(|_| ResolveError::Abandoned(approval_id.to_string()))
    }
}

#[async_trait]
impl DecisionSource for HumanApprovals {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        let (sender, receiver) = oneshot::channel();
        let tenant_id = current_tenant();
        let key = (tenant_id.clone(), request.approval_id.clone());
        let approval = PendingApproval {
            approval_id: request.approval_id.clone(),
            tool_name: request.tool_name.clone(),
            tool_input: request.tool_input.clone(),
            tenant_id,
            requested_at: Utc::now(),
        };

        {
            let mut pending = self.pending.lock().await;
            if pending
                .get(&key)
                .is_some_and(|waiting| !waiting.sender.is_closed())
            {
                warn!("Approval {} is already pending, denying the duplicate", request.approval_id);
                return ApprovalDecision::deny(format!(
                    "Approval '{}' is already awaiting a decision",
                    request.approval_id
                ));
            }
            info!(
                "Waiting for a human decision on '{}' ({})",
                request.tool_name, request.approval_id
            );
            pending.insert(key.clone(), Waiting { approval, sender });
        }

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(_)) => ApprovalDecision::deny("Approval was withdrawn"),
            Err(_) => {
                self.pending.lock().await.remove(&key);
                warn!(
                    "No decision on {} within {:?}, denying",
                    request.approval_id, self.timeout
                );
                ApprovalDecision::deny(format!("No decision within {:?}", self.timeout))
            }
        }
    }
}
