// src/core/auth_context.rs
//! Request-scoped security context.
//!
//! Each inbound request binds its bearer token once with [`run_with_context`]; service
//! clients deep in the call tree read it back with [`current_context`] instead of having
//! the token threaded through every signature. The binding lives in tokio task-local
//! storage, so two requests running concurrently on the same runtime never see each
//! other's value. Tasks started with `tokio::spawn` do not inherit the binding.

use std::future::Future;

tokio::task_local! {
    static AUTH_CONTEXT: AuthContext;
}

/// Identity of the caller for the duration of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: String,
    tenant_id: Option<String>,
}

impl AuthContext {
    pub fn new(token: impl Into<String>, tenant_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            tenant_id,
        }
    }

    pub fn for_tenant(token: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self::new(token, Some(tenant_id.into()))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Run `fut` with `context` as the ambient auth context.
///
/// Bindings nest: inside `fut`, a further `run_with_context` shadows this one until it
/// completes.
pub async fn run_with_context<F>(context: AuthContext, fut: F) -> F::Output
where
    F: Future,
{
    AUTH_CONTEXT.scope(context, fut).await
}

/// Run `fut` under `context` when one is given, otherwise without any binding.
pub async fn run_with_optional_context<F>(context: Option<AuthContext>, fut: F) -> F::Output
where
    F: Future,
{
    match context {
        Some(context) => run_with_context(context, fut).await,
        None => fut.await,
    }
}

/// The nearest enclosing binding, or `None` outside of any.
pub fn current_context() -> Option<AuthContext> {
    AUTH_CONTEXT.try_with(|context| context.clone()).ok()
}

/// Tenant of the current binding, if any.
pub fn current_tenant() -> Option<String> {
    AUTH_CONTEXT
        .try_with(|context| context.tenant_id.clone())
        .ok()
        .flatten()
}
