// src/core/service_client.rs
//! HTTP binding shared by all downstream domain clients.
//!
//! Every request picks up the ambient [`AuthContext`](super::auth_context::AuthContext)
//! and forwards its token as a bearer credential. Without a binding the request goes
//! out without an `Authorization` header; the downstream service decides what that means.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::auth_context;
use crate::utils::{join_url, truncate_for_log};

/// Failure of a downstream call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("{service} service returned HTTP {status}: {body}")]
    Domain {
        service: &'static str,
        status: u16,
        body: String,
    },
    /// No usable response: connect failure, timeout, unreadable body.
    #[error("{service} service unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Domain { status, .. } => Some(*status),
            ServiceError::Transport { .. } => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ServiceError::Transport { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    service: &'static str,
    base_url: String,
}

impl ServiceClient {
    /// Create a client for one downstream domain.
    pub fn new(service: &'static str, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client for {}: {}", service, e))?;

        Ok(Self {
            client,
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<Value, ServiceError> {
        self.send(Method::GET, path, None::<&()>, &[]).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ServiceError> {
        self.send(Method::GET, path, None::<&()>, query).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, ServiceError> {
        self.send(Method::POST, path, Some(payload), &[]).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, ServiceError> {
        self.send(Method::PUT, path, Some(payload), &[]).await
    }

    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, ServiceError> {
        self.send(Method::PATCH, path, Some(payload), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ServiceError> {
        self.send(Method::DELETE, path, None::<&()>, &[]).await
    }

    pub async fn delete_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ServiceError> {
        self.send(Method::DELETE, path, None::<&()>, query).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match auth_context::current_context() {
            Some(context) => request.header(reqwest::header::AUTHORIZATION, context.bearer()),
            None => request,
        }
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&T>,
        query: &[(&str, String)],
    ) -> Result<Value, ServiceError> {
        let url = join_url(&self.base_url, path);
        debug!(service = self.service, %method, %url, "Calling downstream service");

        let mut request = self.authorize(self.client.request(method.clone(), &url));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| ServiceError::Transport {
            service: self.service,
            message: describe_transport_error(&e),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ServiceError::Transport {
            service: self.service,
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            warn!(
                service = self.service,
                %method,
                %url,
                status = status.as_u16(),
                body = %truncate_for_log(&body, 200),
                "Downstream service returned an error"
            );
            return Err(ServiceError::Domain {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }

        debug!(service = self.service, status = status.as_u16(), "Downstream call succeeded");
        Ok(parse_body(status, &body))
    }
}

/// Success bodies are JSON by contract; anything else is kept as a string.
fn parse_body(status: StatusCode, body: &str) -> Value {
    if body.trim().is_empty() || status == StatusCode::NO_CONTENT {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}
