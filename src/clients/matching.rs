// src/clients/matching.rs
//! The scoring itself is the matching service's business; we only relay.

use serde_json::Value;
use std::time::Duration;

use crate::core::{ServiceClient, ServiceError};
use crate::utils::encode_path_segment;

const MATCH_ENDPOINT: &str = "/match";

#[derive(Debug, Clone)]
pub struct MatchingClient {
    http: ServiceClient,
}

impl MatchingClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: ServiceClient::new("matching", base_url, timeout)?,
        })
    }

    pub async fn match_candidates(&self, payload: &Value) -> Result<Value, ServiceError> {
        self.http.post_json(MATCH_ENDPOINT, payload).await
    }

    pub async fn get_results(&self, job_id: &str) -> Result<Value, ServiceError> {
        let path = format!("{}/{}", MATCH_ENDPOINT, encode_path_segment(job_id));
        self.http.get(&path).await
    }
}
