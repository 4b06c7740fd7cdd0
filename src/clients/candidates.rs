// src/clients/candidates.rs
use serde_json::Value;
use std::time::Duration;

use crate::core::{ServiceClient, ServiceError};
use crate::utils::encode_path_segment;

const CANDIDATES_ENDPOINT: &str = "/candidates";

#[derive(Debug, Clone)]
pub struct CandidatesClient {
    http: ServiceClient,
}

impl CandidatesClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: ServiceClient::new("candidates", base_url, timeout)?,
        })
    }

    pub async fn list_candidates(&self, query: &[(&str, String)]) -> Result<Value, ServiceError> {
        self.http.get_with_query(CANDIDATES_ENDPOINT, query).await
    }

    pub async fn get_candidate(&self, candidate_id: &str) -> Result<Value, ServiceError> {
        self.http.get(&candidate_path(candidate_id)).await
    }

    pub async fn create_candidate(&self, payload: &Value) -> Result<Value, ServiceError> {
        self.http.post_json(CANDIDATES_ENDPOINT, payload).await
    }

    pub async fn update_status(
        &self,
        candidate_id: &str,
        payload: &Value,
    ) -> Result<Value, ServiceError> {
        let path = format!("{}/status", candidate_path(candidate_id));
        self.http.patch_json(&path, payload).await
    }

    pub async fn delete_candidate(&self, candidate_id: &str) -> Result<Value, ServiceError> {
        self.http.delete(&candidate_path(candidate_id)).await
    }
}

fn candidate_path(candidate_id: &str) -> String {
    format!(
        "{}/{}",
        CANDIDATES_ENDPOINT,
        encode_path_segment(candidate_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_candidate_id_stays_in_its_segment() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/candidates/a%2F..%2Fb/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/candidates/c%3F1%231"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = CandidatesClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        client
            .update_status("a/../b", &json!({"status": "hired"}))
            .await
            .unwrap();
        client.delete_candidate("c?1#1").await.unwrap();
    }
}
