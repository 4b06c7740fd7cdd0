// src/clients/meetings.rs
use serde_json::Value;
use std::time::Duration;

use crate::core::{ServiceClient, ServiceError};
use crate::utils::encode_path_segment;

const MEETINGS_ENDPOINT: &str = "/meetings";

#[derive(Debug, Clone)]
pub struct MeetingsClient {
    http: ServiceClient,
}

impl MeetingsClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: ServiceClient::new("meetings", base_url, timeout)?,
        })
    }

    pub async fn list_meetings(&self, query: &[(&str, String)]) -> Result<Value, ServiceError> {
        self.http.get_with_query(MEETINGS_ENDPOINT, query).await
    }

    pub async fn schedule_meeting(&self, payload: &Value) -> Result<Value, ServiceError> {
        self.http.post_json(MEETINGS_ENDPOINT, payload).await
    }

    pub async fn cancel_meeting(
        &self,
        meeting_id: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ServiceError> {
        let path = format!("{}/{}", MEETINGS_ENDPOINT, encode_path_segment(meeting_id));
        self.http.delete_with_query(&path, query).await
    }
}
