// src/clients/jobs.rs
use serde_json::Value;
use std::time::Duration;

use crate::core::{ServiceClient, ServiceError};
use crate::utils::encode_path_segment;

const JOBS_ENDPOINT: &str = "/jobs";

#[derive(Debug, Clone)]
pub struct JobsClient {
    http: ServiceClient,
}

impl JobsClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: ServiceClient::new("jobs", base_url, timeout)?,
        })
    }

    pub async fn list_jobs(&self, query: &[(&str, String)]) -> Result<Value, ServiceError> {
        self.http.get_with_query(JOBS_ENDPOINT, query).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Value, ServiceError> {
        self.http.get(&job_path(job_id)).await
    }

    pub async fn create_job(&self, payload: &Value) -> Result<Value, ServiceError> {
        self.http.post_json(JOBS_ENDPOINT, payload).await
    }

    pub async fn update_job(&self, job_id: &str, payload: &Value) -> Result<Value, ServiceError> {
        self.http.put_json(&job_path(job_id), payload).await
    }

    pub async fn delete_job(&self, job_id: &str) -> Result<Value, ServiceError> {
        self.http.delete(&job_path(job_id)).await
    }
}

fn job_path(job_id: &str) -> String {
    format!("{}/{}", JOBS_ENDPOINT, encode_path_segment(job_id))
}
