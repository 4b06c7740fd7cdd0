// src/clients/reports.rs
use serde_json::Value;
use std::time::Duration;

use crate::core::{ServiceClient, ServiceError};
use crate::utils::encode_path_segment;

const REPORTS_ENDPOINT: &str = "/reports";

#[derive(Debug, Clone)]
pub struct ReportsClient {
    http: ServiceClient,
}

impl ReportsClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: ServiceClient::new("reports", base_url, timeout)?,
        })
    }

    /// Report rendering and PDF export happen downstream.
    pub async fn generate_report(&self, payload: &Value) -> Result<Value, ServiceError> {
        self.http.post_json(REPORTS_ENDPOINT, payload).await
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Value, ServiceError> {
        self.http.get(&report_path(report_id)).await
    }

    /// Delivery (SMTP) is the reports service's concern.
    pub async fn send_report(
        &self,
        report_id: &str,
        payload: &Value,
    ) -> Result<Value, ServiceError> {
        let path = format!("{}/send", report_path(report_id));
        self.http.post_json(&path, payload).await
    }
}

fn report_path(report_id: &str) -> String {
    format!("{}/{}", REPORTS_ENDPOINT, encode_path_segment(report_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_report_id_stays_in_its_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reports/q3%2F..%2Fall/send"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReportsClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        client
            .send_report("q3/../all", &json!({"recipients": ["a@b.io"]}))
            .await
            .unwrap();
    }
}
