// src/tools/reports.rs
use async_trait::async_trait;
use serde_json::json;

use super::args::{self, ArgError};
use super::{object_schema, Arguments, ToolDefinition, ToolGroup, ToolResult};
use crate::clients::ReportsClient;

const REPORT_TYPES: &[&str] = &["pipeline", "job_summary", "hiring_funnel", "time_to_hire"];

pub struct ReportTools {
    client: ReportsClient,
}

impl ReportTools {
    pub fn new(client: ReportsClient) -> Self {
        Self { client }
    }

    async fn generate_report(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let report_type = args::required_str(arguments, "report_type")?;
        if !REPORT_TYPES.contains(&report_type.as_str()) {
            return Ok(ToolResult::error(format!(
                "Invalid arguments for 'generate_report': unknown report_type '{}', expected one of {}",
                report_type,
                REPORT_TYPES.join(", ")
            )));
        }
        if report_type == "job_summary" && args::optional_id(arguments, "job_id")?.is_none() {
            return Ok(ToolResult::error(
                "Invalid arguments for 'generate_report': job_summary reports need 'job_id'",
            ));
        }

        let mut payload = json!({ "report_type": report_type });
        if let Some(job_id) = args::optional_id(arguments, "job_id")? {
            payload["job_id"] = json!(job_id);
        }
        if let Some(period) = args::optional_str(arguments, "period")? {
            payload["period"] = json!(period);
        }

        Ok(ToolResult::from_service(
            self.client.generate_report(&payload).await,
        ))
    }

    async fn get_report(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let report_id = args::required_id(arguments, "report_id")?;
        Ok(ToolResult::from_service(
            self.client.get_report(&report_id).await,
        ))
    }

    async fn send_report(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let report_id = args::required_id(arguments, "report_id")?;
        let recipients = args::required_str_list(arguments, "recipients")?;
        if let Some(bad) = recipients.iter().find(|r| !r.contains('@')) {
            return Ok(ToolResult::error(format!(
                "Invalid arguments for 'send_report': '{}' is not an email address",
                bad
            )));
        }

        let mut payload = json!({ "recipients": recipients });
        if let Some(message) = args::optional_str(arguments, "message")? {
            payload["message"] = json!(message);
        }

        Ok(ToolResult::from_service(
            self.client.send_report(&report_id, &payload).await,
        ))
    }
}

#[async_trait]
impl ToolGroup for ReportTools {
    fn name(&self) -> &'static str {
        "reports"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "generate_report",
                "Generate a recruiting report",
                object_schema(
                    &[
                        (
                            "report_type",
                            "string",
                            "pipeline, job_summary, hiring_funnel or time_to_hire",
                        ),
                        ("job_id", "id", "Job to report on (required for job_summary)"),
                        ("period", "string", "Reporting period, e.g. 2026-Q1"),
                    ],
                    &["report_type"],
                ),
            ),
            ToolDefinition::new(
                "get_report",
                "Fetch a generated report",
                object_schema(&[("report_id", "id", "Report identifier")], &["report_id"]),
            ),
            ToolDefinition::new(
                "send_report",
                "Email a generated report to recipients",
                object_schema(
                    &[
                        ("report_id", "id", "Report identifier"),
                        ("recipients", "string[]", "Recipient email addresses"),
                        ("message", "string", "Cover message"),
                    ],
                    &["report_id", "recipients"],
                ),
            )
            .requires_approval(),
        ]
    }

    async fn call(&self, tool: &str, arguments: &Arguments) -> Option<ToolResult> {
        let outcome = match tool {
            "generate_report" => self.generate_report(arguments).await,
            "get_report" => self.get_report(arguments).await,
            "send_report" => self.send_report(arguments).await,
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|e| ToolResult::invalid_arguments(tool, &e)))
    }
}
