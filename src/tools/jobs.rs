// src/tools/jobs.rs
use async_trait::async_trait;

use super::args::{self, ArgError};
use super::{object_schema, Arguments, ToolDefinition, ToolGroup, ToolResult};
use crate::clients::JobsClient;

const JOB_FIELDS: &[&str] = &[
    "title",
    "description",
    "location",
    "department",
    "employment_type",
    "salary_range",
    "status",
];

pub struct JobTools {
    client: JobsClient,
}

impl JobTools {
    pub fn new(client: JobsClient) -> Self {
        Self { client }
    }

    async fn list_jobs(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        args::optional_u64(arguments, "limit")?;
        let query = args::query_pairs(arguments, &["status", "limit"])?;
        Ok(ToolResult::from_service(self.client.list_jobs(&query).await))
    }

    async fn get_job(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let job_id = args::required_id(arguments, "job_id")?;
        Ok(ToolResult::from_service(self.client.get_job(&job_id).await))
    }

    async fn create_job(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        args::required_str(arguments, "title")?;
        args::required_str(arguments, "description")?;
        let payload = args::pick_fields(arguments, JOB_FIELDS);
        Ok(ToolResult::from_service(self.client.create_job(&payload).await))
    }

    async fn update_job(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let job_id = args::required_id(arguments, "job_id")?;
        let payload = args::pick_fields(arguments, JOB_FIELDS);
        if payload.as_object().is_some_and(|fields| fields.is_empty()) {
            return Ok(ToolResult::error(format!(
                "Invalid arguments for 'update_job': nothing to update, provide at least one of {}",
                JOB_FIELDS.join(", ")
            )));
        }
        Ok(ToolResult::from_service(
            self.client.update_job(&job_id, &payload).await,
        ))
    }

    async fn delete_job(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let job_id = args::required_id(arguments, "job_id")?;
        Ok(ToolResult::from_service(self.client.delete_job(&job_id).await))
    }
}

#[async_trait]
impl ToolGroup for JobTools {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let job_properties: &[(&str, &str, &str)] = &[
            ("title", "string", "Job title"),
            ("description", "string", "Full job description"),
            ("location", "string", "Office location or 'remote'"),
            ("department", "string", "Hiring department"),
            ("employment_type", "string", "full_time, part_time, contract or internship"),
            ("salary_range", "string", "Salary range, free text"),
        ];

        let mut update_properties = vec![("job_id", "id", "Job identifier")];
        update_properties.extend_from_slice(job_properties);
        update_properties.push(("status", "string", "open, paused or closed"));

        vec![
            ToolDefinition::new(
                "list_jobs",
                "List job openings, optionally filtered by status",
                object_schema(
                    &[
                        ("status", "string", "open, paused or closed"),
                        ("limit", "integer", "Maximum number of jobs to return"),
                    ],
                    &[],
                ),
            ),
            ToolDefinition::new(
                "get_job",
                "Get the full details of one job opening",
                object_schema(&[("job_id", "id", "Job identifier")], &["job_id"]),
            ),
            ToolDefinition::new(
                "create_job",
                "Create a new job opening",
                object_schema(job_properties, &["title", "description"]),
            )
            .requires_approval(),
            ToolDefinition::new(
                "update_job",
                "Update fields of an existing job opening",
                object_schema(&update_properties, &["job_id"]),
            )
            .requires_approval(),
            ToolDefinition::new(
                "delete_job",
                "Delete a job opening",
                object_schema(&[("job_id", "id", "Job identifier")], &["job_id"]),
            )
            .requires_approval(),
        ]
    }

    async fn call(&self, tool: &str, arguments: &Arguments) -> Option<ToolResult> {
        let outcome = match tool {
            "list_jobs" => self.list_jobs(arguments).await,
            "get_job" => self.get_job(arguments).await,
            "create_job" => self.create_job(arguments).await,
            "update_job" => self.update_job(arguments).await,
            "delete_job" => self.delete_job(arguments).await,
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|e| ToolResult::invalid_arguments(tool, &e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tools(server: &MockServer) -> JobTools {
        JobTools::new(JobsClient::new(&server.uri(), Duration::from_secs(5)).unwrap())
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_list_jobs_forwards_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("status", "open"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let result = tools(&server)
            .call("list_jobs", &args(json!({"status": "open", "limit": 5})))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.structured_data(), Some(&json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn test_create_job_requires_title_before_calling_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let result = tools(&server)
            .call("create_job", &args(json!({"description": "Build things"})))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("'title'"));
    }

    #[tokio::test]
    async fn test_create_job_sends_only_known_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .and(body_json(
                json!({"title": "Rust dev", "description": "Systems", "location": "Lyon"}),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "j-9"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = tools(&server)
            .call(
                "create_job",
                &args(json!({
                    "title": "Rust dev",
                    "description": "Systems",
                    "location": "Lyon",
                    "unrelated": true,
                })),
            )
            .await
            .unwrap();
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_update_job_without_fields_is_rejected() {
        let server = MockServer::start().await;
        let result = tools(&server)
            .call("update_job", &args(json!({"job_id": 3})))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text_content().contains("nothing to update"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_declined() {
        let server = MockServer::start().await;
        assert!(tools(&server)
            .call("get_candidate", &Arguments::new())
            .await
            .is_none());
    }

    #[test]
    fn test_mutating_tools_require_approval() {
        let tools = JobTools::new(
            JobsClient::new("http://localhost:1", Duration::from_secs(1)).unwrap(),
        );
        let gated: Vec<String> = tools
            .definitions()
            .into_iter()
            .filter(|d| d.approval_policy)
            .map(|d| d.name)
            .collect();
        assert_eq!(gated, vec!["create_job", "update_job", "delete_job"]);
    }
}
