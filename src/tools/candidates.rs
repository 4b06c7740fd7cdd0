// src/tools/candidates.rs
use async_trait::async_trait;
use serde_json::json;

use super::args::{self, ArgError};
use super::{object_schema, Arguments, ToolDefinition, ToolGroup, ToolResult};
use crate::clients::CandidatesClient;

const CANDIDATE_STATUSES: &[&str] = &[
    "new",
    "screening",
    "interview",
    "offer",
    "hired",
    "rejected",
];

pub struct CandidateTools {
    client: CandidatesClient,
}

impl CandidateTools {
    pub fn new(client: CandidatesClient) -> Self {
        Self { client }
    }

    async fn list_candidates(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        args::optional_u64(arguments, "limit")?;
        let query = args::query_pairs(arguments, &["job_id", "status", "limit"])?;
        Ok(ToolResult::from_service(
            self.client.list_candidates(&query).await,
        ))
    }

    async fn get_candidate(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let candidate_id = args::required_id(arguments, "candidate_id")?;
        Ok(ToolResult::from_service(
            self.client.get_candidate(&candidate_id).await,
        ))
    }

    async fn create_candidate(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let name = args::required_str(arguments, "name")?;
        let email = args::required_str(arguments, "email")?;
        if !email.contains('@') {
            return Ok(ToolResult::error(format!(
                "Invalid arguments for 'create_candidate': '{}' is not an email address",
                email
            )));
        }

        let mut payload = args::pick_fields(arguments, &["phone", "resume_url"]);
        payload["name"] = json!(name);
        payload["email"] = json!(email);
        if let Some(skills) = args::optional_str_list(arguments, "skills")? {
            payload["skills"] = json!(skills);
        }
        if let Some(job_id) = args::optional_id(arguments, "job_id")? {
            payload["job_id"] = json!(job_id);
        }

        Ok(ToolResult::from_service(
            self.client.create_candidate(&payload).await,
        ))
    }

    async fn update_candidate_status(
        &self,
        arguments: &Arguments,
    ) -> Result<ToolResult, ArgError> {
        let candidate_id = args::required_id(arguments, "candidate_id")?;
        let status = args::required_str(arguments, "status")?.to_lowercase();
        if !CANDIDATE_STATUSES.contains(&status.as_str()) {
            return Ok(ToolResult::error(format!(
                "Invalid arguments for 'update_candidate_status': unknown status '{}', expected one of {}",
                status,
                CANDIDATE_STATUSES.join(", ")
            )));
        }

        let mut payload = json!({ "status": status });
        if let Some(notes) = args::optional_str(arguments, "notes")? {
            payload["notes"] = json!(notes);
        }

        Ok(ToolResult::from_service(
            self.client.update_status(&candidate_id, &payload).await,
        ))
    }

    async fn delete_candidate(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let candidate_id = args::required_id(arguments, "candidate_id")?;
        Ok(ToolResult::from_service(
            self.client.delete_candidate(&candidate_id).await,
        ))
    }
}

#[async_trait]
impl ToolGroup for CandidateTools {
    fn name(&self) -> &'static str {
        "candidates"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "list_candidates",
                "List candidates, optionally for one job or pipeline status",
                object_schema(
                    &[
                        ("job_id", "id", "Only candidates who applied to this job"),
                        ("status", "string", "Pipeline status filter"),
                        ("limit", "integer", "Maximum number of candidates to return"),
                    ],
                    &[],
                ),
            ),
            ToolDefinition::new(
                "get_candidate",
                "Get a candidate's profile",
                object_schema(
                    &[("candidate_id", "id", "Candidate identifier")],
                    &["candidate_id"],
                ),
            ),
            ToolDefinition::new(
                "create_candidate",
                "Add a candidate to the talent pool",
                object_schema(
                    &[
                        ("name", "string", "Full name"),
                        ("email", "string", "Email address"),
                        ("phone", "string", "Phone number"),
                        ("skills", "string[]", "Skills"),
                        ("resume_url", "string", "Link to the resume"),
                        ("job_id", "id", "Job the candidate applies to"),
                    ],
                    &["name", "email"],
                ),
            ),
            ToolDefinition::new(
                "update_candidate_status",
                "Move a candidate to another pipeline stage",
                object_schema(
                    &[
                        ("candidate_id", "id", "Candidate identifier"),
                        (
                            "status",
                            "string",
                            "new, screening, interview, offer, hired or rejected",
                        ),
                        ("notes", "string", "Recruiter notes for the change"),
                    ],
                    &["candidate_id", "status"],
                ),
            )
            .requires_approval(),
            ToolDefinition::new(
                "delete_candidate",
                "Remove a candidate and their data",
                object_schema(
                    &[("candidate_id", "id", "Candidate identifier")],
                    &["candidate_id"],
                ),
            )
            .requires_approval(),
        ]
    }

    async fn call(&self, tool: &str, arguments: &Arguments) -> Option<ToolResult> {
        let outcome = match tool {
            "list_candidates" => self.list_candidates(arguments).await,
            "get_candidate" => self.get_candidate(arguments).await,
            "create_candidate" => self.create_candidate(arguments).await,
            "update_candidate_status" => self.update_candidate_status(arguments).await,
            "delete_candidate" => self.delete_candidate(arguments).await,
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|e| ToolResult::invalid_arguments(tool, &e)))
    }
}
