// src/tools/matching.rs
use async_trait::async_trait;
use serde_json::json;

use super::args::{self, ArgError};
use super::{object_schema, Arguments, ToolDefinition, ToolGroup, ToolResult};
use crate::clients::MatchingClient;

const DEFAULT_MATCH_LIMIT: u64 = 10;

pub struct MatchingTools {
    client: MatchingClient,
}

impl MatchingTools {
    pub fn new(client: MatchingClient) -> Self {
        Self { client }
    }

    async fn match_candidates(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let job_id = args::required_id(arguments, "job_id")?;
        let limit = args::optional_u64(arguments, "limit")?.unwrap_or(DEFAULT_MATCH_LIMIT);
        let min_score = args::optional_f64(arguments, "min_score")?;

        if let Some(score) = min_score {
            if !(0.0..=1.0).contains(&score) {
                return Ok(ToolResult::error(
                    "Invalid arguments for 'match_candidates': min_score must be between 0 and 1",
                ));
            }
        }

        let mut payload = json!({ "job_id": job_id, "limit": limit });
        if let Some(score) = min_score {
            payload["min_score"] = json!(score);
        }

        Ok(ToolResult::from_service(
            self.client.match_candidates(&payload).await,
        ))
    }

    async fn get_match_results(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let job_id = args::required_id(arguments, "job_id")?;
        Ok(ToolResult::from_service(
            self.client.get_results(&job_id).await,
        ))
    }
}

#[async_trait]
impl ToolGroup for MatchingTools {
    fn name(&self) -> &'static str {
        "matching"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "match_candidates",
                "Rank the candidate pool against a job opening",
                object_schema(
                    &[
                        ("job_id", "id", "Job to match against"),
                        ("limit", "integer", "Number of top candidates (default 10)"),
                        ("min_score", "number", "Minimum match score between 0 and 1"),
                    ],
                    &["job_id"],
                ),
            ),
            ToolDefinition::new(
                "get_match_results",
                "Fetch the latest ranking computed for a job",
                object_schema(&[("job_id", "id", "Job identifier")], &["job_id"]),
            ),
        ]
    }

    async fn call(&self, tool: &str, arguments: &Arguments) -> Option<ToolResult> {
        let outcome = match tool {
            "match_candidates" => self.match_candidates(arguments).await,
            "get_match_results" => self.get_match_results(arguments).await,
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|e| ToolResult::invalid_arguments(tool, &e)))
    }
}
