// src/tools/meetings.rs
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::json;

use super::args::{self, ArgError};
use super::{object_schema, Arguments, ToolDefinition, ToolGroup, ToolResult};
use crate::clients::MeetingsClient;

const DEFAULT_DURATION_MINUTES: u64 = 30;
const MAX_DURATION_MINUTES: u64 = 8 * 60;

pub struct MeetingTools {
    client: MeetingsClient,
}

impl MeetingTools {
    pub fn new(client: MeetingsClient) -> Self {
        Self { client }
    }

    async fn list_meetings(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let query = args::query_pairs(arguments, &["candidate_id", "from", "to"])?;
        Ok(ToolResult::from_service(
            self.client.list_meetings(&query).await,
        ))
    }

    async fn schedule_meeting(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let candidate_id = args::required_id(arguments, "candidate_id")?;
        let start_time = args::required_str(arguments, "start_time")?;
        let start = match DateTime::<FixedOffset>::parse_from_rfc3339(&start_time) {
            Ok(start) => start,
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "Invalid arguments for 'schedule_meeting': start_time '{}' is not an RFC 3339 date-time (e.g. 2026-03-01T14:00:00+01:00)",
                    start_time
                )))
            }
        };

        let duration = args::optional_u64(arguments, "duration_minutes")?
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration == 0 || duration > MAX_DURATION_MINUTES {
            return Ok(ToolResult::error(format!(
                "Invalid arguments for 'schedule_meeting': duration_minutes must be between 1 and {}",
                MAX_DURATION_MINUTES
            )));
        }

        let mut payload = json!({
            "candidate_id": candidate_id,
            "start_time": start.to_rfc3339(),
            "duration_minutes": duration,
        });
        if let Some(job_id) = args::optional_id(arguments, "job_id")? {
            payload["job_id"] = json!(job_id);
        }
        if let Some(attendees) = args::optional_str_list(arguments, "attendees")? {
            payload["attendees"] = json!(attendees);
        }
        if let Some(title) = args::optional_str(arguments, "title")? {
            payload["title"] = json!(title);
        }

        Ok(ToolResult::from_service(
            self.client.schedule_meeting(&payload).await,
        ))
    }

    async fn cancel_meeting(&self, arguments: &Arguments) -> Result<ToolResult, ArgError> {
        let meeting_id = args::required_id(arguments, "meeting_id")?;
        let query = args::query_pairs(arguments, &["reason"])?;
        Ok(ToolResult::from_service(
            self.client.cancel_meeting(&meeting_id, &query).await,
        ))
    }
}

#[async_trait]
impl ToolGroup for MeetingTools {
    fn name(&self) -> &'static str {
        "meetings"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "list_meetings",
                "List scheduled interviews",
                object_schema(
                    &[
                        ("candidate_id", "id", "Only meetings with this candidate"),
                        ("from", "string", "Start of the window, RFC 3339"),
                        ("to", "string", "End of the window, RFC 3339"),
                    ],
                    &[],
                ),
            ),
            ToolDefinition::new(
                "schedule_meeting",
                "Schedule an interview with a candidate and send invitations",
                object_schema(
                    &[
                        ("candidate_id", "id", "Candidate identifier"),
                        ("start_time", "string", "RFC 3339 start date-time"),
                        ("duration_minutes", "integer", "Length in minutes (default 30)"),
                        ("job_id", "id", "Job the interview is for"),
                        ("attendees", "string[]", "Interviewer email addresses"),
                        ("title", "string", "Calendar title"),
                    ],
                    &["candidate_id", "start_time"],
                ),
            )
            .requires_approval(),
            ToolDefinition::new(
                "cancel_meeting",
                "Cancel a scheduled interview and notify attendees",
                object_schema(
                    &[
                        ("meeting_id", "id", "Meeting identifier"),
                        ("reason", "string", "Reason shared with attendees"),
                    ],
                    &["meeting_id"],
                ),
            )
            .requires_approval(),
        ]
    }

    async fn call(&self, tool: &str, arguments: &Arguments) -> Option<ToolResult> {
        let outcome = match tool {
            "list_meetings" => self.list_meetings(arguments).await,
            "schedule_meeting" => self.schedule_meeting(arguments).await,
            "cancel_meeting" => self.cancel_meeting(arguments).await,
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|e| ToolResult::invalid_arguments(tool, &e)))
    }
}
