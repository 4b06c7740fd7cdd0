// src/tools/registry.rs
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::candidates::CandidateTools;
use super::jobs::JobTools;
use super::matching::MatchingTools;
use super::meetings::MeetingTools;
use super::reports::ReportTools;
use super::{Arguments, ToolDefinition, ToolError, ToolGroup, ToolResult};
use crate::clients::ServiceClients;
use crate::core::auth_context::current_tenant;

/// Catalog plus dispatcher. Read-only once built.
pub struct ToolRegistry {
    groups: Vec<Box<dyn ToolGroup>>,
    catalog: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Groups are consulted in the order given. Fails if two groups define the same name.
    pub fn new(groups: Vec<Box<dyn ToolGroup>>) -> Result<Self, ToolError> {
        let mut owners: HashMap<String, &'static str> = HashMap::new();
        let mut catalog = Vec::new();

        for group in &groups {
            for definition in group.definitions() {
                if let Some(first) = owners.insert(definition.name.clone(), group.name()) {
                    return Err(ToolError::DuplicateTool {
                        name: definition.name,
                        first,
                        second: group.name(),
                    });
                }
                catalog.push(definition);
            }
        }

        info!(
            "Tool catalog ready: {} tools across {} groups",
            catalog.len(),
            groups.len()
        );
        Ok(Self { groups, catalog })
    }

    /// Standard dispatch order: jobs, candidates, matching, meetings, reports.
    pub fn from_clients(clients: ServiceClients) -> Result<Self, ToolError> {
        Self::new(vec![
            Box::new(JobTools::new(clients.jobs)),
            Box::new(CandidateTools::new(clients.candidates)),
            Box::new(MatchingTools::new(clients.matching)),
            Box::new(MeetingTools::new(clients.meetings)),
            Box::new(ReportTools::new(clients.reports)),
        ])
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.catalog.clone()
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.catalog.iter().find(|d| d.name == name)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Arguments,
    ) -> Result<ToolResult, ToolError> {
        let tenant = current_tenant().unwrap_or_else(|| "-".to_string());
        info!("Dispatching tool '{}' for tenant {}", name, tenant);

        for group in &self.groups {
            if let Some(result) = group.call(name, arguments).await {
                if result.is_error {
                    warn!("Tool '{}' ({}) reported an error", name, group.name());
                } else {
                    debug!("Tool '{}' handled by {}", name, group.name());
                }
                return Ok(result);
            }
        }

        warn!("Tool '{}' not found in any group", name);
        Err(ToolError::NotFound {
            name: name.to_string(),
        })
    }
}
