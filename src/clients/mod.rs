// src/clients/mod.rs
//! One thin HTTP binding per downstream recruitment service

pub mod candidates;
pub mod jobs;
pub mod matching;
pub mod meetings;
pub mod reports;

pub use candidates::CandidatesClient;
pub use jobs::JobsClient;
pub use matching::MatchingClient;
pub use meetings::MeetingsClient;
pub use reports::ReportsClient;

use anyhow::Result;

use crate::environment::ServicesConfig;

/// Quick CRUD services.
pub const DEFAULT_CRUD_TIMEOUT_SECS: u64 = 10;
/// Matching and report generation run model inference downstream.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ServiceClients {
    pub jobs: JobsClient,
    pub candidates: CandidatesClient,
    pub matching: MatchingClient,
    pub meetings: MeetingsClient,
    pub reports: ReportsClient,
}

impl ServiceClients {
    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            jobs: JobsClient::new(
                &config.jobs.base_url,
                config.jobs.timeout_or(DEFAULT_CRUD_TIMEOUT_SECS),
            )?,
            candidates: CandidatesClient::new(
                &config.candidates.base_url,
                config.candidates.timeout_or(DEFAULT_CRUD_TIMEOUT_SECS),
            )?,
            matching: MatchingClient::new(
                &config.matching.base_url,
                config.matching.timeout_or(DEFAULT_GENERATION_TIMEOUT_SECS),
            )?,
            meetings: MeetingsClient::new(
                &config.meetings.base_url,
                config.meetings.timeout_or(DEFAULT_CRUD_TIMEOUT_SECS),
            )?,
            reports: ReportsClient::new(
                &config.reports.base_url,
                config.reports.timeout_or(DEFAULT_GENERATION_TIMEOUT_SECS),
            )?,
        })
    }

    /// Every service behind one base URL, default timeouts. Handy for tests and demos.
    pub fn single_host(base_url: &str) -> Result<Self> {
        use crate::environment::ServiceEndpoint;

        let endpoint = ServiceEndpoint {
            base_url: base_url.to_string(),
            timeout_secs: None,
        };
        Self::from_config(&ServicesConfig {
            jobs: endpoint.clone(),
            candidates: endpoint.clone(),
            matching: endpoint.clone(),
            meetings: endpoint.clone(),
            reports: endpoint,
        })
    }
}
