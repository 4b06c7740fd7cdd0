// src/cards/formatters.rs
//! Per-tool card formatters. Downstream services are not consistent about field names,
//! so every logical field is looked up under several keys.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use super::{Card, CardSection, Formatter};
use crate::utils::display_value;

/// Largest number of list entries shown on one card.
const MAX_LIST_ITEMS: usize = 10;

pub(super) const FORMATTERS: &[(&str, Formatter)] = &[
    ("list_jobs", job_list),
    ("get_job", job_detail),
    ("create_job", job_detail),
    ("update_job", job_detail),
    ("list_candidates", candidate_list),
    ("get_candidate", candidate_detail),
    ("create_candidate", candidate_detail),
    ("update_candidate_status", candidate_detail),
    ("match_candidates", match_list),
    ("get_match_results", match_list),
    ("list_meetings", meeting_list),
    ("schedule_meeting", meeting_detail),
    ("generate_report", report_detail),
    ("get_report", report_detail),
];

/// Tools whose results are acknowledgements; shown raw.
pub const RAW_FALLBACK_TOOLS: &[&str] =
    &["delete_job", "delete_candidate", "cancel_meeting", "send_report"];

const ID_KEYS: &[&str] = &["id", "_id", "uuid"];

fn pick<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .find(|value| !value.is_null())
}

fn pick_text(data: &Value, keys: &[&str]) -> Option<String> {
    pick(data, keys)
        .map(display_value)
        .filter(|text| !text.is_empty())
}

fn pick_date(data: &Value, keys: &[&str]) -> Option<String> {
    pick_text(data, keys).map(|raw| humanize_date(&raw))
}

/// `2026-03-01T14:00:00+01:00` → `Sun 01 Mar 2026, 14:00 (+01:00)`. Unparsable input is
/// returned unchanged.
pub(super) fn humanize_date(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%a %d %b %Y, %H:%M (%:z)").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%a %d %b %Y").to_string();
    }
    raw.to_string()
}

fn percent(value: &Value) -> Option<String> {
    let score = value.as_f64()?;
    if score <= 1.0 {
        Some(format!("{:.0}%", score * 100.0))
    } else {
        Some(format!("{:.0}%", score))
    }
}

/// A bare array, or an object wrapping one under a known key.
fn list_items<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    if let Some(items) = data.as_array() {
        return Some(items);
    }
    keys.iter()
        .chain(["items", "data", "results"].iter())
        .filter_map(|key| data.get(*key))
        .find_map(Value::as_array)
}

fn count_subtitle(shown: usize, total: usize, noun: &str) -> Option<String> {
    if total > shown {
        Some(format!("Showing {} of {} {}", shown, total, noun))
    } else {
        Some(format!("{} {}", total, noun))
    }
}

fn job_list(data: &Value) -> Option<Card> {
    let jobs = list_items(data, &["jobs"])?;
    let mut card = Card::new("Job openings").subtitle(count_subtitle(
        jobs.len().min(MAX_LIST_ITEMS),
        jobs.len(),
        "jobs",
    ));
    for job in jobs.iter().take(MAX_LIST_ITEMS) {
        card = card.section(
            CardSection::titled(
                pick_text(job, &["title", "job_title", "name"])
                    .unwrap_or_else(|| "Untitled job".to_string()),
            )
            .fact("ID", pick_text(job, ID_KEYS))
            .fact("Location", pick_text(job, &["location", "city"]))
            .fact("Status", pick_text(job, &["status", "state"])),
        );
    }
    Some(card)
}

fn job_detail(data: &Value) -> Option<Card> {
    let job = data.get("job").unwrap_or(data);
    job.as_object()?;

    let title =
        pick_text(job, &["title", "job_title", "name"]).unwrap_or_else(|| "Job".to_string());
    let card = Card::new(title)
        .subtitle(pick_text(job, &["department", "team"]))
        .section(
            CardSection::default()
                .fact("ID", pick_text(job, ID_KEYS))
                .fact("Location", pick_text(job, &["location", "city"]))
                .fact("Type", pick_text(job, &["employment_type", "type", "contract_type"]))
                .fact("Salary", pick_text(job, &["salary_range", "salary"]))
                .fact("Status", pick_text(job, &["status", "state"]))
                .fact("Posted", pick_date(job, &["created_at", "posted_at", "createdAt"])),
        )
        .section(
            CardSection::titled("Description")
                .text(pick_text(job, &["description", "summary", "details"])),
        )
        .action("Open posting", pick_text(job, &["url", "link", "posting_url"]));
    Some(card)
}

fn candidate_list(data: &Value) -> Option<Card> {
    let candidates = list_items(data, &["candidates"])?;
    let mut card = Card::new("Candidates").subtitle(count_subtitle(
        candidates.len().min(MAX_LIST_ITEMS),
        candidates.len(),
        "candidates",
    ));
    for candidate in candidates.iter().take(MAX_LIST_ITEMS) {
        card = card.section(
            CardSection::titled(
                pick_text(candidate, &["name", "full_name", "fullName"])
                    .unwrap_or_else(|| "Unnamed candidate".to_string()),
            )
            .fact("ID", pick_text(candidate, ID_KEYS))
            .fact("Email", pick_text(candidate, &["email", "email_address"]))
            .fact("Status", pick_text(candidate, &["status", "stage"])),
        );
    }
    Some(card)
}

fn candidate_detail(data: &Value) -> Option<Card> {
    let candidate = data.get("candidate").unwrap_or(data);
    candidate.as_object()?;

    let name = pick_text(candidate, &["name", "full_name", "fullName"])
        .unwrap_or_else(|| "Candidate".to_string());
    let card = Card::new(name)
        .subtitle(pick_text(candidate, &["headline", "current_title", "title"]))
        .section(
            CardSection::default()
                .fact("ID", pick_text(candidate, ID_KEYS))
                .fact("Email", pick_text(candidate, &["email", "email_address"]))
                .fact("Phone", pick_text(candidate, &["phone", "phone_number"]))
                .fact("Status", pick_text(candidate, &["status", "stage"]))
                .fact("Skills", pick_text(candidate, &["skills", "tags"]))
                .fact("Updated", pick_date(candidate, &["updated_at", "updatedAt"])),
        )
        .section(CardSection::titled("Notes").text(pick_text(candidate, &["notes", "summary"])))
        .action("Resume", pick_text(candidate, &["resume_url", "cv_url", "resume"]));
    Some(card)
}

fn match_list(data: &Value) -> Option<Card> {
    let matches = list_items(data, &["matches", "candidates", "ranking"])?;
    let subtitle = pick_text(data, &["job_title", "job_id"])
        .map(|job| format!("For {}", job))
        .or_else(|| count_subtitle(matches.len().min(MAX_LIST_ITEMS), matches.len(), "matches"));

    let mut card = Card::new("Candidate matches").subtitle(subtitle);
    for (rank, entry) in matches.iter().take(MAX_LIST_ITEMS).enumerate() {
        let candidate = entry.get("candidate").unwrap_or(entry);
        let name = pick_text(candidate, &["name", "full_name", "candidate_name"])
            .or_else(|| pick_text(entry, &["candidate_name", "candidate_id"]))
            .unwrap_or_else(|| "Candidate".to_string());
        card = card.section(
            CardSection::titled(format!("{}. {}", rank + 1, name))
                .fact(
                    "Score",
                    pick(entry, &["score", "match_score", "similarity"]).and_then(percent),
                )
                .fact(
                    "Candidate ID",
                    pick_text(entry, &["candidate_id"]).or_else(|| pick_text(candidate, ID_KEYS)),
                )
                .text(pick_text(entry, &["explanation", "reason", "summary"])),
        );
    }
    Some(card)
}

fn meeting_list(data: &Value) -> Option<Card> {
    let meetings = list_items(data, &["meetings", "events"])?;
    let mut card = Card::new("Interviews").subtitle(count_subtitle(
        meetings.len().min(MAX_LIST_ITEMS),
        meetings.len(),
        "meetings",
    ));
    for meeting in meetings.iter().take(MAX_LIST_ITEMS) {
        card = card.section(
            CardSection::titled(
                pick_text(meeting, &["title", "subject", "summary"])
                    .unwrap_or_else(|| "Interview".to_string()),
            )
            .fact("When", pick_date(meeting, &["start_time", "start", "startTime"]))
            .fact("Candidate", pick_text(meeting, &["candidate_name", "candidate_id"]))
            .fact("ID", pick_text(meeting, ID_KEYS)),
        );
    }
    Some(card)
}

fn meeting_detail(data: &Value) -> Option<Card> {
    let meeting = data.get("meeting").unwrap_or(data);
    meeting.as_object()?;

    let title = pick_text(meeting, &["title", "subject", "summary"])
        .unwrap_or_else(|| "Interview scheduled".to_string());
    let card = Card::new(title)
        .subtitle(pick_date(meeting, &["start_time", "start", "startTime"]))
        .section(
            CardSection::default()
                .fact("ID", pick_text(meeting, ID_KEYS))
                .fact("Candidate", pick_text(meeting, &["candidate_name", "candidate_id"]))
                .fact(
                    "Duration",
                    pick_text(meeting, &["duration_minutes", "duration"])
                        .map(|m| format!("{} min", m)),
                )
                .fact("Attendees", pick_text(meeting, &["attendees", "participants"]))
                .fact("Status", pick_text(meeting, &["status"])),
        )
        .action("Join", pick_text(meeting, &["meeting_url", "join_url", "location_url"]))
        .action("Calendar", pick_text(meeting, &["calendar_url", "ics_url"]));
    Some(card)
}

fn report_detail(data: &Value) -> Option<Card> {
    let report = data.get("report").unwrap_or(data);
    report.as_object()?;

    let kind = pick_text(report, &["report_type", "type", "kind"]);
    let title = pick_text(report, &["title", "name"])
        .or_else(|| kind.as_ref().map(|k| format!("{} report", k.replace('_', " "))))
        .unwrap_or_else(|| "Report".to_string());

    let mut summary = CardSection::titled("Summary");
    if let Some(metrics) =
        pick(report, &["metrics", "summary", "stats"]).and_then(Value::as_object)
    {
        for (label, value) in metrics {
            summary = summary.fact(&label.replace('_', " "), Some(display_value(value)));
        }
    } else {
        summary = summary.text(pick_text(report, &["summary", "content", "body"]));
    }

    let card = Card::new(title)
        .subtitle(pick_text(report, &["period", "range"]))
        .section(
            CardSection::default()
                .fact("ID", pick_text(report, ID_KEYS))
                .fact("Status", pick_text(report, &["status", "state"]))
                .fact("Generated", pick_date(report, &["generated_at", "created_at", "createdAt"])),
        )
        .section(summary)
        .action("Download", pick_text(report, &["download_url", "url", "pdf_url"]));
    Some(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_humanize_date() {
        assert_eq!(
            humanize_date("2026-03-01T14:00:00+01:00"),
            "Sun 01 Mar 2026, 14:00 (+01:00)"
        );
        assert_eq!(humanize_date("2026-03-02"), "Mon 02 Mar 2026");
        assert_eq!(humanize_date("tomorrow"), "tomorrow");
    }

    #[test]
    fn test_job_detail_reads_alternate_keys() {
        let card = job_detail(&json!({
            "job": {"job_title": "Data engineer", "city": "Lyon", "_id": 12}
        }))
        .unwrap();
        assert_eq!(card.title, "Data engineer");
        let facts = &card.sections[0].facts;
        assert!(facts.iter().any(|f| f.label == "Location" && f.value == "Lyon"));
        assert!(facts.iter().any(|f| f.label == "ID" && f.value == "12"));
        assert!(card.actions.is_empty());
    }

    #[test]
    fn test_job_list_caps_entries() {
        let jobs: Vec<Value> = (0..15)
            .map(|i| json!({"id": i, "title": format!("Job {}", i)}))
            .collect();
        let card = job_list(&json!({"jobs": jobs})).unwrap();
        assert_eq!(card.sections.len(), MAX_LIST_ITEMS);
        assert_eq!(card.subtitle.as_deref(), Some("Showing 10 of 15 jobs"));
    }

    #[test]
    fn test_match_scores_as_percent() {
        let card = match_list(&json!([
            {"candidate": {"name": "Ada"}, "score": 0.87},
            {"candidate_name": "Linus", "score": 64}
        ]))
        .unwrap();
        assert_eq!(card.sections[0].title.as_deref(), Some("1. Ada"));
        assert_eq!(card.sections[0].facts[0].value, "87%");
        assert_eq!(card.sections[1].title.as_deref(), Some("2. Linus"));
        assert_eq!(card.sections[1].facts[0].value, "64%");
    }

    #[test]
    fn test_unreadable_shape_declines() {
        assert!(job_detail(&json!("just a string")).is_none());
        assert!(candidate_list(&json!({"total": 3})).is_none());
    }

    #[test]
    fn test_meeting_detail_links() {
        let card = meeting_detail(&json!({
            "id": "m-1",
            "start_time": "2026-03-01T14:00:00Z",
            "duration_minutes": 45,
            "join_url": "https://meet.example.com/abc"
        }))
        .unwrap();
        assert_eq!(card.title, "Interview scheduled");
        assert_eq!(card.subtitle.as_deref(), Some("Sun 01 Mar 2026, 14:00 (+00:00)"));
        assert_eq!(card.actions[0].url, "https://meet.example.com/abc");
    }
}
