use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::proposal::ApprovalStamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogbookStatus {
    Pending,
    Approved,
    Rejected,
}

impl LogbookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogbookStatus::Pending => "pending",
            LogbookStatus::Approved => "approved",
            LogbookStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LogbookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogbookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LogbookStatus::Pending),
            "approved" => Ok(LogbookStatus::Approved),
            "rejected" => Ok(LogbookStatus::Rejected),
            other => Err(format!("Unknown logbook status: {other}")),
        }
    }
}

/// A weekly logbook entry as served to clients. The list fields are stored
/// as JSON arrays in TEXT columns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Logbook {
    pub id: i64,
    pub proposal_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub supervisor_id: Option<i64>,
    pub supervisor_name: String,
    pub project_title: String,
    pub week_no: i64,
    pub meeting_no: i64,
    pub term: String,
    pub date_range: String,
    pub work_done: Vec<String>,
    pub discussion: Vec<String>,
    pub problems: Vec<String>,
    pub further_notes: String,
    pub status: LogbookStatus,
    pub locked: bool,
    pub supervisor_feedback: Option<String>,
    pub digital_approval: Option<ApprovalStamp>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for inserting a logbook, with project fields already denormalised
/// from the student's activated proposal.
pub struct NewLogbook {
    pub proposal_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub supervisor_id: Option<i64>,
    pub supervisor_name: String,
    pub project_title: String,
    pub week_no: i64,
    pub meeting_no: i64,
    pub term: String,
    pub date_range: String,
    pub work_done: Vec<String>,
    pub discussion: Vec<String>,
    pub problems: Vec<String>,
    pub further_notes: String,
}

/// One updatable field from a PATCH body; unknown keys are rejected.
#[derive(Debug, Clone)]
pub enum LogbookPatch {
    WeekNo(i64),
    MeetingNo(i64),
    Term(String),
    DateRange(String),
    WorkDone(Vec<String>),
    Discussion(Vec<String>),
    Problems(Vec<String>),
    FurtherNotes(String),
    Status(LogbookStatus),
    SupervisorFeedback(String),
}

impl LogbookPatch {
    pub fn field_name(&self) -> &'static str {
        match self {
            LogbookPatch::WeekNo(_) => "weekNo",
            LogbookPatch::MeetingNo(_) => "meetingNo",
            LogbookPatch::Term(_) => "term",
            LogbookPatch::DateRange(_) => "dateRange",
            LogbookPatch::WorkDone(_) => "workDone",
            LogbookPatch::Discussion(_) => "discussion",
            LogbookPatch::Problems(_) => "problems",
            LogbookPatch::FurtherNotes(_) => "furtherNotes",
            LogbookPatch::Status(_) => "status",
            LogbookPatch::SupervisorFeedback(_) => "supervisorFeedback",
        }
    }

    /// Plain content fields the owning student may edit while unlocked.
    pub fn is_content(&self) -> bool {
        !matches!(
            self,
            LogbookPatch::Status(_) | LogbookPatch::SupervisorFeedback(_)
        )
    }

    fn from_field(key: &str, value: &serde_json::Value) -> Result<Self, String> {
        let as_string = || -> Result<String, String> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("Field '{key}' must be a string"))
        };
        let as_int = || -> Result<i64, String> {
            value
                .as_i64()
                .ok_or_else(|| format!("Field '{key}' must be an integer"))
        };
        let as_list = || -> Result<Vec<String>, String> {
            let items = value
                .as_array()
                .ok_or_else(|| format!("Field '{key}' must be an array of strings"))?;
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("Field '{key}' must be an array of strings"))
                })
                .collect()
        };
        match key {
            "weekNo" => Ok(LogbookPatch::WeekNo(as_int()?)),
            "meetingNo" => Ok(LogbookPatch::MeetingNo(as_int()?)),
            "term" => Ok(LogbookPatch::Term(as_string()?)),
            "dateRange" => Ok(LogbookPatch::DateRange(as_string()?)),
            "workDone" => Ok(LogbookPatch::WorkDone(as_list()?)),
            "discussion" => Ok(LogbookPatch::Discussion(as_list()?)),
            "problems" => Ok(LogbookPatch::Problems(as_list()?)),
            "furtherNotes" => Ok(LogbookPatch::FurtherNotes(as_string()?)),
            "status" => {
                let raw = as_string()?;
                let status = raw
                    .parse::<LogbookStatus>()
                    .map_err(|_| format!("Unknown status '{raw}'"))?;
                Ok(LogbookPatch::Status(status))
            }
            "supervisorFeedback" => Ok(LogbookPatch::SupervisorFeedback(as_string()?)),
            other => Err(format!("Field '{other}' is not updatable")),
        }
    }

    pub fn parse_object(
        body: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<Self>, String> {
        body.iter()
            .map(|(key, value)| Self::from_field(key, value))
            .collect()
    }
}
