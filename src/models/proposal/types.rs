use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle states of a proposal. `Flagged` is stored and served but no
/// transition produces it; it exists for records imported from review
/// tooling that marks suspect submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Activated,
    Flagged,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Activated => "activated",
            ProposalStatus::Flagged => "flagged",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProposalStatus::Pending),
            "approved" => Ok(ProposalStatus::Approved),
            "rejected" => Ok(ProposalStatus::Rejected),
            "activated" => Ok(ProposalStatus::Activated),
            "flagged" => Ok(ProposalStatus::Flagged),
            other => Err(format!("Unknown proposal status: {other}")),
        }
    }
}

/// Who approved a record, and when.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStamp {
    pub approved_by: String,
    pub uid: i64,
    pub timestamp: String,
}

/// One entry of the student-facing progress checklist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub label: String,
    pub detail: String,
    pub done: bool,
    pub timestamp: Option<String>,
}

/// Full proposal as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub research_area: String,
    pub group_members: String,
    pub submitted_by: i64,
    pub submitted_by_name: String,
    pub supervisor_id: Option<i64>,
    pub supervisor_name: String,
    pub similarity_score: i64,
    pub status: ProposalStatus,
    pub forwarded_to_coordinator: bool,
    pub supervisor_approval: Option<ApprovalStamp>,
    pub supervisor_feedback: Option<String>,
    pub coordinator_feedback: Option<String>,
    pub coordinator_approved_by: Option<String>,
    pub coordinator_approved_at: Option<String>,
    pub rejected_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub steps: Vec<WorkflowStep>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for inserting a proposal: validated fields with the supervisor and
/// similarity score already resolved server-side.
pub struct NewProposal {
    pub title: String,
    pub description: String,
    pub research_area: String,
    pub group_members: String,
    pub submitted_by: i64,
    pub submitted_by_name: String,
    pub supervisor_id: i64,
    pub supervisor_name: String,
    pub similarity_score: i64,
}

/// One updatable field from a PATCH body. Parsing is closed over this enum:
/// a key it does not name is rejected rather than silently dropped, so
/// provenance columns can never be set from the wire.
#[derive(Debug, Clone)]
pub enum ProposalPatch {
    Title(String),
    Description(String),
    ResearchArea(String),
    GroupMembers(String),
    Status(ProposalStatus),
    SupervisorFeedback(String),
    CoordinatorFeedback(String),
}

impl ProposalPatch {
    pub fn field_name(&self) -> &'static str {
        match self {
            ProposalPatch::Title(_) => "title",
            ProposalPatch::Description(_) => "description",
            ProposalPatch::ResearchArea(_) => "researchArea",
            ProposalPatch::GroupMembers(_) => "groupMembers",
            ProposalPatch::Status(_) => "status",
            ProposalPatch::SupervisorFeedback(_) => "supervisorFeedback",
            ProposalPatch::CoordinatorFeedback(_) => "coordinatorFeedback",
        }
    }

    /// Plain content fields a student may edit outside a status transition.
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            ProposalPatch::Title(_)
                | ProposalPatch::Description(_)
                | ProposalPatch::ResearchArea(_)
                | ProposalPatch::GroupMembers(_)
        )
    }

    fn from_field(key: &str, value: &serde_json::Value) -> Result<Self, String> {
        let as_string = || -> Result<String, String> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("Field '{key}' must be a string"))
        };
        match key {
            "title" => Ok(ProposalPatch::Title(as_string()?)),
            "description" => Ok(ProposalPatch::Description(as_string()?)),
            "researchArea" => Ok(ProposalPatch::ResearchArea(as_string()?)),
            "groupMembers" => Ok(ProposalPatch::GroupMembers(as_string()?)),
            "status" => {
                let raw = as_string()?;
                let status = raw
                    .parse::<ProposalStatus>()
                    .map_err(|_| format!("Unknown status '{raw}'"))?;
                Ok(ProposalPatch::Status(status))
            }
            "supervisorFeedback" => Ok(ProposalPatch::SupervisorFeedback(as_string()?)),
            "coordinatorFeedback" => Ok(ProposalPatch::CoordinatorFeedback(as_string()?)),
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
