use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::StageId;

/// Identifier wrapper for applicants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier wrapper for scheduled interviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterviewId(pub String);

/// Identifier of an interviewer in the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterviewerId(pub String);

/// Identifier of a job posting owned by the job service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier of an employee created by the onboarding service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InterviewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inbound application captured when a candidate applies to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub resume_ref: Option<String>,
    pub job_id: JobId,
}

/// Opaque output of the resume screening collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningSummary {
    pub score: u16,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Pipeline status cached on the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Applied,
    Screening,
    Interviewing,
    Offered,
    Hired,
    Rejected,
    Onboarded,
}

impl ApplicantStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicantStatus::Applied => "applied",
            ApplicantStatus::Screening => "screening",
            ApplicantStatus::Interviewing => "interviewing",
            ApplicantStatus::Offered => "offered",
            ApplicantStatus::Hired => "hired",
            ApplicantStatus::Rejected => "rejected",
            ApplicantStatus::Onboarded => "onboarded",
        }
    }

    /// No further pipeline transitions are possible from a closed status.
    pub const fn is_closed(self) -> bool {
        matches!(self, ApplicantStatus::Rejected | ApplicantStatus::Onboarded)
    }
}

/// Candidate response to an extended offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
        }
    }
}

/// Stored applicant with the derived pipeline status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub id: ApplicantId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_ref: Option<String>,
    pub job_id: JobId,
    pub status: ApplicantStatus,
    pub offer_status: OfferStatus,
    pub screening: Option<ScreeningSummary>,
    pub employee_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicantRecord {
    pub fn is_onboarded(&self) -> bool {
        self.employee_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewResult {
    Pending,
    Pass,
    Fail,
}

impl InterviewResult {
    pub const fn is_final(self) -> bool {
        matches!(self, InterviewResult::Pass | InterviewResult::Fail)
    }

    pub const fn label(self) -> &'static str {
        match self {
            InterviewResult::Pending => "pending",
            InterviewResult::Pass => "pass",
            InterviewResult::Fail => "fail",
        }
    }
}

/// One scheduled occurrence of a stage for an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: InterviewId,
    pub applicant_id: ApplicantId,
    pub stage: StageId,
    pub interviewer_id: InterviewerId,
    pub scheduled_for: DateTime<Utc>,
    /// 1-based attempt number within the stage; only the final stage reaches 2.
    pub attempt: u8,
    pub status: InterviewStatus,
    pub result: InterviewResult,
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InterviewRecord {
    /// Cancelled interviews keep their attempt slot but never carry a result.
    pub fn is_live(&self) -> bool {
        self.status != InterviewStatus::Cancelled
    }

    pub fn is_awaiting_result(&self) -> bool {
        self.is_live() && self.result == InterviewResult::Pending
    }

    /// Ordering key for "most recent attempt wins".
    pub fn recency(&self) -> (DateTime<Utc>, u8) {
        (self.created_at, self.attempt)
    }
}

/// Interviewer as published by the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: InterviewerId,
    pub name: String,
    pub position: String,
    pub interview_type: String,
    pub function: String,
}

impl Interviewer {
    pub fn serves_function(&self, function: &str) -> bool {
        self.function.trim().eq_ignore_ascii_case(function.trim())
    }
}

/// Job posting fields consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub function: String,
    pub department: String,
}

/// Request sent to the employee onboarding collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub applicant_id: ApplicantId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub title: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub applicant_id: ApplicantId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub title: String,
    pub grade: String,
}

/// Caller supplied onboarding fields; department and title default to the job posting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnboardingDetails {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub grade: String,
}

/// Validated scheduling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub applicant_id: ApplicantId,
    pub stage: StageId,
    pub interviewer_id: InterviewerId,
    pub scheduled_for: DateTime<Utc>,
}

/// New slot for an interview that is still waiting for feedback. The interviewer is kept
/// unless a replacement is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleRequest {
    pub scheduled_for: DateTime<Utc>,
    pub interviewer_id: Option<InterviewerId>,
}

/// Interviewer feedback for a scheduled interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub result: InterviewResult,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
