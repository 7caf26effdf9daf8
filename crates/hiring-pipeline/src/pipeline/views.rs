use serde::Serialize;

use super::catalog::Stage;
use super::domain::{InterviewId, InterviewRecord, Interviewer};
use super::gate::StageState;

/// Stage board entry rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStatusView {
    pub stage: Stage,
    pub state: StageState,
    /// Attempt slots used for the stage, cancelled interviews included.
    pub attempts: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_id: Option<InterviewId>,
}

/// Interview with its stage and interviewer embedded for listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewView {
    #[serde(flatten)]
    pub interview: InterviewRecord,
    pub stage_detail: Stage,
    /// `None` when the directory no longer lists the interviewer.
    pub interviewer: Option<Interviewer>,
}
