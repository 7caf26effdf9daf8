//! Stage gating decisions.
//!
//! Everything here is a pure function of an applicant's [`PipelineView`]: the interview
//! history plus the offer and onboarding markers stored on the applicant. The service layer is
//! the only caller that turns a refusal into a reported error.

mod history;
pub mod offer;

pub use history::StageAttempts;

use serde::{Deserialize, Serialize};

use super::catalog::StageId;
use super::domain::{
    ApplicantRecord, ApplicantStatus, InterviewId, InterviewRecord, InterviewResult,
    Interviewer, InterviewerId, OfferStatus,
};
use super::views::StageStatusView;

/// Everything the gates look at when deciding for one applicant.
#[derive(Debug, Clone, Copy)]
pub struct PipelineView<'a> {
    pub history: &'a [InterviewRecord],
    pub offer_status: OfferStatus,
    pub screened: bool,
    pub onboarded: bool,
}

impl<'a> PipelineView<'a> {
    /// View over a bare history with no offer response, screening, or onboarding recorded.
    pub fn new(history: &'a [InterviewRecord]) -> Self {
        Self {
            history,
            offer_status: OfferStatus::Pending,
            screened: false,
            onboarded: false,
        }
    }

    pub fn for_applicant(applicant: &ApplicantRecord, history: &'a [InterviewRecord]) -> Self {
        Self {
            history,
            offer_status: applicant.offer_status,
            screened: applicant.screening.is_some(),
            onboarded: applicant.is_onboarded(),
        }
    }

    pub fn with_offer(mut self, offer_status: OfferStatus) -> Self {
        self.offer_status = offer_status;
        self
    }

    pub fn attempts(&self, stage: StageId) -> StageAttempts<'a> {
        StageAttempts::collect(self.history, stage)
    }

    pub fn final_passed(&self) -> bool {
        self.attempts(StageId::Final).passed()
    }
}

/// Where an applicant stands in the stage sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The stage has no live interview yet.
    Open { stage: StageId },
    /// The stage has an interview waiting for interviewer feedback.
    AwaitingResult {
        stage: StageId,
        interview_id: InterviewId,
    },
    /// The latest attempt failed but the stage permits another one.
    RetryAvailable { stage: StageId, attempts: u8 },
    /// The stage failed with no attempts left.
    Halted { stage: StageId },
    /// Every stage passed.
    Complete,
}

impl Progress {
    pub fn stage(&self) -> StageId {
        match self {
            Progress::Open { stage }
            | Progress::AwaitingResult { stage, .. }
            | Progress::RetryAvailable { stage, .. }
            | Progress::Halted { stage } => *stage,
            Progress::Complete => StageId::Offer,
        }
    }
}

/// Walk the catalog in order and stop at the first stage that has not passed.
pub fn progress(history: &[InterviewRecord]) -> Progress {
    for stage in StageId::ordered() {
        let attempts = StageAttempts::collect(history, stage);
        let Some(effective) = attempts.effective() else {
            return Progress::Open { stage };
        };

        match effective.result {
            InterviewResult::Pass => continue,
            InterviewResult::Pending => {
                return Progress::AwaitingResult {
                    stage,
                    interview_id: effective.id.clone(),
                }
            }
            InterviewResult::Fail if attempts.has_retry_left() => {
                return Progress::RetryAvailable {
                    stage,
                    attempts: attempts.count() as u8,
                }
            }
            InterviewResult::Fail => return Progress::Halted { stage },
        }
    }

    Progress::Complete
}

/// The stage an applicant is on: the next one to schedule, the one awaiting a result, or the
/// one that halted the pipeline. Returns the offer stage once everything has passed.
pub fn current_eligible_stage(history: &[InterviewRecord]) -> StageId {
    progress(history).stage()
}

/// Reasons a scheduling request is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleBlock {
    #[error("{requested} is locked; the applicant is currently at {current}")]
    StageLocked { requested: StageId, current: StageId },
    #[error("{stage} already has interview {interview_id} awaiting a result")]
    AwaitingResult {
        stage: StageId,
        interview_id: InterviewId,
    },
    #[error("{stage} allows at most {limit} attempts")]
    RetryLimitExceeded { stage: StageId, limit: u8 },
    #[error("pipeline halted after a failed {stage}")]
    PipelineHalted { stage: StageId },
    #[error("every stage has already passed")]
    PipelineComplete,
    #[error("applicant is {} and cannot be scheduled", .status.label())]
    PipelineClosed { status: ApplicantStatus },
    #[error("no interviewer serves the '{function}' function")]
    NoEligibleInterviewer { function: String },
    #[error("interviewer {interviewer_id} does not serve the '{function}' function")]
    InterviewerMismatch {
        interviewer_id: InterviewerId,
        function: String,
    },
}

impl ScheduleBlock {
    pub const fn reason(&self) -> &'static str {
        match self {
            ScheduleBlock::StageLocked { .. } => "stage_locked",
            ScheduleBlock::AwaitingResult { .. } => "awaiting_result",
            ScheduleBlock::RetryLimitExceeded { .. } => "retry_limit_exceeded",
            ScheduleBlock::PipelineHalted { .. } => "pipeline_halted",
            ScheduleBlock::PipelineComplete => "pipeline_complete",
            ScheduleBlock::PipelineClosed { .. } => "pipeline_closed",
            ScheduleBlock::NoEligibleInterviewer { .. } => "no_eligible_interviewer",
            ScheduleBlock::InterviewerMismatch { .. } => "interviewer_mismatch",
        }
    }
}

/// Decide whether `stage` may be scheduled, returning the attempt number the new interview
/// would carry.
pub fn can_schedule(stage: StageId, view: &PipelineView<'_>) -> Result<u8, ScheduleBlock> {
    // An exhausted retry budget outranks every other refusal.
    let attempts = view.attempts(stage);
    let limit = stage.attempt_limit();
    if limit > 1 && !attempts.has_retry_left() {
        return Err(ScheduleBlock::RetryLimitExceeded { stage, limit });
    }

    if view.onboarded {
        return Err(ScheduleBlock::PipelineClosed {
            status: ApplicantStatus::Onboarded,
        });
    }
    if view.offer_status == OfferStatus::Rejected {
        return Err(ScheduleBlock::PipelineClosed {
            status: ApplicantStatus::Rejected,
        });
    }

    let current = match progress(view.history) {
        Progress::Halted { stage } => return Err(ScheduleBlock::PipelineHalted { stage }),
        Progress::Complete => return Err(ScheduleBlock::PipelineComplete),
        other => other.stage(),
    };

    if stage != current {
        return Err(ScheduleBlock::StageLocked {
            requested: stage,
            current,
        });
    }

    if let Some(pending) = attempts.awaiting_result() {
        return Err(ScheduleBlock::AwaitingResult {
            stage,
            interview_id: pending.id.clone(),
        });
    }
    if !attempts.has_retry_left() {
        return Err(ScheduleBlock::RetryLimitExceeded { stage, limit });
    }

    Ok(attempts.count() as u8 + 1)
}

/// Check the interviewer constraint for stages that require a function match.
///
/// `candidates` is the directory's answer for the job function; it is filtered again here so a
/// loose directory match cannot unlock the stage.
pub fn check_interviewer(
    stage: StageId,
    job_function: &str,
    interviewer: &Interviewer,
    candidates: &[Interviewer],
) -> Result<(), ScheduleBlock> {
    if !stage.requires_function_match() {
        return Ok(());
    }

    if !candidates
        .iter()
        .any(|candidate| candidate.serves_function(job_function))
    {
        return Err(ScheduleBlock::NoEligibleInterviewer {
            function: job_function.to_string(),
        });
    }

    if !interviewer.serves_function(job_function) {
        return Err(ScheduleBlock::InterviewerMismatch {
            interviewer_id: interviewer.id.clone(),
            function: job_function.to_string(),
        });
    }

    Ok(())
}

/// Recompute the applicant status from the view. First matching rule wins.
pub fn derive_status(view: &PipelineView<'_>) -> ApplicantStatus {
    if view.onboarded {
        return ApplicantStatus::Onboarded;
    }

    if matches!(progress(view.history), Progress::Halted { .. })
        || view.offer_status == OfferStatus::Rejected
    {
        return ApplicantStatus::Rejected;
    }

    if view.final_passed() {
        return match view.offer_status {
            OfferStatus::Accepted => ApplicantStatus::Hired,
            _ => ApplicantStatus::Offered,
        };
    }

    if !view.history.is_empty() {
        return ApplicantStatus::Interviewing;
    }

    if view.screened {
        ApplicantStatus::Screening
    } else {
        ApplicantStatus::Applied
    }
}

/// Per-stage display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Locked,
    Current,
    Scheduled,
    Passed,
    Failed,
}

impl StageState {
    pub const fn label(self) -> &'static str {
        match self {
            StageState::Locked => "locked",
            StageState::Current => "current",
            StageState::Scheduled => "scheduled",
            StageState::Passed => "passed",
            StageState::Failed => "failed",
        }
    }
}

/// One entry per catalog stage, in catalog order.
pub fn stage_board(view: &PipelineView<'_>) -> Vec<StageStatusView> {
    let progress = progress(view.history);
    let current = progress.stage();

    StageId::ordered()
        .into_iter()
        .map(|stage| {
            let attempts = view.attempts(stage);
            let state = if progress == Progress::Complete || stage < current {
                StageState::Passed
            } else if stage > current {
                StageState::Locked
            } else {
                match progress {
                    Progress::AwaitingResult { .. } => StageState::Scheduled,
                    Progress::Halted { .. } => StageState::Failed,
                    _ => StageState::Current,
                }
            };

            StageStatusView {
                stage: stage.stage(),
                state,
                attempts: attempts.count() as u8,
                interview_id: attempts.effective().map(|interview| interview.id.clone()),
            }
        })
        .collect()
}
