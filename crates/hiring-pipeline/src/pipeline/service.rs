use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::catalog::StageId;
use super::domain::{
    ApplicantId, ApplicantRecord, ApplicantStatus, ApplicationSubmission, Employee,
    InterviewId, InterviewRecord, InterviewResult, InterviewStatus, Interviewer, InterviewerId,
    JobId, JobPosting, NewEmployee, OfferStatus, OnboardingDetails, RescheduleRequest,
    ResultSubmission, ScheduleRequest, ScreeningSummary,
};
use super::gate::offer::{self, OfferBlock, OnboardBlock};
use super::gate::{self, PipelineView, ScheduleBlock};
use super::locks::{ApplicantLocks, LockTimeout};
use super::repository::{
    DirectoryError, EmployeeOnboarding, OnboardingError, PipelineChange, PipelineRepository,
    RepositoryError, TalentDirectory,
};
use super::views::{InterviewView, StageStatusView};
use crate::config::PipelineConfig;

/// Service composing the stage gates, repository, and external collaborators.
pub struct PipelineService<R, D, E> {
    repository: Arc<R>,
    directory: Arc<D>,
    employees: Arc<E>,
    locks: ApplicantLocks,
}

static APPLICANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_applicant_id() -> ApplicantId {
    let id = APPLICANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicantId(format!("apl-{id:06}"))
}

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

impl<R, D, E> PipelineService<R, D, E>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        employees: Arc<E>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            employees,
            locks: ApplicantLocks::new(config.lock_timeout),
        }
    }

    /// Register a new applicant in the `applied` state.
    pub fn submit_application(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicantRecord, PipelineServiceError> {
        let name = required("name", &submission.name)?;
        let email = required("email", &submission.email)?;
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail(email).into());
        }

        if self.directory.job(&submission.job_id)?.is_none() {
            return Err(NotFound::Job(submission.job_id).into());
        }

        let now = Utc::now();
        let record = ApplicantRecord {
            id: next_applicant_id(),
            name,
            email: email.clone(),
            phone: submission.phone.trim().to_string(),
            resume_ref: submission.resume_ref,
            job_id: submission.job_id,
            status: ApplicantStatus::Applied,
            offer_status: OfferStatus::Pending,
            screening: None,
            employee_id: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self
            .repository
            .insert_applicant(record)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    PipelineServiceError::from(StateConflict::DuplicateApplicant(email))
                }
                other => other.into(),
            })?;

        info!(applicant_id = %stored.id, job_id = %stored.job_id, "application submitted");
        Ok(stored)
    }

    /// Attach the resume screening collaborator's score and question set.
    pub fn attach_screening(
        &self,
        applicant_id: &ApplicantId,
        screening: ScreeningSummary,
    ) -> Result<ApplicantRecord, PipelineServiceError> {
        if screening
            .questions
            .iter()
            .any(|question| question.trim().is_empty())
        {
            return Err(ValidationError::MissingField("questions").into());
        }

        let _guard = self.locks.acquire(applicant_id)?;
        let mut applicant = self.load_applicant(applicant_id)?;
        if applicant.status.is_closed() {
            return Err(StateConflict::ApplicantClosed {
                status: applicant.status,
            }
            .into());
        }

        let history = self.repository.interviews_for(applicant_id)?;
        applicant.screening = Some(screening);
        let applicant = self.commit(applicant, &history, None)?;

        info!(
            applicant_id = %applicant.id,
            status = applicant.status.label(),
            "screening attached"
        );
        Ok(applicant)
    }

    /// Schedule the applicant's current stage with the chosen interviewer.
    pub fn schedule_stage(
        &self,
        request: ScheduleRequest,
    ) -> Result<InterviewRecord, PipelineServiceError> {
        let ScheduleRequest {
            applicant_id,
            stage,
            interviewer_id,
            scheduled_for,
        } = request;

        let _guard = self.locks.acquire(&applicant_id)?;
        let applicant = self.load_applicant(&applicant_id)?;
        let interviewer = self
            .directory
            .interviewer(&interviewer_id)?
            .ok_or_else(|| NotFound::Interviewer(interviewer_id.clone()))?;
        let mut history = self.repository.interviews_for(&applicant_id)?;

        let view = PipelineView::for_applicant(&applicant, &history);
        let attempt = gate::can_schedule(stage, &view).map_err(|block| {
            warn!(
                applicant_id = %applicant_id,
                %stage,
                reason = block.reason(),
                "stage scheduling refused"
            );
            block
        })?;

        if stage.requires_function_match() {
            self.check_interviewer(&applicant, stage, &interviewer)?;
        }

        let interview = InterviewRecord {
            id: next_interview_id(),
            applicant_id: applicant_id.clone(),
            stage,
            interviewer_id,
            scheduled_for,
            attempt,
            status: InterviewStatus::Scheduled,
            result: InterviewResult::Pending,
            feedback: None,
            notes: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        history.push(interview.clone());
        let applicant = self.commit(applicant, &history, Some(interview.clone()))?;

        info!(
            applicant_id = %applicant.id,
            interview_id = %interview.id,
            %stage,
            attempt,
            status = applicant.status.label(),
            "stage scheduled"
        );
        Ok(interview)
    }

    /// Record interviewer feedback and recompute the applicant status in the same commit.
    pub fn record_result(
        &self,
        interview_id: &InterviewId,
        submission: ResultSubmission,
    ) -> Result<ApplicantRecord, PipelineServiceError> {
        if !submission.result.is_final() {
            return Err(ValidationError::PendingResult.into());
        }

        let applicant_id = self.load_interview(interview_id)?.applicant_id;
        let _guard = self.locks.acquire(&applicant_id)?;

        // Re-read under the lock; another operation may have finalized it meanwhile.
        let mut interview = self.load_interview(interview_id)?;
        if interview.status == InterviewStatus::Cancelled {
            return Err(StateConflict::InterviewCancelled(interview.id).into());
        }
        if interview.result.is_final() {
            return Err(StateConflict::AlreadyFinalized(interview.id).into());
        }

        let applicant = self.load_applicant(&applicant_id)?;
        if applicant.status.is_closed() {
            warn!(
                applicant_id = %applicant_id,
                interview_id = %interview.id,
                status = applicant.status.label(),
                "result refused for closed applicant"
            );
            return Err(StateConflict::ApplicantClosed {
                status: applicant.status,
            }
            .into());
        }

        let now = Utc::now();
        interview.result = submission.result;
        interview.status = InterviewStatus::Completed;
        interview.feedback = submission.feedback;
        interview.notes = submission.notes;
        interview.completed_at = Some(now);

        let history = self.history_with(&applicant_id, &interview)?;
        let applicant = self.commit(applicant, &history, Some(interview.clone()))?;

        info!(
            applicant_id = %applicant.id,
            interview_id = %interview.id,
            stage = %interview.stage,
            result = interview.result.label(),
            status = applicant.status.label(),
            "interview result recorded"
        );
        Ok(applicant)
    }

    /// Move an interview that is still waiting for feedback to a new time, optionally with a
    /// different interviewer. The interview keeps its attempt number.
    pub fn reschedule_interview(
        &self,
        interview_id: &InterviewId,
        request: RescheduleRequest,
    ) -> Result<InterviewRecord, PipelineServiceError> {
        let applicant_id = self.load_interview(interview_id)?.applicant_id;
        let _guard = self.locks.acquire(&applicant_id)?;

        let mut interview = self.load_interview(interview_id)?;
        if interview.status == InterviewStatus::Cancelled {
            return Err(StateConflict::InterviewCancelled(interview.id).into());
        }
        if interview.result.is_final() {
            return Err(StateConflict::NotReschedulable(interview.id).into());
        }

        let applicant = self.load_applicant(&applicant_id)?;
        if applicant.status.is_closed() {
            return Err(StateConflict::ApplicantClosed {
                status: applicant.status,
            }
            .into());
        }

        if let Some(interviewer_id) = request.interviewer_id {
            let interviewer = self
                .directory
                .interviewer(&interviewer_id)?
                .ok_or_else(|| NotFound::Interviewer(interviewer_id.clone()))?;
            if interview.stage.requires_function_match() {
                self.check_interviewer(&applicant, interview.stage, &interviewer)?;
            }
            interview.interviewer_id = interviewer_id;
        }
        interview.scheduled_for = request.scheduled_for;

        let history = self.history_with(&applicant_id, &interview)?;
        let applicant = self.commit(applicant, &history, Some(interview.clone()))?;

        info!(
            applicant_id = %applicant.id,
            interview_id = %interview.id,
            stage = %interview.stage,
            interviewer_id = %interview.interviewer_id,
            "interview rescheduled"
        );
        Ok(interview)
    }

    /// Record the candidate's response to the offer.
    pub fn set_offer_status(
        &self,
        applicant_id: &ApplicantId,
        offer_status: OfferStatus,
    ) -> Result<ApplicantRecord, PipelineServiceError> {
        let _guard = self.locks.acquire(applicant_id)?;
        let mut applicant = self.load_applicant(applicant_id)?;
        let mut history = self.repository.interviews_for(applicant_id)?;

        let view = PipelineView::for_applicant(&applicant, &history);
        offer::check_offer_update(&view, offer_status).map_err(|block| {
            warn!(applicant_id = %applicant_id, reason = block.reason(), "offer update refused");
            block
        })?;

        applicant.offer_status = offer_status;
        let withdrawn = if offer_status == OfferStatus::Rejected {
            withdraw_pending(&mut history)
        } else {
            None
        };
        let applicant = self.commit(applicant, &history, withdrawn)?;

        info!(
            applicant_id = %applicant.id,
            offer_status = offer_status.label(),
            status = applicant.status.label(),
            "offer status updated"
        );
        Ok(applicant)
    }

    /// Create the employee record and mark the applicant onboarded. Runs at most once.
    pub fn onboard(
        &self,
        applicant_id: &ApplicantId,
        details: OnboardingDetails,
    ) -> Result<Employee, PipelineServiceError> {
        let grade = required("grade", &details.grade)?;

        let _guard = self.locks.acquire(applicant_id)?;
        let applicant = self.load_applicant(applicant_id)?;
        let mut history = self.repository.interviews_for(applicant_id)?;

        let view = PipelineView::for_applicant(&applicant, &history);
        offer::check_onboard(&view).map_err(|block| {
            warn!(applicant_id = %applicant_id, reason = block.reason(), "onboarding refused");
            block
        })?;

        let job = self.load_job(&applicant.job_id)?;
        let request = NewEmployee {
            applicant_id: applicant.id.clone(),
            name: applicant.name.clone(),
            email: applicant.email.clone(),
            phone: applicant.phone.clone(),
            department: details.department.unwrap_or(job.department),
            title: details.title.unwrap_or(job.title),
            grade,
        };

        let employee = match self.employees.create_employee(request) {
            Ok(employee) => employee,
            Err(OnboardingError::AlreadyExists(existing)) => {
                // An earlier run created the employee but never marked the applicant.
                warn!(
                    applicant_id = %applicant_id,
                    employee_id = %existing.id.0,
                    "employee already exists; marking applicant onboarded"
                );
                let mut applicant = applicant;
                applicant.employee_id = Some(existing.id);
                let withdrawn = withdraw_pending(&mut history);
                self.commit(applicant, &history, withdrawn)?;
                return Err(OnboardBlock::AlreadyOnboarded.into());
            }
            Err(other) => return Err(other.into()),
        };

        let mut applicant = applicant;
        applicant.employee_id = Some(employee.id.clone());
        let withdrawn = withdraw_pending(&mut history);
        let applicant = self.commit(applicant, &history, withdrawn)?;

        info!(
            applicant_id = %applicant.id,
            employee_id = %employee.id.0,
            status = applicant.status.label(),
            "applicant onboarded"
        );
        Ok(employee)
    }

    /// Fetch an applicant with its current status for API responses.
    pub fn get_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<ApplicantRecord, PipelineServiceError> {
        self.load_applicant(applicant_id)
    }

    /// The stage board in catalog order.
    pub fn stage_statuses(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<StageStatusView>, PipelineServiceError> {
        let applicant = self.load_applicant(applicant_id)?;
        let history = self.repository.interviews_for(applicant_id)?;
        let view = PipelineView::for_applicant(&applicant, &history);
        Ok(gate::stage_board(&view))
    }

    /// All interviews for the applicant ordered by stage then attempt, with their stage and
    /// interviewer embedded.
    pub fn applicant_interviews(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<InterviewView>, PipelineServiceError> {
        self.load_applicant(applicant_id)?;
        let mut history = self.repository.interviews_for(applicant_id)?;
        history.sort_by(|left, right| {
            left.stage
                .cmp(&right.stage)
                .then_with(|| left.recency().cmp(&right.recency()))
                .then_with(|| left.id.cmp(&right.id))
        });

        let mut interviewers: BTreeMap<InterviewerId, Option<Interviewer>> = BTreeMap::new();
        let mut views = Vec::with_capacity(history.len());
        for interview in history {
            let interviewer = match interviewers.get(&interview.interviewer_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.directory.interviewer(&interview.interviewer_id)?;
                    interviewers.insert(interview.interviewer_id.clone(), fetched.clone());
                    fetched
                }
            };
            views.push(InterviewView {
                stage_detail: interview.stage.stage(),
                interview,
                interviewer,
            });
        }

        Ok(views)
    }

    /// Technical rounds need an interviewer from the job's function.
    fn check_interviewer(
        &self,
        applicant: &ApplicantRecord,
        stage: StageId,
        interviewer: &Interviewer,
    ) -> Result<(), PipelineServiceError> {
        let job = self.load_job(&applicant.job_id)?;
        let candidates = self.directory.interviewers_for_function(&job.function)?;
        gate::check_interviewer(stage, &job.function, interviewer, &candidates).map_err(|block| {
            warn!(
                applicant_id = %applicant.id,
                %stage,
                reason = block.reason(),
                "interviewer refused"
            );
            block.into()
        })
    }

    /// Derive the status from `history` and persist the applicant together with `interview`.
    fn commit(
        &self,
        mut applicant: ApplicantRecord,
        history: &[InterviewRecord],
        interview: Option<InterviewRecord>,
    ) -> Result<ApplicantRecord, PipelineServiceError> {
        applicant.status = gate::derive_status(&PipelineView::for_applicant(&applicant, history));
        applicant.updated_at = Utc::now();

        self.repository.commit(PipelineChange {
            applicant: applicant.clone(),
            interview,
        })?;
        Ok(applicant)
    }

    fn history_with(
        &self,
        applicant_id: &ApplicantId,
        updated: &InterviewRecord,
    ) -> Result<Vec<InterviewRecord>, RepositoryError> {
        let mut history = self.repository.interviews_for(applicant_id)?;
        match history.iter_mut().find(|interview| interview.id == updated.id) {
            Some(slot) => *slot = updated.clone(),
            None => history.push(updated.clone()),
        }
        Ok(history)
    }

    fn load_applicant(&self, id: &ApplicantId) -> Result<ApplicantRecord, PipelineServiceError> {
        self.repository
            .fetch_applicant(id)?
            .ok_or_else(|| NotFound::Applicant(id.clone()).into())
    }

    fn load_interview(&self, id: &InterviewId) -> Result<InterviewRecord, PipelineServiceError> {
        self.repository
            .fetch_interview(id)?
            .ok_or_else(|| NotFound::Interview(id.clone()).into())
    }

    fn load_job(&self, id: &JobId) -> Result<JobPosting, PipelineServiceError> {
        self.directory
            .job(id)?
            .ok_or_else(|| NotFound::Job(id.clone()).into())
    }
}

/// Cancel the interview still waiting for feedback when the applicant closes. Only the offer
/// round can be open at that point.
fn withdraw_pending(history: &mut [InterviewRecord]) -> Option<InterviewRecord> {
    let pending = history
        .iter_mut()
        .find(|interview| interview.is_awaiting_result())?;
    pending.status = InterviewStatus::Cancelled;
    Some(pending.clone())
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Malformed input, rejected before any state is read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("unknown stage id {0}")]
    UnknownStage(u8),
    #[error("'{0}' is not a valid date/time")]
    InvalidDateTime(String),
    #[error("an interview result must be pass or fail")]
    PendingResult,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("applicant {0} not found")]
    Applicant(ApplicantId),
    #[error("interview {0} not found")]
    Interview(InterviewId),
    #[error("interviewer {0} not found")]
    Interviewer(InterviewerId),
    #[error("job {0} not found")]
    Job(JobId),
}

impl NotFound {
    pub const fn reason(&self) -> &'static str {
        match self {
            NotFound::Applicant(_) => "applicant_not_found",
            NotFound::Interview(_) => "interview_not_found",
            NotFound::Interviewer(_) => "interviewer_not_found",
            NotFound::Job(_) => "job_not_found",
        }
    }
}

/// The requested transition is illegal given the applicant's current history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateConflict {
    #[error(transparent)]
    Schedule(#[from] ScheduleBlock),
    #[error(transparent)]
    Offer(#[from] OfferBlock),
    #[error("interview {0} already has a final result")]
    AlreadyFinalized(InterviewId),
    #[error("interview {0} was cancelled")]
    InterviewCancelled(InterviewId),
    #[error("interview {0} already has a result and cannot be rescheduled")]
    NotReschedulable(InterviewId),
    #[error("applicant is {} and can no longer change", .status.label())]
    ApplicantClosed { status: ApplicantStatus },
    #[error("an applicant with email {0} already exists")]
    DuplicateApplicant(String),
}

impl StateConflict {
    pub const fn reason(&self) -> &'static str {
        match self {
            StateConflict::Schedule(block) => block.reason(),
            StateConflict::Offer(block) => block.reason(),
            StateConflict::AlreadyFinalized(_) => "already_finalized",
            StateConflict::InterviewCancelled(_) => "interview_cancelled",
            StateConflict::NotReschedulable(_) => "not_reschedulable",
            StateConflict::ApplicantClosed { .. } => "applicant_closed",
            StateConflict::DuplicateApplicant(_) => "duplicate_applicant",
        }
    }
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Conflict(#[from] StateConflict),
    #[error(transparent)]
    Precondition(#[from] OnboardBlock),
    #[error(transparent)]
    Busy(#[from] LockTimeout),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
    #[error("pipeline operation interrupted: {0}")]
    Interrupted(String),
}

impl PipelineServiceError {
    /// Stable reason code reported to API callers.
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineServiceError::Validation(_) => "validation_failed",
            PipelineServiceError::NotFound(missing) => missing.reason(),
            PipelineServiceError::Conflict(conflict) => conflict.reason(),
            PipelineServiceError::Precondition(block) => block.reason(),
            PipelineServiceError::Busy(_) => "concurrency_conflict",
            PipelineServiceError::Repository(_) => "repository_error",
            PipelineServiceError::Directory(_) => "directory_error",
            PipelineServiceError::Onboarding(_) => "onboarding_service_error",
            PipelineServiceError::Interrupted(_) => "interrupted",
        }
    }

    /// Whether the caller should rerun the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineServiceError::Busy(_))
    }
}

impl From<ScheduleBlock> for PipelineServiceError {
    fn from(value: ScheduleBlock) -> Self {
        Self::Conflict(StateConflict::Schedule(value))
    }
}

impl From<OfferBlock> for PipelineServiceError {
    fn from(value: OfferBlock) -> Self {
        Self::Conflict(StateConflict::Offer(value))
    }
}
