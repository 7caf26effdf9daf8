use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::catalog::StageId;
use super::domain::{
    ApplicantId, ApplicantRecord, ApplicationSubmission, Employee, InterviewId, InterviewRecord,
    InterviewerId, OfferStatus, OnboardingDetails, RescheduleRequest, ResultSubmission,
    ScheduleRequest, ScreeningSummary,
};
use super::repository::{EmployeeOnboarding, PipelineRepository, TalentDirectory};
use super::service::{PipelineService, PipelineServiceError, StateConflict, ValidationError};
use super::views::{InterviewView, StageStatusView};

const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Body of `POST /interview/schedule-stage`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleStagePayload {
    pub applicant_id: String,
    pub interviewer_id: String,
    pub date_time: String,
    pub stage_id: u8,
}

impl ScheduleStagePayload {
    pub fn into_request(self) -> Result<ScheduleRequest, ValidationError> {
        let stage =
            StageId::from_order(self.stage_id).ok_or(ValidationError::UnknownStage(self.stage_id))?;
        if self.applicant_id.trim().is_empty() {
            return Err(ValidationError::MissingField("applicant_id"));
        }
        if self.interviewer_id.trim().is_empty() {
            return Err(ValidationError::MissingField("interviewer_id"));
        }

        Ok(ScheduleRequest {
            applicant_id: ApplicantId(self.applicant_id.trim().to_string()),
            stage,
            interviewer_id: InterviewerId(self.interviewer_id.trim().to_string()),
            scheduled_for: parse_date_time(&self.date_time)?,
        })
    }
}

/// Body of `POST /interview/stages/:interview_id/reschedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReschedulePayload {
    pub date_time: String,
    #[serde(default)]
    pub interviewer_id: Option<String>,
}

impl ReschedulePayload {
    pub fn into_request(self) -> Result<RescheduleRequest, ValidationError> {
        let interviewer_id = match self.interviewer_id.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::MissingField("interviewer_id")),
            Some(id) => Some(InterviewerId(id.to_string())),
            None => None,
        };

        Ok(RescheduleRequest {
            scheduled_for: parse_date_time(&self.date_time)?,
            interviewer_id,
        })
    }
}

/// Accepts RFC 3339 or a zone-less `YYYY-MM-DD[T ]HH:MM[:SS]`, read as UTC.
pub fn parse_date_time(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidDateTime(raw.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferStatusPayload {
    pub offer_status: OfferStatus,
}

/// Body of `POST /employees`.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardPayload {
    pub applicant_id: ApplicantId,
    #[serde(flatten)]
    pub details: OnboardingDetails,
}

/// Router builder exposing the pipeline endpoints.
pub fn pipeline_router<R, D, E>(service: Arc<PipelineService<R, D, E>>) -> Router
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    Router::new()
        .route("/api/v1/applicant", post(submit_handler::<R, D, E>))
        .route(
            "/api/v1/applicant/:applicant_id",
            get(applicant_handler::<R, D, E>),
        )
        .route(
            "/api/v1/applicant/:applicant_id/screening",
            post(screening_handler::<R, D, E>),
        )
        .route(
            "/api/v1/applicant/:applicant_id/offer-status",
            post(offer_status_handler::<R, D, E>),
        )
        .route(
            "/api/v1/applicant/:applicant_id/stages",
            get(stage_statuses_handler::<R, D, E>),
        )
        .route(
            "/api/v1/interview/schedule-stage",
            post(schedule_stage_handler::<R, D, E>),
        )
        .route(
            "/api/v1/interview/stages/:interview_id/feedback",
            post(feedback_handler::<R, D, E>),
        )
        .route(
            "/api/v1/interview/stages/:interview_id/reschedule",
            post(reschedule_handler::<R, D, E>),
        )
        .route(
            "/api/v1/interview/applicant/:applicant_id",
            get(applicant_interviews_handler::<R, D, E>),
        )
        .route("/api/v1/employees", post(onboard_handler::<R, D, E>))
        .with_state(service)
}

/// Service calls may wait on an applicant lock, so they run off the async workers.
async fn run_blocking<T, F>(operation: F) -> Result<T, PipelineServiceError>
where
    F: FnOnce() -> Result<T, PipelineServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|err| PipelineServiceError::Interrupted(err.to_string()))?
}

pub(crate) async fn submit_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Json(submission): Json<ApplicationSubmission>,
) -> Result<(StatusCode, Json<ApplicantRecord>), PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let record = run_blocking(move || service.submit_application(submission)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn applicant_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<ApplicantRecord>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let id = ApplicantId(applicant_id);
    let record = run_blocking(move || service.get_applicant(&id)).await?;
    Ok(Json(record))
}

pub(crate) async fn screening_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(applicant_id): Path<String>,
    Json(screening): Json<ScreeningSummary>,
) -> Result<Json<ApplicantRecord>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let id = ApplicantId(applicant_id);
    let record = run_blocking(move || service.attach_screening(&id, screening)).await?;
    Ok(Json(record))
}

pub(crate) async fn offer_status_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<OfferStatusPayload>,
) -> Result<Json<ApplicantRecord>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let id = ApplicantId(applicant_id);
    let record =
        run_blocking(move || service.set_offer_status(&id, payload.offer_status)).await?;
    Ok(Json(record))
}

pub(crate) async fn stage_statuses_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<Vec<StageStatusView>>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let id = ApplicantId(applicant_id);
    let board = run_blocking(move || service.stage_statuses(&id)).await?;
    Ok(Json(board))
}

pub(crate) async fn schedule_stage_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Json(payload): Json<ScheduleStagePayload>,
) -> Result<(StatusCode, Json<InterviewRecord>), PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let request = payload.into_request()?;
    let interview = run_blocking(move || service.schedule_stage(request)).await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub(crate) async fn feedback_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(interview_id): Path<String>,
    Json(submission): Json<ResultSubmission>,
) -> Result<Json<ApplicantRecord>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let id = InterviewId(interview_id);
    let record = run_blocking(move || service.record_result(&id, submission)).await?;
    Ok(Json(record))
}

pub(crate) async fn reschedule_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(interview_id): Path<String>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<Json<InterviewRecord>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let request = payload.into_request()?;
    let id = InterviewId(interview_id);
    let interview = run_blocking(move || service.reschedule_interview(&id, request)).await?;
    Ok(Json(interview))
}

pub(crate) async fn applicant_interviews_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<Vec<InterviewView>>, PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let id = ApplicantId(applicant_id);
    let interviews = run_blocking(move || service.applicant_interviews(&id)).await?;
    Ok(Json(interviews))
}

pub(crate) async fn onboard_handler<R, D, E>(
    State(service): State<Arc<PipelineService<R, D, E>>>,
    Json(payload): Json<OnboardPayload>,
) -> Result<(StatusCode, Json<Employee>), PipelineServiceError>
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    let OnboardPayload {
        applicant_id,
        details,
    } = payload;
    let employee = run_blocking(move || service.onboard(&applicant_id, details)).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// HTTP status for each error class.
pub fn status_for(error: &PipelineServiceError) -> StatusCode {
    match error {
        PipelineServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineServiceError::Conflict(StateConflict::DuplicateApplicant(_)) => {
            StatusCode::CONFLICT
        }
        PipelineServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
        PipelineServiceError::Precondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineServiceError::Busy(_) => StatusCode::CONFLICT,
        PipelineServiceError::Repository(_)
        | PipelineServiceError::Directory(_)
        | PipelineServiceError::Onboarding(_)
        | PipelineServiceError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for PipelineServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(reason = self.reason(), error = %self, "pipeline request failed");
        }

        let payload = json!({
            "error": self.to_string(),
            "reason": self.reason(),
            "retryable": self.is_retryable(),
        });
        (status, Json(payload)).into_response()
    }
}
