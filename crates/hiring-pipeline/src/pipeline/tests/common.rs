use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::pipeline::catalog::StageId;
use crate::pipeline::domain::{
    ApplicantId, ApplicantRecord, ApplicationSubmission, InterviewId, InterviewRecord,
    InterviewResult, InterviewStatus, Interviewer, InterviewerId, JobId, JobPosting,
    ResultSubmission, ScheduleRequest,
};
use crate::pipeline::gate::{self, PipelineView};
use crate::pipeline::memory::{
    InMemoryEmployeeRegistry, InMemoryPipelineRepository, InMemoryTalentDirectory,
};
use crate::pipeline::repository::{PipelineChange, PipelineRepository, RepositoryError};
use crate::pipeline::service::PipelineService;

pub(super) const ENGINEERING_JOB: &str = "job-platform-engineer";
pub(super) const OPERATIONS_JOB: &str = "job-warehouse-lead";

pub(super) type MemoryService =
    PipelineService<InMemoryPipelineRepository, InMemoryTalentDirectory, InMemoryEmployeeRegistry>;

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn interviewer(id: &str, function: &str) -> Interviewer {
    Interviewer {
        id: InterviewerId(id.to_string()),
        name: format!("Interviewer {id}"),
        position: "Senior Staff".to_string(),
        interview_type: "panel".to_string(),
        function: function.to_string(),
    }
}

pub(super) fn directory() -> InMemoryTalentDirectory {
    InMemoryTalentDirectory::default()
        .with_interviewer(interviewer("ivr-people", "People"))
        .with_interviewer(interviewer("ivr-engineering", "Engineering"))
        .with_interviewer(interviewer("ivr-sales", "Sales"))
        .with_job(JobPosting {
            id: JobId(ENGINEERING_JOB.to_string()),
            title: "Platform Engineer".to_string(),
            function: "engineering".to_string(),
            department: "Platform".to_string(),
        })
        .with_job(JobPosting {
            id: JobId(OPERATIONS_JOB.to_string()),
            title: "Warehouse Lead".to_string(),
            function: "Operations".to_string(),
            department: "Logistics".to_string(),
        })
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryPipelineRepository>,
    Arc<InMemoryEmployeeRegistry>,
) {
    let repository = Arc::new(InMemoryPipelineRepository::default());
    let employees = Arc::new(InMemoryEmployeeRegistry::default());
    let service = PipelineService::new(
        repository.clone(),
        Arc::new(directory()),
        employees.clone(),
        PipelineConfig::default(),
    );
    (service, repository, employees)
}

pub(super) fn submission(email: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        name: "Ada Lovelace".to_string(),
        email: email.to_string(),
        phone: "+1 515 555 0101".to_string(),
        resume_ref: Some("resumes/ada.pdf".to_string()),
        job_id: JobId(ENGINEERING_JOB.to_string()),
    }
}

/// Interviewer used for a stage in the happy path.
pub(super) fn interviewer_for(stage: StageId) -> InterviewerId {
    match stage {
        StageId::Technical => InterviewerId("ivr-engineering".to_string()),
        _ => InterviewerId("ivr-people".to_string()),
    }
}

pub(super) fn schedule_request(applicant_id: &ApplicantId, stage: StageId) -> ScheduleRequest {
    ScheduleRequest {
        applicant_id: applicant_id.clone(),
        stage,
        interviewer_id: interviewer_for(stage),
        scheduled_for: base_time() + chrono::Duration::days(i64::from(stage.order())),
    }
}

pub(super) fn verdict(result: InterviewResult) -> ResultSubmission {
    ResultSubmission {
        result,
        feedback: Some(format!("recorded {}", result.label())),
        notes: None,
    }
}

pub(super) fn schedule_and_record(
    service: &MemoryService,
    applicant_id: &ApplicantId,
    stage: StageId,
    result: InterviewResult,
) -> (InterviewId, ApplicantRecord) {
    let interview = service
        .schedule_stage(schedule_request(applicant_id, stage))
        .unwrap_or_else(|err| panic!("schedule {stage:?}: {err}"));
    let applicant = service
        .record_result(&interview.id, verdict(result))
        .unwrap_or_else(|err| panic!("record {stage:?}: {err}"));
    (interview.id, applicant)
}

/// Pass every stage before `stage`.
pub(super) fn pass_through(service: &MemoryService, applicant_id: &ApplicantId, stage: StageId) {
    for earlier in StageId::ordered()
        .into_iter()
        .take_while(|candidate| *candidate < stage)
    {
        schedule_and_record(service, applicant_id, earlier, InterviewResult::Pass);
    }
}

/// Assert the cached status still equals a fresh derivation from storage.
pub(super) fn assert_status_consistent(repository: &InMemoryPipelineRepository, id: &ApplicantId) {
    let applicant = repository
        .fetch_applicant(id)
        .expect("fetch applicant")
        .expect("applicant stored");
    let history = repository.interviews_for(id).expect("fetch history");
    let derived = gate::derive_status(&PipelineView::for_applicant(&applicant, &history));
    assert_eq!(applicant.status, derived, "cached status drifted from history");
}

/// Hand-built interview histories for gate tests.
pub(super) struct HistoryBuilder {
    interviews: Vec<InterviewRecord>,
    clock: DateTime<Utc>,
}

impl HistoryBuilder {
    pub(super) fn new() -> Self {
        Self {
            interviews: Vec::new(),
            clock: base_time(),
        }
    }

    pub(super) fn with(mut self, stage: StageId, result: InterviewResult) -> Self {
        let status = if result.is_final() {
            InterviewStatus::Completed
        } else {
            InterviewStatus::Scheduled
        };
        self.push(stage, status, result);
        self
    }

    pub(super) fn cancelled(mut self, stage: StageId) -> Self {
        self.push(stage, InterviewStatus::Cancelled, InterviewResult::Pending);
        self
    }

    pub(super) fn build(self) -> Vec<InterviewRecord> {
        self.interviews
    }

    fn push(&mut self, stage: StageId, status: InterviewStatus, result: InterviewResult) {
        let attempt = self
            .interviews
            .iter()
            .filter(|interview| interview.stage == stage)
            .count() as u8
            + 1;
        self.clock += chrono::Duration::minutes(30);
        let sequence = self.interviews.len() + 1;

        self.interviews.push(InterviewRecord {
            id: InterviewId(format!("int-{sequence:03}")),
            applicant_id: ApplicantId("apl-history".to_string()),
            stage,
            interviewer_id: interviewer_for(stage),
            scheduled_for: self.clock,
            attempt,
            status,
            result,
            feedback: None,
            notes: None,
            completed_at: result.is_final().then_some(self.clock),
            created_at: self.clock,
        });
    }
}

/// Repository whose commits can be switched to fail, to prove operations stay atomic.
#[derive(Default)]
pub(super) struct FlakyRepository {
    pub(super) inner: InMemoryPipelineRepository,
    pub(super) fail_commits: AtomicBool,
}

impl PipelineRepository for FlakyRepository {
    fn insert_applicant(
        &self,
        record: ApplicantRecord,
    ) -> Result<ApplicantRecord, RepositoryError> {
        self.inner.insert_applicant(record)
    }

    fn fetch_applicant(
        &self,
        id: &ApplicantId,
    ) -> Result<Option<ApplicantRecord>, RepositoryError> {
        self.inner.fetch_applicant(id)
    }

    fn fetch_interview(
        &self,
        id: &InterviewId,
    ) -> Result<Option<InterviewRecord>, RepositoryError> {
        self.inner.fetch_interview(id)
    }

    fn interviews_for(&self, id: &ApplicantId) -> Result<Vec<InterviewRecord>, RepositoryError> {
        self.inner.interviews_for(id)
    }

    fn commit(&self, change: PipelineChange) -> Result<(), RepositoryError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("database offline".to_string()));
        }
        self.inner.commit(change)
    }
}

/// Repository that stalls while reading history, holding the applicant lock open.
pub(super) struct SlowRepository {
    pub(super) inner: InMemoryPipelineRepository,
    pub(super) delay: Duration,
}

impl PipelineRepository for SlowRepository {
    fn insert_applicant(
        &self,
        record: ApplicantRecord,
    ) -> Result<ApplicantRecord, RepositoryError> {
        self.inner.insert_applicant(record)
    }

    fn fetch_applicant(
        &self,
        id: &ApplicantId,
    ) -> Result<Option<ApplicantRecord>, RepositoryError> {
        self.inner.fetch_applicant(id)
    }

    fn fetch_interview(
        &self,
        id: &InterviewId,
    ) -> Result<Option<InterviewRecord>, RepositoryError> {
        self.inner.fetch_interview(id)
    }

    fn interviews_for(&self, id: &ApplicantId) -> Result<Vec<InterviewRecord>, RepositoryError> {
        thread::sleep(self.delay);
        self.inner.interviews_for(id)
    }

    fn commit(&self, change: PipelineChange) -> Result<(), RepositoryError> {
        self.inner.commit(change)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
