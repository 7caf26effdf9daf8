use hiring_pipeline::config::PipelineConfig;
use hiring_pipeline::pipeline::{
    InMemoryEmployeeRegistry, InMemoryPipelineRepository, InMemoryTalentDirectory, Interviewer,
    InterviewerId, JobId, JobPosting, PipelineService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryPipelineService =
    PipelineService<InMemoryPipelineRepository, InMemoryTalentDirectory, InMemoryEmployeeRegistry>;

pub(crate) const DEMO_JOB_ID: &str = "job-backend-engineer";

/// Interviewers and job postings available until a real directory is wired in.
pub(crate) fn seeded_directory() -> InMemoryTalentDirectory {
    let interviewers = [
        ("ivr-hr-01", "Maya Chen", "Talent Partner", "screening call", "People"),
        ("ivr-culture-01", "Jonas Weber", "Engineering Manager", "values", "Engineering"),
        ("ivr-eng-01", "Amara Okafor", "Staff Engineer", "technical", "Engineering"),
        ("ivr-eng-02", "Luis Ortega", "Principal Engineer", "system design", "Engineering"),
        ("ivr-exec-01", "Hannah Park", "VP Engineering", "final", "Leadership"),
    ];

    let directory = interviewers.into_iter().fold(
        InMemoryTalentDirectory::default(),
        |directory, (id, name, position, interview_type, function)| {
            directory.with_interviewer(Interviewer {
                id: InterviewerId(id.to_string()),
                name: name.to_string(),
                position: position.to_string(),
                interview_type: interview_type.to_string(),
                function: function.to_string(),
            })
        },
    );

    directory
        .with_job(JobPosting {
            id: JobId(DEMO_JOB_ID.to_string()),
            title: "Backend Engineer".to_string(),
            function: "Engineering".to_string(),
            department: "Platform".to_string(),
        })
        .with_job(JobPosting {
            id: JobId("job-account-executive".to_string()),
            title: "Account Executive".to_string(),
            function: "Sales".to_string(),
            department: "Revenue".to_string(),
        })
}

pub(crate) fn build_pipeline_service(config: PipelineConfig) -> Arc<MemoryPipelineService> {
    Arc::new(PipelineService::new(
        Arc::new(InMemoryPipelineRepository::default()),
        Arc::new(seeded_directory()),
        Arc::new(InMemoryEmployeeRegistry::default()),
        config,
    ))
}
