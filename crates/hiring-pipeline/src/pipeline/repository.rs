use super::domain::{
    ApplicantId, ApplicantRecord, Employee, InterviewId, InterviewRecord, Interviewer,
    InterviewerId, JobId, JobPosting, NewEmployee,
};

/// Applicant update plus the interview touched by the same operation.
///
/// Implementations must apply both or neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineChange {
    pub applicant: ApplicantRecord,
    pub interview: Option<InterviewRecord>,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait PipelineRepository: Send + Sync {
    /// Store a new applicant. Emails are unique ignoring ASCII case.
    fn insert_applicant(&self, record: ApplicantRecord)
        -> Result<ApplicantRecord, RepositoryError>;
    fn fetch_applicant(&self, id: &ApplicantId)
        -> Result<Option<ApplicantRecord>, RepositoryError>;
    fn fetch_interview(&self, id: &InterviewId)
        -> Result<Option<InterviewRecord>, RepositoryError>;
    /// Every interview ever created for the applicant, cancelled ones included.
    fn interviews_for(&self, id: &ApplicantId) -> Result<Vec<InterviewRecord>, RepositoryError>;
    fn commit(&self, change: PipelineChange) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("change rejected: {0}")]
    Inconsistent(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the interviewer directory and job service.
pub trait TalentDirectory: Send + Sync {
    fn interviewer(&self, id: &InterviewerId) -> Result<Option<Interviewer>, DirectoryError>;
    fn interviewers_for_function(&self, function: &str)
        -> Result<Vec<Interviewer>, DirectoryError>;
    fn job(&self, id: &JobId) -> Result<Option<JobPosting>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook that turns an onboarded applicant into an employee record.
pub trait EmployeeOnboarding: Send + Sync {
    /// Create the employee. A second call for the same applicant must fail with
    /// [`OnboardingError::AlreadyExists`] carrying the first employee.
    fn create_employee(&self, employee: NewEmployee) -> Result<Employee, OnboardingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("employee {} already exists for this applicant", .0.id.0)]
    AlreadyExists(Box<Employee>),
    #[error("onboarding service unavailable: {0}")]
    Unavailable(String),
}
