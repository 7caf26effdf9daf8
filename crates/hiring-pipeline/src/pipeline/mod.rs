//! Applicant interview pipeline.
//!
//! [`catalog`] fixes the stage order, [`gate`] makes every progression decision as a pure
//! function of an applicant's interview history, and [`service`] applies those decisions to
//! stored records under a per-applicant lock. [`router`] exposes the service over HTTP.

pub mod catalog;
pub mod domain;
pub mod gate;
pub mod locks;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::{Stage, StageId};
pub use domain::{
    ApplicantId, ApplicantRecord, ApplicantStatus, ApplicationSubmission, Employee, EmployeeId,
    InterviewId, InterviewRecord, InterviewResult, InterviewStatus, Interviewer, InterviewerId,
    JobId, JobPosting, NewEmployee, OfferStatus, OnboardingDetails, RescheduleRequest,
    ResultSubmission, ScheduleRequest, ScreeningSummary,
};
pub use gate::offer::{OfferBlock, OnboardBlock};
pub use gate::{PipelineView, Progress, ScheduleBlock, StageState};
pub use memory::{InMemoryEmployeeRegistry, InMemoryPipelineRepository, InMemoryTalentDirectory};
pub use repository::{
    DirectoryError, EmployeeOnboarding, OnboardingError, PipelineChange, PipelineRepository,
    RepositoryError, TalentDirectory,
};
pub use router::pipeline_router;
pub use service::{NotFound, PipelineService, PipelineServiceError, StateConflict, ValidationError};
pub use views::{InterviewView, StageStatusView};
