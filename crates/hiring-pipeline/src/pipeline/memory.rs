//! In-memory adapters for the repository and collaborator traits, used by the service binary
//! and by tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::domain::{
    ApplicantId, ApplicantRecord, Employee, EmployeeId, InterviewId, InterviewRecord,
    Interviewer, InterviewerId, JobId, JobPosting, NewEmployee,
};
use super::repository::{
    DirectoryError, EmployeeOnboarding, OnboardingError, PipelineChange, PipelineRepository,
    RepositoryError, TalentDirectory,
};

#[derive(Default)]
struct PipelineTables {
    applicants: HashMap<ApplicantId, ApplicantRecord>,
    emails: HashMap<String, ApplicantId>,
    interviews: BTreeMap<InterviewId, InterviewRecord>,
}

#[derive(Default)]
pub struct InMemoryPipelineRepository {
    tables: Mutex<PipelineTables>,
}

impl InMemoryPipelineRepository {
    pub fn applicant_count(&self) -> usize {
        self.tables.lock().applicants.len()
    }

    pub fn interview_count(&self) -> usize {
        self.tables.lock().interviews.len()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl PipelineRepository for InMemoryPipelineRepository {
    fn insert_applicant(
        &self,
        record: ApplicantRecord,
    ) -> Result<ApplicantRecord, RepositoryError> {
        let mut tables = self.tables.lock();
        let key = email_key(&record.email);
        if tables.applicants.contains_key(&record.id) || tables.emails.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        tables.emails.insert(key, record.id.clone());
        tables.applicants.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_applicant(
        &self,
        id: &ApplicantId,
    ) -> Result<Option<ApplicantRecord>, RepositoryError> {
        Ok(self.tables.lock().applicants.get(id).cloned())
    }

    fn fetch_interview(
        &self,
        id: &InterviewId,
    ) -> Result<Option<InterviewRecord>, RepositoryError> {
        Ok(self.tables.lock().interviews.get(id).cloned())
    }

    fn interviews_for(&self, id: &ApplicantId) -> Result<Vec<InterviewRecord>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .interviews
            .values()
            .filter(|interview| &interview.applicant_id == id)
            .cloned()
            .collect())
    }

    fn commit(&self, change: PipelineChange) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        let PipelineChange {
            applicant,
            interview,
        } = change;

        let Some(stored) = tables.applicants.get(&applicant.id) else {
            return Err(RepositoryError::NotFound);
        };
        if email_key(&stored.email) != email_key(&applicant.email) {
            return Err(RepositoryError::Inconsistent(
                "applicant email is immutable".to_string(),
            ));
        }

        if let Some(interview) = interview {
            if interview.applicant_id != applicant.id {
                return Err(RepositoryError::Inconsistent(format!(
                    "interview {} belongs to applicant {}",
                    interview.id, interview.applicant_id
                )));
            }
            tables.interviews.insert(interview.id.clone(), interview);
        }
        tables.applicants.insert(applicant.id.clone(), applicant);
        Ok(())
    }
}

/// Static interviewer and job listing.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTalentDirectory {
    interviewers: BTreeMap<InterviewerId, Interviewer>,
    jobs: BTreeMap<JobId, JobPosting>,
}

impl InMemoryTalentDirectory {
    pub fn with_interviewer(mut self, interviewer: Interviewer) -> Self {
        self.interviewers.insert(interviewer.id.clone(), interviewer);
        self
    }

    pub fn with_job(mut self, job: JobPosting) -> Self {
        self.jobs.insert(job.id.clone(), job);
        self
    }

    pub fn interviewers(&self) -> impl Iterator<Item = &Interviewer> {
        self.interviewers.values()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobPosting> {
        self.jobs.values()
    }
}

impl TalentDirectory for InMemoryTalentDirectory {
    fn interviewer(&self, id: &InterviewerId) -> Result<Option<Interviewer>, DirectoryError> {
        Ok(self.interviewers.get(id).cloned())
    }

    fn interviewers_for_function(
        &self,
        function: &str,
    ) -> Result<Vec<Interviewer>, DirectoryError> {
        Ok(self
            .interviewers
            .values()
            .filter(|interviewer| interviewer.serves_function(function))
            .cloned()
            .collect())
    }

    fn job(&self, id: &JobId) -> Result<Option<JobPosting>, DirectoryError> {
        Ok(self.jobs.get(id).cloned())
    }
}

/// Employee registry enforcing one employee per applicant.
#[derive(Default)]
pub struct InMemoryEmployeeRegistry {
    employees: Mutex<Vec<Employee>>,
    sequence: AtomicU64,
}

impl InMemoryEmployeeRegistry {
    pub fn employees(&self) -> Vec<Employee> {
        self.employees.lock().clone()
    }
}

impl EmployeeOnboarding for InMemoryEmployeeRegistry {
    fn create_employee(&self, employee: NewEmployee) -> Result<Employee, OnboardingError> {
        let mut employees = self.employees.lock();
        if let Some(existing) = employees
            .iter()
            .find(|existing| existing.applicant_id == employee.applicant_id)
        {
            return Err(OnboardingError::AlreadyExists(Box::new(existing.clone())));
        }

        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let created = Employee {
            id: EmployeeId(format!("emp-{id:05}")),
            applicant_id: employee.applicant_id,
            name: employee.name,
            email: employee.email,
            phone: employee.phone,
            department: employee.department,
            title: employee.title,
            grade: employee.grade,
        };
        employees.push(created.clone());
        Ok(created)
    }
}
