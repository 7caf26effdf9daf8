//! End-to-end scenarios for the interview pipeline, driven through the public service facade and
//! the HTTP router only.

mod common {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use hiring_pipeline::config::PipelineConfig;
    use hiring_pipeline::pipeline::{
        ApplicantId, ApplicationSubmission, InMemoryEmployeeRegistry, InMemoryPipelineRepository,
        InMemoryTalentDirectory, InterviewResult, Interviewer, InterviewerId, JobId, JobPosting,
        PipelineService, ResultSubmission, ScheduleRequest, StageId,
    };

    pub(super) type Service = PipelineService<
        InMemoryPipelineRepository,
        InMemoryTalentDirectory,
        InMemoryEmployeeRegistry,
    >;

    pub(super) fn directory() -> InMemoryTalentDirectory {
        let interviewer = |id: &str, name: &str, function: &str| Interviewer {
            id: InterviewerId(id.to_string()),
            name: name.to_string(),
            position: "Hiring Manager".to_string(),
            interview_type: "video".to_string(),
            function: function.to_string(),
        };

        InMemoryTalentDirectory::default()
            .with_interviewer(interviewer("ivr-hr-1", "Priya Raman", "People"))
            .with_interviewer(interviewer("ivr-data-1", "Tomas Ek", "Data"))
            .with_job(JobPosting {
                id: JobId("job-data-analyst".to_string()),
                title: "Data Analyst".to_string(),
                function: "Data".to_string(),
                department: "Insights".to_string(),
            })
    }

    pub(super) fn build_service() -> (Arc<Service>, Arc<InMemoryEmployeeRegistry>) {
        let employees = Arc::new(InMemoryEmployeeRegistry::default());
        let service = PipelineService::new(
            Arc::new(InMemoryPipelineRepository::default()),
            Arc::new(directory()),
            employees.clone(),
            PipelineConfig::default(),
        );
        (Arc::new(service), employees)
    }

    pub(super) fn submission(email: &str) -> ApplicationSubmission {
        ApplicationSubmission {
            name: "Linus Pauling".to_string(),
            email: email.to_string(),
            phone: "+44 20 7946 0000".to_string(),
            resume_ref: None,
            job_id: JobId("job-data-analyst".to_string()),
        }
    }

    pub(super) fn request(applicant_id: &ApplicantId, stage: StageId) -> ScheduleRequest {
        let interviewer = if stage == StageId::Technical {
            "ivr-data-1"
        } else {
            "ivr-hr-1"
        };
        ScheduleRequest {
            applicant_id: applicant_id.clone(),
            stage,
            interviewer_id: InterviewerId(interviewer.to_string()),
            scheduled_for: Utc
                .with_ymd_and_hms(2025, 6, 2, 10, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    pub(super) fn verdict(result: InterviewResult) -> ResultSubmission {
        ResultSubmission {
            result,
            feedback: Some("panel notes".to_string()),
            notes: None,
        }
    }
}

mod service_tests {
    use super::common::*;

    use hiring_pipeline::pipeline::{
        ApplicantStatus, InterviewResult, OfferStatus, OnboardingDetails, PipelineServiceError,
        ScheduleBlock, StageId, StageState, StateConflict,
    };

    #[test]
    fn applicant_walks_from_application_to_onboarding() {
        let (service, employees) = build_service();
        let applicant = service
            .submit_application(submission("linus@example.com"))
            .expect("submit");
        assert_eq!(applicant.status, ApplicantStatus::Applied);

        for stage in [
            StageId::Hr,
            StageId::Cultural,
            StageId::Technical,
            StageId::Final,
        ] {
            let interview = service
                .schedule_stage(request(&applicant.id, stage))
                .expect("schedule");
            let updated = service
                .record_result(&interview.id, verdict(InterviewResult::Pass))
                .expect("record");
            let expected = if stage == StageId::Final {
                ApplicantStatus::Offered
            } else {
                ApplicantStatus::Interviewing
            };
            assert_eq!(updated.status, expected, "after {stage}");
        }

        let hired = service
            .set_offer_status(&applicant.id, OfferStatus::Accepted)
            .expect("accept offer");
        assert_eq!(hired.status, ApplicantStatus::Hired);

        let employee = service
            .onboard(
                &applicant.id,
                OnboardingDetails {
                    grade: "G7".to_string(),
                    ..OnboardingDetails::default()
                },
            )
            .expect("onboard");
        assert_eq!(employee.department, "Insights");
        assert_eq!(employee.title, "Data Analyst");

        let onboarded = service.get_applicant(&applicant.id).expect("fetch");
        assert_eq!(onboarded.status, ApplicantStatus::Onboarded);
        assert_eq!(employees.employees().len(), 1);

        let board = service.stage_statuses(&applicant.id).expect("board");
        assert_eq!(board[3].state, StageState::Passed);
        assert_eq!(board[4].state, StageState::Current);

        match service.schedule_stage(request(&applicant.id, StageId::Offer)) {
            Err(PipelineServiceError::Conflict(StateConflict::Schedule(
                ScheduleBlock::PipelineClosed { status },
            ))) => assert_eq!(status, ApplicantStatus::Onboarded),
            other => panic!("expected closed pipeline, got {other:?}"),
        }
    }

    #[test]
    fn final_retry_then_second_failure_rejects() {
        let (service, _) = build_service();
        let applicant = service
            .submit_application(submission("retry@example.com"))
            .expect("submit");
        for stage in [StageId::Hr, StageId::Cultural, StageId::Technical] {
            let interview = service
                .schedule_stage(request(&applicant.id, stage))
                .expect("schedule");
            service
                .record_result(&interview.id, verdict(InterviewResult::Pass))
                .expect("record");
        }

        let first = service
            .schedule_stage(request(&applicant.id, StageId::Final))
            .expect("first final");
        let after_first = service
            .record_result(&first.id, verdict(InterviewResult::Fail))
            .expect("record first final");
        assert_eq!(after_first.status, ApplicantStatus::Interviewing);

        let second = service
            .schedule_stage(request(&applicant.id, StageId::Final))
            .expect("second final");
        assert_eq!(second.attempt, 2);
        let after_second = service
            .record_result(&second.id, verdict(InterviewResult::Fail))
            .expect("record second final");
        assert_eq!(after_second.status, ApplicantStatus::Rejected);

        let err = service
            .schedule_stage(request(&applicant.id, StageId::Final))
            .expect_err("retry budget spent");
        assert_eq!(err.reason(), "retry_limit_exceeded");

        let board = service.stage_statuses(&applicant.id).expect("board");
        assert_eq!(board[3].state, StageState::Failed);
        assert_eq!(board[3].attempts, 2);
    }
}

mod router_tests {
    use super::common::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use hiring_pipeline::pipeline::{pipeline_router, InterviewResult, StageId};

    async fn send(
        router: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(payload) => builder
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        (status, payload)
    }

    #[tokio::test]
    async fn http_flow_reaches_an_offer() {
        let (service, _) = build_service();
        let router = pipeline_router(service);

        let (status, applicant) = send(
            &router,
            "POST",
            "/api/v1/applicant",
            Some(json!({
                "name": "Rosalind Franklin",
                "email": "rosalind@example.com",
                "job_id": "job-data-analyst",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let applicant_id = applicant["id"].as_str().expect("applicant id").to_string();

        let (status, screened) = send(
            &router,
            "POST",
            &format!("/api/v1/applicant/{applicant_id}/screening"),
            Some(json!({ "score": 74, "questions": ["Walk through a cohort analysis."] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(screened["status"], "screening");

        let rounds = [
            (1, "ivr-hr-1"),
            (2, "ivr-hr-1"),
            (3, "ivr-data-1"),
            (4, "ivr-hr-1"),
        ];
        for (stage_id, interviewer) in rounds {
            let (status, interview) = send(
                &router,
                "POST",
                "/api/v1/interview/schedule-stage",
                Some(json!({
                    "applicant_id": applicant_id,
                    "interviewer_id": interviewer,
                    "date_time": "2025-06-02T10:00:00Z",
                    "stage_id": stage_id,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "schedule stage {stage_id}");
            let interview_id = interview["id"].as_str().expect("interview id").to_string();

            let (status, _) = send(
                &router,
                "POST",
                &format!("/api/v1/interview/stages/{interview_id}/feedback"),
                Some(json!({ "result": "pass" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, applicant) = send(
            &router,
            "GET",
            &format!("/api/v1/applicant/{applicant_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(applicant["status"], "offered");

        let (status, interviews) = send(
            &router,
            "GET",
            &format!("/api/v1/interview/applicant/{applicant_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let interviews = interviews.as_array().expect("interview list");
        assert_eq!(interviews.len(), 4);
        assert_eq!(interviews[2]["interviewer"]["function"], "Data");
    }

    #[tokio::test]
    async fn technical_round_with_wrong_interviewer_is_refused() {
        let (service, _) = build_service();
        let applicant = service
            .submit_application(submission("wrong-panel@example.com"))
            .expect("submit");
        for stage in [StageId::Hr, StageId::Cultural] {
            let interview = service
                .schedule_stage(request(&applicant.id, stage))
                .expect("schedule");
            service
                .record_result(&interview.id, verdict(InterviewResult::Pass))
                .expect("record");
        }
        let router = pipeline_router(service);

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/interview/schedule-stage",
            Some(json!({
                "applicant_id": applicant.id.0,
                "interviewer_id": "ivr-hr-1",
                "date_time": "2025-06-03 09:30",
                "stage_id": 3,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "interviewer_mismatch");
        assert_eq!(body["retryable"], false);
    }
}
