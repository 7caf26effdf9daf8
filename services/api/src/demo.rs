use crate::infra::{build_pipeline_service, MemoryPipelineService, DEMO_JOB_ID};
use chrono::{Duration, Utc};
use clap::Args;
use hiring_pipeline::config::PipelineConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::pipeline::catalog;
use hiring_pipeline::pipeline::{
    ApplicantId, ApplicationSubmission, InterviewResult, InterviewerId, JobId, OfferStatus,
    OnboardingDetails, ResultSubmission, ScheduleRequest, ScreeningSummary, StageId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Email for the sample applicant. Must be unique within the run.
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Fail the first final interview to show the single retry.
    #[arg(long)]
    pub(crate) fail_final_once: bool,
    /// Decline the offer instead of accepting it.
    #[arg(long)]
    pub(crate) decline_offer: bool,
}

pub(crate) fn print_stage_catalog() {
    println!("Interview stages");
    for stage in catalog::stages() {
        println!(
            "  {}. {:<24} attempts: {}{}",
            stage.order,
            stage.name,
            stage.id.attempt_limit(),
            if stage.id.requires_function_match() {
                "  (interviewer must match the job function)"
            } else {
                ""
            }
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_pipeline_service(PipelineConfig::default());
    let email = args
        .email
        .unwrap_or_else(|| "demo.applicant@example.com".to_string());

    println!("Hiring pipeline demo");
    let applicant = service.submit_application(ApplicationSubmission {
        name: "Demo Applicant".to_string(),
        email,
        phone: "+1 206 555 0142".to_string(),
        resume_ref: Some("resumes/demo-applicant.pdf".to_string()),
        job_id: JobId(DEMO_JOB_ID.to_string()),
    })?;
    println!(
        "  Applicant {} submitted for {} ({})",
        applicant.id,
        applicant.job_id,
        applicant.status.label()
    );

    let screened = service.attach_screening(
        &applicant.id,
        ScreeningSummary {
            score: 78,
            questions: vec![
                "Walk through a service you scaled past its first bottleneck.".to_string(),
                "How do you decide when to split a module?".to_string(),
            ],
        },
    )?;
    println!(
        "  Screening attached (score {}), status {}",
        screened.screening.as_ref().map_or(0, |summary| summary.score),
        screened.status.label()
    );

    let mut final_failures_left = u8::from(args.fail_final_once);
    for stage in [
        StageId::Hr,
        StageId::Cultural,
        StageId::Technical,
        StageId::Final,
    ] {
        loop {
            let result = if stage == StageId::Final && final_failures_left > 0 {
                final_failures_left -= 1;
                InterviewResult::Fail
            } else {
                InterviewResult::Pass
            };
            run_round(&service, &applicant.id, stage, result)?;
            if result == InterviewResult::Pass {
                break;
            }
        }
    }

    let offer = if args.decline_offer {
        OfferStatus::Rejected
    } else {
        OfferStatus::Accepted
    };
    let responded = service.set_offer_status(&applicant.id, offer)?;
    println!(
        "\nOffer {}; applicant is {}",
        offer.label(),
        responded.status.label()
    );

    if offer == OfferStatus::Accepted {
        let employee = service.onboard(
            &applicant.id,
            OnboardingDetails {
                grade: "E3".to_string(),
                ..OnboardingDetails::default()
            },
        )?;
        match serde_json::to_string_pretty(&employee) {
            Ok(json) => println!("  Employee record:\n{}", json),
            Err(err) => println!("  Employee record unavailable: {}", err),
        }
    }

    render_board(&service, &applicant.id)?;
    let final_state = service.get_applicant(&applicant.id)?;
    println!("\nFinal status: {}", final_state.status.label());
    Ok(())
}

fn run_round(
    service: &MemoryPipelineService,
    applicant_id: &ApplicantId,
    stage: StageId,
    result: InterviewResult,
) -> Result<(), AppError> {
    let interview = service.schedule_stage(ScheduleRequest {
        applicant_id: applicant_id.clone(),
        stage,
        interviewer_id: demo_interviewer(stage),
        scheduled_for: Utc::now() + Duration::days(i64::from(stage.order())),
    })?;
    let applicant = service.record_result(
        &interview.id,
        ResultSubmission {
            result,
            feedback: Some(format!("{} round {}", stage, result.label())),
            notes: None,
        },
    )?;

    println!(
        "\n{} (attempt {}) with {}: {} -> applicant {}",
        stage,
        interview.attempt,
        interview.interviewer_id,
        result.label(),
        applicant.status.label()
    );
    render_board(service, applicant_id)
}

fn render_board(
    service: &MemoryPipelineService,
    applicant_id: &ApplicantId,
) -> Result<(), AppError> {
    for entry in service.stage_statuses(applicant_id)? {
        println!(
            "  {:<24} {:<10} attempts {}",
            entry.stage.name,
            entry.state.label(),
            entry.attempts
        );
    }
    Ok(())
}

fn demo_interviewer(stage: StageId) -> InterviewerId {
    let id = match stage {
        StageId::Hr => "ivr-hr-01",
        StageId::Cultural => "ivr-culture-01",
        StageId::Technical => "ivr-eng-01",
        StageId::Final | StageId::Offer => "ivr-exec-01",
    };
    InterviewerId(id.to_string())
}
