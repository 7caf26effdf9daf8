//! Offer-stage specialization: who may respond to an offer and who may be onboarded.

use super::super::catalog::StageId;
use super::super::domain::OfferStatus;
use super::{progress, PipelineView, Progress};

/// Reasons onboarding is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OnboardBlock {
    #[error("applicant has already been onboarded")]
    AlreadyOnboarded,
    #[error("onboarding requires a passed final interview")]
    FinalNotPassed,
    #[error("onboarding requires an accepted offer (offer is {})", .status.label())]
    OfferNotAccepted { status: OfferStatus },
    #[error("pipeline halted after a failed {stage}")]
    PipelineHalted { stage: StageId },
}

impl OnboardBlock {
    pub const fn reason(&self) -> &'static str {
        match self {
            OnboardBlock::AlreadyOnboarded => "already_onboarded",
            OnboardBlock::FinalNotPassed
            | OnboardBlock::OfferNotAccepted { .. }
            | OnboardBlock::PipelineHalted { .. } => "onboarding_precondition_not_met",
        }
    }
}

/// Reasons an offer status update is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfferBlock {
    #[error("no offer has been extended; the final interview has not passed")]
    NotExtended,
    #[error("applicant has already been onboarded")]
    AlreadyOnboarded,
    #[error("pipeline halted after a failed {stage}")]
    PipelineHalted { stage: StageId },
    #[error("the offer was declined and cannot be reopened")]
    Declined,
}

impl OfferBlock {
    pub const fn reason(&self) -> &'static str {
        match self {
            OfferBlock::NotExtended => "offer_not_extended",
            OfferBlock::AlreadyOnboarded => "already_onboarded",
            OfferBlock::PipelineHalted { .. } => "pipeline_halted",
            OfferBlock::Declined => "offer_declined",
        }
    }
}

/// Final stage passed and offer accepted, on an applicant not yet onboarded.
pub fn can_onboard(view: &PipelineView<'_>) -> bool {
    check_onboard(view).is_ok()
}

pub fn check_onboard(view: &PipelineView<'_>) -> Result<(), OnboardBlock> {
    if view.onboarded {
        return Err(OnboardBlock::AlreadyOnboarded);
    }
    if !view.final_passed() {
        return Err(OnboardBlock::FinalNotPassed);
    }
    if let Progress::Halted { stage } = progress(view.history) {
        return Err(OnboardBlock::PipelineHalted { stage });
    }
    if view.offer_status != OfferStatus::Accepted {
        return Err(OnboardBlock::OfferNotAccepted {
            status: view.offer_status,
        });
    }
    Ok(())
}

pub fn check_offer_update(
    view: &PipelineView<'_>,
    requested: OfferStatus,
) -> Result<(), OfferBlock> {
    if view.onboarded {
        return Err(OfferBlock::AlreadyOnboarded);
    }
    if !view.final_passed() {
        return Err(OfferBlock::NotExtended);
    }
    if let Progress::Halted { stage } = progress(view.history) {
        return Err(OfferBlock::PipelineHalted { stage });
    }
    if view.offer_status == OfferStatus::Rejected && requested != OfferStatus::Rejected {
        return Err(OfferBlock::Declined);
    }
    Ok(())
}
