use super::super::catalog::StageId;
use super::super::domain::{InterviewRecord, InterviewResult};

/// Every interview of one stage, oldest first.
#[derive(Debug, Clone)]
pub struct StageAttempts<'a> {
    stage: StageId,
    records: Vec<&'a InterviewRecord>,
}

impl<'a> StageAttempts<'a> {
    /// Collect the interviews of `stage` ordered by creation time, attempt number breaking
    /// ties. Cancelled interviews are kept: they still hold an attempt slot.
    pub fn collect(history: &'a [InterviewRecord], stage: StageId) -> Self {
        let mut records: Vec<&InterviewRecord> = history
            .iter()
            .filter(|interview| interview.stage == stage)
            .collect();
        records.sort_by(|left, right| {
            left.recency()
                .cmp(&right.recency())
                .then_with(|| left.id.cmp(&right.id))
        });

        Self { stage, records }
    }

    pub fn stage(&self) -> StageId {
        self.stage
    }

    /// Attempt slots used, cancelled interviews included.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// The most recent live attempt; its result is the stage's result.
    pub fn effective(&self) -> Option<&'a InterviewRecord> {
        self.records
            .iter()
            .rev()
            .copied()
            .find(|interview| interview.is_live())
    }

    pub fn effective_result(&self) -> Option<InterviewResult> {
        self.effective().map(|interview| interview.result)
    }

    pub fn awaiting_result(&self) -> Option<&'a InterviewRecord> {
        self.records
            .iter()
            .copied()
            .find(|interview| interview.is_awaiting_result())
    }

    pub fn has_retry_left(&self) -> bool {
        self.count() < usize::from(self.stage.attempt_limit())
    }

    pub fn passed(&self) -> bool {
        self.effective_result() == Some(InterviewResult::Pass)
    }
}
