use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use super::domain::ApplicantId;

/// Slots are pruned once the map grows past this many applicants.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-applicant mutual exclusion for read-decide-write sequences.
///
/// Operations on different applicants never contend. Waiting is bounded by the configured
/// timeout so a stuck holder surfaces as [`LockTimeout`] instead of a hang.
pub struct ApplicantLocks {
    timeout: Duration,
    slots: Mutex<HashMap<ApplicantId, Arc<Mutex<()>>>>,
}

/// Held for the duration of one pipeline operation.
pub struct ApplicantGuard {
    _guard: ArcMutexGuard<RawMutex, ()>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("applicant {applicant_id} is locked by another operation (waited {waited:?})")]
pub struct LockTimeout {
    pub applicant_id: ApplicantId,
    pub waited: Duration,
}

impl ApplicantLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn acquire(&self, applicant_id: &ApplicantId) -> Result<ApplicantGuard, LockTimeout> {
        let slot = {
            let mut slots = self.slots.lock();
            if slots.len() >= PRUNE_THRESHOLD {
                // Only this map holds an idle slot, and cloning happens under the map lock.
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            slots.entry(applicant_id.clone()).or_default().clone()
        };

        slot.try_lock_arc_for(self.timeout)
            .map(|guard| ApplicantGuard { _guard: guard })
            .ok_or_else(|| LockTimeout {
                applicant_id: applicant_id.clone(),
                waited: self.timeout,
            })
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.slots.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn id(value: &str) -> ApplicantId {
        ApplicantId(value.to_string())
    }

    #[test]
    fn second_holder_times_out() {
        let locks = ApplicantLocks::new(Duration::from_millis(20));
        let _held = locks.acquire(&id("apl-1")).expect("first acquire");

        let err = locks
            .acquire(&id("apl-1"))
            .err()
            .expect("second acquire must time out");
        assert_eq!(err.applicant_id, id("apl-1"));
        assert_eq!(err.waited, Duration::from_millis(20));
    }

    #[test]
    fn different_applicants_do_not_contend() {
        let locks = ApplicantLocks::new(Duration::from_millis(20));
        let _first = locks.acquire(&id("apl-1")).expect("first applicant");
        let _second = locks.acquire(&id("apl-2")).expect("second applicant");
    }

    #[test]
    fn released_lock_can_be_reacquired_from_another_thread() {
        let locks = Arc::new(ApplicantLocks::new(Duration::from_secs(2)));
        let held = locks.acquire(&id("apl-1")).expect("first acquire");
        let (sender, receiver) = mpsc::channel();

        let worker = {
            let locks = locks.clone();
            thread::spawn(move || {
                let acquired = locks.acquire(&id("apl-1")).is_ok();
                sender.send(acquired).expect("send result");
            })
        };

        drop(held);
        worker.join().expect("worker joins");
        assert!(receiver.recv().expect("result"));
    }

    #[test]
    fn idle_slots_are_pruned() {
        let locks = ApplicantLocks::new(Duration::from_millis(5));
        for index in 0..PRUNE_THRESHOLD {
            drop(locks.acquire(&id(&format!("apl-{index}"))).expect("acquire"));
        }
        let _guard = locks.acquire(&id("apl-fresh")).expect("acquire after pruning");
        assert_eq!(locks.tracked(), 1);
    }
}
