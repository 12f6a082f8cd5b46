use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::error::StreakError;
use crate::ledger::{
    Amount, CheckInOutcome, LedgerSnapshot, StreakLedger, StreakView, Timestamp, UserId,
};

/// Thread-safe handle around a [`StreakLedger`].
///
/// On-chain every call runs under global mutual exclusion; off that
/// substrate the same guarantee has to be made explicit. Write calls hold
/// the lock across the entire read-modify-write, so two concurrent
/// check-ins for one user can never both observe the pre-update record.
/// `now` always comes from the system clock here — callers cannot supply
/// their own time.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<StreakLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: StreakLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn check_in(&self, user: &UserId, paid_amount: Amount) -> Result<CheckInOutcome, StreakError> {
        let now = unix_now();
        self.inner.write().check_in(user, paid_amount, now)
    }

    pub fn get_streak(&self, user: &UserId) -> StreakView {
        self.inner.read().get_streak(user, unix_now())
    }

    pub fn withdraw(&self, caller: &UserId) -> Result<Amount, StreakError> {
        let now = unix_now();
        self.inner.write().withdraw(caller, now)
    }

    pub fn accumulated_balance(&self) -> Amount {
        self.inner.read().accumulated_balance()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().snapshot()
    }
}

/// Seconds since the Unix epoch from the system clock.
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ACTIVATION_FEE;

    #[test]
    fn concurrent_check_ins_for_one_user_accept_exactly_one() {
        let shared = SharedLedger::new(StreakLedger::new("admin".to_string()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let shared = shared.clone();
            handles.push(std::thread::spawn(move || {
                shared.check_in(&"alice".to_string(), ACTIVATION_FEE).is_ok()
            }));
        }
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        let view = shared.get_streak(&"alice".to_string());
        assert_eq!(view.count, 1);
        assert_eq!(shared.accumulated_balance(), ACTIVATION_FEE);
    }

    #[test]
    fn distinct_users_check_in_in_parallel() {
        let shared = SharedLedger::new(StreakLedger::new("admin".to_string()));
        let mut handles = Vec::new();
        for idx in 0..8 {
            let shared = shared.clone();
            handles.push(std::thread::spawn(move || {
                shared
                    .check_in(&format!("user-{idx}"), ACTIVATION_FEE)
                    .unwrap()
            }));
        }
        for handle in handles {
            let outcome = handle.join().unwrap();
            assert_eq!(outcome.record.count, 1);
        }
        assert_eq!(shared.accumulated_balance(), ACTIVATION_FEE * 8);
    }
}
