use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StreakError;

pub type UserId = String;
pub type Amount = u64;
pub type Timestamp = u64;

pub const NATIVE_SCALE: u64 = 1_000_000_000_000_000_000; // 1 native unit = 1e18 minimal units

/// Minimum payment accepted per check-in (0.000005 native units).
pub const ACTIVATION_FEE: Amount = NATIVE_SCALE / 200_000;
/// At most one check-in per hour.
pub const MIN_CHECKIN_INTERVAL: u64 = 3_600;
/// A streak survives as long as check-ins are at most one day apart.
pub const STREAK_WINDOW: u64 = 86_400;

/// Stored per-user state. An absent entry is equivalent to the default.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StreakRecord {
    pub count: u64,
    pub last_check_in: Timestamp,
    /// "Has ever started" flag; once true it never reverts, even after
    /// the streak expires.
    pub is_active: bool,
}

/// Query result of [`StreakLedger::get_streak`]; `is_expired` is derived
/// against the supplied `now`, never stored.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakView {
    pub count: u64,
    pub last_check_in: Timestamp,
    pub is_active: bool,
    pub is_expired: bool,
}

/// Three-way classification a check-in transitions from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreakPhase {
    /// No record, or a record that never activated.
    NoRecord,
    /// Active and the last check-in is within the streak window.
    Fresh,
    /// Active but the streak window has elapsed.
    Expired,
}

/// Classify a record against `now`. Elapsed time saturates at zero so a
/// backwards clock can never make a fresh streak look expired.
pub fn classify(record: Option<&StreakRecord>, now: Timestamp) -> StreakPhase {
    match record {
        Some(rec) if rec.is_active => {
            if now.saturating_sub(rec.last_check_in) > STREAK_WINDOW {
                StreakPhase::Expired
            } else {
                StreakPhase::Fresh
            }
        }
        _ => StreakPhase::NoRecord,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreakEvent {
    StreakActivated {
        user: UserId,
        at: Timestamp,
    },
    StreakContinued {
        user: UserId,
        count: u64,
        at: Timestamp,
    },
    StreakBroken {
        user: UserId,
        previous_count: u64,
        at: Timestamp,
    },
    BalanceWithdrawn {
        to: UserId,
        amount: Amount,
        at: Timestamp,
    },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckInKind {
    Activated,
    Continued,
    Broken,
}

/// What a successful check-in did, plus the updated record so the caller
/// can react without a separate read.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInOutcome {
    pub kind: CheckInKind,
    pub record: StreakRecord,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub administrator: UserId,
    pub accumulated_balance: Amount,
    pub records: BTreeMap<UserId, StreakRecord>,
    pub events: Vec<StreakEvent>,
    pub merkle_root: [u8; 32],
}

impl LedgerSnapshot {
    /// Merkle root as lowercase hex, for logs and client display.
    pub fn merkle_root_hex(&self) -> String {
        hex::encode(self.merkle_root)
    }
}

/// The streak ledger: per-user records, an append-only event log, and the
/// balance of collected fees. The administrator is fixed at construction.
#[derive(Debug)]
pub struct StreakLedger {
    administrator: UserId,
    accumulated_balance: Amount,
    records: BTreeMap<UserId, StreakRecord>,
    events: Vec<StreakEvent>,
}

impl StreakLedger {
    pub fn new(administrator: UserId) -> Self {
        Self {
            administrator,
            accumulated_balance: 0,
            records: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn administrator(&self) -> &UserId {
        &self.administrator
    }

    pub fn accumulated_balance(&self) -> Amount {
        self.accumulated_balance
    }

    pub fn record(&self, user: &UserId) -> Option<&StreakRecord> {
        self.records.get(user)
    }

    pub fn events(&self) -> &[StreakEvent] {
        &self.events
    }

    /// Accept or reject a check-in at `now`. The payment guard runs
    /// first, then the recency guard; only then is the phase classified.
    /// Every accepted branch keeps the payment and appends exactly one
    /// event. A rejected call leaves the ledger untouched.
    pub fn check_in(
        &mut self,
        user: &UserId,
        paid_amount: Amount,
        now: Timestamp,
    ) -> Result<CheckInOutcome, StreakError> {
        if paid_amount < ACTIVATION_FEE {
            return Err(StreakError::InsufficientPayment {
                paid: paid_amount,
                required: ACTIVATION_FEE,
            });
        }
        if let Some(rec) = self.records.get(user) {
            if rec.is_active {
                let elapsed = now.saturating_sub(rec.last_check_in);
                if elapsed < MIN_CHECKIN_INTERVAL {
                    return Err(StreakError::TooSoon {
                        wait: MIN_CHECKIN_INTERVAL - elapsed,
                    });
                }
            }
        }

        // rejected before any mutation so a failed call commits nothing
        let new_balance = self
            .accumulated_balance
            .checked_add(paid_amount)
            .ok_or(StreakError::BalanceOverflow { paid: paid_amount })?;

        let phase = classify(self.records.get(user), now);
        let record = self.records.entry(user.clone()).or_default();
        let (kind, event) = match phase {
            StreakPhase::NoRecord => {
                record.count = 1;
                record.last_check_in = now;
                record.is_active = true;
                (
                    CheckInKind::Activated,
                    StreakEvent::StreakActivated {
                        user: user.clone(),
                        at: now,
                    },
                )
            }
            StreakPhase::Fresh => {
                record.count += 1;
                record.last_check_in = now;
                (
                    CheckInKind::Continued,
                    StreakEvent::StreakContinued {
                        user: user.clone(),
                        count: record.count,
                        at: now,
                    },
                )
            }
            StreakPhase::Expired => {
                let previous_count = record.count;
                record.count = 1;
                record.last_check_in = now;
                (
                    CheckInKind::Broken,
                    StreakEvent::StreakBroken {
                        user: user.clone(),
                        previous_count,
                        at: now,
                    },
                )
            }
        };
        let updated = *record;
        self.accumulated_balance = new_balance;
        self.events.push(event);
        Ok(CheckInOutcome {
            kind,
            record: updated,
        })
    }

    /// Read-only view of a user's streak, with expiry evaluated against
    /// the supplied `now`.
    pub fn get_streak(&self, user: &UserId, now: Timestamp) -> StreakView {
        let record = self.records.get(user).copied().unwrap_or_default();
        let is_expired =
            record.is_active && now.saturating_sub(record.last_check_in) > STREAK_WINDOW;
        StreakView {
            count: record.count,
            last_check_in: record.last_check_in,
            is_active: record.is_active,
            is_expired,
        }
    }

    /// Move the entire accumulated balance to the administrator. A zero
    /// balance is an error, not a silent no-op.
    pub fn withdraw(&mut self, caller: &UserId, now: Timestamp) -> Result<Amount, StreakError> {
        if caller != &self.administrator {
            return Err(StreakError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if self.accumulated_balance == 0 {
            return Err(StreakError::NothingToWithdraw);
        }
        let amount = self.accumulated_balance;
        self.accumulated_balance = 0;
        self.events.push(StreakEvent::BalanceWithdrawn {
            to: caller.clone(),
            amount,
            at: now,
        });
        Ok(amount)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            administrator: self.administrator.clone(),
            accumulated_balance: self.accumulated_balance,
            records: self.records.clone(),
            events: self.events.clone(),
            merkle_root: compute_merkle_root(
                &self.administrator,
                self.accumulated_balance,
                &self.records,
            ),
        }
    }

    /// Restore a ledger from a snapshot, verifying the merkle root.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, StreakError> {
        let expected = compute_merkle_root(
            &snapshot.administrator,
            snapshot.accumulated_balance,
            &snapshot.records,
        );
        if expected != snapshot.merkle_root {
            return Err(StreakError::CorruptSnapshot);
        }
        Ok(Self {
            administrator: snapshot.administrator,
            accumulated_balance: snapshot.accumulated_balance,
            records: snapshot.records,
            events: snapshot.events,
        })
    }
}

fn compute_merkle_root(
    administrator: &UserId,
    accumulated_balance: Amount,
    records: &BTreeMap<UserId, StreakRecord>,
) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    {
        let mut hasher = Sha256::new();
        hasher.update(b"admin");
        hasher.update(administrator.as_bytes());
        hasher.update(accumulated_balance.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (user, record) in records {
        let mut hasher = Sha256::new();
        hasher.update(b"record");
        hasher.update(user.as_bytes());
        hasher.update(record.count.to_le_bytes());
        hasher.update(record.last_check_in.to_le_bytes());
        hasher.update([record.is_active as u8]);
        leaves.push(hasher.finalize().into());
    }
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"streak-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
