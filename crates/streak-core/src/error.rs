use thiserror::Error;

use crate::ledger::{Amount, UserId};

/// Canonical error type for all ledger operations. A returned error
/// means the call committed nothing.
#[derive(Debug, Error)]
pub enum StreakError {
    /// The submitted payment is below the activation fee.
    #[error("insufficient payment: {paid} paid, {required} required")]
    InsufficientPayment { paid: Amount, required: Amount },

    /// The user already checked in within the minimum interval.
    #[error("already checked in recently, retry in {wait}s")]
    TooSoon { wait: u64 },

    /// Only the administrator may withdraw the accumulated balance.
    #[error("caller {caller} is not the administrator")]
    Unauthorized { caller: UserId },

    /// Accepting the payment would overflow the accumulated balance.
    #[error("payment of {paid} would overflow the accumulated balance")]
    BalanceOverflow { paid: Amount },

    /// The accumulated balance is zero.
    #[error("nothing to withdraw")]
    NothingToWithdraw,

    /// A restored snapshot failed merkle root verification.
    #[error("snapshot merkle root mismatch")]
    CorruptSnapshot,
}
