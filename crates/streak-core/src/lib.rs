//! Core state machine for the daily check-in streak ledger.
//!
//! This crate exposes the building blocks the rest of the stack relies
//! upon:
//!
//! * [`ledger`] — the [`ledger::StreakLedger`] itself: per-user streak
//!   records, the three-way check-in transition (activate, continue,
//!   break), the derived expiry query, administrator withdrawal, and
//!   merkle-verified snapshots.
//! * [`shared`] — a lock-wrapped [`shared::SharedLedger`] handle that
//!   serializes writes and supplies the clock, for hosts without the
//!   atomic-call guarantee of a chain runtime.
//!
//! The modules are intentionally small so that front ends (CLI, service,
//! …) can embed the semantics without bespoke plumbing of their own.

pub mod ledger;
pub mod shared;

mod error;

pub use error::StreakError;
