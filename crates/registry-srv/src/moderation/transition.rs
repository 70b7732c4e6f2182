//! The record lifecycle as a pure transition table.
//!
//! ```text
//! pending  --approve--> approved
//! pending  --reject---> rejected
//! approved --reject---> rejected
//! rejected --approve--> approved
//! rejected --reopen---> pending
//! pending | approved | rejected --ban--> banned
//! ```
//!
//! `banned` has no outgoing transitions.

use registry_core::{ModerationAction, RecordStatus};

/// Status after applying `action` in `from`, or `None` if not allowed.
#[must_use]
pub const fn next_status(from: RecordStatus, action: ModerationAction) -> Option<RecordStatus> {
    use ModerationAction as A;
    use RecordStatus as S;

    match (from, action) {
        (S::Pending | S::Rejected, A::Approve) => Some(S::Approved),
        (S::Pending | S::Approved, A::Reject) => Some(S::Rejected),
        (S::Pending | S::Approved | S::Rejected, A::Ban) => Some(S::Banned),
        (S::Rejected, A::Reopen) => Some(S::Pending),
        _ => None,
    }
}

/// Actions allowed in `from`.
#[must_use]
pub fn allowed_actions(from: RecordStatus) -> Vec<ModerationAction> {
    ModerationAction::ALL
        .into_iter()
        .filter(|action| next_status(from, *action).is_some())
        .collect()
}

/// Statuses reachable from `from` in one transition.
#[must_use]
pub fn reachable_from(from: RecordStatus) -> Vec<RecordStatus> {
    let mut reachable: Vec<RecordStatus> = ModerationAction::ALL
        .into_iter()
        .filter_map(|action| next_status(from, action))
        .collect();
    reachable.sort_by_key(|s| s.as_str());
    reachable.dedup();
    reachable
}
