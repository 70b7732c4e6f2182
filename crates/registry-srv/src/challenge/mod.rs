//! Proof-of-work challenge gate for registration.
//!
//! - **pow**: the puzzle format and predicate (client-implementable).
//! - **service**: issuing tokens and single-use verification.

pub mod pow;
pub mod service;

pub use service::{ChallengeOutcome, ChallengeService};
