//! Moderation state machine.

pub mod service;
pub mod transition;

pub use service::ModerationService;
pub use transition::{allowed_actions, next_status, reachable_from};
