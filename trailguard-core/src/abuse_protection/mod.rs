mod escalation;
mod service;

pub use escalation::{
    ban_expiry, first_ban_step, hours_to_duration, latest_ban_expiry, next_ban_step, BanStep,
};
pub use service::{AbuseProtectionService, BanInfo, EscalationOutcome, SecurityStatus};

pub use crate::ledger::rejection::RejectedRequestInfo;
