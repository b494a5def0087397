#[derive(thiserror::Error, Debug)]
pub enum TrailguardError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("concurrent modification of ban record for {address}")]
    Conflict { address: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Inconsistent state error")]
    InconsistentState,
}

impl TrailguardError {
    /// Message safe to hand to the end caller. Storage details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "request conflicted with a concurrent request",
            _ => "internal server error",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_are_not_leaked() {
        let err = TrailguardError::from(sea_orm::DbErr::Custom("table bans is locked".into()));
        assert_eq!(err.public_message(), "internal server error");
        assert!(err.to_string().contains("table bans is locked"));
    }

    #[test]
    fn test_conflict_is_structural() {
        let err = TrailguardError::Conflict {
            address: "10.0.0.1".into(),
        };
        assert!(err.is_conflict());
        assert!(!TrailguardError::InconsistentState.is_conflict());
    }

    #[test]
    fn test_config_errors_are_not_leaked() {
        let err = TrailguardError::InvalidConfig("abuse_protection.window is too large".into());
        assert_eq!(err.public_message(), "internal server error");
        assert!(!err.is_conflict());
    }
}
