//! The module contains the errors the engine can throw.
//!
//! Every caller-recoverable condition has its own variant:
//!
//! - [`NotMember`] the user has no membership in the group.
//! - [`NoParticipants`] an expense was requested without participants.
//! - [`InvalidSplit`] the split input does not match the participants.
//! - [`UnsupportedSplitMethod`] the split method is not `equal`, `percent`
//!   or `custom`.
//! - [`DuplicateInviteCode`] the invite-code allocator ran out of attempts.
//! - [`DuplicateMembership`] the user already belongs to the group.
//!
//! Storage failures surface as [`Database`] and are never retried here.
//!
//!  [`NotMember`]: EngineError::NotMember
//!  [`NoParticipants`]: EngineError::NoParticipants
//!  [`InvalidSplit`]: EngineError::InvalidSplit
//!  [`UnsupportedSplitMethod`]: EngineError::UnsupportedSplitMethod
//!  [`DuplicateInviteCode`]: EngineError::DuplicateInviteCode
//!  [`DuplicateMembership`]: EngineError::DuplicateMembership
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not a member of group {0}")]
    NotMember(String),
    #[error("No participants provided")]
    NoParticipants,
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Unsupported split method: {0}")]
    UnsupportedSplitMethod(String),
    #[error("Could not allocate a unique invite code after {0} attempts")]
    DuplicateInviteCode(u32),
    #[error("User {user_id} is already a member of group {group_id}")]
    DuplicateMembership { group_id: String, user_id: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when the error is a unique-index violation reported by
    /// the database.
    pub(crate) fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(err) => {
                matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
            }
            _ => false,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotMember(a), Self::NotMember(b)) => a == b,
            (Self::NoParticipants, Self::NoParticipants) => true,
            (Self::InvalidSplit(a), Self::InvalidSplit(b)) => a == b,
            (Self::UnsupportedSplitMethod(a), Self::UnsupportedSplitMethod(b)) => a == b,
            (Self::DuplicateInviteCode(a), Self::DuplicateInviteCode(b)) => a == b,
            (
                Self::DuplicateMembership {
                    group_id: ga,
                    user_id: ua,
                },
                Self::DuplicateMembership {
                    group_id: gb,
                    user_id: ub,
                },
            ) => ga == gb && ua == ub,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
