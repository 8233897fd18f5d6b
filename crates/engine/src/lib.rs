//! Shared group expenses engine.
//!
//! The [`Engine`] creates groups, enrolls members through invite codes,
//! splits expenses into per-participant shares and aggregates those shares
//! into signed balances. All state lives in the database handed to
//! [`EngineBuilder`]; the engine itself is stateless and can be shared across
//! tasks.

pub use commands::NewExpenseCmd;
pub use error::EngineError;
pub use expense_shares::ExpenseShare;
pub use expenses::{Expense, SplitMethod};
pub use group_members::GroupMember;
pub use groups::Group;
pub use invite::{INVITE_CODE_LEN, InviteCodeGenerator, RandomInviteCode};
pub use ledger::{GroupSummary, MemberBalance, Settlement, settlement_plan};
pub use money::MoneyCents;
pub use ops::{
    DEFAULT_MAX_INVITE_ATTEMPTS, Engine, EngineBuilder, ExpenseDetail, GroupAccess,
};
pub use split::{ExpenseSplitter, RemainderPolicy, ShareDraft};

mod commands;
mod error;
mod expense_shares;
mod expenses;
mod group_members;
mod groups;
mod invite;
mod ledger;
mod money;
mod ops;
mod split;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
