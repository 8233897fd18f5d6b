use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    ExpenseSplitter, InviteCodeGenerator, RandomInviteCode, RemainderPolicy, ResultEngine,
};

mod access;
mod balances;
mod expenses;
mod groups;

pub use access::GroupAccess;
pub use expenses::ExpenseDetail;

/// Attempts made to find a free invite code before giving up.
pub const DEFAULT_MAX_INVITE_ATTEMPTS: u32 = 8;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    invite_codes: Arc<dyn InviteCodeGenerator>,
    max_invite_attempts: u32,
    splitter: ExpenseSplitter,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    invite_codes: Arc<dyn InviteCodeGenerator>,
    max_invite_attempts: u32,
    remainder_policy: RemainderPolicy,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            invite_codes: Arc::new(RandomInviteCode),
            max_invite_attempts: DEFAULT_MAX_INVITE_ATTEMPTS,
            remainder_policy: RemainderPolicy::default(),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the invite-code source (deterministic codes in tests).
    pub fn invite_codes(mut self, generator: impl InviteCodeGenerator + 'static) -> EngineBuilder {
        self.invite_codes = Arc::new(generator);
        self
    }

    /// Bound the invite-code allocation loop. Values below 1 are raised to 1.
    pub fn max_invite_attempts(mut self, attempts: u32) -> EngineBuilder {
        self.max_invite_attempts = attempts.max(1);
        self
    }

    pub fn remainder_policy(mut self, policy: RemainderPolicy) -> EngineBuilder {
        self.remainder_policy = policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            invite_codes: self.invite_codes,
            max_invite_attempts: self.max_invite_attempts,
            splitter: ExpenseSplitter::new(self.remainder_policy),
        })
    }
}
