//! Command structs for engine write operations.
//!
//! Expense creation takes many parameters; grouping them here keeps call
//! sites readable.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::MoneyCents;

/// Create an expense inside a group and split it among participants.
///
/// `split_method` is kept as the raw caller string so that unknown methods
/// are reported as [`EngineError::UnsupportedSplitMethod`](crate::EngineError::UnsupportedSplitMethod).
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub group_id: Uuid,
    pub user_id: String,
    pub name: String,
    pub amount: MoneyCents,
    pub expense_type: String,
    pub split_method: String,
    pub participants: Vec<String>,
    pub splits: Option<Vec<Decimal>>,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(
        group_id: Uuid,
        user_id: impl Into<String>,
        name: impl Into<String>,
        amount: MoneyCents,
    ) -> Self {
        Self {
            group_id,
            user_id: user_id.into(),
            name: name.into(),
            amount,
            expense_type: "general".to_string(),
            split_method: "equal".to_string(),
            participants: Vec::new(),
            splits: None,
        }
    }

    #[must_use]
    pub fn expense_type(mut self, expense_type: impl Into<String>) -> Self {
        self.expense_type = expense_type.into();
        self
    }

    #[must_use]
    pub fn split_method(mut self, method: impl Into<String>) -> Self {
        self.split_method = method.into();
        self
    }

    #[must_use]
    pub fn participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn splits(mut self, splits: impl Into<Vec<Decimal>>) -> Self {
        self.splits = Some(splits.into());
        self
    }
}
