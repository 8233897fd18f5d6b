use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseShare, NewExpenseCmd, ResultEngine, SplitMethod, expense_shares,
    expenses,
    util::{normalize_required_name, normalize_user_id},
};

use super::{Engine, with_tx};

/// An expense header together with its shares, in participant order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDetail {
    pub expense: Expense,
    pub shares: Vec<ExpenseShare>,
}

impl Engine {
    /// Record an expense and split it among `cmd.participants`.
    ///
    /// The share plan is computed before anything is written; the header and
    /// every share are then inserted in one transaction, so a rejected
    /// request leaves no rows behind.
    pub async fn create_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<ExpenseDetail> {
        let NewExpenseCmd {
            group_id,
            user_id,
            name,
            amount,
            expense_type,
            split_method,
            participants,
            splits,
        } = cmd;
        let user_id = normalize_user_id(&user_id)?;
        let name = normalize_required_name(&name, "expense")?;
        let expense_type = match expense_type.trim() {
            "" => "general".to_string(),
            other => other.to_string(),
        };
        let participants: Vec<String> = participants
            .iter()
            .map(|p| p.trim().to_string())
            .collect();

        let created: ResultEngine<ExpenseDetail> = with_tx!(self, |db_tx| {
            let member = self.require_member(&db_tx, group_id, &user_id).await?;
            if participants.is_empty() {
                return Err(EngineError::NoParticipants);
            }
            let method = SplitMethod::try_from(split_method.as_str())?;
            let drafts =
                self.splitter
                    .plan(amount, &participants, method, splits.as_deref(), &user_id)?;
            tracing::debug!(%group_id, %method, ?drafts, "share plan computed");

            let expense = Expense::new(
                group_id,
                user_id.clone(),
                member.id,
                name,
                amount,
                expense_type,
                method,
            )?;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;

            let mut shares = Vec::with_capacity(drafts.len());
            for (index, draft) in drafts.into_iter().enumerate() {
                let position = i32::try_from(index)
                    .map_err(|_| EngineError::InvalidSplit("too many participants".to_string()))?;
                let share = draft.into_share(expense.id);
                expense_shares::ActiveModel::from_share(&share, position)
                    .insert(&db_tx)
                    .await?;
                shares.push(share);
            }
            Ok(ExpenseDetail { expense, shares })
        });
        let detail = created?;

        tracing::info!(
            expense_id = %detail.expense.id,
            %group_id,
            amount = %detail.expense.amount,
            shares = detail.shares.len(),
            "expense created"
        );
        Ok(detail)
    }

    /// A single expense with its shares. Only members of the expense's group
    /// may read it.
    pub async fn expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<ExpenseDetail> {
        with_tx!(self, |db_tx| {
            let model = expenses::Entity::find_by_id(expense_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            let expense = Expense::try_from(model)?;
            self.require_member(&db_tx, expense.group_id, user_id).await?;

            let shares = expense_shares::Entity::find()
                .filter(expense_shares::Column::ExpenseId.eq(expense_id.to_string()))
                .order_by_asc(expense_shares::Column::Position)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(ExpenseShare::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(ExpenseDetail { expense, shares })
        })
    }

    /// Expenses of a group, newest first.
    pub async fn list_expenses(&self, group_id: Uuid, user_id: &str) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, group_id, user_id).await?;
            expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group_id.to_string()))
                .order_by_desc(expenses::Column::CreatedAt)
                .order_by_desc(expenses::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Expense::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
