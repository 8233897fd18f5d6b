//! Expense shares.
//!
//! One row per `(expense, participant)` pair, created in the same batch as
//! the parent expense. Amounts are integer cents:
//! - `amount_owed_minor` is what the participant is responsible for
//! - `amount_paid_minor` is what the participant put toward the expense
//!
//! A user's balance in a group is `Σ paid − Σ owed` over these rows.

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: String,
    pub amount_owed: MoneyCents,
    pub amount_paid: MoneyCents,
    pub settled: bool,
    /// Percentage the share was derived from (`percent` splits).
    pub percent: Option<Decimal>,
    /// Share units the amount was derived from (`equal` splits).
    pub shares: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expense_shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub user_id: String,
    pub position: i32,
    pub amount_owed_minor: i64,
    pub amount_paid_minor: i64,
    pub settled: bool,
    pub percent: Option<String>,
    pub shares: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Builds the row for `share`, keeping its position in the participant
    /// list so reads return shares in the order they were requested.
    pub(crate) fn from_share(share: &ExpenseShare, position: i32) -> Self {
        Self {
            id: ActiveValue::Set(share.id.to_string()),
            expense_id: ActiveValue::Set(share.expense_id.to_string()),
            user_id: ActiveValue::Set(share.user_id.clone()),
            position: ActiveValue::Set(position),
            amount_owed_minor: ActiveValue::Set(share.amount_owed.cents()),
            amount_paid_minor: ActiveValue::Set(share.amount_paid.cents()),
            settled: ActiveValue::Set(share.settled),
            percent: ActiveValue::Set(share.percent.map(|p| p.to_string())),
            shares: ActiveValue::Set(share.shares),
        }
    }
}

impl TryFrom<Model> for ExpenseShare {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let percent = model
            .percent
            .as_deref()
            .map(str::parse::<Decimal>)
            .transpose()
            .map_err(|_| EngineError::InvalidSplit("invalid stored percent".to_string()))?;
        Ok(Self {
            id: parse_uuid(&model.id, "share")?,
            expense_id: parse_uuid(&model.expense_id, "expense")?,
            user_id: model.user_id,
            amount_owed: MoneyCents::new(model.amount_owed_minor),
            amount_paid: MoneyCents::new(model.amount_paid_minor),
            settled: model.settled,
            percent,
            shares: model.shares,
        })
    }
}
