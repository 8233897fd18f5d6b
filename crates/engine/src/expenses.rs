//! Expense headers.
//!
//! An `Expense` belongs to exactly one group and records who created it,
//! both as a user and as the membership that authorized the write. The
//! per-participant obligations live in [`crate::expense_shares`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

/// Strategy used to partition an expense amount among participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    Equal,
    Percent,
    Custom,
}

impl SplitMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Percent => "percent",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SplitMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "percent" => Ok(Self::Percent),
            "custom" => Ok(Self::Custom),
            _ => Err(EngineError::UnsupportedSplitMethod(value.to_string())),
        }
    }
}

impl FromStr for SplitMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub created_by: String,
    pub member_id: Uuid,
    pub name: String,
    pub amount: MoneyCents,
    pub expense_type: String,
    pub split_method: SplitMethod,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        group_id: Uuid,
        created_by: String,
        member_id: Uuid,
        name: String,
        amount: MoneyCents,
        expense_type: String,
        split_method: SplitMethod,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            created_by,
            member_id,
            name,
            amount,
            expense_type,
            split_method,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub created_by: String,
    pub member_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub expense_type: String,
    pub split_method: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::expense_shares::Entity")]
    ExpenseShares,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::expense_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseShares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.to_string()),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            member_id: ActiveValue::Set(expense.member_id.to_string()),
            name: ActiveValue::Set(expense.name.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            expense_type: ActiveValue::Set(expense.expense_type.clone()),
            split_method: ActiveValue::Set(expense.split_method.as_str().to_string()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            created_by: model.created_by,
            member_id: parse_uuid(&model.member_id, "membership")?,
            name: model.name,
            amount: MoneyCents::new(model.amount_minor),
            expense_type: model.expense_type,
            split_method: SplitMethod::try_from(model.split_method.as_str())?,
            created_at: model.created_at,
        })
    }
}
