//! Group memberships.
//!
//! A membership row is the capability that lets a user act inside a group.
//! The `(group_id, user_id)` pair is unique at the storage layer.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: String,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(group_id: Uuid, user_id: String, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            is_admin,
            joined_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "group_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub is_admin: bool,
    pub joined_at: DateTimeUtc,
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
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&GroupMember> for ActiveModel {
    fn from(member: &GroupMember) -> Self {
        Self {
            id: ActiveValue::Set(member.id.to_string()),
            group_id: ActiveValue::Set(member.group_id.to_string()),
            user_id: ActiveValue::Set(member.user_id.clone()),
            is_admin: ActiveValue::Set(member.is_admin),
            joined_at: ActiveValue::Set(member.joined_at),
        }
    }
}

impl TryFrom<Model> for GroupMember {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "membership")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            user_id: model.user_id,
            is_admin: model.is_admin,
            joined_at: model.joined_at,
        })
    }
}
