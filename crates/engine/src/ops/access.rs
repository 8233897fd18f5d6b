use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, GroupMember, ResultEngine, group_members};

use super::{Engine, with_tx};

/// What a user may do inside a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAccess {
    None,
    Member,
    Admin,
}

impl GroupAccess {
    pub fn is_member(self) -> bool {
        matches!(self, Self::Member | Self::Admin)
    }
}

impl From<Option<&GroupMember>> for GroupAccess {
    fn from(member: Option<&GroupMember>) -> Self {
        match member {
            None => Self::None,
            Some(m) if m.is_admin => Self::Admin,
            Some(_) => Self::Member,
        }
    }
}

impl Engine {
    /// Capability of `user_id` in `group_id`. Unknown groups yield
    /// [`GroupAccess::None`].
    pub async fn group_access(&self, group_id: Uuid, user_id: &str) -> ResultEngine<GroupAccess> {
        with_tx!(self, |db_tx| {
            let member = self.find_membership(&db_tx, group_id, user_id).await?;
            Ok(GroupAccess::from(member.as_ref()))
        })
    }

    pub async fn is_member(&self, group_id: Uuid, user_id: &str) -> ResultEngine<bool> {
        Ok(self.group_access(group_id, user_id).await?.is_member())
    }

    /// Returns the membership row or fails with [`EngineError::NotMember`].
    pub async fn require_membership(
        &self,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<GroupMember> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, group_id, user_id).await
        })
    }

    pub(super) async fn find_membership(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<GroupMember>> {
        group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .filter(group_members::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .map(GroupMember::try_from)
            .transpose()
    }

    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<GroupMember> {
        self.find_membership(db, group_id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotMember(group_id.to_string()))
    }
}
