use sea_orm::{JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Group, GroupMember, ResultEngine, group_members, groups,
    invite::normalize_invite_code,
    util::{normalize_optional_text, normalize_required_name, normalize_user_id, parse_uuid},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a group owned by `creator_id`, who becomes its first admin.
    ///
    /// A fresh invite code is drawn for every attempt. An attempt whose code
    /// is already taken (seen by the pre-check or by the unique index) is
    /// retried until `max_invite_attempts` is spent.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        creator_id: &str,
    ) -> ResultEngine<Group> {
        let name = normalize_required_name(name, "group")?;
        let description = normalize_optional_text(description);
        let creator_id = normalize_user_id(creator_id)?;

        for attempt in 1..=self.max_invite_attempts {
            let group = Group::new(
                name.clone(),
                description.clone(),
                self.invite_codes.generate(),
                creator_id.clone(),
            );
            match self.insert_group(&group).await {
                Ok(true) => {
                    tracing::info!(group_id = %group.id, creator = %creator_id, "group created");
                    return Ok(group);
                }
                Ok(false) => {
                    tracing::warn!(attempt, code = %group.invite_code, "invite code already taken");
                }
                Err(err) if err.is_unique_violation() => {
                    tracing::warn!(attempt, code = %group.invite_code, "invite code collided on insert");
                }
                Err(err) => return Err(err),
            }
        }
        Err(EngineError::DuplicateInviteCode(self.max_invite_attempts))
    }

    /// Inserts the group and the creator's admin membership. Returns `false`
    /// without writing when the invite code is already in use.
    async fn insert_group(&self, group: &Group) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let taken = groups::Entity::find()
                .filter(groups::Column::InviteCode.eq(group.invite_code.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Ok(false);
            }

            groups::ActiveModel::from(group).insert(&db_tx).await?;
            let admin = GroupMember::new(group.id, group.created_by.clone(), true);
            group_members::ActiveModel::from(&admin)
                .insert(&db_tx)
                .await?;
            Ok(true)
        })
    }

    /// Enroll `user_id` in the group behind `invite_code` (case-insensitive).
    pub async fn join_group(&self, invite_code: &str, user_id: &str) -> ResultEngine<GroupMember> {
        let code = normalize_invite_code(invite_code)?;
        let user_id = normalize_user_id(user_id)?;

        let member = self.insert_member(&code, &user_id).await?;
        tracing::info!(group_id = %member.group_id, user = %member.user_id, "member joined");
        Ok(member)
    }

    async fn insert_member(&self, code: &str, user_id: &str) -> ResultEngine<GroupMember> {
        with_tx!(self, |db_tx| {
            let group = groups::Entity::find()
                .filter(groups::Column::InviteCode.eq(code.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("invite code not exists".to_string()))?;
            let group_id = parse_uuid(&group.id, "group")?;
            let duplicate = || EngineError::DuplicateMembership {
                group_id: group.id.clone(),
                user_id: user_id.to_string(),
            };

            if self.find_membership(&db_tx, group_id, user_id).await?.is_some() {
                return Err(duplicate());
            }

            let member = GroupMember::new(group_id, user_id.to_string(), false);
            if let Err(err) = group_members::ActiveModel::from(&member)
                .insert(&db_tx)
                .await
            {
                let err = EngineError::from(err);
                return Err(if err.is_unique_violation() {
                    duplicate()
                } else {
                    err
                });
            }
            Ok(member)
        })
    }

    /// Group details, visible to members only.
    pub async fn group(&self, group_id: Uuid, user_id: &str) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, group_id, user_id).await?;
            let model = groups::Entity::find_by_id(group_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
            Group::try_from(model)
        })
    }

    /// Members of a group in join order.
    pub async fn list_members(
        &self,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<GroupMember>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, group_id, user_id).await?;
            group_members::Entity::find()
                .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                .order_by_asc(group_members::Column::JoinedAt)
                .order_by_asc(group_members::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(GroupMember::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Every group `user_id` belongs to, oldest first.
    pub async fn list_user_groups(&self, user_id: &str) -> ResultEngine<Vec<Group>> {
        with_tx!(self, |db_tx| {
            groups::Entity::find()
                .join(JoinType::InnerJoin, groups::Relation::GroupMembers.def())
                .filter(group_members::Column::UserId.eq(user_id.trim().to_string()))
                .order_by_asc(groups::Column::CreatedAt)
                .order_by_asc(groups::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Group::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
