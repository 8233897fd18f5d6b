use std::collections::BTreeMap;

use sea_orm::{
    DatabaseTransaction, JoinType, PaginatorTrait, QueryFilter, QuerySelect, Statement,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, GroupSummary, MemberBalance, MoneyCents, ResultEngine, Settlement,
    group_members, groups, settlement_plan,
    util::{normalize_user_id, parse_uuid},
};

use super::{Engine, with_tx};

impl Engine {
    /// Net position of `user_id` in `group_id`: what they paid minus what
    /// they owe, over every share of every expense in the group.
    ///
    /// Always aggregated from the stored shares; users without shares get 0.
    pub async fn group_balance(&self, group_id: Uuid, user_id: &str) -> ResultEngine<MoneyCents> {
        let user_id = normalize_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let stmt = Statement::from_sql_and_values(
                self.database.get_database_backend(),
                "SELECT COALESCE(SUM(s.amount_paid_minor), 0) - COALESCE(SUM(s.amount_owed_minor), 0) AS balance \
                 FROM expense_shares s \
                 JOIN expenses e ON e.id = s.expense_id \
                 WHERE e.group_id = ? AND s.user_id = ?;",
                vec![group_id.to_string().into(), user_id.into()],
            );
            let row = db_tx.query_one(stmt).await?;
            let balance: i64 = match row {
                Some(row) => row.try_get("", "balance")?,
                None => 0,
            };
            Ok(MoneyCents::new(balance))
        })
    }

    /// Member count and the plain sum of expense amounts for one group.
    pub async fn group_summary(&self, group_id: Uuid) -> ResultEngine<GroupSummary> {
        with_tx!(self, |db_tx| {
            groups::Entity::find_by_id(group_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
            self.summary_in(&db_tx, group_id).await
        })
    }

    /// Summaries of every group `user_id` belongs to, keyed by group id.
    pub async fn group_summaries(
        &self,
        user_id: &str,
    ) -> ResultEngine<BTreeMap<Uuid, GroupSummary>> {
        with_tx!(self, |db_tx| {
            let group_ids: Vec<String> = groups::Entity::find()
                .select_only()
                .column(groups::Column::Id)
                .join(JoinType::InnerJoin, groups::Relation::GroupMembers.def())
                .filter(group_members::Column::UserId.eq(user_id.trim().to_string()))
                .into_tuple()
                .all(&db_tx)
                .await?;

            let mut summaries = BTreeMap::new();
            for group_id in group_ids {
                let group_id = parse_uuid(&group_id, "group")?;
                summaries.insert(group_id, self.summary_in(&db_tx, group_id).await?);
            }
            Ok(summaries)
        })
    }

    /// Balance of every member (and of any non-member participant) of the
    /// group, ordered by user id. Members without shares appear with 0.
    pub async fn group_balances(
        &self,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<MemberBalance>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, group_id, user_id).await?;
            self.balances_in(&db_tx, group_id).await
        })
    }

    /// Suggested transfers that would bring every balance in the group to
    /// zero. Nothing is persisted.
    pub async fn settle_up(&self, group_id: Uuid, user_id: &str) -> ResultEngine<Vec<Settlement>> {
        let balances = self.group_balances(group_id, user_id).await?;
        Ok(settlement_plan(&balances))
    }

    async fn summary_in(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<GroupSummary> {
        let member_count = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .count(db)
            .await?;

        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum FROM expenses WHERE group_id = ?;",
            vec![group_id.to_string().into()],
        );
        let grand_total: i64 = match db.query_one(stmt).await? {
            Some(row) => row.try_get("", "sum")?,
            None => 0,
        };

        Ok(GroupSummary {
            group_id,
            member_count,
            grand_total: MoneyCents::new(grand_total),
        })
    }

    async fn balances_in(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<MemberBalance>> {
        let members: Vec<String> = group_members::Entity::find()
            .select_only()
            .column(group_members::Column::UserId)
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .into_tuple()
            .all(db)
            .await?;
        let mut balances: BTreeMap<String, i64> =
            members.into_iter().map(|user| (user, 0)).collect();

        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            "SELECT s.user_id AS user_id, \
                    COALESCE(SUM(s.amount_paid_minor), 0) - COALESCE(SUM(s.amount_owed_minor), 0) AS balance \
             FROM expense_shares s \
             JOIN expenses e ON e.id = s.expense_id \
             WHERE e.group_id = ? \
             GROUP BY s.user_id;",
            vec![group_id.to_string().into()],
        );
        for row in db.query_all(stmt).await? {
            let user: String = row.try_get("", "user_id")?;
            let balance: i64 = row.try_get("", "balance")?;
            balances.insert(user, balance);
        }

        Ok(balances
            .into_iter()
            .map(|(user_id, cents)| MemberBalance {
                user_id,
                balance: MoneyCents::new(cents),
            })
            .collect())
    }
}
