//! Ledger read models and the settlement planner.
//!
//! Balances are always aggregated from the persisted shares (see
//! `Engine::group_balance`); the types here only carry the results.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MoneyCents;

/// Whole-group figures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group_id: Uuid,
    pub member_count: u64,
    /// Plain sum of every expense amount in the group.
    pub grand_total: MoneyCents,
}

/// Net position of one member: positive when the group owes them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub user_id: String,
    pub balance: MoneyCents,
}

/// A suggested transfer that moves both parties toward zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: String,
    pub to: String,
    pub amount: MoneyCents,
}

/// Pairs debtors with creditors, largest amounts first.
///
/// Ties are broken by user id so the plan is deterministic. When balances do
/// not add up to zero (equal splits with unassigned rounding remainders) the
/// leftover cents stay unmatched.
pub fn settlement_plan(balances: &[MemberBalance]) -> Vec<Settlement> {
    let mut creditors: Vec<(&str, i64)> = balances
        .iter()
        .filter(|b| b.balance.is_positive())
        .map(|b| (b.user_id.as_str(), b.balance.cents()))
        .collect();
    let mut debtors: Vec<(&str, i64)> = balances
        .iter()
        .filter(|b| b.balance.is_negative())
        .map(|b| (b.user_id.as_str(), -b.balance.cents()))
        .collect();
    creditors.sort_by_key(|&(user, amount)| (Reverse(amount), user));
    debtors.sort_by_key(|&(user, amount)| (Reverse(amount), user));

    let mut plan = Vec::new();
    let (mut c, mut d) = (0, 0);
    while c < creditors.len() && d < debtors.len() {
        let amount = creditors[c].1.min(debtors[d].1);
        plan.push(Settlement {
            from: debtors[d].0.to_string(),
            to: creditors[c].0.to_string(),
            amount: MoneyCents::new(amount),
        });
        creditors[c].1 -= amount;
        debtors[d].1 -= amount;
        if creditors[c].1 == 0 {
            c += 1;
        }
        if debtors[d].1 == 0 {
            d += 1;
        }
    }
    plan
}
