//! Expense splitting.
//!
//! [`ExpenseSplitter`] turns an amount, an ordered participant list and a
//! [`SplitMethod`] into one [`ShareDraft`] per participant. It is pure: the
//! drafts are persisted by the engine together with the expense header.
//!
//! Rules:
//! - `equal`: every participant owes `round(total / n, 2)`; what happens to
//!   the rounding remainder is decided by [`RemainderPolicy`].
//! - `percent`: participant `i` owes `round(total * splits[i] / 100, 2)`.
//!   Percentages are taken as given; they do not have to add up to 100.
//! - `custom`: participant `i` owes exactly `splits[i]`, which must fit in
//!   whole cents (at most two decimals).
//!
//! The expense creator is assumed to have paid the whole amount up front, so
//! their share (when they participate) starts paid and settled.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ExpenseShare, MoneyCents, ResultEngine, SplitMethod};

/// What an equal split does with the cents lost to per-share rounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Each share is rounded on its own; the sum may be off by up to
    /// `n * 0.005`.
    #[default]
    Unassigned,
    /// Shares are floored and the leftover cents go, one each, to the first
    /// participants in list order. The sum is always exact.
    FirstParticipants,
}

/// One participant's computed obligation, before it gets an expense id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareDraft {
    pub user_id: String,
    pub amount_owed: MoneyCents,
    pub amount_paid: MoneyCents,
    pub settled: bool,
    pub percent: Option<Decimal>,
    pub shares: Option<i64>,
}

impl ShareDraft {
    fn new(user_id: &str, amount_owed: MoneyCents) -> Self {
        Self {
            user_id: user_id.to_string(),
            amount_owed,
            amount_paid: MoneyCents::ZERO,
            settled: false,
            percent: None,
            shares: None,
        }
    }

    pub fn into_share(self, expense_id: Uuid) -> ExpenseShare {
        ExpenseShare {
            id: Uuid::new_v4(),
            expense_id,
            user_id: self.user_id,
            amount_owed: self.amount_owed,
            amount_paid: self.amount_paid,
            settled: self.settled,
            percent: self.percent,
            shares: self.shares,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ExpenseSplitter {
    policy: RemainderPolicy,
}

impl ExpenseSplitter {
    pub fn new(policy: RemainderPolicy) -> Self {
        Self { policy }
    }

    /// Computes the share plan for an expense.
    ///
    /// `payer` is the expense creator; their share is marked as paid in full.
    /// `splits` holds percentages for `percent` and amounts (in currency
    /// units) for `custom`; it is ignored for `equal`.
    pub fn plan(
        &self,
        total: MoneyCents,
        participants: &[String],
        method: SplitMethod,
        splits: Option<&[Decimal]>,
        payer: &str,
    ) -> ResultEngine<Vec<ShareDraft>> {
        if participants.is_empty() {
            return Err(EngineError::NoParticipants);
        }
        if !total.is_positive() {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        ensure_unique_participants(participants)?;

        let mut drafts = match method {
            SplitMethod::Equal => self.equal(total, participants)?,
            SplitMethod::Percent => percent(total, participants, splits)?,
            SplitMethod::Custom => custom(participants, splits)?,
        };

        for draft in drafts.iter_mut().filter(|d| d.user_id == payer) {
            draft.amount_paid = total;
            draft.settled = true;
        }
        Ok(drafts)
    }

    fn equal(&self, total: MoneyCents, participants: &[String]) -> ResultEngine<Vec<ShareDraft>> {
        let count = i64::try_from(participants.len())
            .map_err(|_| EngineError::InvalidSplit("too many participants".to_string()))?;

        let amounts: Vec<MoneyCents> = match self.policy {
            RemainderPolicy::Unassigned => {
                let each =
                    MoneyCents::round_from_decimal(total.to_decimal() / Decimal::from(count))?;
                vec![each; participants.len()]
            }
            RemainderPolicy::FirstParticipants => {
                let base = total.cents() / count;
                let leftover = total.cents() % count;
                (0..count)
                    .map(|i| MoneyCents::new(if i < leftover { base + 1 } else { base }))
                    .collect()
            }
        };

        Ok(participants
            .iter()
            .zip(amounts)
            .map(|(user_id, owed)| {
                let mut draft = ShareDraft::new(user_id, owed);
                draft.shares = Some(1);
                draft
            })
            .collect())
    }
}

fn ensure_unique_participants(participants: &[String]) -> ResultEngine<()> {
    let mut seen = HashSet::with_capacity(participants.len());
    for user_id in participants {
        if user_id.trim().is_empty() {
            return Err(EngineError::InvalidSplit(
                "participant id must not be empty".to_string(),
            ));
        }
        if !seen.insert(user_id.as_str()) {
            return Err(EngineError::InvalidSplit(format!(
                "duplicate participant: {user_id}"
            )));
        }
    }
    Ok(())
}

fn matching_splits<'a>(
    participants: &[String],
    splits: Option<&'a [Decimal]>,
    method: SplitMethod,
) -> ResultEngine<&'a [Decimal]> {
    match splits {
        Some(splits) if splits.len() == participants.len() => Ok(splits),
        Some(splits) => Err(EngineError::InvalidSplit(format!(
            "{method} split needs {} values, got {}",
            participants.len(),
            splits.len()
        ))),
        None => Err(EngineError::InvalidSplit(format!(
            "{method} split needs one value per participant"
        ))),
    }
}

fn percent(
    total: MoneyCents,
    participants: &[String],
    splits: Option<&[Decimal]>,
) -> ResultEngine<Vec<ShareDraft>> {
    let splits = matching_splits(participants, splits, SplitMethod::Percent)?;
    participants
        .iter()
        .zip(splits)
        .map(|(user_id, pct)| {
            if pct.is_sign_negative() && !pct.is_zero() {
                return Err(EngineError::InvalidSplit(format!(
                    "negative percentage for {user_id}"
                )));
            }
            let too_large =
                || EngineError::InvalidSplit(format!("percentage too large for {user_id}"));
            let scaled = total
                .to_decimal()
                .checked_mul(*pct)
                .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(too_large)?;
            let owed = MoneyCents::round_from_decimal(scaled).map_err(|_| too_large())?;
            let mut draft = ShareDraft::new(user_id, owed);
            draft.percent = Some(*pct);
            Ok(draft)
        })
        .collect()
}

fn custom(participants: &[String], splits: Option<&[Decimal]>) -> ResultEngine<Vec<ShareDraft>> {
    let splits = matching_splits(participants, splits, SplitMethod::Custom)?;
    participants
        .iter()
        .zip(splits)
        .map(|(user_id, amount)| {
            let owed = MoneyCents::try_from_decimal(*amount).map_err(|_| {
                EngineError::InvalidSplit(format!("invalid amount {amount} for {user_id}"))
            })?;
            if owed.is_negative() {
                return Err(EngineError::InvalidSplit(format!(
                    "negative amount for {user_id}"
                )));
            }
            Ok(ShareDraft::new(user_id, owed))
        })
        .collect()
}
