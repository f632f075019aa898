//! Merging published rolls into the card.
//!
//! Roll records are untrusted: anyone can publish one. A record is merged only
//! if the card is readable, the lane's actor still resolves, the record's
//! claimed actor is the lane's actor, and its author may roll for that actor.
//! The verdict is always recomputed from the raw total and the banked target.

use std::sync::Arc;

use duelcard_domain::{
    BankEffect, CriticalProfile, CriticalRules, Lane, OpposedTestState, RollRecord, SessionId,
};

use super::OpposedTestError;
use crate::entities::{Actors, Cards, Mutation};
use crate::infrastructure::ports::{can_roll_for, PermissionPort};

#[derive(Debug, Clone)]
pub struct BankReport {
    /// Card after the attempt (unchanged if nothing was written).
    pub card: OpposedTestState,
    pub effect: BankEffect,
}

impl BankReport {
    pub fn lane_result(&self, lane: Lane) -> Option<&duelcard_domain::RollResult> {
        self.card.lane(lane).roll_result()
    }
}

pub struct BankRoll {
    cards: Arc<Cards>,
    actors: Arc<Actors>,
    permissions: Arc<dyn PermissionPort>,
    rules: CriticalRules,
}

impl BankRoll {
    pub fn new(
        cards: Arc<Cards>,
        actors: Arc<Actors>,
        permissions: Arc<dyn PermissionPort>,
        rules: CriticalRules,
    ) -> Self {
        Self {
            cards,
            actors,
            permissions,
            rules,
        }
    }

    /// Bank `record` on behalf of `banker` (the session doing the write).
    pub async fn execute(
        &self,
        banker: SessionId,
        record: &RollRecord,
    ) -> Result<BankReport, OpposedTestError> {
        let contest_id = record.contest_id;
        let lane = record.lane;

        // Card exists with a readable schema.
        let card = self.cards.load(contest_id).await?;

        if !(1..=100).contains(&record.roll_total) {
            tracing::warn!(
                contest_id = %contest_id,
                lane = %lane,
                roll_total = record.roll_total,
                "Roll record rejected: total out of range"
            );
            return Err(OpposedTestError::InvalidRoll(format!(
                "roll total {} is outside 1..=100",
                record.roll_total
            )));
        }

        // The lane's expected actor resolves.
        let expected = card.lane(lane).actor_id();
        let actor = self
            .actors
            .get(expected)
            .await?
            .ok_or(OpposedTestError::MissingActor(expected))?;

        // A declared originating actor must be that actor.
        if let Some(claimed) = record.actor_id {
            if claimed != expected {
                tracing::warn!(
                    contest_id = %contest_id,
                    lane = %lane,
                    expected = %expected,
                    claimed = %claimed,
                    record_id = %record.id,
                    "Roll record rejected: actor mismatch"
                );
                return Err(OpposedTestError::IdentityMismatch {
                    lane,
                    expected,
                    found: claimed,
                });
            }
        }

        // The author may roll for that actor.
        if !can_roll_for(self.permissions.as_ref(), record.author, expected).await {
            tracing::warn!(
                contest_id = %contest_id,
                lane = %lane,
                author = %record.author,
                record_id = %record.id,
                "Roll record rejected: author may not roll for this actor"
            );
            return Err(OpposedTestError::denied(
                record.author,
                format!("roll for the {} lane", lane),
            ));
        }

        let profile = CriticalProfile::for_actor(&actor, self.rules);
        let update = self
            .cards
            .update(contest_id, banker, |card, now| {
                let effect = card.bank_roll(lane, record.roll_total, record.id, &profile, now)?;
                Ok::<_, OpposedTestError>(match effect {
                    BankEffect::AlreadyBanked => Mutation::Skip(effect),
                    BankEffect::Banked { .. } | BankEffect::ReferenceAttached => {
                        Mutation::Write(effect)
                    }
                })
            })
            .await?;

        let report = BankReport {
            card: update.card,
            effect: update.value,
        };
        match report.effect {
            BankEffect::Banked { resolved } => {
                if let Some(result) = report.lane_result(lane) {
                    if let Some(claimed) = record.claimed_degree.filter(|d| *d != result.degree) {
                        tracing::warn!(
                            contest_id = %contest_id,
                            lane = %lane,
                            claimed,
                            computed = result.degree,
                            "Ignoring client-claimed degree"
                        );
                    }
                    tracing::info!(
                        contest_id = %contest_id,
                        lane = %lane,
                        result = %result,
                        "Roll banked"
                    );
                }
                if resolved {
                    if let Some(outcome) = report.card.outcome() {
                        tracing::info!(
                            contest_id = %contest_id,
                            winner = ?outcome.winner,
                            reason = %outcome.reason,
                            "Opposed test resolved"
                        );
                    }
                }
            }
            BankEffect::ReferenceAttached => {
                tracing::debug!(contest_id = %contest_id, lane = %lane, "Roll reference attached");
            }
            BankEffect::AlreadyBanked => {
                tracing::debug!(contest_id = %contest_id, lane = %lane, record_id = %record.id, "Duplicate banking ignored");
            }
        }
        Ok(report)
    }
}
