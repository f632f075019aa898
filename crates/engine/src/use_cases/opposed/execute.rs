//! Rolling the banked declarations.
//!
//! Only the elected authority rolls automatically. A lane whose actor the
//! authority may not roll for is left to any session that controls that actor.
//! The guard keeps a session from running the same card twice when
//! notifications arrive in a burst.

use std::sync::Arc;

use duelcard_domain::{BankEffect, ContestId, Lane, OpposedTestState, RollRecord, SessionId};

use super::authority::current_authority;
use super::bank::BankRoll;
use super::OpposedTestError;
use crate::entities::{Cards, RollLog};
use crate::infrastructure::ports::{can_roll_for, ClockPort, PermissionPort, RandomPort};
use crate::stores::{InFlightGuard, SessionStore};

/// What started the execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A store notification said the card changed.
    Automatic,
    /// Someone pressed "begin" because the automatic run was missed.
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// Another session is authoritative for this card.
    Deferred { authority: SessionId },
    /// This session is already executing the card.
    AlreadyRunning,
    /// At least one lane has not committed yet.
    NotReady,
    /// Resolved already, or every committed lane already has a result.
    NothingToDo,
    /// Lanes still need a roll, but none of them may be rolled by this session.
    AwaitingOtherSessions { lanes: Vec<Lane> },
    Executed {
        card: OpposedTestState,
        banked: Vec<(Lane, BankEffect)>,
    },
}

pub struct ExecutePendingRolls {
    cards: Arc<Cards>,
    roll_log: Arc<RollLog>,
    bank: Arc<BankRoll>,
    sessions: Arc<SessionStore>,
    permissions: Arc<dyn PermissionPort>,
    guard: InFlightGuard,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl ExecutePendingRolls {
    pub fn new(
        cards: Arc<Cards>,
        roll_log: Arc<RollLog>,
        bank: Arc<BankRoll>,
        sessions: Arc<SessionStore>,
        permissions: Arc<dyn PermissionPort>,
        guard: InFlightGuard,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            cards,
            roll_log,
            bank,
            sessions,
            permissions,
            guard,
            random,
            clock,
        }
    }

    pub async fn execute(
        &self,
        session: SessionId,
        contest_id: ContestId,
        trigger: Trigger,
    ) -> Result<ExecuteOutcome, OpposedTestError> {
        let card = self.cards.load(contest_id).await?;
        if card.is_resolved() {
            return Ok(ExecuteOutcome::NothingToDo);
        }

        let connected = self.sessions.connected().await;
        let authority = current_authority(&connected, card.created_by());
        let mut only: Option<Vec<Lane>> = None;
        if authority != session {
            let orphaned = self.orphaned_lanes(&card, authority, session).await;
            if !orphaned.is_empty() {
                tracing::info!(
                    contest_id = %contest_id,
                    session_id = %session,
                    authority = %authority,
                    lanes = ?orphaned,
                    "Rolling lanes the authority cannot roll for"
                );
                only = Some(orphaned);
            } else {
                match trigger {
                    Trigger::Automatic => {
                        tracing::debug!(
                            contest_id = %contest_id,
                            session_id = %session,
                            authority = %authority,
                            "Deferring to the authoritative session"
                        );
                        return Ok(ExecuteOutcome::Deferred { authority });
                    }
                    Trigger::Manual => {
                        if !self.permissions.is_elevated(session).await {
                            tracing::warn!(
                                contest_id = %contest_id,
                                session_id = %session,
                                "Manual begin rejected: not authority and not elevated"
                            );
                            return Err(OpposedTestError::denied(session, "begin this opposed test"));
                        }
                        tracing::info!(
                            contest_id = %contest_id,
                            session_id = %session,
                            authority = %authority,
                            "Manual begin by elevated session"
                        );
                    }
                }
            }
        }

        if !card.both_committed() {
            return Ok(ExecuteOutcome::NotReady);
        }

        let Some(_permit) = self.guard.try_acquire(contest_id) else {
            tracing::debug!(contest_id = %contest_id, "Execution already in flight");
            return Ok(ExecuteOutcome::AlreadyRunning);
        };

        // Re-read under the guard; a previous run may have finished meanwhile.
        let card = self.cards.load(contest_id).await?;
        let pending: Vec<Lane> = card
            .lanes_awaiting_roll()
            .into_iter()
            .filter(|lane| match &only {
                Some(only) => only.contains(lane),
                None => true,
            })
            .collect();
        if card.is_resolved() || pending.is_empty() {
            return Ok(ExecuteOutcome::NothingToDo);
        }

        let mut latest = card;
        let mut banked = Vec::with_capacity(pending.len());
        let mut skipped = Vec::new();
        for lane in pending {
            let actor = latest.lane(lane).actor_id();
            if !can_roll_for(self.permissions.as_ref(), session, actor).await {
                tracing::info!(
                    contest_id = %contest_id,
                    lane = %lane,
                    session_id = %session,
                    "Leaving lane for a session that controls its actor"
                );
                skipped.push(lane);
                continue;
            }
            let record = self.record_for(session, &latest, lane).await?;
            let report = self.bank.execute(session, &record).await?;
            banked.push((lane, report.effect));
            latest = report.card;
        }

        if banked.is_empty() {
            return Ok(ExecuteOutcome::AwaitingOtherSessions { lanes: skipped });
        }

        tracing::info!(
            contest_id = %contest_id,
            session_id = %session,
            lanes = banked.len(),
            resolved = latest.is_resolved(),
            "Pending rolls executed"
        );
        Ok(ExecuteOutcome::Executed {
            card: latest,
            banked,
        })
    }

    /// Lanes awaiting a roll that `authority` may not roll for but `session` may.
    async fn orphaned_lanes(
        &self,
        card: &OpposedTestState,
        authority: SessionId,
        session: SessionId,
    ) -> Vec<Lane> {
        let mut lanes = Vec::new();
        for lane in card.lanes_awaiting_roll() {
            let actor = card.lane(lane).actor_id();
            if !can_roll_for(self.permissions.as_ref(), authority, actor).await
                && can_roll_for(self.permissions.as_ref(), session, actor).await
            {
                lanes.push(lane);
            }
        }
        lanes
    }

    /// Reuse this session's earlier roll for the lane, or roll and publish a new one.
    async fn record_for(
        &self,
        session: SessionId,
        card: &OpposedTestState,
        lane: Lane,
    ) -> Result<RollRecord, OpposedTestError> {
        let earlier = self
            .roll_log
            .list_for_contest(card.id())
            .await?
            .into_iter()
            .find(|r| r.lane == lane && r.author == session);
        if let Some(record) = earlier {
            tracing::debug!(
                contest_id = %card.id(),
                lane = %lane,
                record_id = %record.id,
                "Reusing published roll"
            );
            return Ok(record);
        }

        // No claimed degree: banking computes the verdict from the total.
        let total = self.random.roll_d100();
        let record = RollRecord::new(card.id(), lane, session, total, self.clock.now())
            .with_actor(card.lane(lane).actor_id());

        self.roll_log.publish(&record).await?;
        tracing::info!(
            contest_id = %card.id(),
            lane = %lane,
            roll_total = total,
            record_id = %record.id,
            "Roll published"
        );
        Ok(record)
    }
}
