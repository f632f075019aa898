//! Banking a lane's declaration.
//!
//! Committing computes the lane's target number from the declaration and
//! stores it on the card. Nothing is rolled here; the authority rolls both
//! lanes once both are committed.

use std::sync::Arc;

use duelcard_domain::{
    resolve_target_number, ContestId, Declaration, Lane, LaneCommit, OpposedTestState, SessionId,
    TestSource,
};

use super::{resolve_participant, OpposedTestError};
use crate::entities::{Actors, Cards, Mutation, Preferences};
use crate::infrastructure::ports::{can_roll_for, PermissionPort};

#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub contest_id: ContestId,
    pub lane: Lane,
    /// What to test. `None` uses the source the initiator pre-selected for the lane.
    pub source: Option<TestSource>,
    pub declaration: Declaration,
}

#[derive(Debug, Clone)]
pub struct CommitResult {
    pub card: OpposedTestState,
    /// Both lanes are now committed; the authority can roll.
    pub ready_to_roll: bool,
}

pub struct CommitDeclaration {
    cards: Arc<Cards>,
    actors: Arc<Actors>,
    preferences: Arc<Preferences>,
    permissions: Arc<dyn PermissionPort>,
}

impl CommitDeclaration {
    pub fn new(
        cards: Arc<Cards>,
        actors: Arc<Actors>,
        preferences: Arc<Preferences>,
        permissions: Arc<dyn PermissionPort>,
    ) -> Self {
        Self {
            cards,
            actors,
            preferences,
            permissions,
        }
    }

    pub async fn execute(
        &self,
        session: SessionId,
        request: CommitRequest,
    ) -> Result<CommitResult, OpposedTestError> {
        let CommitRequest {
            contest_id,
            lane,
            source,
            declaration,
        } = request;

        let card = self.cards.load(contest_id).await?;
        if card.is_resolved() {
            return Err(OpposedTestError::AlreadyResolved);
        }
        let participant = card.lane(lane);
        if participant.is_committed() {
            tracing::warn!(contest_id = %contest_id, lane = %lane, "Lane already committed");
            return Err(OpposedTestError::AlreadyCommitted(lane));
        }
        if !can_roll_for(self.permissions.as_ref(), session, participant.actor_id()).await {
            tracing::warn!(
                contest_id = %contest_id,
                lane = %lane,
                session_id = %session,
                "Commit rejected: session may not roll for this actor"
            );
            return Err(OpposedTestError::denied(
                session,
                format!("commit for the {} lane", lane),
            ));
        }

        let actor = resolve_participant(&self.actors, lane, participant).await?;
        let source = source
            .or_else(|| participant.source().cloned())
            .ok_or_else(|| {
                OpposedTestError::MissingCapability(format!("no test chosen for the {} lane", lane))
            })?;
        let resolved = resolve_target_number(&actor, &source, &declaration)?;

        let commit = LaneCommit {
            source: source.clone(),
            label: resolved.label,
            declaration: declaration.clone(),
            target_number: resolved.breakdown,
        };
        let update = self
            .cards
            .update(contest_id, session, |card, now| {
                card.commit(lane, commit.clone(), now)?;
                Ok::<_, OpposedTestError>(Mutation::Write(card.both_committed()))
            })
            .await?;

        tracing::info!(
            contest_id = %contest_id,
            lane = %lane,
            session_id = %session,
            ready_to_roll = update.value,
            "Declaration committed"
        );

        let capability = match &source {
            TestSource::Capability { id } => Some(*id),
            TestSource::DerivedValue { .. } => None,
        };
        if let Err(e) = self
            .preferences
            .remember(session, actor.id, capability, &declaration)
            .await
        {
            tracing::warn!(session_id = %session, error = %e, "Failed to remember commit preferences");
        }

        Ok(CommitResult {
            card: update.card,
            ready_to_roll: update.value,
        })
    }
}

/// Commit with remembered defaults instead of an interactive declaration.
pub struct QuickCommit {
    commit: Arc<CommitDeclaration>,
    cards: Arc<Cards>,
    actors: Arc<Actors>,
    preferences: Arc<Preferences>,
}

impl QuickCommit {
    pub fn new(
        commit: Arc<CommitDeclaration>,
        cards: Arc<Cards>,
        actors: Arc<Actors>,
        preferences: Arc<Preferences>,
    ) -> Self {
        Self {
            commit,
            cards,
            actors,
            preferences,
        }
    }

    /// Source falls back from the lane's pre-selection, to the capability this
    /// session last used for the actor, to the actor's first capability.
    pub async fn execute(
        &self,
        session: SessionId,
        contest_id: ContestId,
        lane: Lane,
    ) -> Result<CommitResult, OpposedTestError> {
        let prefs = self.preferences.get(session).await?;
        if !prefs.quick_path_enabled {
            return Err(OpposedTestError::QuickPathDisabled);
        }

        let card = self.cards.load(contest_id).await?;
        let participant = card.lane(lane);
        let source = match participant.source() {
            Some(source) => source.clone(),
            None => {
                let actor = self
                    .actors
                    .get(participant.actor_id())
                    .await?
                    .ok_or(OpposedTestError::MissingActor(participant.actor_id()))?;
                let remembered = prefs
                    .last_capability
                    .get(&actor.id)
                    .copied()
                    .filter(|id| actor.capability(*id).is_some());
                let id = remembered
                    .or_else(|| actor.capabilities.first().map(|c| c.id))
                    .ok_or_else(|| {
                        OpposedTestError::MissingCapability(format!(
                            "{} has no capabilities",
                            actor.name
                        ))
                    })?;
                TestSource::capability(id)
            }
        };

        tracing::debug!(contest_id = %contest_id, lane = %lane, "Quick path commit");
        self.commit
            .execute(
                session,
                CommitRequest {
                    contest_id,
                    lane,
                    source: Some(source),
                    declaration: prefs.default_declaration(),
                },
            )
            .await
    }
}
