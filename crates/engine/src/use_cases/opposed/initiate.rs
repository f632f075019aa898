//! Start a new opposed test.

use std::sync::Arc;

use duelcard_domain::{
    ActorId, Lane, OpposedTestState, SessionId, TestParticipant, TestSource, TokenId,
};

use super::OpposedTestError;
use crate::entities::{Actors, Cards};
use crate::infrastructure::ports::{can_roll_for, ClockPort, PermissionPort};

/// One side as named by the initiator.
#[derive(Debug, Clone)]
pub struct LaneSetup {
    pub actor_id: ActorId,
    pub token_id: Option<TokenId>,
    /// Pre-selected test source; the lane may still choose at commit time.
    pub source: Option<TestSource>,
}

impl LaneSetup {
    pub fn actor(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            token_id: None,
            source: None,
        }
    }

    pub fn with_token(mut self, token_id: TokenId) -> Self {
        self.token_id = Some(token_id);
        self
    }

    pub fn with_source(mut self, source: TestSource) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub attacker: LaneSetup,
    pub defender: LaneSetup,
}

/// Create the card. The initiator must be allowed to roll for the attacker.
pub struct InitiateOpposedTest {
    cards: Arc<Cards>,
    actors: Arc<Actors>,
    permissions: Arc<dyn PermissionPort>,
    clock: Arc<dyn ClockPort>,
}

impl InitiateOpposedTest {
    pub fn new(
        cards: Arc<Cards>,
        actors: Arc<Actors>,
        permissions: Arc<dyn PermissionPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            cards,
            actors,
            permissions,
            clock,
        }
    }

    pub async fn execute(
        &self,
        session: SessionId,
        request: InitiateRequest,
    ) -> Result<OpposedTestState, OpposedTestError> {
        if !can_roll_for(self.permissions.as_ref(), session, request.attacker.actor_id).await {
            tracing::warn!(
                session_id = %session,
                actor_id = %request.attacker.actor_id,
                "Initiation rejected: session does not control the attacker"
            );
            return Err(OpposedTestError::denied(session, "initiate for this attacker"));
        }

        let attacker = self.participant(Lane::Attacker, request.attacker).await?;
        let defender = self.participant(Lane::Defender, request.defender).await?;
        let card = OpposedTestState::new(session, attacker, defender, self.clock.now());
        self.cards.create(&card).await?;

        tracing::info!(
            contest_id = %card.id(),
            session_id = %session,
            attacker = %card.lane(Lane::Attacker).name(),
            defender = %card.lane(Lane::Defender).name(),
            "Opposed test initiated"
        );
        Ok(card)
    }

    async fn participant(
        &self,
        lane: Lane,
        setup: LaneSetup,
    ) -> Result<TestParticipant, OpposedTestError> {
        let actor = self
            .actors
            .get(setup.actor_id)
            .await?
            .ok_or(OpposedTestError::MissingActor(setup.actor_id))?;

        let mut name = actor.name.clone();
        if let Some(token_id) = setup.token_id {
            let token = self
                .actors
                .get_token(token_id)
                .await?
                .ok_or(OpposedTestError::MissingToken(token_id))?;
            if token.actor_id != actor.id {
                return Err(OpposedTestError::IdentityMismatch {
                    lane,
                    expected: actor.id,
                    found: token.actor_id,
                });
            }
            name = token.name;
        }

        let mut participant = TestParticipant::new(actor.id, name);
        if let Some(token_id) = setup.token_id {
            participant = participant.with_token(token_id);
        }
        if let Some(source) = setup.source {
            let label = match &source {
                TestSource::Capability { id } => actor
                    .capability(*id)
                    .map(|c| c.name.clone())
                    .ok_or_else(|| OpposedTestError::MissingCapability(id.to_string()))?,
                TestSource::DerivedValue { key, .. } => key.clone(),
            };
            participant = participant.with_source(source, label);
        }
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::feed::ChangeFeed;
    use crate::infrastructure::memory::{InMemoryActorDirectory, InMemoryCardRepo};
    use crate::infrastructure::ports::MockPermissionPort;
    use chrono::Utc;
    use duelcard_domain::{ActorClass, ActorSnapshot, Capability, Phase};

    struct Fixture {
        directory: Arc<InMemoryActorDirectory>,
        cards: Arc<Cards>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock(Utc::now()));
        let repo = Arc::new(InMemoryCardRepo::new(Arc::new(ChangeFeed::new())));
        Fixture {
            directory: Arc::new(InMemoryActorDirectory::new()),
            cards: Arc::new(Cards::new(repo, clock, 3)),
        }
    }

    fn use_case(fx: &Fixture, allowed: bool) -> InitiateOpposedTest {
        let mut permissions = MockPermissionPort::new();
        permissions.expect_is_elevated().returning(move |_| allowed);
        permissions.expect_is_owner().returning(move |_, _| allowed);
        InitiateOpposedTest::new(
            fx.cards.clone(),
            Arc::new(Actors::new(fx.directory.clone())),
            Arc::new(permissions),
            Arc::new(FixedClock(Utc::now())),
        )
    }

    #[tokio::test]
    async fn creates_a_pending_card_with_token_names_and_preselected_source() {
        let fx = fixture();
        let stealth = Capability::new("Stealth", 45);
        let mira = ActorSnapshot::new("Mira", ActorClass::Character).with_capability(stealth.clone());
        let guard = ActorSnapshot::new("Guard", ActorClass::Npc);
        fx.directory.upsert_actor(mira.clone());
        fx.directory.upsert_actor(guard.clone());
        let guard_token = fx.directory.place_token(&guard);

        let session = SessionId::new();
        let card = use_case(&fx, true)
            .execute(
                session,
                InitiateRequest {
                    attacker: LaneSetup::actor(mira.id)
                        .with_source(TestSource::capability(stealth.id)),
                    defender: LaneSetup::actor(guard.id).with_token(guard_token),
                },
            )
            .await
            .expect("initiate");

        assert_eq!(card.phase(), Phase::Pending);
        assert_eq!(card.created_by(), session);
        assert_eq!(card.lane(Lane::Attacker).source_label(), Some("Stealth"));
        assert_eq!(card.lane(Lane::Defender).token_id(), Some(guard_token));
        let stored = fx.cards.get(card.id()).await.expect("get");
        assert_eq!(stored, Some(card));
    }

    #[tokio::test]
    async fn initiator_must_control_the_attacker() {
        let fx = fixture();
        let mira = ActorSnapshot::new("Mira", ActorClass::Character);
        let guard = ActorSnapshot::new("Guard", ActorClass::Npc);
        fx.directory.upsert_actor(mira.clone());
        fx.directory.upsert_actor(guard.clone());

        let err = use_case(&fx, false)
            .execute(
                SessionId::new(),
                InitiateRequest {
                    attacker: LaneSetup::actor(mira.id),
                    defender: LaneSetup::actor(guard.id),
                },
            )
            .await
            .expect_err("denied");
        assert!(matches!(err, OpposedTestError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn unknown_defender_is_missing_actor() {
        let fx = fixture();
        let mira = ActorSnapshot::new("Mira", ActorClass::Character);
        fx.directory.upsert_actor(mira.clone());

        let err = use_case(&fx, true)
            .execute(
                SessionId::new(),
                InitiateRequest {
                    attacker: LaneSetup::actor(mira.id),
                    defender: LaneSetup::actor(ActorId::new()),
                },
            )
            .await
            .expect_err("missing");
        assert!(matches!(err, OpposedTestError::MissingActor(_)));
    }
}
