//! Shared table setup for use case tests.
//!
//! A [`Table`] is a fully wired in-memory [`App`] with one GM, one player and
//! two actors:
//!
//! - Mira (character, owned by the player): Evade 40, Perception 50
//! - Goblin (NPC, placed as a token): Combat 50
//!
//! ```rust,ignore
//! let table = Table::new().await;
//! let card = table.committed_card(Difficulty::Average, Difficulty::Average).await;
//! table.random.push([35, 62]);
//! ```

use std::sync::Arc;

use chrono::TimeZone;
use duelcard_domain::{
    ActorClass, ActorId, ActorSnapshot, Capability, CapabilityId, ContestId, Declaration,
    Difficulty, Lane, OpposedTestState, SessionId, TestSource, TokenId,
};

use crate::app::{App, Ports};
use crate::infrastructure::clock::{ManualClock, ScriptedRandom};
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::feed::ChangeFeed;
use crate::infrastructure::memory::{
    InMemoryActorDirectory, InMemoryCardRepo, InMemoryPreferencesRepo, InMemoryRollRecordRepo,
};
use crate::infrastructure::permissions::SessionPermissions;
use crate::infrastructure::ports::{SessionInfo, SessionRole};
use crate::stores::{InFlightGuard, SessionStore};
use crate::use_cases::opposed::{CommitRequest, InitiateRequest, LaneSetup};

pub struct Table {
    pub app: App,
    pub card_repo: Arc<InMemoryCardRepo>,
    pub clock: Arc<ManualClock>,
    pub random: Arc<ScriptedRandom>,
    pub directory: Arc<InMemoryActorDirectory>,
    pub permissions: Arc<SessionPermissions>,
    pub sessions: Arc<SessionStore>,
    pub feed: Arc<ChangeFeed>,
    pub guard: InFlightGuard,
    pub gm: SessionId,
    pub player: SessionId,
    pub hero: ActorSnapshot,
    pub goblin: ActorSnapshot,
    pub goblin_token: TokenId,
    pub evade: Capability,
    pub perception: Capability,
    pub combat: Capability,
}

impl Table {
    pub async fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc
                .with_ymd_and_hms(2024, 3, 1, 20, 0, 0)
                .single()
                .expect("valid start time"),
        ));
        let random = Arc::new(ScriptedRandom::new([]));
        let feed = Arc::new(ChangeFeed::new());
        let sessions = Arc::new(SessionStore::new());
        let permissions = Arc::new(SessionPermissions::new(sessions.clone()));
        let directory = Arc::new(InMemoryActorDirectory::new());
        let card_repo = Arc::new(InMemoryCardRepo::new(feed.clone()));

        let gm = SessionId::new();
        let player = SessionId::new();
        sessions
            .connect(SessionInfo::new(gm, "gm", SessionRole::Gm))
            .await;
        sessions
            .connect(SessionInfo::new(player, "ana", SessionRole::Player))
            .await;

        let evade = Capability::new("Evade", 40);
        let perception = Capability::new("Perception", 50).with_specialization();
        let combat = Capability::new("Combat", 50);
        let hero = ActorSnapshot::new("Mira", ActorClass::Character)
            .with_capability(evade.clone())
            .with_capability(perception.clone());
        let goblin = ActorSnapshot::new("Goblin", ActorClass::Npc).with_capability(combat.clone());
        directory.upsert_actor(hero.clone());
        directory.upsert_actor(goblin.clone());
        let goblin_token = directory.place_token(&goblin);
        permissions.grant_ownership(player, hero.id);

        let app = App::new(
            Ports {
                cards: card_repo.clone(),
                rolls: Arc::new(InMemoryRollRecordRepo::new(feed.clone())),
                preferences: Arc::new(InMemoryPreferencesRepo::new()),
                actors: directory.clone(),
                permissions: permissions.clone(),
                clock: clock.clone(),
                random: random.clone(),
            },
            sessions.clone(),
            feed.clone(),
            EngineConfig::default(),
        );
        let guard = app.guard.clone();

        Self {
            app,
            card_repo,
            clock,
            random,
            directory,
            permissions,
            sessions,
            feed,
            guard,
            gm,
            player,
            hero,
            goblin,
            goblin_token,
            evade,
            perception,
            combat,
        }
    }

    /// Player starts Mira (attacker) against the goblin token.
    pub async fn initiate(&self) -> OpposedTestState {
        self.start(
            LaneSetup::actor(self.goblin.id).with_token(self.goblin_token),
        )
        .await
    }

    /// Player starts Mira against an arbitrary untokened defender.
    pub async fn initiate_against(&self, defender: ActorId) -> OpposedTestState {
        self.start(LaneSetup::actor(defender)).await
    }

    async fn start(&self, defender: LaneSetup) -> OpposedTestState {
        self.app
            .use_cases
            .opposed
            .initiate
            .execute(
                self.player,
                InitiateRequest {
                    attacker: LaneSetup::actor(self.hero.id),
                    defender,
                },
            )
            .await
            .expect("initiate")
    }

    pub fn request(
        &self,
        contest_id: ContestId,
        lane: Lane,
        capability: CapabilityId,
        difficulty: Difficulty,
    ) -> CommitRequest {
        CommitRequest {
            contest_id,
            lane,
            source: Some(TestSource::capability(capability)),
            declaration: Declaration::new(difficulty),
        }
    }

    /// Player commits Mira's Evade.
    pub async fn commit_attacker(&self, contest_id: ContestId, difficulty: Difficulty) {
        self.app
            .use_cases
            .opposed
            .commit
            .execute(
                self.player,
                self.request(contest_id, Lane::Attacker, self.evade.id, difficulty),
            )
            .await
            .expect("attacker commit");
    }

    /// GM commits the goblin's Combat.
    pub async fn commit_defender(&self, contest_id: ContestId, difficulty: Difficulty) {
        self.app
            .use_cases
            .opposed
            .commit
            .execute(
                self.gm,
                self.request(contest_id, Lane::Defender, self.combat.id, difficulty),
            )
            .await
            .expect("defender commit");
    }

    /// A fresh card with both sides committed and nothing rolled.
    pub async fn committed_card(
        &self,
        attacker: Difficulty,
        defender: Difficulty,
    ) -> OpposedTestState {
        let card = self.initiate().await;
        self.commit_attacker(card.id(), attacker).await;
        self.commit_defender(card.id(), defender).await;
        self.card(card.id()).await
    }

    pub async fn card(&self, contest_id: ContestId) -> OpposedTestState {
        self.app
            .entities
            .cards
            .get(contest_id)
            .await
            .expect("card read")
            .expect("card exists")
    }
}
