//! Duelcard - demo table.
//!
//! Wires one GM session and one player session to the same card store, runs a
//! single opposed test through the full commit / roll / bank cycle and prints
//! the resolved card.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duelcard_domain::{
    ActorClass, ActorSnapshot, Capability, Declaration, Difficulty, Lane, SessionId, TestSource,
};
use duelcard_engine::app::{App, Ports};
use duelcard_engine::infrastructure::{
    card_store::{self, SqliteCardRepo, SqliteRollRecordRepo},
    clock::{SystemClock, SystemRandom},
    config::{EngineConfig, StoreBackend},
    feed::ChangeFeed,
    memory::{
        InMemoryActorDirectory, InMemoryCardRepo, InMemoryPreferencesRepo, InMemoryRollRecordRepo,
    },
    permissions::SessionPermissions,
    ports::{
        CardRepo, ClockPort, PreferencesRepo, RandomPort, RollRecordRepo, SessionInfo, SessionRole,
    },
    settings::SqlitePreferencesRepo,
};
use duelcard_engine::stores::SessionStore;
use duelcard_engine::use_cases::opposed::{CommitRequest, InitiateRequest, LaneSetup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duelcard_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(store = ?config.store, "Starting Duelcard table");

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
    let feed = Arc::new(ChangeFeed::new());
    let sessions = Arc::new(SessionStore::new());
    let permissions = Arc::new(SessionPermissions::new(sessions.clone()));
    let directory = Arc::new(InMemoryActorDirectory::new());

    let (cards, rolls, preferences): (
        Arc<dyn CardRepo>,
        Arc<dyn RollRecordRepo>,
        Arc<dyn PreferencesRepo>,
    ) = match config.store {
        StoreBackend::Memory => (
            Arc::new(InMemoryCardRepo::new(feed.clone())),
            Arc::new(InMemoryRollRecordRepo::new(feed.clone())),
            Arc::new(InMemoryPreferencesRepo::new()),
        ),
        StoreBackend::Sqlite => {
            tracing::info!(path = %config.db_path, "Opening SQLite card store");
            let pool = card_store::connect(&config.db_path)
                .await
                .context("opening card store")?;
            (
                Arc::new(SqliteCardRepo::new(pool.clone(), feed.clone()).await?),
                Arc::new(SqliteRollRecordRepo::new(pool.clone(), feed.clone()).await?),
                Arc::new(SqlitePreferencesRepo::new(pool, clock.clone()).await?),
            )
        }
    };

    // Seat the table.
    let gm = SessionId::new();
    let player = SessionId::new();
    sessions
        .connect(SessionInfo::new(gm, "gm", SessionRole::Gm))
        .await;
    sessions
        .connect(SessionInfo::new(player, "player", SessionRole::Player))
        .await;

    let evade = Capability::new("Evade", 45);
    let mira = ActorSnapshot::new("Mira", ActorClass::Character)
        .with_capability(evade.clone())
        .with_capability(Capability::new("Perception", 50).with_specialization())
        .with_luck(vec![11, 44], vec![66]);
    let goblin = ActorSnapshot::new("Goblin", ActorClass::Npc)
        .with_capability(Capability::new("Combat", 50));
    directory.upsert_actor(mira.clone());
    directory.upsert_actor(goblin.clone());
    let goblin_token = directory.place_token(&goblin);
    permissions.grant_ownership(player, mira.id);

    let app = App::new(
        Ports {
            cards,
            rolls,
            preferences,
            actors: directory.clone(),
            permissions: permissions.clone(),
            clock,
            random,
        },
        sessions.clone(),
        feed.clone(),
        config,
    );

    for session in [gm, player] {
        tokio::spawn(app.reactor(session).run(feed.subscribe()));
    }

    let opposed = &app.use_cases.opposed;
    let card = opposed
        .initiate
        .execute(
            player,
            InitiateRequest {
                attacker: LaneSetup::actor(mira.id),
                defender: LaneSetup::actor(goblin.id).with_token(goblin_token),
            },
        )
        .await?;
    println!("{}", opposed.view.execute(card.id()).await?);

    opposed
        .commit
        .execute(
            player,
            CommitRequest {
                contest_id: card.id(),
                lane: Lane::Attacker,
                source: Some(TestSource::capability(evade.id)),
                declaration: Declaration::new(Difficulty::Challenging),
            },
        )
        .await?;
    println!("{}", opposed.view.execute(card.id()).await?);

    app.entities.preferences.set_quick_path(gm, true).await?;
    opposed
        .quick_commit
        .execute(gm, card.id(), Lane::Defender)
        .await?;

    let view = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let view = opposed.view.execute(card.id()).await?;
            if view.outcome.is_some() {
                return Ok::<_, anyhow::Error>(view);
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    })
    .await
    .context("opposed test did not resolve")??;
    println!("{}", view);

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
