//! Application state and composition.

use std::sync::Arc;

use crate::entities::{Actors, Cards, Preferences, RollLog};
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::feed::ChangeFeed;
use crate::infrastructure::ports::{
    ActorDataPort, CardRepo, ClockPort, PermissionPort, PreferencesRepo, RandomPort,
    RollRecordRepo,
};
use crate::stores::{InFlightGuard, SessionStore};
use crate::use_cases::opposed::{
    BankRoll, CommitDeclaration, ExecutePendingRolls, InitiateOpposedTest, QuickCommit,
    TableReactor, ViewCard,
};
use crate::use_cases::OpposedTestUseCases;
use duelcard_domain::SessionId;

/// Port implementations the app is built from.
///
/// The binary picks in-memory or SQLite adapters; tests plug in their own.
pub struct Ports {
    pub cards: Arc<dyn CardRepo>,
    pub rolls: Arc<dyn RollRecordRepo>,
    pub preferences: Arc<dyn PreferencesRepo>,
    pub actors: Arc<dyn ActorDataPort>,
    pub permissions: Arc<dyn PermissionPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

/// Main application state for one session process.
pub struct App {
    pub entities: Entities,
    pub use_cases: UseCases,
    pub sessions: Arc<SessionStore>,
    pub feed: Arc<ChangeFeed>,
    pub config: EngineConfig,
    pub guard: InFlightGuard,
}

/// Container for entity modules.
pub struct Entities {
    pub cards: Arc<Cards>,
    pub actors: Arc<Actors>,
    pub preferences: Arc<Preferences>,
    pub roll_log: Arc<RollLog>,
}

/// Container for all use cases.
pub struct UseCases {
    pub opposed: OpposedTestUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        ports: Ports,
        sessions: Arc<SessionStore>,
        feed: Arc<ChangeFeed>,
        config: EngineConfig,
    ) -> Self {
        let cards = Arc::new(Cards::new(
            ports.cards.clone(),
            ports.clock.clone(),
            config.update_retries,
        ));
        let actors = Arc::new(Actors::new(ports.actors.clone()));
        let preferences = Arc::new(Preferences::new(ports.preferences.clone()));
        let roll_log = Arc::new(RollLog::new(ports.rolls.clone()));
        let guard = InFlightGuard::new();

        let bank = Arc::new(BankRoll::new(
            cards.clone(),
            actors.clone(),
            ports.permissions.clone(),
            config.critical_rules,
        ));
        let commit = Arc::new(CommitDeclaration::new(
            cards.clone(),
            actors.clone(),
            preferences.clone(),
            ports.permissions.clone(),
        ));
        let opposed = OpposedTestUseCases::new(
            Arc::new(InitiateOpposedTest::new(
                cards.clone(),
                actors.clone(),
                ports.permissions.clone(),
                ports.clock.clone(),
            )),
            commit.clone(),
            Arc::new(QuickCommit::new(
                commit,
                cards.clone(),
                actors.clone(),
                preferences.clone(),
            )),
            Arc::new(ExecutePendingRolls::new(
                cards.clone(),
                roll_log.clone(),
                bank.clone(),
                sessions.clone(),
                ports.permissions.clone(),
                guard.clone(),
                ports.random.clone(),
                ports.clock.clone(),
            )),
            bank,
            Arc::new(ViewCard::new(
                cards.clone(),
                ports.clock.clone(),
                config.stale_wait,
            )),
        );

        Self {
            entities: Entities {
                cards,
                actors,
                preferences,
                roll_log,
            },
            use_cases: UseCases { opposed },
            sessions,
            feed,
            config,
            guard,
        }
    }

    /// Reactor that drives the protocol on behalf of `session`.
    pub fn reactor(&self, session: SessionId) -> Arc<TableReactor> {
        Arc::new(TableReactor::new(
            session,
            self.use_cases.opposed.execute.clone(),
            self.use_cases.opposed.bank.clone(),
        ))
    }
}
