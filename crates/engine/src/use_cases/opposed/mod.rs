//! Opposed test use cases.
//!
//! Banked-choice opposed tests between two independently controlled sides.
//! The flow is:
//! 1. Someone initiates a test against a target (InitiateOpposedTest)
//! 2. Each side banks a declaration without rolling (CommitDeclaration / QuickCommit)
//! 3. Once both are banked, the elected authority rolls each lane and publishes
//!    the rolls (ExecutePendingRolls)
//! 4. Each published roll is validated and merged into the card (BankRoll)
//! 5. The second merge resolves the outcome and freezes the card
//!
//! There is no server. Every session runs the same code and reacts to store
//! notifications (TableReactor); the card is the only shared state.

use std::sync::Arc;

use duelcard_domain::{
    ActorId, ActorSnapshot, ContestId, DomainError, Lane, SessionId, TestParticipant, TokenId,
};

mod authority;
mod bank;
mod commit;
mod execute;
mod initiate;
mod observe;
mod view;

pub use authority::{current_authority, is_authority};
pub use bank::{BankReport, BankRoll};
pub use commit::{CommitDeclaration, CommitRequest, CommitResult, QuickCommit};
pub use execute::{ExecuteOutcome, ExecutePendingRolls, Trigger};
pub use initiate::{InitiateOpposedTest, InitiateRequest, LaneSetup};
pub use observe::TableReactor;
pub use view::{render_card, CardView, LaneView, Notice, ViewCard};

use crate::entities::{Actors, CardError};
use crate::infrastructure::ports::RepoError;

/// Container for opposed test use cases.
pub struct OpposedTestUseCases {
    pub initiate: Arc<InitiateOpposedTest>,
    pub commit: Arc<CommitDeclaration>,
    pub quick_commit: Arc<QuickCommit>,
    pub execute: Arc<ExecutePendingRolls>,
    pub bank: Arc<BankRoll>,
    pub view: Arc<ViewCard>,
}

impl OpposedTestUseCases {
    pub fn new(
        initiate: Arc<InitiateOpposedTest>,
        commit: Arc<CommitDeclaration>,
        quick_commit: Arc<QuickCommit>,
        execute: Arc<ExecutePendingRolls>,
        bank: Arc<BankRoll>,
        view: Arc<ViewCard>,
    ) -> Self {
        Self {
            initiate,
            commit,
            quick_commit,
            execute,
            bank,
            view,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpposedTestError {
    #[error("Session {session} may not {action}")]
    PermissionDenied {
        session: SessionId,
        action: String,
    },
    #[error("Actor not found: {0}")]
    MissingActor(ActorId),
    #[error("Token not found: {0}")]
    MissingToken(TokenId),
    #[error("Capability not available: {0}")]
    MissingCapability(String),
    #[error("{lane} lane expects actor {expected}, got {found}")]
    IdentityMismatch {
        lane: Lane,
        expected: ActorId,
        found: ActorId,
    },
    #[error("Card schema version {found} is not supported (expected {supported})")]
    InvalidSchemaVersion { found: u32, supported: u32 },
    #[error("Opposed test not found: {0}")]
    NotFound(ContestId),
    #[error("{0} lane has already committed")]
    AlreadyCommitted(Lane),
    #[error("{0} lane has not committed a declaration")]
    NotCommitted(Lane),
    #[error("Opposed test is already resolved")]
    AlreadyResolved,
    #[error("Quick path is disabled for this session")]
    QuickPathDisabled,
    #[error("Invalid roll: {0}")]
    InvalidRoll(String),
    #[error("Card {id} kept changing; gave up after {attempts} attempts")]
    Conflict { id: ContestId, attempts: u32 },
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl OpposedTestError {
    pub(crate) fn denied(session: SessionId, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            session,
            action: action.into(),
        }
    }
}

impl From<DomainError> for OpposedTestError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => Self::InvalidRoll(msg),
            DomainError::NotFound { entity_type, id } if entity_type == "Capability" => {
                Self::MissingCapability(id)
            }
            DomainError::NotFound { entity_type, id } => {
                Self::Repo(RepoError::not_found(entity_type, id))
            }
            DomainError::AlreadyCommitted(lane) => Self::AlreadyCommitted(lane),
            DomainError::NotCommitted(lane) => Self::NotCommitted(lane),
            DomainError::AlreadyResolved => Self::AlreadyResolved,
            DomainError::UnsupportedSchema { found, supported } => {
                Self::InvalidSchemaVersion { found, supported }
            }
        }
    }
}

impl From<CardError> for OpposedTestError {
    fn from(e: CardError) -> Self {
        match e {
            CardError::NotFound(id) => Self::NotFound(id),
            CardError::Unreadable(e) => e.into(),
            CardError::Contended { id, attempts } => Self::Conflict { id, attempts },
            CardError::Repo(e) => Self::Repo(e),
        }
    }
}

/// Re-resolve a lane's actor, checking its token still points at it.
pub(crate) async fn resolve_participant(
    actors: &Actors,
    lane: Lane,
    participant: &TestParticipant,
) -> Result<ActorSnapshot, OpposedTestError> {
    let expected = participant.actor_id();
    if let Some(token_id) = participant.token_id() {
        let token = actors
            .get_token(token_id)
            .await?
            .ok_or(OpposedTestError::MissingToken(token_id))?;
        if token.actor_id != expected {
            return Err(OpposedTestError::IdentityMismatch {
                lane,
                expected,
                found: token.actor_id,
            });
        }
    }
    actors
        .get(expected)
        .await?
        .ok_or(OpposedTestError::MissingActor(expected))
}
