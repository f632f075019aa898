//! Coordination card operations.
//!
//! Every mutation is one load-latest / compute-next / write-whole-card cycle.
//! The write is a compare-and-swap on `update_sequence`; if another session
//! wrote first, the cycle reloads and recomputes from the fresh card.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use duelcard_domain::{ContestId, DomainError, OpposedTestState, SessionId};

use crate::infrastructure::ports::{CardRepo, ClockPort, RepoError};

/// What a compute step wants done with its working copy.
#[derive(Debug)]
pub enum Mutation<T> {
    /// Persist the working copy.
    Write(T),
    /// Leave the stored card alone.
    Skip(T),
}

/// Result of a successful update cycle.
#[derive(Debug)]
pub struct CardUpdate<T> {
    /// The card as stored after the cycle.
    pub card: OpposedTestState,
    pub value: T,
    pub written: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("Card not found: {0}")]
    NotFound(ContestId),
    #[error("Card is unreadable: {0}")]
    Unreadable(#[from] DomainError),
    #[error("Card {id} kept changing; gave up after {attempts} attempts")]
    Contended { id: ContestId, attempts: u32 },
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct Cards {
    repo: Arc<dyn CardRepo>,
    clock: Arc<dyn ClockPort>,
    max_attempts: u32,
}

impl Cards {
    pub fn new(repo: Arc<dyn CardRepo>, clock: Arc<dyn ClockPort>, max_attempts: u32) -> Self {
        Self {
            repo,
            clock,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn create(&self, card: &OpposedTestState) -> Result<(), RepoError> {
        self.repo.create(card).await
    }

    pub async fn get(&self, id: ContestId) -> Result<Option<OpposedTestState>, RepoError> {
        self.repo.get(id).await
    }

    /// Load a card and refuse layouts this build cannot interpret.
    pub async fn load(&self, id: ContestId) -> Result<OpposedTestState, CardError> {
        let card = self.repo.get(id).await?.ok_or(CardError::NotFound(id))?;
        card.ensure_supported_schema()?;
        Ok(card)
    }

    /// Run `mutate` against the latest card until the write lands.
    ///
    /// `mutate` may run more than once, always on a fresh copy, so it must not
    /// have side effects outside the card. An `Err` from `mutate` aborts the
    /// cycle without writing.
    pub async fn update<T, E, F>(
        &self,
        id: ContestId,
        by: SessionId,
        mut mutate: F,
    ) -> Result<CardUpdate<T>, E>
    where
        F: FnMut(&mut OpposedTestState, DateTime<Utc>) -> Result<Mutation<T>, E>,
        E: From<CardError>,
    {
        for attempt in 1..=self.max_attempts {
            let latest = self.load(id).await?;
            let expected = latest.update_sequence();
            let now = self.clock.now();

            let mut next = latest.clone();
            let value = match mutate(&mut next, now)? {
                Mutation::Skip(value) => {
                    return Ok(CardUpdate {
                        card: latest,
                        value,
                        written: false,
                    })
                }
                Mutation::Write(value) => value,
            };

            next.record_write(by, now);
            match self.repo.replace(&next, expected).await {
                Ok(()) => {
                    tracing::debug!(
                        contest_id = %id,
                        sequence = next.update_sequence(),
                        attempt,
                        "Card updated"
                    );
                    return Ok(CardUpdate {
                        card: next,
                        value,
                        written: true,
                    });
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(contest_id = %id, attempt, "Card changed underneath us, retrying");
                }
                Err(e) => return Err(CardError::Repo(e).into()),
            }
        }

        tracing::warn!(contest_id = %id, attempts = self.max_attempts, "Card update gave up");
        Err(CardError::Contended {
            id,
            attempts: self.max_attempts,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::feed::ChangeFeed;
    use crate::infrastructure::memory::InMemoryCardRepo;
    use crate::infrastructure::ports::MockCardRepo;
    use duelcard_domain::{ActorId, TestParticipant};

    fn card() -> OpposedTestState {
        OpposedTestState::new(
            SessionId::new(),
            TestParticipant::new(ActorId::new(), "Attacker"),
            TestParticipant::new(ActorId::new(), "Defender"),
            Utc::now(),
        )
    }

    fn cards_over(repo: Arc<dyn CardRepo>, attempts: u32) -> Cards {
        Cards::new(repo, Arc::new(FixedClock(Utc::now())), attempts)
    }

    #[tokio::test]
    async fn write_bumps_sequence_and_stamps_writer() {
        let repo = Arc::new(InMemoryCardRepo::new(Arc::new(ChangeFeed::new())));
        let cards = cards_over(repo.clone(), 3);
        let original = card();
        cards.create(&original).await.expect("create");
        let writer = SessionId::new();

        let update = cards
            .update(original.id(), writer, |_, _| {
                Ok::<_, CardError>(Mutation::Write(()))
            })
            .await
            .expect("update");

        assert!(update.written);
        assert_eq!(update.card.update_sequence(), 2);
        assert_eq!(update.card.context().updated_by, writer);
        let stored = repo.get(original.id()).await.expect("get").expect("exists");
        assert_eq!(stored, update.card);
    }

    #[tokio::test]
    async fn skip_leaves_the_store_untouched() {
        let repo = Arc::new(InMemoryCardRepo::new(Arc::new(ChangeFeed::new())));
        let cards = cards_over(repo.clone(), 3);
        let original = card();
        cards.create(&original).await.expect("create");

        let update = cards
            .update(original.id(), SessionId::new(), |card, _| {
                card.record_write(SessionId::new(), Utc::now());
                Ok::<_, CardError>(Mutation::Skip("nothing to do"))
            })
            .await
            .expect("update");

        assert!(!update.written);
        assert_eq!(update.value, "nothing to do");
        assert_eq!(update.card, original);
    }

    #[tokio::test]
    async fn conflict_reloads_and_recomputes() {
        let original = card();
        let mut concurrent = original.clone();
        concurrent.record_write(SessionId::new(), Utc::now());

        let mut repo = MockCardRepo::new();
        let mut seq = mockall::Sequence::new();
        let first = original.clone();
        repo.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(first.clone())));
        repo.expect_replace()
            .withf(|_, expected| *expected == 1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|card, expected| Err(RepoError::conflict("Card", card.id(), expected)));
        let second = concurrent.clone();
        repo.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(second.clone())));
        repo.expect_replace()
            .withf(|card, expected| *expected == 2 && card.update_sequence() == 3)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let cards = cards_over(Arc::new(repo), 5);
        let mut calls = 0;
        let update = cards
            .update(original.id(), SessionId::new(), |_, _| {
                calls += 1;
                Ok::<_, CardError>(Mutation::Write(()))
            })
            .await
            .expect("second attempt lands");

        assert_eq!(calls, 2);
        assert_eq!(update.card.update_sequence(), 3);
    }

    #[tokio::test]
    async fn persistent_conflict_gives_up() {
        let original = card();
        let mut repo = MockCardRepo::new();
        repo.expect_get()
            .times(2)
            .returning(move |_| Ok(Some(original.clone())));
        repo.expect_replace()
            .times(2)
            .returning(|card, expected| Err(RepoError::conflict("Card", card.id(), expected)));

        let cards = cards_over(Arc::new(repo), 2);
        let err = cards
            .update(ContestId::new(), SessionId::new(), |_, _| {
                Ok::<_, CardError>(Mutation::Write(()))
            })
            .await
            .expect_err("contended");
        assert!(matches!(err, CardError::Contended { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn rejected_mutation_writes_nothing() {
        let original = card();
        let mut repo = MockCardRepo::new();
        repo.expect_get()
            .returning(move |_| Ok(Some(original.clone())));
        repo.expect_replace().never();

        let cards = cards_over(Arc::new(repo), 3);
        let err = cards
            .update(ContestId::new(), SessionId::new(), |_, _| {
                Err::<Mutation<()>, _>(CardError::NotFound(ContestId::new()))
            })
            .await
            .expect_err("rejected");
        assert!(matches!(err, CardError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_card_is_not_found() {
        let repo = Arc::new(InMemoryCardRepo::new(Arc::new(ChangeFeed::new())));
        let cards = cards_over(repo, 3);
        let err = cards.load(ContestId::new()).await.expect_err("missing");
        assert!(matches!(err, CardError::NotFound(_)));
    }
}
