//! Per-session reactions to store notifications.
//!
//! Every session runs one reactor. Card changes may trigger execution (the
//! authority check lives in [`ExecutePendingRolls`]); published rolls are banked
//! by whoever sees them first. Errors are logged and dropped so one bad
//! notification never stops the loop.

use std::sync::Arc;

use duelcard_domain::{ContestId, RollRecord, SessionId};
use tokio::sync::broadcast;

use super::bank::BankRoll;
use super::execute::{ExecuteOutcome, ExecutePendingRolls, Trigger};
use super::OpposedTestError;
use crate::infrastructure::feed::StoreEvent;

pub struct TableReactor {
    session: SessionId,
    execute: Arc<ExecutePendingRolls>,
    bank: Arc<BankRoll>,
}

impl TableReactor {
    pub fn new(session: SessionId, execute: Arc<ExecutePendingRolls>, bank: Arc<BankRoll>) -> Self {
        Self {
            session,
            execute,
            bank,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub async fn on_card_changed(&self, contest_id: ContestId) {
        match self
            .execute
            .execute(self.session, contest_id, Trigger::Automatic)
            .await
        {
            Ok(ExecuteOutcome::Executed { banked, card }) => {
                tracing::debug!(
                    session_id = %self.session,
                    contest_id = %contest_id,
                    lanes = banked.len(),
                    resolved = card.is_resolved(),
                    "Reactor executed pending rolls"
                );
            }
            Ok(ExecuteOutcome::Deferred { authority }) => {
                tracing::trace!(
                    session_id = %self.session,
                    contest_id = %contest_id,
                    authority = %authority,
                    "Not authoritative"
                );
            }
            Ok(ExecuteOutcome::AwaitingOtherSessions { lanes }) => {
                tracing::debug!(
                    session_id = %self.session,
                    contest_id = %contest_id,
                    lanes = ?lanes,
                    "Lanes left for the sessions that control them"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session,
                    contest_id = %contest_id,
                    error = %e,
                    "Reactor failed to execute pending rolls"
                );
            }
        }
    }

    pub async fn on_roll_record(&self, record: &RollRecord) {
        match self.bank.execute(self.session, record).await {
            Ok(report) => {
                tracing::trace!(
                    session_id = %self.session,
                    record_id = %record.id,
                    effect = ?report.effect,
                    "Reactor banked roll record"
                );
            }
            // Another session got there first, or the card moved on.
            Err(OpposedTestError::Conflict { .. }) => {}
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session,
                    contest_id = %record.contest_id,
                    record_id = %record.id,
                    error = %e,
                    "Reactor rejected roll record"
                );
            }
        }
    }

    pub async fn handle(&self, event: StoreEvent) {
        match event {
            StoreEvent::CardChanged(id) => self.on_card_changed(id).await,
            StoreEvent::RollPublished(record) => self.on_roll_record(&record).await,
        }
    }

    /// Drain `events` until the feed closes.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<StoreEvent>) {
        tracing::info!(session_id = %self.session, "Reactor started");
        loop {
            match events.recv().await {
                Ok(event) => self.handle(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session_id = %self.session,
                        skipped,
                        "Reactor lagged behind the change feed"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!(session_id = %self.session, "Reactor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::Table;
    use duelcard_domain::{Difficulty, Lane, Phase};
    use std::time::Duration;

    #[tokio::test]
    async fn gm_reactor_resolves_once_both_sides_commit() {
        let table = Table::new().await;
        let card = table.initiate().await;
        table.commit_attacker(card.id(), Difficulty::Average).await;
        table.commit_defender(card.id(), Difficulty::Average).await;
        table.random.push([35, 62]);

        table.app.reactor(table.player).on_card_changed(card.id()).await;
        assert!(table.card(card.id()).await.is_ready_to_roll());

        table.app.reactor(table.gm).on_card_changed(card.id()).await;
        let done = table.card(card.id()).await;
        assert_eq!(done.phase(), Phase::Resolved);
    }

    #[tokio::test]
    async fn any_session_banks_a_visible_roll() {
        let table = Table::new().await;
        let card = table.committed_card(Difficulty::Average, Difficulty::Average).await;
        let record = RollRecord::new(card.id(), Lane::Attacker, table.player, 35, table.clock.now())
            .with_actor(table.hero.id);

        table.app.reactor(table.gm).on_roll_record(&record).await;
        table.app.reactor(table.player).on_roll_record(&record).await;

        let banked = table.card(card.id()).await;
        assert_eq!(banked.lane(Lane::Attacker).roll_record_id(), Some(record.id));
        assert_eq!(banked.update_sequence(), card.update_sequence() + 1);
    }

    #[tokio::test]
    async fn forged_record_is_swallowed() {
        let table = Table::new().await;
        let card = table.committed_card(Difficulty::Average, Difficulty::Average).await;
        let forged = RollRecord::new(card.id(), Lane::Defender, table.player, 99, table.clock.now());

        table
            .app
            .reactor(table.gm)
            .handle(StoreEvent::RollPublished(forged))
            .await;

        assert!(table.card(card.id()).await.lane(Lane::Defender).roll_result().is_none());
    }

    #[tokio::test]
    async fn reactors_on_the_feed_drive_a_contest_to_resolution() {
        let table = Table::new().await;
        for session in [table.gm, table.player] {
            let reactor = table.app.reactor(session);
            tokio::spawn(reactor.run(table.feed.subscribe()));
        }
        table.random.push([35, 62]);

        let card = table.committed_card(Difficulty::Average, Difficulty::Average).await;

        let mut resolved = None;
        for _ in 0..100 {
            let latest = table.card(card.id()).await;
            if latest.is_resolved() {
                resolved = Some(latest);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let resolved = resolved.expect("contest resolves");
        assert!(resolved.outcome().is_some());
        let records = table
            .app
            .entities
            .roll_log
            .list_for_contest(card.id())
            .await
            .expect("records");
        assert_eq!(records.len(), 2);
    }
}
