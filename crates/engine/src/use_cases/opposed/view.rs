//! Two-column rendering of a card.
//!
//! Until both lanes have committed, each lane's choice, target and declared
//! options stay sealed so neither side can react to the other.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duelcard_domain::{
    ContestId, Declaration, Lane, LaneState, OpposedTestState, Outcome, Phase, RollResult, Status,
};

use super::OpposedTestError;
use crate::entities::Cards;
use crate::infrastructure::ports::ClockPort;

/// Diagnostic shown alongside the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The card has sat in a waiting phase longer than the configured threshold.
    StaleWait {
        waited_secs: u64,
        waiting_on: Vec<Lane>,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::StaleWait {
                waited_secs,
                waiting_on,
            } => {
                let lanes: Vec<String> = waiting_on.iter().map(Lane::to_string).collect();
                write!(
                    f,
                    "Still waiting on {} after {}s",
                    lanes.join(" and "),
                    waited_secs
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneView {
    pub lane: Lane,
    pub name: String,
    pub state: LaneState,
    /// True while the lane's choices are hidden from everyone.
    pub sealed: bool,
    pub source_label: Option<String>,
    pub target: Option<i32>,
    pub declaration: Option<Declaration>,
    pub result: Option<RollResult>,
}

impl LaneView {
    fn from_card(card: &OpposedTestState, lane: Lane) -> Self {
        let participant = card.lane(lane);
        let sealed = !card.both_committed();
        Self {
            lane,
            name: participant.name().to_string(),
            state: participant.state(),
            sealed,
            source_label: participant
                .source_label()
                .filter(|_| !sealed)
                .map(str::to_string),
            target: participant.target().filter(|_| !sealed),
            declaration: participant.declaration().filter(|_| !sealed).cloned(),
            result: participant.roll_result().cloned(),
        }
    }

    fn status_line(&self) -> String {
        match (&self.result, self.state) {
            (Some(result), _) => result.to_string(),
            (None, LaneState::Uncommitted) => "choosing...".to_string(),
            (None, _) if self.sealed => "committed (sealed)".to_string(),
            (None, _) => match (&self.source_label, self.target) {
                (Some(label), Some(target)) => format!("{} vs {}, awaiting roll", label, target),
                _ => "awaiting roll".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub contest_id: ContestId,
    pub phase: Phase,
    pub status: Status,
    pub attacker: LaneView,
    pub defender: LaneView,
    pub outcome: Option<Outcome>,
    pub notices: Vec<Notice>,
}

impl CardView {
    pub fn lane(&self, lane: Lane) -> &LaneView {
        match lane {
            Lane::Attacker => &self.attacker,
            Lane::Defender => &self.defender,
        }
    }
}

const COLUMN: usize = 34;

impl fmt::Display for CardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Opposed test {} [{:?}]", self.contest_id, self.phase)?;
        writeln!(f, "{:<COLUMN$} | {}", "Attacker", "Defender")?;
        writeln!(f, "{:<COLUMN$} | {}", self.attacker.name, self.defender.name)?;
        writeln!(
            f,
            "{:<COLUMN$} | {}",
            self.attacker.status_line(),
            self.defender.status_line()
        )?;
        if let Some(outcome) = &self.outcome {
            writeln!(f, "=> {}", outcome.reason)?;
        }
        for notice in &self.notices {
            writeln!(f, "!! {}", notice)?;
        }
        Ok(())
    }
}

/// Build the view of `card` as seen at `now`.
pub fn render_card(card: &OpposedTestState, now: DateTime<Utc>, stale_after: Duration) -> CardView {
    let mut notices = Vec::new();
    let waited = card
        .waiting_for(now)
        .and_then(|waited| waited.to_std().ok());
    if let Some(waited) = waited.filter(|w| *w >= stale_after) {
        let waiting_on: Vec<Lane> = Lane::BOTH
            .into_iter()
            .filter(|lane| match card.phase() {
                Phase::Resolving => card.lane(*lane).roll_result().is_none(),
                _ => card.lane(*lane).state() == LaneState::Uncommitted,
            })
            .collect();
        notices.push(Notice::StaleWait {
            waited_secs: waited.as_secs(),
            waiting_on,
        });
    }

    CardView {
        contest_id: card.id(),
        phase: card.phase(),
        status: card.status(),
        attacker: LaneView::from_card(card, Lane::Attacker),
        defender: LaneView::from_card(card, Lane::Defender),
        outcome: card.outcome().cloned(),
        notices,
    }
}

pub struct ViewCard {
    cards: Arc<Cards>,
    clock: Arc<dyn ClockPort>,
    stale_after: Duration,
}

impl ViewCard {
    pub fn new(cards: Arc<Cards>, clock: Arc<dyn ClockPort>, stale_after: Duration) -> Self {
        Self {
            cards,
            clock,
            stale_after,
        }
    }

    pub async fn execute(&self, contest_id: ContestId) -> Result<CardView, OpposedTestError> {
        let card = self.cards.load(contest_id).await?;
        let view = render_card(&card, self.clock.now(), self.stale_after);
        if !view.notices.is_empty() {
            tracing::debug!(contest_id = %contest_id, notices = view.notices.len(), "Card has notices");
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::Table;
    use crate::use_cases::opposed::Trigger;
    use duelcard_domain::Difficulty;

    #[tokio::test]
    async fn committed_lane_is_sealed_until_the_other_side_commits() {
        let table = Table::new().await;
        let card = table.initiate().await;
        table.commit_attacker(card.id(), Difficulty::Hard).await;

        let view = table.app.use_cases.opposed.view.execute(card.id()).await.expect("view");
        let attacker = view.lane(Lane::Attacker);
        assert!(attacker.sealed);
        assert_eq!(attacker.state, LaneState::Committed);
        assert_eq!(attacker.target, None);
        assert_eq!(attacker.declaration, None);
        assert_eq!(attacker.source_label, None);
        assert!(view.to_string().contains("committed (sealed)"));
    }

    #[tokio::test]
    async fn both_commits_reveal_targets() {
        let table = Table::new().await;
        let card = table.committed_card(Difficulty::Average, Difficulty::Average).await;

        let view = table.app.use_cases.opposed.view.execute(card.id()).await.expect("view");
        assert!(!view.attacker.sealed);
        assert_eq!(view.attacker.target, Some(40));
        assert_eq!(view.defender.target, Some(50));
        assert_eq!(view.defender.source_label.as_deref(), Some("Combat"));
        assert!(view.to_string().contains("Combat vs 50, awaiting roll"));
    }

    #[tokio::test]
    async fn long_wait_surfaces_a_notice_without_expiring() {
        let table = Table::new().await;
        let card = table.initiate().await;
        table.commit_attacker(card.id(), Difficulty::Average).await;

        let fresh = table.app.use_cases.opposed.view.execute(card.id()).await.expect("view");
        assert!(fresh.notices.is_empty());

        table.clock.advance(chrono::Duration::seconds(61));
        let stale = table.app.use_cases.opposed.view.execute(card.id()).await.expect("view");
        assert_eq!(
            stale.notices,
            vec![Notice::StaleWait {
                waited_secs: 61,
                waiting_on: vec![Lane::Defender],
            }]
        );
        assert_eq!(stale.phase, Phase::WaitingForOneSide);
        assert!(stale.to_string().contains("Still waiting on defender after 61s"));
    }

    #[tokio::test]
    async fn resolved_card_shows_results_and_reason() {
        let table = Table::new().await;
        let card = table.committed_card(Difficulty::Average, Difficulty::Average).await;
        table.random.push([35, 62]);
        table
            .app
            .use_cases
            .opposed
            .execute
            .execute(table.gm, card.id(), Trigger::Automatic)
            .await
            .expect("execute");
        table.clock.advance(chrono::Duration::seconds(600));

        let view = table.app.use_cases.opposed.view.execute(card.id()).await.expect("view");
        assert!(view.notices.is_empty());
        let rendered = view.to_string();
        assert!(rendered.contains("35 vs 40: 3 DoS"));
        assert!(rendered.contains("62 vs 50: 2 DoF"));
        assert!(rendered.contains("=> Attacker succeeded while defender failed"));
    }
}
