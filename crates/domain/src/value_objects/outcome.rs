//! Opposed test outcome resolution.

use serde::{Deserialize, Serialize};

use crate::entities::Lane;
use crate::value_objects::RollResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Attacker,
    Defender,
    Tie,
}

impl From<Lane> for Winner {
    fn from(lane: Lane) -> Self {
        match lane {
            Lane::Attacker => Winner::Attacker,
            Lane::Defender => Winner::Defender,
        }
    }
}

/// Which precedence rule produced the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    CriticalSuccess,
    CriticalFailure,
    SuccessAgainstFailure,
    DegreesOfSuccess,
    DegreesOfFailure,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub winner: Winner,
    pub reason: String,
    pub decided_by: DecidedBy,
}

impl Outcome {
    fn new(winner: Winner, decided_by: DecidedBy, reason: String) -> Self {
        Self {
            winner,
            reason,
            decided_by,
        }
    }
}

fn lane_name(lane: Lane) -> &'static str {
    match lane {
        Lane::Attacker => "Attacker",
        Lane::Defender => "Defender",
    }
}

/// Compare two lane results.
///
/// Precedence, first match wins: a lone critical success, a lone critical
/// failure (the other side wins), success against failure, then degrees
/// (more DoS wins when both succeed, fewer DoF wins when both fail).
/// A missing result on either side is an unresolved tie.
pub fn resolve_outcome(attacker: Option<&RollResult>, defender: Option<&RollResult>) -> Outcome {
    let (Some(a), Some(d)) = (attacker, defender) else {
        return Outcome::new(
            Winner::Tie,
            DecidedBy::Unresolved,
            "Waiting for both rolls".to_string(),
        );
    };

    let lone = |a_flag: bool, d_flag: bool| match (a_flag, d_flag) {
        (true, false) => Some(Lane::Attacker),
        (false, true) => Some(Lane::Defender),
        _ => None,
    };

    if let Some(lane) = lone(a.is_critical_success, d.is_critical_success) {
        return Outcome::new(
            lane.into(),
            DecidedBy::CriticalSuccess,
            format!("{} wins with a critical success", lane_name(lane)),
        );
    }

    if let Some(fumbler) = lone(a.is_critical_failure, d.is_critical_failure) {
        let lane = fumbler.opponent();
        return Outcome::new(
            lane.into(),
            DecidedBy::CriticalFailure,
            format!(
                "{} wins; {} critically failed",
                lane_name(lane),
                lane_name(fumbler).to_lowercase()
            ),
        );
    }

    if let Some(lane) = lone(a.is_success, d.is_success) {
        return Outcome::new(
            lane.into(),
            DecidedBy::SuccessAgainstFailure,
            format!(
                "{} succeeded while {} failed",
                lane_name(lane),
                lane_name(lane.opponent()).to_lowercase()
            ),
        );
    }

    let both_succeeded = a.is_success;
    let (decided_by, unit) = if both_succeeded {
        (DecidedBy::DegreesOfSuccess, "DoS")
    } else {
        (DecidedBy::DegreesOfFailure, "DoF")
    };

    let leader = match a.degree.cmp(&d.degree) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater if both_succeeded => Some(Lane::Attacker),
        std::cmp::Ordering::Less if !both_succeeded => Some(Lane::Attacker),
        _ => Some(Lane::Defender),
    };

    match leader {
        Some(lane) => {
            let (mine, theirs) = match lane {
                Lane::Attacker => (a.degree, d.degree),
                Lane::Defender => (d.degree, a.degree),
            };
            let verb = if both_succeeded {
                "both succeeded"
            } else {
                "both failed"
            };
            Outcome::new(
                lane.into(),
                decided_by,
                format!(
                    "{} wins; {} ({} vs {} {})",
                    lane_name(lane),
                    verb,
                    mine,
                    theirs,
                    unit
                ),
            )
        }
        None => Outcome::new(
            Winner::Tie,
            decided_by,
            format!("Tie ({} vs {} {})", a.degree, d.degree, unit),
        ),
    }
}
