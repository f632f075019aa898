//! Degree of success / failure for a d100 roll-under test.

use serde::{Deserialize, Serialize};

use crate::entities::{ActorClass, ActorSnapshot};

/// Fixed critical band for [`ActorClass::Npc`].
pub const NPC_CRITICAL_SUCCESS_MAX: u8 = 3;
pub const NPC_CRITICAL_FAILURE_MIN: u8 = 98;

/// Which critical gates are enabled for per-character lucky/unlucky numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalRules {
    pub allow_lucky: bool,
    pub allow_unlucky: bool,
}

impl Default for CriticalRules {
    fn default() -> Self {
        Self {
            allow_lucky: true,
            allow_unlucky: true,
        }
    }
}

/// Everything the degree resolver needs to know about the roller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalProfile<'a> {
    pub class: ActorClass,
    pub lucky: &'a [u8],
    pub unlucky: &'a [u8],
    pub rules: CriticalRules,
}

impl<'a> CriticalProfile<'a> {
    pub fn for_actor(actor: &'a ActorSnapshot, rules: CriticalRules) -> Self {
        Self {
            class: actor.class,
            lucky: &actor.lucky_numbers,
            unlucky: &actor.unlucky_numbers,
            rules,
        }
    }

    pub fn npc() -> Self {
        Self {
            class: ActorClass::Npc,
            lucky: &[],
            unlucky: &[],
            rules: CriticalRules::default(),
        }
    }
}

/// The banked verdict for one lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    pub roll_total: u8,
    pub target: i32,
    pub is_success: bool,
    pub degree: u32,
    pub is_critical_success: bool,
    pub is_critical_failure: bool,
}

impl RollResult {
    /// "3 DoS" / "2 DoF".
    pub fn label(&self) -> String {
        if self.is_success {
            format!("{} DoS", self.degree)
        } else {
            format!("{} DoF", self.degree)
        }
    }

    fn critical_tag(&self) -> Option<&'static str> {
        if self.is_critical_success {
            Some("critical success")
        } else if self.is_critical_failure {
            Some("critical failure")
        } else {
            None
        }
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {}: {}", self.roll_total, self.target, self.label())?;
        if let Some(tag) = self.critical_tag() {
            write!(f, " ({})", tag)?;
        }
        Ok(())
    }
}

/// Resolve a roll total against a target.
///
/// Callers must pass `roll_total` in `1..=100`.
pub fn resolve_degree(roll_total: u8, target: i32, profile: &CriticalProfile<'_>) -> RollResult {
    let (is_critical_success, is_critical_failure) = match profile.class {
        ActorClass::Npc => (
            roll_total <= NPC_CRITICAL_SUCCESS_MAX,
            roll_total >= NPC_CRITICAL_FAILURE_MIN,
        ),
        ActorClass::Character => {
            let lucky = profile.rules.allow_lucky && profile.lucky.contains(&roll_total);
            let unlucky =
                !lucky && profile.rules.allow_unlucky && profile.unlucky.contains(&roll_total);
            (lucky, unlucky)
        }
    };

    let roll = i32::from(roll_total);
    let is_success = match profile.class {
        ActorClass::Character if is_critical_success => true,
        ActorClass::Character if is_critical_failure => false,
        _ => roll <= target,
    };

    let degree = if is_success {
        let mut degree = (roll / 10).max(1);
        if target > 100 {
            degree += (target % 100) / 10;
        }
        degree
    } else {
        1 + (roll - target).max(0) / 10
    };

    RollResult {
        roll_total,
        target,
        is_success,
        // Both branches are >= 1.
        degree: degree.unsigned_abs(),
        is_critical_success,
        is_critical_failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pc<'a>(lucky: &'a [u8], unlucky: &'a [u8]) -> CriticalProfile<'a> {
        CriticalProfile {
            class: ActorClass::Character,
            lucky,
            unlucky,
            rules: CriticalRules::default(),
        }
    }

    #[test]
    fn success_degree_is_tens_digit() {
        let result = resolve_degree(35, 40, &CriticalProfile::npc());
        assert!(result.is_success);
        assert_eq!(result.degree, 3);
        assert_eq!(result.label(), "3 DoS");
    }

    #[test]
    fn low_success_still_has_one_degree() {
        let result = resolve_degree(7, 40, &pc(&[], &[]));
        assert!(result.is_success);
        assert_eq!(result.degree, 1);
    }

    #[test]
    fn failure_degree_counts_margin() {
        let result = resolve_degree(62, 50, &CriticalProfile::npc());
        assert!(!result.is_success);
        assert_eq!(result.degree, 2);
        assert_eq!(result.label(), "2 DoF");
    }

    #[test]
    fn target_above_one_hundred_adds_bonus_degrees() {
        let result = resolve_degree(80, 123, &pc(&[], &[]));
        assert!(result.is_success);
        assert_eq!(result.degree, 10);
    }

    #[test]
    fn npc_critical_bands_do_not_force_the_verdict() {
        let crit = resolve_degree(3, 2, &CriticalProfile::npc());
        assert!(crit.is_critical_success);
        assert!(!crit.is_success);

        let fumble = resolve_degree(98, 120, &CriticalProfile::npc());
        assert!(fumble.is_critical_failure);
        assert!(fumble.is_success);

        let plain = resolve_degree(4, 50, &CriticalProfile::npc());
        assert!(!plain.is_critical_success);
    }

    #[test]
    fn lucky_number_forces_success() {
        let result = resolve_degree(77, 30, &pc(&[77], &[]));
        assert!(result.is_critical_success);
        assert!(result.is_success);
        assert_eq!(result.degree, 7);
    }

    #[test]
    fn unlucky_number_forces_failure() {
        let result = resolve_degree(12, 60, &pc(&[], &[12]));
        assert!(result.is_critical_failure);
        assert!(!result.is_success);
        assert_eq!(result.degree, 1);
    }

    #[test]
    fn lucky_wins_when_a_number_is_in_both_sets() {
        let result = resolve_degree(50, 10, &pc(&[50], &[50]));
        assert!(result.is_critical_success);
        assert!(!result.is_critical_failure);
    }

    #[test]
    fn disabled_gates_ignore_personal_numbers() {
        let profile = CriticalProfile {
            rules: CriticalRules {
                allow_lucky: false,
                allow_unlucky: false,
            },
            ..pc(&[77], &[12])
        };
        let lucky = resolve_degree(77, 30, &profile);
        assert!(!lucky.is_critical_success);
        assert!(!lucky.is_success);

        let unlucky = resolve_degree(12, 60, &profile);
        assert!(!unlucky.is_critical_failure);
        assert!(unlucky.is_success);
    }

    #[test]
    fn display_includes_critical_tag() {
        let result = resolve_degree(1, 40, &CriticalProfile::npc());
        assert_eq!(result.to_string(), "1 vs 40: 1 DoS (critical success)");
    }

    #[test]
    fn degree_is_never_below_one_over_full_range() {
        for roll in 1..=100u8 {
            for target in 1..=200 {
                assert!(resolve_degree(roll, target, &CriticalProfile::npc()).degree >= 1);
            }
        }
    }

    proptest! {
        #[test]
        fn degree_is_at_least_one_for_characters(
            roll in 1u8..=100,
            target in -100i32..=300,
            lucky in proptest::collection::vec(1u8..=100, 0..4),
            unlucky in proptest::collection::vec(1u8..=100, 0..4),
        ) {
            let result = resolve_degree(roll, target, &pc(&lucky, &unlucky));
            prop_assert!(result.degree >= 1);
            prop_assert_eq!(result.roll_total, roll);
        }
    }
}
