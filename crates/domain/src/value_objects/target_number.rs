//! Target number resolution.
//!
//! A target number is the base rating of whatever is being tested plus an
//! ordered list of modifiers. The order is fixed so two sessions computing the
//! same declaration always produce the same breakdown:
//!
//! base, item bonuses, fatigue, encumbrance, armor mobility, wound,
//! environment, difficulty, specialization, situational, manual.

use serde::{Deserialize, Serialize};

use crate::entities::ActorSnapshot;
use crate::error::DomainError;
use crate::value_objects::Difficulty;
use crate::CapabilityId;

/// Flat bonus granted by a declared specialization.
pub const SPECIALIZATION_BONUS: i32 = 10;

/// What the lane is rolling against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestSource {
    /// A rated capability on the actor.
    Capability { id: CapabilityId },
    /// A derived value computed elsewhere (e.g. a characteristic), used as-is.
    DerivedValue { key: String, value: i32 },
}

impl TestSource {
    pub fn capability(id: CapabilityId) -> Self {
        Self::Capability { id }
    }

    pub fn derived(key: impl Into<String>, value: i32) -> Self {
        Self::DerivedValue {
            key: key.into(),
            value,
        }
    }
}

/// Tag recorded on every breakdown line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierSource {
    Base,
    Item,
    Fatigue,
    Encumbrance,
    ArmorMobility,
    Wound,
    Environment,
    Difficulty,
    Specialization,
    Sensory,
    Trait,
    Situational,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SituationalKind {
    SensoryImpairment,
    Trait,
    Other,
}

impl SituationalKind {
    fn source(&self) -> ModifierSource {
        match self {
            SituationalKind::SensoryImpairment => ModifierSource::Sensory,
            SituationalKind::Trait => ModifierSource::Trait,
            SituationalKind::Other => ModifierSource::Situational,
        }
    }
}

/// A situational flag the participant ticked when declaring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationalModifier {
    pub label: String,
    pub value: i32,
    pub kind: SituationalKind,
}

impl SituationalModifier {
    pub fn new(label: impl Into<String>, value: i32, kind: SituationalKind) -> Self {
        Self {
            label: label.into(),
            value,
            kind,
        }
    }
}

/// The banked choice for one lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Difficulty key; unknown keys resolve to `average`.
    pub difficulty: String,
    #[serde(default)]
    pub manual_modifier: i32,
    #[serde(default)]
    pub specialization: bool,
    #[serde(default)]
    pub situational: Vec<SituationalModifier>,
}

impl Declaration {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty: difficulty.key().to_string(),
            manual_modifier: 0,
            specialization: false,
            situational: Vec::new(),
        }
    }

    pub fn with_manual_modifier(mut self, modifier: i32) -> Self {
        self.manual_modifier = modifier;
        self
    }

    pub fn with_specialization(mut self, specialization: bool) -> Self {
        self.specialization = specialization;
        self
    }

    pub fn with_situational(mut self, modifier: SituationalModifier) -> Self {
        self.situational.push(modifier);
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_key_or_default(&self.difficulty)
    }
}

impl Default for Declaration {
    fn default() -> Self {
        Self::new(Difficulty::Average)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierLine {
    pub label: String,
    pub value: i32,
    pub source: ModifierSource,
}

/// Ordered list of modifier lines. The final value is always the sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetNumberBreakdown {
    lines: Vec<ModifierLine>,
}

impl TargetNumberBreakdown {
    pub fn lines(&self) -> &[ModifierLine] {
        &self.lines
    }

    pub fn final_value(&self) -> i32 {
        self.lines.iter().map(|l| l.value).sum()
    }

    fn push(&mut self, label: impl Into<String>, value: i32, source: ModifierSource) {
        self.lines.push(ModifierLine {
            label: label.into(),
            value,
            source,
        });
    }

    fn push_nonzero(&mut self, label: &str, value: i32, source: ModifierSource) {
        if value != 0 {
            self.push(label, value, source);
        }
    }
}

impl std::fmt::Display for TargetNumberBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{}({})", line.label, line.value)
                } else {
                    format!("{}({:+})", line.label, line.value)
                }
            })
            .collect();
        write!(f, "{} = {}", parts.join(" "), self.final_value())
    }
}

/// Output of [`resolve_target_number`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Display label for what is being tested.
    pub label: String,
    pub breakdown: TargetNumberBreakdown,
}

/// Compute the target number for `actor` testing `source` with `declaration`.
///
/// This is the single entry point that interprets a [`TestSource`]; everything
/// downstream only sees the breakdown.
pub fn resolve_target_number(
    actor: &ActorSnapshot,
    source: &TestSource,
    declaration: &Declaration,
) -> Result<ResolvedTarget, DomainError> {
    let (label, base, item_bonus, supports_specialization) = match source {
        TestSource::Capability { id } => {
            let capability = actor
                .capability(*id)
                .ok_or_else(|| DomainError::not_found("Capability", id.to_string()))?;
            (
                capability.name.clone(),
                capability.rating,
                capability.item_bonus,
                capability.supports_specialization,
            )
        }
        TestSource::DerivedValue { key, value } => (key.clone(), *value, 0, false),
    };

    let mut breakdown = TargetNumberBreakdown::default();
    breakdown.push(label.clone(), base, ModifierSource::Base);
    breakdown.push_nonzero("Items", item_bonus, ModifierSource::Item);

    let penalties = &actor.penalties;
    breakdown.push_nonzero("Fatigue", penalties.fatigue, ModifierSource::Fatigue);
    breakdown.push_nonzero("Encumbrance", penalties.encumbrance, ModifierSource::Encumbrance);
    breakdown.push_nonzero("Armor", penalties.armor_mobility, ModifierSource::ArmorMobility);
    breakdown.push_nonzero("Wounded", penalties.wound, ModifierSource::Wound);
    breakdown.push_nonzero("Environment", penalties.environment, ModifierSource::Environment);

    let difficulty = declaration.difficulty();
    breakdown.push(difficulty.label(), difficulty.modifier(), ModifierSource::Difficulty);

    if declaration.specialization && supports_specialization {
        breakdown.push("Specialization", SPECIALIZATION_BONUS, ModifierSource::Specialization);
    }

    for modifier in &declaration.situational {
        breakdown.push_nonzero(&modifier.label, modifier.value, modifier.kind.source());
    }

    breakdown.push_nonzero("Manual", declaration.manual_modifier, ModifierSource::Manual);

    Ok(ResolvedTarget { label, breakdown })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ActorClass, ActorPenalties, Capability};

    fn sources(breakdown: &TargetNumberBreakdown) -> Vec<ModifierSource> {
        breakdown.lines().iter().map(|l| l.source).collect()
    }

    #[test]
    fn plain_average_test_is_just_the_rating() {
        let evade = Capability::new("Evade", 40);
        let actor = ActorSnapshot::new("Brenna", ActorClass::Character).with_capability(evade.clone());

        let resolved =
            resolve_target_number(&actor, &TestSource::capability(evade.id), &Declaration::default())
                .expect("capability exists");

        assert_eq!(resolved.label, "Evade");
        assert_eq!(resolved.breakdown.final_value(), 40);
        assert_eq!(
            sources(&resolved.breakdown),
            vec![ModifierSource::Base, ModifierSource::Difficulty]
        );
    }

    #[test]
    fn lines_follow_the_fixed_order() {
        let blade = Capability::new("One-Handed", 55)
            .with_item_bonus(5)
            .with_specialization();
        let actor = ActorSnapshot::new("Varo", ActorClass::Character)
            .with_capability(blade.clone())
            .with_penalties(ActorPenalties {
                fatigue: -10,
                encumbrance: -5,
                armor_mobility: -10,
                wound: -20,
                environment: -10,
            });
        let declaration = Declaration::new(Difficulty::Hard)
            .with_specialization(true)
            .with_situational(SituationalModifier::new(
                "Blinded",
                -30,
                SituationalKind::SensoryImpairment,
            ))
            .with_situational(SituationalModifier::new("Night Eye", 20, SituationalKind::Trait))
            .with_manual_modifier(7);

        let resolved = resolve_target_number(&actor, &TestSource::capability(blade.id), &declaration)
            .expect("capability exists");

        assert_eq!(
            sources(&resolved.breakdown),
            vec![
                ModifierSource::Base,
                ModifierSource::Item,
                ModifierSource::Fatigue,
                ModifierSource::Encumbrance,
                ModifierSource::ArmorMobility,
                ModifierSource::Wound,
                ModifierSource::Environment,
                ModifierSource::Difficulty,
                ModifierSource::Specialization,
                ModifierSource::Sensory,
                ModifierSource::Trait,
                ModifierSource::Manual,
            ]
        );
        // 55 + 5 - 10 - 5 - 10 - 20 - 10 - 30 + 10 - 30 + 20 + 7
        assert_eq!(resolved.breakdown.final_value(), -18);
    }

    #[test]
    fn specialization_needs_capability_support() {
        let brawl = Capability::new("Unarmed", 50);
        let actor = ActorSnapshot::new("Hrolf", ActorClass::Npc).with_capability(brawl.clone());
        let declaration = Declaration::default().with_specialization(true);

        let resolved = resolve_target_number(&actor, &TestSource::capability(brawl.id), &declaration)
            .expect("capability exists");

        assert_eq!(resolved.breakdown.final_value(), 50);
        assert!(!sources(&resolved.breakdown).contains(&ModifierSource::Specialization));
    }

    #[test]
    fn derived_value_is_used_as_base() {
        let actor = ActorSnapshot::new("Ysolda", ActorClass::Character);
        let declaration = Declaration::new(Difficulty::Easy).with_specialization(true);

        let resolved =
            resolve_target_number(&actor, &TestSource::derived("Agility", 45), &declaration)
                .expect("derived values always resolve");

        assert_eq!(resolved.label, "Agility");
        assert_eq!(resolved.breakdown.final_value(), 65);
    }

    #[test]
    fn unknown_difficulty_key_contributes_zero() {
        let actor = ActorSnapshot::new("Ysolda", ActorClass::Character);
        let declaration = Declaration {
            difficulty: "legendary".to_string(),
            ..Declaration::default()
        };

        let resolved =
            resolve_target_number(&actor, &TestSource::derived("Strength", 38), &declaration)
                .expect("derived values always resolve");

        assert_eq!(resolved.breakdown.final_value(), 38);
    }

    #[test]
    fn missing_capability_is_an_error() {
        let actor = ActorSnapshot::new("Ysolda", ActorClass::Character);
        let result = resolve_target_number(
            &actor,
            &TestSource::capability(CapabilityId::new()),
            &Declaration::default(),
        );
        assert!(matches!(result, Err(DomainError::NotFound { entity_type: "Capability", .. })));
    }

    #[test]
    fn display_lists_every_line_and_total() {
        let actor = ActorSnapshot::new("Ysolda", ActorClass::Character);
        let declaration = Declaration::new(Difficulty::Challenging).with_manual_modifier(5);
        let resolved =
            resolve_target_number(&actor, &TestSource::derived("Perception", 50), &declaration)
                .expect("derived values always resolve");

        assert_eq!(
            resolved.breakdown.to_string(),
            "Perception(50) Challenging(-10) Manual(+5) = 45"
        );
    }
}
