//! Plain data carried across port boundaries.

use std::collections::HashMap;

use duelcard_domain::{ActorId, CapabilityId, Declaration, Difficulty, SessionId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Session Types
// =============================================================================

/// A connected session's role at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    /// Game master - may act for any actor
    Gm,
    /// Player - acts for the actors they own
    Player,
    /// Observer - can view but not roll
    Observer,
}

/// Information about a connected session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub user_name: String,
    pub role: SessionRole,
}

impl SessionInfo {
    pub fn new(session_id: SessionId, user_name: impl Into<String>, role: SessionRole) -> Self {
        Self {
            session_id,
            user_name: user_name.into(),
            role,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self.role, SessionRole::Gm)
    }
}

// =============================================================================
// Preferences
// =============================================================================

/// Per-session defaults remembered between commits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub last_difficulty: Option<String>,
    pub manual_modifier: i32,
    pub specialization: bool,
    pub last_capability: HashMap<ActorId, CapabilityId>,
    pub quick_path_enabled: bool,
}

impl UserPreferences {
    /// Declaration built from the remembered values, for the quick path.
    pub fn default_declaration(&self) -> Declaration {
        let difficulty = self
            .last_difficulty
            .as_deref()
            .map(Difficulty::from_key_or_default)
            .unwrap_or_default();
        Declaration::new(difficulty)
            .with_manual_modifier(self.manual_modifier)
            .with_specialization(self.specialization)
    }

    /// Fold a committed declaration back into the remembered defaults.
    pub fn remember(
        &mut self,
        actor: ActorId,
        capability: Option<CapabilityId>,
        declaration: &Declaration,
    ) {
        self.last_difficulty = Some(declaration.difficulty().key().to_string());
        self.manual_modifier = declaration.manual_modifier;
        self.specialization = declaration.specialization;
        if let Some(capability) = capability {
            self.last_capability.insert(actor, capability);
        }
    }
}
