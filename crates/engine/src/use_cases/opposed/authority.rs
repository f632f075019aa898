//! Authority election.
//!
//! Decides which connected session runs automatic steps for a card. The answer
//! depends only on the connected-session list and the card's creator, so every
//! session computes the same authority without talking to the others.

use duelcard_domain::SessionId;

use crate::infrastructure::ports::SessionInfo;

/// The lowest-id connected elevated session, or the card's creator if none is connected.
pub fn current_authority(connected: &[SessionInfo], creator: SessionId) -> SessionId {
    connected
        .iter()
        .filter(|s| s.is_elevated())
        .map(|s| s.session_id)
        .min()
        .unwrap_or(creator)
}

pub fn is_authority(connected: &[SessionInfo], creator: SessionId, session: SessionId) -> bool {
    current_authority(connected, creator) == session
}
