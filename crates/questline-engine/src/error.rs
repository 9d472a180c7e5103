//! Error types for the draw orchestrator.
//!
//! The first four variants are precondition failures detected before any
//! mutation; [`EngineError::NoCandidates`] in particular is a normal game
//! state ("nothing to encounter here") that reaches the player as
//! information, not a failure banner.

use questline_core::DrawError;
use questline_db::StoreError;
use questline_types::{EventId, PlayerId};

/// Errors that can occur while resolving an event draw.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The player has no current map or area set.
    ///
    /// A player must have a valid position before any draw.
    #[error("player {0} has no current position")]
    PositionUnset(PlayerId),

    /// The union of map and area event pools is empty or zero-weighted.
    #[error("no events available at the player's position")]
    NoCandidates,

    /// A candidate pool carried a negative weight (authoring error).
    #[error("invalid weight in candidate pool: {0}")]
    InvalidWeight(f64),

    /// A drawn event has no logic record matching its kind.
    #[error("event {0} has no logic record for its kind")]
    MissingLogic(EventId),

    /// A persistence operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DrawError> for EngineError {
    fn from(e: DrawError) -> Self {
        match e {
            DrawError::NoCandidates => Self::NoCandidates,
            DrawError::InvalidWeight(w) => Self::InvalidWeight(w),
        }
    }
}
