//! Error types for the pure logic crate.

/// Errors that can occur during a weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DrawError {
    /// The candidate pool is empty or its weights sum to zero.
    ///
    /// This is a normal game state ("nothing available here"), not a system
    /// fault; callers surface it as informational.
    #[error("no candidates with positive weight")]
    NoCandidates,

    /// A candidate carried a negative weight.
    ///
    /// Negative weights have no sound probabilistic interpretation, so this
    /// is a caller error rather than something to clamp silently.
    #[error("invalid negative weight: {0}")]
    InvalidWeight(f64),
}
