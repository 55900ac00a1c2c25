//! The engine's small, fatal, local error taxonomy.
//!
//! Every variant ends the calculation that raised it. Nothing in this crate retries an error;
//! callers that want retry/backoff behavior belong outside the core.

use crate::types::Rank;

/// A fatal condition raised by the probability or game-state layers.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A distribution's probability mass deviated from 1 by more than its configured
    /// `PROB_SPACE_TOLERANCE`, or one of its events had a negative probability.
    #[error("probability mass {mass} deviates from 1 beyond tolerance")]
    ProbabilityInvariant {
        /// The offending total mass, or the offending negative probability itself when a single
        /// event (rather than the whole distribution's closure) violated the invariant.
        mass: f64,
    },

    /// `draw(Some(v))` was requested for a face whose remaining count in the deck is zero.
    #[error("no cards of rank {0} remain in the deck")]
    ExhaustedFace(Rank),

    /// A driver was invoked when its stated precondition did not hold. This is always a
    /// programming error in the caller, not a data-dependent failure.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
}

/// Convenience alias for the engine's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
