//! The narrow interface this crate consumes from its host simulation.
//!
//! The discrete-event engine owns simulated time, the population store owns
//! person ids, and the attribute store owns current values. A partition never
//! reaches into any of them directly; it sees the world through a caller-supplied
//! context type `C`. Filters and labelers capture their own attribute accessors
//! over `C`, so the only operations the crate itself needs from the context are
//! the ones below.

use rand::RngCore;

use crate::error::SimdexError;
use crate::people::PersonId;

/// Identifies a named random stream provided by the context.
///
/// The crate implies no default stream of its own; passing `None` wherever a
/// stream id is accepted means "use the ambient default stream" of the context.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RngStreamId(pub &'static str);

impl std::fmt::Display for RngStreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Services consumed from the simulation: population existence and iteration,
/// and access to seeded random streams.
///
/// All methods are synchronous point lookups; the crate performs no caching
/// beyond what its own indexes represent.
pub trait SimContext {
    /// Returns whether `person_id` currently exists in the population.
    fn contains_person(&self, person_id: PersonId) -> bool;

    /// A snapshot of every person currently in the population. Used once, when
    /// a partition is activated over an already-populated simulation.
    fn people(&self) -> Vec<PersonId>;

    /// Runs `sample` against the random stream named by `stream`, or the
    /// ambient default stream when `stream` is `None`.
    ///
    /// # Errors
    /// `SimdexError::UnknownRngStream` if `stream` names a stream the context
    /// does not provide.
    fn with_rng<T>(
        &self,
        stream: Option<RngStreamId>,
        sample: impl FnOnce(&mut dyn RngCore) -> T,
    ) -> Result<T, SimdexError>;
}
