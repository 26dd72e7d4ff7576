//! Contract resolution
//!
//! The [`ResolutionSession`] owns every cache of a run and dispatches types to
//! the shape builders; the [`ClosureResolver`] drives it to a fixed point over
//! the types reachable from a set of roots.

pub mod closure;
pub mod known_types;
pub mod session;

pub use closure::{ClosureResolver, Resolution};
pub use session::{ResolutionSession, SessionOptions};
