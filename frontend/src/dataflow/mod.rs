//! Actor+Relay primitives the tree view is built on.
//!
//! - [`Relay`] carries events from UI callbacks to an Actor.
//! - [`Actor`] owns one value and mutates it in a sequential event loop.
//! - [`ActorVec`] does the same for a list bound to the UI with `VecDiff`s.
//!
//! State is never mutated from outside its Actor; views only read signals.

pub mod actor;
pub mod actor_vec;
pub mod relay;

pub use actor::Actor;
pub use actor_vec::ActorVec;
pub use relay::{Relay, relay};
