//! Shared data model for the streamdfa automaton engine.
//!
//! # Architecture
//!
//! - [`state`] -- State identifiers and accepting-state sets
//! - [`transition`] -- The partial, deterministic transition table

pub mod state;
pub mod transition;

#[cfg(feature = "serde")]
mod serde_impl;

pub use hashbrown::Equivalent;
pub use state::{State, StateSet};
pub use transition::{TransitionKey, TransitionTable};
