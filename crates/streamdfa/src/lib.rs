//! Streaming deterministic finite automaton engine.
//!
//! An [`Automaton`] is built once from a [`TransitionTable`], a start state
//! and a [`StateSet`] of accepting states, then run any number of times
//! against a channel of input symbols. Each run reports every transition to
//! an observation callback and stops on acceptance (unless looping),
//! end-of-input or cancellation.
//!
//! # Architecture
//!
//! - [`automaton`] -- Construction options and the run loop
//! - [`cancel`] -- Cooperative cancellation raced against the input channel
//! - [`dot`] -- Graphviz export with canonical ordering
//!
//! ```no_run
//! use streamdfa::crossbeam_channel;
//! use streamdfa::{Automaton, AutomatonOption, CancelToken, State, StateSet, TransitionTable};
//!
//! let table = TransitionTable::from([
//!     ((State(0), "A"), State(1)),
//!     ((State(1), "B"), State(2)),
//! ]);
//! let automaton = Automaton::new(
//!     State(0),
//!     table,
//!     StateSet::from([State(2)]),
//!     [AutomatonOption::Fallback(State(0))],
//! );
//!
//! let (tx, rx) = crossbeam_channel::bounded(1);
//! std::thread::spawn(move || {
//!     for symbol in ["B", "A", "B"] {
//!         let _ = tx.send(symbol);
//!     }
//! });
//! let accepted = automaton
//!     .run(&CancelToken::never(), &rx, |p, u, q| println!("{p} --{u}--> {q}"))
//!     .unwrap();
//! assert!(accepted);
//! ```

pub mod automaton;
pub mod cancel;
pub mod dot;

pub use automaton::{Automaton, AutomatonOption, Options};
pub use cancel::{CancelToken, Canceller};
pub use crossbeam_channel;
pub use streamdfa_core::{State, StateSet, TransitionKey, TransitionTable};

/// Error type for a failed run.
///
/// A failed run is terminal for that run only; the automaton stays valid and
/// can be run again. The message is available when `T: Display`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError<T> {
    /// The table has no entry for `(state, input)` and no fallback state is
    /// configured.
    #[error("undefined transition, state: {state}, input: {input}")]
    UndefinedTransition { state: State, input: T },
}
