// Automaton construction and the streaming run loop.

use std::fmt;
use std::hash::Hash;

use crossbeam_channel::Receiver;
use log::{debug, trace};
use streamdfa_core::{Equivalent, State, StateSet, TransitionTable};

use crate::RunError;
use crate::cancel::CancelToken;

/// A behavioral modifier applied at construction time.
///
/// Options apply in the order given; a later option of the same kind
/// overwrites an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonOption {
    /// Go to this state whenever the table has no entry for the current
    /// `(state, input)` pair.
    Fallback(State),
    /// Keep consuming input after reaching an accepting state.
    Loop,
}

/// Run policy of an automaton.
///
/// Built from [`AutomatonOption`] values or with the builder methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    fallback: Option<State>,
    looping: bool,
}

impl Options {
    /// Set the fallback state.
    pub fn fallback(mut self, state: State) -> Self {
        self.fallback = Some(state);
        self
    }

    /// Enable loop mode.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn apply(&mut self, option: AutomatonOption) {
        match option {
            AutomatonOption::Fallback(state) => self.fallback = Some(state),
            AutomatonOption::Loop => self.looping = true,
        }
    }

    pub fn fallback_state(&self) -> Option<State> {
        self.fallback
    }

    pub fn is_loop(&self) -> bool {
        self.looping
    }
}

impl FromIterator<AutomatonOption> for Options {
    fn from_iter<I: IntoIterator<Item = AutomatonOption>>(iter: I) -> Self {
        let mut options = Self::default();
        options.extend(iter);
        options
    }
}

impl Extend<AutomatonOption> for Options {
    fn extend<I: IntoIterator<Item = AutomatonOption>>(&mut self, iter: I) {
        for option in iter {
            self.apply(option);
        }
    }
}

/// Result of consuming one symbol.
enum Step {
    /// Accepting state reached and the run must stop.
    Accept(State),
    Continue(State),
}

/// A deterministic finite automaton over symbols of type `T`.
///
/// Immutable once built. Runs keep their current state locally, so one
/// automaton can serve any number of runs, including concurrent ones.
#[derive(Debug, Clone)]
pub struct Automaton<T> {
    start: State,
    transition: TransitionTable<T>,
    final_states: StateSet,
    options: Options,
}

impl<T> Default for Automaton<T> {
    fn default() -> Self {
        Self {
            start: State::default(),
            transition: TransitionTable::default(),
            final_states: StateSet::default(),
            options: Options::default(),
        }
    }
}

impl<T: Eq + Hash> Automaton<T> {
    /// Create an automaton starting at `start` with the given transition
    /// function, accepting states and options.
    pub fn new(
        start: State,
        transition: TransitionTable<T>,
        final_states: StateSet,
        options: impl IntoIterator<Item = AutomatonOption>,
    ) -> Self {
        Self::with_options(start, transition, final_states, options.into_iter().collect())
    }

    /// Create an automaton from an already assembled [`Options`] record.
    pub fn with_options(
        start: State,
        transition: TransitionTable<T>,
        final_states: StateSet,
        options: Options,
    ) -> Self {
        Self {
            start,
            transition,
            final_states,
            options,
        }
    }

    /// The state every run starts from.
    pub fn initial_state(&self) -> State {
        self.start
    }

    /// Look up the transition from `state` on `input`.
    ///
    /// This is the raw table lookup; the fallback state is a run policy and is
    /// not applied here.
    pub fn next<Q>(&self, state: State, input: &Q) -> Option<State>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.transition.next(state, input)
    }

    /// Returns `true` if `state` is accepting.
    pub fn is_final(&self, state: State) -> bool {
        self.final_states.contains(state)
    }

    pub fn fallback(&self) -> Option<State> {
        self.options.fallback
    }

    pub fn is_loop(&self) -> bool {
        self.options.looping
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn transitions(&self) -> &TransitionTable<T> {
        &self.transition
    }

    pub fn final_states(&self) -> &StateSet {
        &self.final_states
    }
}

impl<T: Eq + Hash + fmt::Debug> Automaton<T> {
    /// Run the automaton over symbols received from `input`.
    ///
    /// Each received symbol is stepped through the table (falling back to the
    /// fallback state on a miss, if one is configured) and reported to
    /// `on_step` as `(current, symbol, next)` before acceptance is checked.
    ///
    /// Returns:
    /// - `Ok(true)` when an accepting state is reached outside loop mode; the
    ///   rest of the input is left unread.
    /// - `Ok(false)` when every sender is dropped and the channel is drained,
    ///   or when `cancel` fires. Cancellation wins over a symbol that arrives
    ///   at the same time; that symbol is dropped unobserved.
    /// - `Err(RunError::UndefinedTransition)` on a miss with no fallback.
    ///
    /// Blocks only while waiting for the next symbol.
    pub fn run<F>(
        &self,
        cancel: &CancelToken,
        input: &Receiver<T>,
        mut on_step: F,
    ) -> Result<bool, RunError<T>>
    where
        F: FnMut(State, &T, State),
    {
        let timer = cancel.timer();
        let mut current = self.start;
        let mut steps: u64 = 0;
        debug!("run started at state {current}");

        loop {
            if cancel.is_cancelled() {
                debug!("run cancelled at state {current} after {steps} steps");
                return Ok(false);
            }

            let symbol = crossbeam_channel::select! {
                recv(input) -> msg => match msg {
                    Ok(symbol) => symbol,
                    Err(_) => {
                        debug!("input closed at state {current} after {steps} steps");
                        return Ok(false);
                    }
                },
                recv(cancel.done()) -> _ => {
                    debug!("run cancelled at state {current} after {steps} steps");
                    return Ok(false);
                },
                recv(timer) -> _ => {
                    debug!("run deadline passed at state {current} after {steps} steps");
                    return Ok(false);
                },
            };

            if cancel.is_cancelled() {
                debug!("run cancelled at state {current} after {steps} steps, dropping {symbol:?}");
                return Ok(false);
            }

            steps += 1;
            match self.step(current, symbol, &mut on_step)? {
                Step::Accept(next) => {
                    debug!("accepted at state {next} after {steps} steps");
                    return Ok(true);
                }
                Step::Continue(next) => current = next,
            }
        }
    }

    /// Run the automaton over a finite sequence of symbols.
    ///
    /// Same step policy as [`run`](Self::run), without cancellation; the end
    /// of the iterator is the end of input.
    pub fn run_iter<I, F>(&self, input: I, mut on_step: F) -> Result<bool, RunError<T>>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(State, &T, State),
    {
        let mut current = self.start;
        for symbol in input {
            match self.step(current, symbol, &mut on_step)? {
                Step::Accept(_) => return Ok(true),
                Step::Continue(next) => current = next,
            }
        }
        Ok(false)
    }

    fn step<F>(&self, current: State, symbol: T, on_step: &mut F) -> Result<Step, RunError<T>>
    where
        F: FnMut(State, &T, State),
    {
        let next = match self.transition.next(current, &symbol) {
            Some(next) => next,
            None => match self.options.fallback {
                Some(fallback) => {
                    trace!("no transition for ({current}, {symbol:?}), falling back to {fallback}");
                    fallback
                }
                None => {
                    debug!("undefined transition, state: {current}, input: {symbol:?}");
                    return Err(RunError::UndefinedTransition {
                        state: current,
                        input: symbol,
                    });
                }
            },
        };

        trace!("{current} --{symbol:?}--> {next}");
        on_step(current, &symbol, next);

        if self.is_final(next) {
            if !self.options.looping {
                return Ok(Step::Accept(next));
            }
            trace!("accepting state {next} reached in loop mode");
        }
        Ok(Step::Continue(next))
    }
}
