// State identifiers and state sets.

use std::fmt;

use hashbrown::HashSet;

/// An automaton state.
///
/// States carry no meaning beyond identity. The inner number doubles as the
/// label used in diagnostics and graph export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct State(pub u32);

impl State {
    /// Create a state from its numeric identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Numeric identifier of this state.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl From<u32> for State {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A set of states with constant-time membership tests.
///
/// Used for the accepting states of an automaton. Duplicates collapse on
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSet {
    states: HashSet<State>,
}

impl StateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `state` is a member of the set.
    #[inline]
    pub fn contains(&self, state: State) -> bool {
        self.states.contains(&state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over the members in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = State> + '_ {
        self.states.iter().copied()
    }

    /// Members in ascending order.
    pub fn sorted(&self) -> Vec<State> {
        let mut states: Vec<State> = self.iter().collect();
        states.sort_unstable();
        states
    }
}

impl FromIterator<State> for StateSet {
    fn from_iter<I: IntoIterator<Item = State>>(iter: I) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[State; N]> for StateSet {
    fn from(states: [State; N]) -> Self {
        states.into_iter().collect()
    }
}

impl Extend<State> for StateSet {
    fn extend<I: IntoIterator<Item = State>>(&mut self, iter: I) {
        self.states.extend(iter);
    }
}
