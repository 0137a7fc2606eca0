// Transition table: a partial, deterministic map from (state, input) to state.

use std::hash::{Hash, Hasher};

use hashbrown::{Equivalent, HashMap};

use crate::state::State;

/// Lookup key of the transition function.
///
/// Two keys are equal iff both the state and the input are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey<T> {
    pub state: State,
    pub input: T,
}

impl<T> TransitionKey<T> {
    pub fn new(state: State, input: T) -> Self {
        Self { state, input }
    }
}

/// Borrowed form of [`TransitionKey`] used for lookups.
///
/// Hashes exactly like the owned key (state first, then input), so a lookup
/// with `&str` finds a `String` key without allocating.
struct KeyRef<'a, Q: ?Sized> {
    state: State,
    input: &'a Q,
}

impl<Q: ?Sized + Hash> Hash for KeyRef<'_, Q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
        self.input.hash(state);
    }
}

impl<Q, T> Equivalent<TransitionKey<T>> for KeyRef<'_, Q>
where
    Q: ?Sized + Equivalent<T>,
{
    fn equivalent(&self, key: &TransitionKey<T>) -> bool {
        self.state == key.state && self.input.equivalent(&key.input)
    }
}

/// The transition function of an automaton.
///
/// The table is partial: pairs without an entry are "undefined" and are
/// resolved by the run policy of the automaton, not here. It is deterministic
/// by construction: inserting an existing key replaces its destination.
#[derive(Debug, Clone)]
pub struct TransitionTable<T> {
    map: HashMap<TransitionKey<T>, State>,
}

impl<T> Default for TransitionTable<T> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash> TransitionTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with room for `capacity` transitions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Add the transition `state --input--> next`.
    ///
    /// Returns the destination previously stored for the same key, if any.
    pub fn insert(&mut self, state: State, input: T, next: State) -> Option<State> {
        self.map.insert(TransitionKey::new(state, input), next)
    }

    /// Look up the destination for `(state, input)`.
    ///
    /// Keys match exactly; there is no wildcarding.
    #[inline]
    pub fn next<Q>(&self, state: State, input: &Q) -> Option<State>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.map.get(&KeyRef { state, input }).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all transitions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&TransitionKey<T>, State)> + '_ {
        self.map.iter().map(|(key, next)| (key, *next))
    }
}

impl<T: Eq + Hash> PartialEq for TransitionTable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq + Hash> Eq for TransitionTable<T> {}

impl<T: Eq + Hash> FromIterator<((State, T), State)> for TransitionTable<T> {
    fn from_iter<I: IntoIterator<Item = ((State, T), State)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut table = Self::with_capacity(iter.size_hint().0);
        table.extend(iter);
        table
    }
}

impl<T: Eq + Hash> Extend<((State, T), State)> for TransitionTable<T> {
    fn extend<I: IntoIterator<Item = ((State, T), State)>>(&mut self, iter: I) {
        for ((state, input), next) in iter {
            self.insert(state, input, next);
        }
    }
}

impl<T: Eq + Hash, const N: usize> From<[((State, T), State); N]> for TransitionTable<T> {
    fn from(entries: [((State, T), State); N]) -> Self {
        entries.into_iter().collect()
    }
}
