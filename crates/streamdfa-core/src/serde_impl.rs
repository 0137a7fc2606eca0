// Serde support for shipping transition tables as configuration data.
//
// A state is its number, a state set is a sorted list of numbers, and a table
// is a list of `{state, input, next}` entries.

use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::state::{State, StateSet};
use crate::transition::TransitionTable;

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(State)
    }
}

impl Serialize for StateSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}

impl<'de> Deserialize<'de> for StateSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<State>::deserialize(deserializer).map(StateSet::from_iter)
    }
}

#[derive(Serialize)]
struct EntryRef<'a, T> {
    state: State,
    input: &'a T,
    next: State,
}

#[derive(Deserialize)]
struct Entry<T> {
    state: State,
    input: T,
    next: State,
}

impl<T: Eq + Hash + Serialize> Serialize for TransitionTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(key, next)| EntryRef {
            state: key.state,
            input: &key.input,
            next,
        }))
    }
}

impl<'de, T: Eq + Hash + Deserialize<'de>> Deserialize<'de> for TransitionTable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Entry<T>>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| ((e.state, e.input), e.next))
            .collect())
    }
}
