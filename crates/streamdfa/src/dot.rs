// Graphviz export of an automaton.
//
// Lines are emitted in a canonical order so the output does not depend on
// the iteration order of the underlying hash maps.

use std::fmt;
use std::hash::Hash;
use std::io;

use streamdfa_core::State;

use crate::automaton::Automaton;

/// Displays an automaton in Graphviz DOT format.
///
/// Created by [`Automaton::dot`].
pub struct Dot<'a, T> {
    automaton: &'a Automaton<T>,
}

impl<T: Eq + Hash> Automaton<T> {
    /// Adapter that renders this automaton as a DOT digraph.
    pub fn dot(&self) -> Dot<'_, T> {
        Dot { automaton: self }
    }
}

impl<T: Eq + Hash + fmt::Display> Automaton<T> {
    /// Render this automaton as a DOT digraph.
    pub fn to_dot(&self) -> String {
        self.dot().to_string()
    }

    /// Write this automaton as a DOT digraph to `w`.
    pub fn write_dot<W: io::Write>(&self, mut w: W) -> io::Result<()> {
        write!(w, "{}", self.dot())
    }
}

/// Escape a label for use inside a double-quoted DOT string.
fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl<T: Eq + Hash + fmt::Display> fmt::Display for Dot<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let automaton = self.automaton;

        // Sort by source, then destination. The label only orders parallel
        // edges between the same pair of states.
        let mut edges: Vec<(State, State, String)> = automaton
            .transitions()
            .iter()
            .map(|(key, next)| (key.state, next, escape_label(&key.input.to_string())))
            .collect();
        edges.sort_unstable();

        writeln!(f, "digraph finite_state_automaton {{")?;
        writeln!(f, "  rankdir = LR;")?;
        writeln!(f, "  fontname=\"sans-serif\";")?;
        writeln!(f, "  node [shape=circle, fontname=\"sans-serif\"];")?;
        writeln!(f, "  edge [fontname=\"sans-serif\"];")?;

        if !edges.is_empty() {
            writeln!(f, "  // transition")?;
            for (from, to, label) in &edges {
                writeln!(f, "  \"{from}\" -> \"{to}\" [label=\"{label}\"];")?;
            }
        }

        writeln!(f, "  // start")?;
        writeln!(f, "  start [shape=point];")?;
        writeln!(f, "  start -> \"{}\";", automaton.initial_state())?;

        let finals = automaton.final_states().sorted();
        if !finals.is_empty() {
            writeln!(f, "  // final states")?;
            for state in finals {
                writeln!(f, "  \"{state}\" [shape=ellipse, peripheries=2];")?;
            }
        }

        writeln!(f, "}}")
    }
}
