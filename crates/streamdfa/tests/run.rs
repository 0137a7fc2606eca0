//! End-to-end runs over channels fed by producer threads.
//!
//! Run with engine logs: RUST_LOG=streamdfa=trace cargo test -p streamdfa --test run

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, bounded, unbounded};
use pretty_assertions::assert_eq;
use streamdfa::{
    Automaton, AutomatonOption, CancelToken, RunError, State, StateSet, TransitionTable,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Step = (u32, &'static str, u32);

/// 0 -A-> 1 -B-> 2 -B-> 3 -B-> 4 (final)
fn abbb(options: impl IntoIterator<Item = AutomatonOption>) -> Automaton<&'static str> {
    let table = TransitionTable::from([
        ((State(0), "A"), State(1)),
        ((State(1), "B"), State(2)),
        ((State(2), "B"), State(3)),
        ((State(3), "B"), State(4)),
    ]);
    Automaton::new(State(0), table, StateSet::from([State(4)]), options)
}

/// A closed channel pre-filled with `symbols`.
fn closed_channel(symbols: &[&'static str]) -> Receiver<&'static str> {
    let (tx, rx) = unbounded();
    for &symbol in symbols {
        tx.send(symbol).unwrap();
    }
    rx
}

fn run_traced(
    automaton: &Automaton<&'static str>,
    cancel: &CancelToken,
    rx: &Receiver<&'static str>,
) -> (Result<bool, RunError<&'static str>>, Vec<Step>) {
    let mut trace = Vec::new();
    let result = automaton.run(cancel, rx, |p, u, q| trace.push((p.id(), *u, q.id())));
    (result, trace)
}

// ---------------------------------------------------------------------------
// Acceptance and failure
// ---------------------------------------------------------------------------

#[test_log::test]
fn pattern_with_fallback_accepts() {
    let a = abbb([AutomatonOption::Fallback(State(1))]);
    let rx = closed_channel(&["A", "B", "B", "B"]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);

    assert_eq!(result, Ok(true));
    assert_eq!(trace.len(), 4);
    assert_eq!(trace.last(), Some(&(3, "B", 4)));
    assert!(a.is_final(State(trace[3].2)));
}

#[test_log::test]
fn unknown_symbol_without_fallback_fails() {
    let a = abbb([]);
    let rx = closed_channel(&["A", "X"]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);

    let err = result.unwrap_err();
    assert_eq!(
        err,
        RunError::UndefinedTransition {
            state: State(1),
            input: "X"
        }
    );
    assert_eq!(err.to_string(), "undefined transition, state: 1, input: X");
    assert_eq!(trace, vec![(0, "A", 1)]);
}

#[test_log::test]
fn fallback_replaces_missing_transition() {
    let a = abbb([AutomatonOption::Fallback(State(1))]);
    let rx = closed_channel(&["B", "X", "B", "B", "B"]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);

    assert_eq!(result, Ok(true));
    assert_eq!(
        trace,
        vec![(0, "B", 1), (1, "X", 1), (1, "B", 2), (2, "B", 3), (3, "B", 4)]
    );
}

#[test_log::test]
fn closed_input_before_acceptance_is_false() {
    let a = abbb([]);
    let rx = closed_channel(&["A", "B", "B"]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);
    assert_eq!(result, Ok(false));
    assert_eq!(trace.len(), 3);

    let rx = closed_channel(&[]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);
    assert_eq!(result, Ok(false));
    assert!(trace.is_empty());
}

#[test_log::test]
fn acceptance_stops_consuming_input() {
    let a = abbb([]);
    let rx = closed_channel(&["A", "B", "B", "B", "A", "B"]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);

    assert_eq!(result, Ok(true));
    assert_eq!(trace.len(), 4);
    assert_eq!(rx.len(), 2);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["A", "B"]);
}

#[test_log::test]
fn loop_mode_runs_until_input_closes() {
    let a = abbb([AutomatonOption::Fallback(State(1)), AutomatonOption::Loop]);
    // The second match starts from the fallback state after 4 --B--> 1.
    let rx = closed_channel(&["A", "B", "B", "B", "B", "B", "B", "B", "A"]);
    let mut hits = Vec::new();
    let result = a.run(&CancelToken::never(), &rx, |_, _, q| {
        if a.is_final(q) {
            hits.push(q);
        }
    });

    assert_eq!(result, Ok(false));
    assert_eq!(hits, vec![State(4), State(4)]);
    assert!(rx.is_empty());
}

#[test_log::test]
fn loop_mode_without_fallback_fails_past_acceptance() {
    let a = abbb([AutomatonOption::Loop]);
    let rx = closed_channel(&["A", "B", "B", "B", "B"]);
    let (result, trace) = run_traced(&a, &CancelToken::never(), &rx);

    assert_eq!(
        result,
        Err(RunError::UndefinedTransition {
            state: State(4),
            input: "B"
        })
    );
    assert_eq!(trace.len(), 4);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test_log::test]
fn cancelled_before_start_observes_nothing() {
    let a = abbb([]);
    let (token, canceller) = CancelToken::new();
    canceller.cancel();

    // Symbols are ready too; cancellation takes precedence.
    let rx = closed_channel(&["A", "B", "B", "B"]);
    let (result, trace) = run_traced(&a, &token, &rx);

    assert_eq!(result, Ok(false));
    assert!(trace.is_empty());
    assert_eq!(rx.len(), 4);
}

#[test_log::test]
fn cancel_from_callback_stops_next_wait() {
    let a = abbb([]);
    let (token, canceller) = CancelToken::new();
    let rx = closed_channel(&["A", "B", "B", "B"]);

    let mut trace = Vec::new();
    let result = a.run(&token, &rx, |p, u, q| {
        trace.push((p.id(), *u, q.id()));
        if trace.len() == 2 {
            canceller.cancel();
        }
    });

    assert_eq!(result, Ok(false));
    assert_eq!(trace, vec![(0, "A", 1), (1, "B", 2)]);
    assert_eq!(rx.len(), 2);
}

#[test_log::test]
fn cancel_unblocks_waiting_run() {
    let a = abbb([]);
    let (token, canceller) = CancelToken::new();
    // Keep the sender alive so the run blocks on an open, empty channel.
    let (_tx, rx) = unbounded::<&'static str>();

    let started = Instant::now();
    let result = thread::scope(|s| {
        s.spawn(|| {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });
        a.run(&token, &rx, |_, _, _| {})
    });

    assert_eq!(result, Ok(false));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test_log::test]
fn deadline_unblocks_waiting_run() {
    let a = abbb([]);
    let token = CancelToken::never().with_timeout(Duration::from_millis(200));
    let (tx, rx) = unbounded();
    tx.send("A").unwrap();

    let mut trace = Vec::new();
    let result = a.run(&token, &rx, |p, u, q| trace.push((p.id(), *u, q.id())));

    // A slow machine may hit the deadline before "A" is stepped.
    assert_eq!(result, Ok(false));
    assert!(trace.len() <= 1);
    assert!(trace.iter().all(|&step| step == (0, "A", 1)));
    drop(tx);
}

// ---------------------------------------------------------------------------
// Concurrency and determinism
// ---------------------------------------------------------------------------

#[test_log::test]
fn bounded_producer_feeds_run() {
    let a = abbb([AutomatonOption::Fallback(State(1))]);
    let (tx, rx) = bounded(1);

    let (result, steps) = thread::scope(|s| {
        s.spawn(move || {
            let noise = std::iter::repeat_n("Z", 1000);
            for symbol in noise.chain(["A", "B", "B", "B", "A"]) {
                if tx.send(symbol).is_err() {
                    break;
                }
            }
        });
        let mut steps = 0;
        let result = a.run(&CancelToken::never(), &rx, |_, _, _| steps += 1);
        drop(rx);
        (result, steps)
    });

    assert_eq!(result, Ok(true));
    assert_eq!(steps, 1004);
}

#[test_log::test]
fn independent_runs_share_one_automaton() {
    let a = abbb([AutomatonOption::Fallback(State(0))]);
    let token = CancelToken::never();

    let (first, second) = thread::scope(|s| {
        let spawn_run = |symbols: Vec<&'static str>| {
            let (tx, rx) = bounded(1);
            s.spawn(move || {
                for symbol in symbols {
                    let _ = tx.send(symbol);
                }
            });
            let a = &a;
            let token = &token;
            s.spawn(move || a.run(token, &rx, |_, _, _| {}))
        };
        let first = spawn_run(vec!["B", "A", "B", "B", "B"]);
        let second = spawn_run(vec!["A", "B", "A", "B", "B"]);
        (first.join().unwrap(), second.join().unwrap())
    });

    assert_eq!(first, Ok(true));
    assert_eq!(second, Ok(false));
}

#[test_log::test]
fn runs_are_deterministic() {
    let a = abbb([AutomatonOption::Fallback(State(1)), AutomatonOption::Loop]);
    let input = ["B", "A", "B", "B", "B", "B", "X", "B", "B", "B"];

    let (first, first_trace) = run_traced(&a, &CancelToken::never(), &closed_channel(&input));
    for _ in 0..5 {
        let (result, trace) = run_traced(&a, &CancelToken::never(), &closed_channel(&input));
        assert_eq!(result, first);
        assert_eq!(trace, first_trace);
    }

    let mut iter_trace = Vec::new();
    let iter_result = a.run_iter(input, |p, u, q| iter_trace.push((p.id(), *u, q.id())));
    assert_eq!(iter_result, first);
    assert_eq!(iter_trace, first_trace);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bracket {
    Open,
    Close,
}

#[test_log::test]
fn symbols_without_display() {
    let table = TransitionTable::from([
        ((State(0), Bracket::Open), State(1)),
        ((State(1), Bracket::Close), State(2)),
    ]);
    let a = Automaton::new(State(0), table, StateSet::from([State(2)]), []);

    let (tx, rx) = unbounded();
    tx.send(Bracket::Open).unwrap();
    tx.send(Bracket::Close).unwrap();
    let mut seen = Vec::new();
    assert_eq!(a.run(&CancelToken::never(), &rx, |_, u, _| seen.push(*u)), Ok(true));
    assert_eq!(seen, vec![Bracket::Open, Bracket::Close]);

    tx.send(Bracket::Close).unwrap();
    drop(tx);
    assert_eq!(
        a.run(&CancelToken::never(), &rx, |_, _, _| {}),
        Err(RunError::UndefinedTransition {
            state: State(0),
            input: Bracket::Close
        })
    );
    assert_eq!(a.run_iter([Bracket::Open, Bracket::Close], |_, _, _| {}), Ok(true));
}

#[test_log::test]
fn owned_string_symbols() {
    let table: TransitionTable<String> = [
        ((State(0), "knock".to_string()), State(1)),
        ((State(1), "knock".to_string()), State(2)),
    ]
    .into_iter()
    .collect();
    let a = Automaton::new(State(0), table, StateSet::from([State(2)]), []);
    assert_eq!(a.next(State(0), "knock"), Some(State(1)));

    let (tx, rx) = unbounded();
    tx.send("knock".to_string()).unwrap();
    tx.send("ring".to_string()).unwrap();
    drop(tx);

    let err = a.run(&CancelToken::never(), &rx, |_, _, _| {}).unwrap_err();
    assert_eq!(err.to_string(), "undefined transition, state: 1, input: ring");
}
