// Cooperative cancellation for automaton runs.
//
// A token is a receiver that never gets a message. Cancelling drops the only
// sender, which disconnects every clone of the receiver at once; a blocked
// `select!` observes the disconnect immediately.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

struct Trigger {
    sender: Mutex<Option<Sender<()>>>,
}

/// Cancellation signal observed by [`Automaton::run`](crate::Automaton::run).
///
/// A token fires when its [`Canceller`] is used or when its deadline passes,
/// whichever comes first. Cloned tokens share the same signal.
#[derive(Clone)]
pub struct CancelToken {
    // Keeps the sender alive for as long as any token exists, so dropping
    // every `Canceller` does not fire the token.
    _trigger: Option<Arc<Trigger>>,
    done: Receiver<()>,
    deadline: Option<Instant>,
}

/// Handle that fires a [`CancelToken`].
#[derive(Clone)]
pub struct Canceller {
    trigger: Arc<Trigger>,
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        Self {
            _trigger: None,
            done: crossbeam_channel::never(),
            deadline: None,
        }
    }

    /// A token paired with the handle that fires it.
    pub fn new() -> (Self, Canceller) {
        let (sender, done) = crossbeam_channel::bounded(0);
        let trigger = Arc::new(Trigger {
            sender: Mutex::new(Some(sender)),
        });
        let token = Self {
            _trigger: Some(Arc::clone(&trigger)),
            done,
            deadline: None,
        };
        (token, Canceller { trigger })
    }

    /// Also fire at `deadline`. The earliest of several deadlines wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Also fire once `timeout` has elapsed from now.
    ///
    /// A timeout too large to represent is treated as no timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once the token has fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Receiver that disconnects when the canceller fires.
    pub(crate) fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Receiver that yields once the deadline passes.
    pub(crate) fn timer(&self) -> Receiver<Instant> {
        match self.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Canceller {
    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        let sender = self
            .trigger
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            log::debug!("cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.trigger
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
