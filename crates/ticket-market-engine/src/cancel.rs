//! Cooperative cancellation of workers
//!
//! Every worker owns a [`CancelToken`]; the supervisor keeps the matching
//! [`CancelHandle`]. No message is ever sent over the underlying channel:
//! cancelling drops the sender, which disconnects the receiver and makes every
//! pending or future wait on the token return immediately.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use thiserror::Error;

/// The worker was asked to stop
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
#[error("cancelled")]
pub struct Cancelled;

/// Supervisor side of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle {
    _signal: Sender<()>,
}

impl CancelHandle {
    /// Signal cancellation to the matching token
    pub fn cancel(self) {
        drop(self);
    }
}

/// Worker side of a cancellation pair
#[derive(Clone, Debug)]
pub struct CancelToken {
    signal: Receiver<()>,
}

/// Create a connected handle and token
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = channel::bounded(0);
    (
        CancelHandle { _signal: sender },
        CancelToken { signal: receiver },
    )
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        Self {
            signal: channel::never(),
        }
    }

    /// Whether the handle was cancelled (or dropped)
    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for `duration` unless cancelled in the meantime
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        match self.signal.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => Ok(()),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Err(Cancelled),
        }
    }

    /// Block until cancelled
    pub fn wait(&self) {
        // nothing is ever sent, so this only returns on disconnect
        let _ = self.signal.recv();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn sleep_runs_to_completion() {
        let (_handle, token) = cancellation();
        let started = Instant::now();
        assert_eq!(token.sleep(Duration::from_millis(20)), Ok(()));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_interrupts_sleep() {
        let (handle, token) = cancellation();
        let sleeper = thread::spawn(move || {
            let started = Instant::now();
            let res = token.sleep(Duration::from_secs(30));
            (res, started.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        handle.cancel();

        let (res, elapsed) = sleeper.join().unwrap();
        assert_eq!(res, Err(Cancelled));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn wait_returns_on_cancel() {
        let (handle, token) = cancellation();
        let waiter = thread::spawn(move || token.wait());
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        handle.cancel();
        waiter.join().unwrap();
    }

    #[test]
    fn never_is_never_cancelled() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
        assert_eq!(token.sleep(Duration::ZERO), Ok(()));
    }
}
