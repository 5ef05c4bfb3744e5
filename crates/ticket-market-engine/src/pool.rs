//! Implementation of the shared ticket pool

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use ticket_market_core::{Event, EventSink, Ticket};

use crate::cancel::{CancelToken, Cancelled};
use crate::emit;

/// The pool is at capacity; the ticket is handed back
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("ticket pool is full, rejected {0}")]
pub struct Rejected(pub Ticket);

/// Bounded FIFO pool of tickets shared by all vendors and customers
///
/// `put`, `take` and `len` are serialized by one lock, so the number of
/// tickets is always between 0 and the capacity.
pub struct TicketPool {
    /// Tickets in insertion order
    tickets: Mutex<VecDeque<Ticket>>,
    /// Signalled whenever a ticket is added or waiters must re-check their
    /// cancellation token
    available: Condvar,
    capacity: usize,
    events: Arc<dyn EventSink>,
}

impl TicketPool {
    /// Create an empty [`TicketPool`] holding at most `capacity` tickets
    pub fn new(capacity: usize, events: Arc<dyn EventSink>) -> Self {
        Self {
            tickets: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
            events,
        }
    }

    /// Append `ticket` unless the pool is full.
    ///
    /// Never blocks. Returns the number of tickets after insertion.
    pub fn put(&self, ticket: Ticket) -> Result<usize, Rejected> {
        let mut tickets = self.tickets.lock();
        if tickets.len() >= self.capacity {
            return Err(Rejected(ticket));
        }

        emit(
            &*self.events,
            Event::TicketAdded {
                ticket: ticket.clone(),
            },
        );
        tickets.push_back(ticket);
        let len = tickets.len();
        drop(tickets);

        self.available.notify_all();
        Ok(len)
    }

    /// Remove the oldest ticket, waiting while the pool is empty.
    ///
    /// Returns the ticket and the number of tickets left behind. Returns
    /// [`Cancelled`] as soon as `cancel` fires and the pool is woken through
    /// [`Self::wake_waiters()`].
    pub fn take(&self, cancel: &CancelToken) -> Result<(Ticket, usize), Cancelled> {
        let mut tickets = self.tickets.lock();
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            if let Some(ticket) = tickets.pop_front() {
                emit(
                    &*self.events,
                    Event::TicketRemoved {
                        ticket: ticket.clone(),
                    },
                );
                return Ok((ticket, tickets.len()));
            }
            // another customer may win the race for the ticket we were woken
            // for, so loop and check again
            self.available.wait(&mut tickets);
        }
    }

    /// Wake every blocked `take` so it re-checks its cancellation token.
    pub fn wake_waiters(&self) {
        // taking the lock orders this wake-up after any waiter's token check
        let _tickets = self.tickets.lock();
        self.available.notify_all();
    }

    /// Get the number of tickets in the pool.
    pub fn len(&self) -> usize {
        self.tickets.lock().len()
    }

    /// Whether the pool holds no tickets.
    pub fn is_empty(&self) -> bool {
        self.tickets.lock().is_empty()
    }

    /// Get the maximum number of tickets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use ticket_market_core::EventLog;

    use super::*;
    use crate::cancel::cancellation;

    fn pool(capacity: usize) -> (Arc<TicketPool>, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        (Arc::new(TicketPool::new(capacity, log.clone())), log)
    }

    #[test]
    fn put_rejects_when_full() {
        let (pool, _) = pool(2);
        assert_eq!(pool.put(Ticket::new("a")), Ok(1));
        assert_eq!(pool.put(Ticket::new("b")), Ok(2));
        assert_eq!(
            pool.put(Ticket::new("c")),
            Err(Rejected(Ticket::new("c")))
        );
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn take_is_fifo() {
        let (pool, log) = pool(3);
        for id in ["a", "b", "c"] {
            pool.put(Ticket::new(id)).unwrap();
        }
        let token = CancelToken::never();
        assert_eq!(pool.take(&token), Ok((Ticket::new("a"), 2)));
        assert_eq!(pool.take(&token), Ok((Ticket::new("b"), 1)));
        assert_eq!(pool.take(&token), Ok((Ticket::new("c"), 0)));
        assert!(pool.is_empty());

        assert_eq!(
            log.entries(),
            [
                "Added ticket: a",
                "Added ticket: b",
                "Added ticket: c",
                "Removed ticket: a",
                "Removed ticket: b",
                "Removed ticket: c",
            ]
        );
    }

    #[test]
    fn blocked_take_returns_on_cancel() {
        let (pool, _) = pool(1);
        let (handle, token) = cancellation();
        let taker = {
            let pool = pool.clone();
            thread::spawn(move || pool.take(&token))
        };

        thread::sleep(Duration::from_millis(50));
        handle.cancel();
        pool.wake_waiters();

        assert_eq!(taker.join().unwrap(), Err(Cancelled));
        assert_eq!(pool.len(), 0);
    }
}
