use std::fmt;

use parking_lot::Mutex;

use crate::Ticket;

/// Role of a worker in the simulation
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Role {
    /// Produces tickets into the pool
    Vendor,
    /// Consumes tickets from the pool
    Customer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Vendor => f.write_str("Vendor"),
            Role::Customer => f.write_str("Customer"),
        }
    }
}

/// Something that happened in the simulation
///
/// The [`Display`](fmt::Display) implementation renders the human-readable
/// log line handed to the logging collaborator.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Event {
    /// The supervisor accepted a configuration
    Configured {
        /// Number of vendors to launch
        vendors: u32,
        /// Number of customers to launch
        customers: u32,
    },
    /// All workers and the monitor were launched
    Started,
    /// All workers and the monitor were cancelled
    Stopped,

    /// The pool appended a ticket
    TicketAdded {
        /// The appended ticket
        ticket: Ticket,
    },
    /// The pool handed out a ticket
    TicketRemoved {
        /// The removed ticket
        ticket: Ticket,
    },

    /// A vendor released a ticket into the pool
    Released {
        /// Name of the vendor
        worker: String,
        /// The released ticket
        ticket: Ticket,
        /// Tickets in the pool after the release
        count: usize,
    },
    /// A vendor found the pool full and stopped releasing
    CapacityReached {
        /// Name of the vendor
        worker: String,
    },
    /// A customer found the pool empty and is about to block
    Waiting {
        /// Name of the customer
        worker: String,
    },
    /// A customer bought a ticket
    Purchased {
        /// Name of the customer
        worker: String,
        /// The purchased ticket
        ticket: Ticket,
        /// Tickets left in the pool
        remaining: usize,
    },
    /// A worker observed cancellation
    Interrupted {
        /// Name of the worker
        worker: String,
        /// Role of the worker
        role: Role,
    },
    /// A worker terminated
    Finished {
        /// Name of the worker
        worker: String,
        /// Role of the worker
        role: Role,
    },

    /// Periodic occupancy sample
    LiveCount {
        /// Tickets in the pool when sampled
        count: usize,
    },
}

impl Event {
    /// Name of the worker that emitted this event, if any
    pub fn worker(&self) -> Option<&str> {
        match self {
            Event::Released { worker, .. }
            | Event::CapacityReached { worker }
            | Event::Waiting { worker }
            | Event::Purchased { worker, .. }
            | Event::Interrupted { worker, .. }
            | Event::Finished { worker, .. } => Some(worker),
            _ => None,
        }
    }

    /// Forward this event to `tracing`
    ///
    /// Pool-level and monitor events are logged at `debug`, everything else at
    /// `info`.
    pub fn trace(&self) {
        match self {
            Event::TicketAdded { ticket } => tracing::debug!(%ticket, "ticket added"),
            Event::TicketRemoved { ticket } => tracing::debug!(%ticket, "ticket removed"),
            Event::LiveCount { count } => tracing::debug!(count, "live ticket count"),
            Event::Released { worker, ticket, count } => {
                tracing::info!(worker = worker.as_str(), %ticket, count, "ticket released")
            }
            Event::Purchased {
                worker,
                ticket,
                remaining,
            } => tracing::info!(worker = worker.as_str(), %ticket, remaining, "ticket purchased"),
            event => match event.worker() {
                Some(worker) => tracing::info!(worker, "{event}"),
                None => tracing::info!("{event}"),
            },
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Configured { vendors, customers } => write!(
                f,
                "System configured with {vendors} vendors and {customers} customers."
            ),
            Event::Started => f.write_str("All threads started."),
            Event::Stopped => f.write_str("All threads stopped."),
            Event::TicketAdded { ticket } => write!(f, "Added ticket: {ticket}"),
            Event::TicketRemoved { ticket } => write!(f, "Removed ticket: {ticket}"),
            Event::Released {
                worker,
                ticket,
                count,
            } => write!(f, "{worker}: Added {ticket}. Current ticket count: {count}"),
            Event::CapacityReached { worker } => write!(
                f,
                "{worker}: Max ticket capacity reached. Pausing ticket release."
            ),
            Event::Waiting { worker } => write!(f, "{worker}: No tickets available. Waiting..."),
            Event::Purchased {
                worker,
                ticket,
                remaining,
            } => write!(
                f,
                "{worker}: Purchased {ticket}. Current ticket count: {remaining}"
            ),
            Event::Interrupted { worker, role } => write!(f, "{worker}: {role} interrupted"),
            Event::Finished {
                worker,
                role: Role::Vendor,
            } => write!(f, "{worker}: Finished releasing tickets."),
            Event::Finished {
                worker,
                role: Role::Customer,
            } => write!(f, "{worker}: Finished purchasing tickets."),
            Event::LiveCount { count } => write!(f, "Live ticket count: {count}"),
        }
    }
}

/// Receiver of simulation events
///
/// This method may be called concurrently from different threads, and from
/// inside the pool's critical section. Implementations must not call back into
/// the pool.
pub trait EventSink: Send + Sync {
    /// Record one event
    fn emit(&self, event: Event);
}

/// In-memory event log
///
/// Keeps every event in order of arrival until [`EventLog::clear()`].
#[derive(Default, Debug)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    /// Create an empty [`EventLog`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all log lines
    pub fn entries(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    /// Snapshot of all events
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_lines() {
        let log = EventLog::new();
        log.emit(Event::Configured {
            vendors: 1,
            customers: 2,
        });
        log.emit(Event::Finished {
            worker: "Customer-2".into(),
            role: Role::Customer,
        });
        log.emit(Event::Interrupted {
            worker: "Vendor-1".into(),
            role: Role::Vendor,
        });

        assert_eq!(
            log.entries(),
            [
                "System configured with 1 vendors and 2 customers.",
                "Customer-2: Finished purchasing tickets.",
                "Vendor-1: Vendor interrupted",
            ]
        );

        log.clear();
        assert!(log.is_empty());
    }
}
