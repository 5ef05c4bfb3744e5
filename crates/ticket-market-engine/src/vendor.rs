//! Implementation of the vendor

use std::sync::Arc;
use std::time::Duration;

use ticket_market_core::{Event, EventSink, Role, Ticket};

use crate::cancel::CancelToken;
use crate::emit;
use crate::pool::{Rejected, TicketPool};

/// A vendor releasing tickets into the pool
pub struct Vendor {
    /// Display name, e.g. `Vendor-1`
    name: String,
    pool: Arc<TicketPool>,
    /// Number of tickets to release
    quota: u32,
    /// Pause between two releases
    delay: Duration,
    events: Arc<dyn EventSink>,
    cancel: CancelToken,
}

impl Vendor {
    /// Create a new [`Vendor`]
    pub fn new(
        name: String,
        pool: Arc<TicketPool>,
        quota: u32,
        delay: Duration,
        events: Arc<dyn EventSink>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            name,
            pool,
            quota,
            delay,
            events,
            cancel,
        }
    }

    /// main vendor loop
    pub fn run(self) {
        self.release_tickets();
        self.emit(Event::Finished {
            worker: self.name.clone(),
            role: Role::Vendor,
        });
    }

    /// Release up to `quota` tickets. Stops for good at the first rejection.
    fn release_tickets(&self) {
        for released in 0..self.quota {
            if self.cancel.is_cancelled() {
                self.interrupted();
                return;
            }

            let ticket = Ticket::issue();
            match self.pool.put(ticket.clone()) {
                Ok(count) => self.emit(Event::Released {
                    worker: self.name.clone(),
                    ticket,
                    count,
                }),
                Err(Rejected(_)) => {
                    self.emit(Event::CapacityReached {
                        worker: self.name.clone(),
                    });
                    return;
                }
            }

            // no pause after the last ticket
            if released + 1 < self.quota && self.cancel.sleep(self.delay).is_err() {
                self.interrupted();
                return;
            }
        }
    }

    fn interrupted(&self) {
        self.emit(Event::Interrupted {
            worker: self.name.clone(),
            role: Role::Vendor,
        });
    }

    fn emit(&self, event: Event) {
        emit(&*self.events, event);
    }
}
