//! Implementation of the customer

use std::sync::Arc;
use std::time::Duration;

use ticket_market_core::{Event, EventSink, Role};

use crate::cancel::{CancelToken, Cancelled};
use crate::emit;
use crate::pool::TicketPool;

/// A customer buying tickets from the pool
pub struct Customer {
    /// Display name, e.g. `Customer-1`
    name: String,
    pool: Arc<TicketPool>,
    /// Number of tickets to buy
    quota: u32,
    /// Pause after every purchase
    delay: Duration,
    events: Arc<dyn EventSink>,
    cancel: CancelToken,
}

impl Customer {
    /// Create a new [`Customer`]
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

    /// main customer loop
    pub fn run(self) {
        if self.buy_tickets().is_err() {
            self.emit(Event::Interrupted {
                worker: self.name.clone(),
                role: Role::Customer,
            });
        }
        self.emit(Event::Finished {
            worker: self.name.clone(),
            role: Role::Customer,
        });
    }

    /// Buy `quota` tickets, blocking while the pool is empty
    fn buy_tickets(&self) -> Result<(), Cancelled> {
        for _ in 0..self.quota {
            if self.pool.is_empty() {
                self.emit(Event::Waiting {
                    worker: self.name.clone(),
                });
            }

            let (ticket, remaining) = self.pool.take(&self.cancel)?;
            self.emit(Event::Purchased {
                worker: self.name.clone(),
                ticket,
                remaining,
            });

            self.cancel.sleep(self.delay)?;
        }
        Ok(())
    }

    fn emit(&self, event: Event) {
        emit(&*self.events, event);
    }
}
