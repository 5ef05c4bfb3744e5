//! Implementation of the occupancy monitor

use std::sync::Arc;
use std::time::Duration;

use ticket_market_core::{Event, EventSink};

use crate::cancel::CancelToken;
use crate::emit;
use crate::pool::TicketPool;

/// Monitor that periodically reports how many tickets are in the pool
pub struct Monitor {
    pool: Arc<TicketPool>,
    interval: Duration,
    events: Arc<dyn EventSink>,
    cancel: CancelToken,
}

impl Monitor {
    pub fn new(
        pool: Arc<TicketPool>,
        interval: Duration,
        events: Arc<dyn EventSink>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            pool,
            interval,
            events,
            cancel,
        }
    }

    /// The monitor's main routine.
    ///
    /// Samples the pool every `interval` until cancelled. Workers finishing
    /// their quotas do not stop the monitor. A zero interval disables
    /// sampling.
    pub fn run(self) {
        if self.interval.is_zero() {
            tracing::warn!("monitor interval is zero, occupancy sampling disabled");
            self.cancel.wait();
            return;
        }
        while self.cancel.sleep(self.interval).is_ok() {
            let count = self.pool.len();
            emit(&*self.events, Event::LiveCount { count });
        }
    }
}
