//! :rocket: The concurrent engine of the ticket market simulation.
//!
//! Vendors release tickets into a bounded [pool], customers buy them, and a
//! [monitor] samples the pool's occupancy. The [supervisor] owns all of them
//! and exposes the session lifecycle through
//! [`MarketControl`](ticket_market_core::MarketControl).
//!
//! Every component runs on its own OS thread and is stopped cooperatively
//! through a [cancellation token][cancel].

#![allow(rustdoc::private_intra_doc_links)]
use std::sync::Arc;
use std::time::Duration;

use ticket_market_core::{Config, Event, EventSink, MarketControl, MarketError};

pub mod cancel;
mod customer;
mod monitor;
pub mod pool;
mod supervisor;
mod vendor;

pub use cancel::{CancelToken, Cancelled};
pub use pool::{Rejected, TicketPool};
pub use supervisor::Supervisor;

/// Pacing of the workers and the monitor
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timing {
    /// Pause between two tickets released by the same vendor
    pub release_delay: Duration,
    /// Pause after every purchase of a customer
    pub retrieval_delay: Duration,
    /// Interval between two occupancy samples, zero disables sampling
    pub monitor_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            release_delay: Duration::from_millis(500),
            retrieval_delay: Duration::from_millis(700),
            monitor_interval: Duration::from_secs(1),
        }
    }
}

/// Entrypoint for a single simulation run
///
/// Constructs a [`Supervisor`], configures it with `config` and starts the
/// session.
pub fn launch(
    config: Config,
    timing: Timing,
    events: Arc<dyn EventSink>,
) -> Result<Supervisor, MarketError> {
    let supervisor = Supervisor::new(events).with_timing(timing);
    supervisor.configure(config)?;
    supervisor.start()?;
    Ok(supervisor)
}

/// Log `event` and hand it to the sink
fn emit(events: &dyn EventSink, event: Event) {
    event.trace();
    events.emit(event);
}
