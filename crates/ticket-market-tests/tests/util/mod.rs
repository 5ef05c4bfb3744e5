use std::sync::Arc;

use ticket_market_core::{Event, EventLog, Ticket};
use ticket_market_engine::TicketPool;

/// A pool recording its events in a fresh log
#[allow(unused)]
pub fn pool(capacity: usize) -> (Arc<TicketPool>, Arc<EventLog>) {
    let log = Arc::new(EventLog::new());
    (Arc::new(TicketPool::new(capacity, log.clone())), log)
}

/// Tickets `T-000`, `T-001`, ... in insertion order
#[allow(unused)]
pub fn tickets(n: usize) -> Vec<Ticket> {
    (0..n).map(|i| Ticket::new(format!("T-{i:03}"))).collect()
}

/// Number of events matching `pred`
#[allow(unused)]
pub fn count(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

/// Tickets in the order the pool handed them out
#[allow(unused)]
pub fn removal_order(log: &EventLog) -> Vec<Ticket> {
    log.events()
        .into_iter()
        .filter_map(|e| match e {
            Event::TicketRemoved { ticket } => Some(ticket),
            _ => None,
        })
        .collect()
}
