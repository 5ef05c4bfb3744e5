//! Event sink forwarding every event to the test

use std::sync::Arc;

use flume::Sender;
use ticket_market_core::{Event, EventLog, EventSink};

/// Records events in an [`EventLog`] and streams them through a channel
pub struct ChannelSink {
    log: Arc<EventLog>,
    sender: Sender<Event>,
}

impl ChannelSink {
    pub fn new(log: Arc<EventLog>, sender: Sender<Event>) -> Self {
        Self { log, sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) {
        self.log.emit(event.clone());
        // the test may have stopped listening
        let _ = self.sender.send(event);
    }
}
