use std::sync::Arc;
use std::time::Duration;

use eyre::{eyre, Result};
use flume::Receiver;
use thiserror::Error;
use ticket_market_core::{Config, Event, EventLog, MarketControl, MarketError, SessionState};
use ticket_market_engine::{Supervisor, Timing};

mod sink;
pub use sink::ChannelSink;

/// No matching event arrived in time
#[derive(Debug, Error)]
#[error("no matching event within {0:?}")]
pub struct WaitTimeout(pub Duration);

pub struct TestCtxBuilder {
    /// Configuration applied by `build()`
    pub config: Config,
    /// Worker pacing
    pub timing: Timing,
    /// Whether `build()` also starts the session
    pub start: bool,
}

impl Default for TestCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCtxBuilder {
    /// Create a new test context builder
    ///
    /// Uses 1 vendor releasing 5 tickets, 2 customers buying 2 tickets each,
    /// a capacity of 5 and delays of a few milliseconds.
    pub fn new() -> Self {
        TestCtxBuilder {
            config: Config {
                total_tickets: 20,
                ticket_release_rate: 5,
                customer_retrieval_rate: 2,
                max_ticket_capacity: 5,
                number_of_vendors: 1,
                number_of_customers: 2,
            },
            timing: Timing {
                release_delay: Duration::from_millis(5),
                retrieval_delay: Duration::from_millis(7),
                monitor_interval: Duration::from_millis(10),
            },
            start: false,
        }
    }

    /// Set the whole configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the number of vendors and the tickets each of them releases
    pub fn with_vendors(mut self, vendors: u32, release_rate: u32) -> Self {
        self.config.number_of_vendors = vendors;
        self.config.ticket_release_rate = release_rate;
        self
    }

    /// Set the number of customers and the tickets each of them buys
    pub fn with_customers(mut self, customers: u32, retrieval_rate: u32) -> Self {
        self.config.number_of_customers = customers;
        self.config.customer_retrieval_rate = retrieval_rate;
        self
    }

    /// Set the pool capacity
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.config.max_ticket_capacity = capacity;
        self
    }

    /// Set the worker pacing
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Start the session right after configuring it
    pub fn started(mut self) -> Self {
        self.start = true;
        self
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let log = Arc::new(EventLog::new());
        let (sender, events) = flume::unbounded();
        let sink = Arc::new(ChannelSink::new(log.clone(), sender));
        let supervisor = Arc::new(Supervisor::new(sink).with_timing(self.timing));

        let ctx = TestCtx {
            supervisor,
            log,
            events,
            drop_bomb: DropBomb,
        };
        ctx.configure(self.config).await?;
        if self.start {
            ctx.start().await?;
        }
        Ok(ctx)
    }
}

/// Test context
pub struct TestCtx {
    /// The supervisor under test
    pub supervisor: Arc<Supervisor>,
    /// Every event emitted so far
    pub log: Arc<EventLog>,
    events: Receiver<Event>,

    drop_bomb: DropBomb,
}

impl TestCtx {
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Supervisor) -> T + Send + 'static,
    {
        let supervisor = self.supervisor.clone();
        Ok(tokio::task::spawn_blocking(move || f(&supervisor)).await?)
    }

    /// Configure the supervisor, failing the test on error
    pub async fn configure(&self, config: Config) -> Result<()> {
        Ok(self.try_configure(config).await??)
    }

    /// Configure the supervisor and return its answer
    pub async fn try_configure(&self, config: Config) -> Result<Result<(), MarketError>> {
        self.blocking(move |s| s.configure(config)).await
    }

    /// Start the session, failing the test on error
    pub async fn start(&self) -> Result<()> {
        Ok(self.blocking(|s| s.start()).await??)
    }

    /// Stop the session, failing the test on error
    pub async fn stop(&self) -> Result<()> {
        Ok(self.blocking(|s| s.stop()).await??)
    }

    /// Current number of tickets in the pool
    pub fn ticket_count(&self) -> usize {
        self.supervisor.current_ticket_count()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.supervisor.state()
    }

    /// Wait for the next event matching `pred`, skipping all others
    pub async fn wait_for(
        &self,
        timeout: Duration,
        mut pred: impl FnMut(&Event) -> bool,
    ) -> Result<Event> {
        let wait = async {
            loop {
                let event = self.events.recv_async().await?;
                if pred(&event) {
                    return Ok::<_, eyre::Report>(event);
                }
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(?timeout, "gave up waiting for an event");
                Err(WaitTimeout(timeout).into())
            }
        }
    }

    /// Wait until every worker of the session emitted its `Finished` event
    pub async fn wait_until_finished(&self, timeout: Duration) -> Result<()> {
        let config = self
            .supervisor
            .config()
            .ok_or_else(|| eyre!("the supervisor is not configured"))?;
        let mut pending = config.number_of_vendors + config.number_of_customers;
        while pending > 0 {
            self.wait_for(timeout, |e| matches!(e, Event::Finished { .. }))
                .await?;
            pending -= 1;
        }
        Ok(())
    }

    /// Events emitted so far
    pub fn events(&self) -> Vec<Event> {
        self.log.events()
    }

    /// Events emitted so far by the worker called `worker`
    pub fn events_of(&self, worker: &str) -> Vec<Event> {
        self.log
            .events()
            .into_iter()
            .filter(|e| e.worker() == Some(worker))
            .collect()
    }

    /// Stop the session if it is still running and finish the test
    pub async fn finish(self) -> Result<()> {
        std::mem::forget(self.drop_bomb);
        if self.supervisor.state() == SessionState::Running {
            let supervisor = self.supervisor.clone();
            tokio::task::spawn_blocking(move || supervisor.stop()).await??;
        }
        Ok(())
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to stop the simulation");
    }
}
