//! Implementation of the supervisor
use std::io;
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use ticket_market_core::{
    Config, Event, EventSink, LifecycleError, MarketControl, MarketError, Role, SessionState,
};

use crate::cancel::{cancellation, CancelHandle};
use crate::customer::Customer;
use crate::emit;
use crate::monitor::Monitor;
use crate::pool::TicketPool;
use crate::vendor::Vendor;
use crate::Timing;

/// A worker to launch on `start()`
struct WorkerSpec {
    role: Role,
    name: String,
    quota: u32,
}

/// Everything built by `configure()`
struct Staged {
    config: Config,
    pool: Arc<TicketPool>,
    workers: Vec<WorkerSpec>,
}

/// A launched thread and the handle to cancel it
struct Task {
    cancel: CancelHandle,
    thread: JoinHandle<()>,
}

enum Session {
    Idle,
    Configured(Staged),
    Running(Staged, Vec<Task>),
}

/// Supervisor orchestrating vendors, customers and the monitor
///
/// At most one session runs at a time. All lifecycle operations are
/// serialized by the session lock; [`MarketControl::current_ticket_count()`]
/// only touches the pool.
pub struct Supervisor {
    timing: Timing,
    events: Arc<dyn EventSink>,
    session: Mutex<Session>,

    /// Pool of the current configuration
    ///
    /// Kept outside of `session` so the ticket count can be read while a
    /// lifecycle operation holds the session lock.
    pool: RwLock<Option<Arc<TicketPool>>>,
}

impl Supervisor {
    /// Create an idle [`Supervisor`] with [`Timing::default()`]
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            timing: Timing::default(),
            events,
            session: Mutex::new(Session::Idle),
            pool: RwLock::new(None),
        }
    }

    /// Use `timing` for all sessions started from now on
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Get the current lifecycle state
    pub fn state(&self) -> SessionState {
        match *self.session.lock() {
            Session::Idle => SessionState::Idle,
            Session::Configured(_) => SessionState::Configured,
            Session::Running(..) => SessionState::Running,
        }
    }

    /// Get the active configuration, if any
    pub fn config(&self) -> Option<Config> {
        match &*self.session.lock() {
            Session::Idle => None,
            Session::Configured(staged) | Session::Running(staged, _) => Some(staged.config),
        }
    }

    /// Spawn one thread per worker plus the monitor
    ///
    /// Tasks are pushed as they are spawned, so on error `tasks` holds
    /// everything that must be shut down again.
    fn launch(&self, staged: &Staged, tasks: &mut Vec<Task>) -> io::Result<()> {
        for spec in &staged.workers {
            let (handle, token) = cancellation();
            let thread = match spec.role {
                Role::Vendor => {
                    let vendor = Vendor::new(
                        spec.name.clone(),
                        staged.pool.clone(),
                        spec.quota,
                        self.timing.release_delay,
                        self.events.clone(),
                        token,
                    );
                    spawn(&spec.name, move || vendor.run())?
                }
                Role::Customer => {
                    let customer = Customer::new(
                        spec.name.clone(),
                        staged.pool.clone(),
                        spec.quota,
                        self.timing.retrieval_delay,
                        self.events.clone(),
                        token,
                    );
                    spawn(&spec.name, move || customer.run())?
                }
            };
            tasks.push(Task {
                cancel: handle,
                thread,
            });
        }

        let (handle, token) = cancellation();
        let monitor = Monitor::new(
            staged.pool.clone(),
            self.timing.monitor_interval,
            self.events.clone(),
            token,
        );
        tasks.push(Task {
            cancel: handle,
            thread: spawn("Monitor", move || monitor.run())?,
        });
        Ok(())
    }
}

fn spawn(name: &str, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name.to_owned()).spawn(f)
}

/// Cancel all `tasks` and wait for them to terminate
///
/// Threads that already finished their quota are joined right away.
fn shutdown(tasks: Vec<Task>, pool: &TicketPool) {
    let threads: Vec<JoinHandle<()>> = tasks
        .into_iter()
        .map(|task| {
            task.cancel.cancel();
            task.thread
        })
        .collect();

    // customers blocked in `take` only notice cancellation when woken
    pool.wake_waiters();

    for thread in threads {
        let name = thread.thread().name().unwrap_or("<unnamed>").to_owned();
        if thread.join().is_err() {
            tracing::error!(worker = name.as_str(), "worker thread panicked");
        }
    }
}

impl MarketControl for Supervisor {
    fn configure(&self, config: Config) -> Result<(), MarketError> {
        let mut session = self.session.lock();
        if let Session::Running(..) = *session {
            tracing::warn!("configure rejected, a session is running");
            return Err(LifecycleError::AlreadyRunning.into());
        }
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "configure rejected");
            return Err(err.into());
        }

        let pool = Arc::new(TicketPool::new(
            config.max_ticket_capacity as usize,
            self.events.clone(),
        ));

        let vendors = (1..=config.number_of_vendors).map(|i| WorkerSpec {
            role: Role::Vendor,
            name: format!("Vendor-{i}"),
            quota: config.ticket_release_rate,
        });
        let customers = (1..=config.number_of_customers).map(|i| WorkerSpec {
            role: Role::Customer,
            name: format!("Customer-{i}"),
            quota: config.customer_retrieval_rate,
        });
        let workers = vendors.chain(customers).collect();

        *self.pool.write() = Some(pool.clone());
        *session = Session::Configured(Staged {
            config,
            pool,
            workers,
        });

        emit(
            &*self.events,
            Event::Configured {
                vendors: config.number_of_vendors,
                customers: config.number_of_customers,
            },
        );
        Ok(())
    }

    fn start(&self) -> Result<(), LifecycleError> {
        let mut session = self.session.lock();
        let staged = match mem::replace(&mut *session, Session::Idle) {
            Session::Configured(staged) => staged,
            other => {
                let err = match other {
                    Session::Idle => LifecycleError::NotConfigured,
                    _ => LifecycleError::AlreadyRunning,
                };
                *session = other;
                tracing::warn!(%err, "start rejected");
                return Err(err);
            }
        };

        let mut tasks = Vec::with_capacity(staged.workers.len() + 1);
        if let Err(err) = self.launch(&staged, &mut tasks) {
            tracing::error!(%err, "failed to spawn worker threads");
            shutdown(tasks, &staged.pool);
            *session = Session::Configured(staged);
            return Err(LifecycleError::SpawnFailed);
        }

        *session = Session::Running(staged, tasks);
        emit(&*self.events, Event::Started);
        Ok(())
    }

    fn stop(&self) -> Result<(), LifecycleError> {
        let mut session = self.session.lock();
        let (staged, tasks) = match mem::replace(&mut *session, Session::Idle) {
            Session::Running(staged, tasks) => (staged, tasks),
            other => {
                *session = other;
                tracing::warn!("stop rejected, no session is running");
                return Err(LifecycleError::NotRunning);
            }
        };

        shutdown(tasks, &staged.pool);
        *session = Session::Configured(staged);
        emit(&*self.events, Event::Stopped);
        Ok(())
    }

    fn current_ticket_count(&self) -> usize {
        self.pool.read().as_ref().map_or(0, |pool| pool.len())
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Session::Running(staged, tasks) = mem::replace(self.session.get_mut(), Session::Idle)
        {
            shutdown(tasks, &staged.pool);
        }
    }
}
