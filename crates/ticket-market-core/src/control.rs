use crate::{Config, LifecycleError, MarketError};

/// Lifecycle state of the simulation
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SessionState {
    /// No configuration has been supplied yet
    Idle,
    /// Workers are built but not running
    Configured,
    /// Workers and the monitor are running
    Running,
}

/// Interface for controlling the simulation from an external collaborator
///
/// 📌 Hint: The supervisor implements this trait. All methods may be called
/// concurrently from different threads.
pub trait MarketControl {
    /// Replace the configuration and rebuild the worker set
    ///
    /// Fails with a validation error if any field is not positive, or with
    /// [`LifecycleError::AlreadyRunning`] while a session is running. On
    /// failure the state is unchanged.
    fn configure(&self, config: Config) -> Result<(), MarketError>;

    /// Launch every worker and the occupancy monitor
    fn start(&self) -> Result<(), LifecycleError>;

    /// Cancel every worker and the occupancy monitor
    ///
    /// Returns once all threads of the session have terminated.
    fn stop(&self) -> Result<(), LifecycleError>;

    /// Snapshot of the number of tickets in the pool
    ///
    /// This method never blocks on the session lifecycle. It returns 0 if no
    /// configuration has been supplied yet.
    fn current_ticket_count(&self) -> usize;
}
