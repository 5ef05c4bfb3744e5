use std::fmt;

use thiserror::Error;

/// What is wrong with a configuration field
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldProblem {
    /// The field was not supplied
    Missing,
    /// The field is zero
    NotPositive,
}

/// A single invalid configuration field
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FieldError {
    /// Name of the field (kebab-case, as in configuration files)
    pub field: &'static str,
    /// The problem
    pub problem: FieldProblem,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, problem: FieldProblem) -> Self {
        Self { field, problem }
    }

    /// Human-readable name of the field
    pub fn label(&self) -> &'static str {
        match self.field {
            "total-tickets" => "Total tickets",
            "ticket-release-rate" => "Ticket release rate",
            "customer-retrieval-rate" => "Customer retrieval rate",
            "max-ticket-capacity" => "Max ticket capacity",
            "number-of-vendors" => "Number of vendors",
            "number-of-customers" => "Number of customers",
            field => field,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.problem, self.field) {
            (FieldProblem::Missing, _) => write!(f, "{} cannot be null", self.label()),
            (FieldProblem::NotPositive, "number-of-vendors") => {
                f.write_str("At least 1 vendor is required")
            }
            (FieldProblem::NotPositive, "number-of-customers") => {
                f.write_str("At least 1 customer is required")
            }
            (FieldProblem::NotPositive, _) => write!(f, "{} must be at least 1", self.label()),
        }
    }
}

/// The configuration was rejected before any worker was created
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("invalid configuration: {}", join(.errors))]
pub struct ConfigError {
    errors: Vec<FieldError>,
}

impl ConfigError {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// All offending fields, in declaration order
    pub fn fields(&self) -> &[FieldError] {
        &self.errors
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A lifecycle operation was declined in the current session state
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum LifecycleError {
    /// `start()` or `configure()` while a session is running
    #[error("Threads are already running.")]
    AlreadyRunning,
    /// `stop()` without a running session
    #[error("Threads are not running.")]
    NotRunning,
    /// `start()` before any configuration was supplied
    #[error("No configuration found. Please configure the system first.")]
    NotConfigured,
    /// The operating system refused to spawn a worker thread
    #[error("Failed to spawn worker threads.")]
    SpawnFailed,
}

/// Error returned by [`crate::MarketControl::configure()`]
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum MarketError {
    /// The configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The session state does not allow reconfiguration
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
