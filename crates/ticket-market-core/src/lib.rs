//! 🏗 Shared vocabulary of the ticket market simulation: configuration,
//! events, errors and the control interface.
#![warn(missing_docs)]

mod control;
mod error;
mod event;

use serde::Deserialize;
use uuid::Uuid;

pub use control::{MarketControl, SessionState};
pub use error::{ConfigError, FieldError, FieldProblem, LifecycleError, MarketError};
pub use event::{Event, EventLog, EventSink, Role};

/// Configuration of one simulation session
///
/// All six values must be at least 1, see [`Config::validate()`].
/// Deserializing requires every key; use [`RawConfig`] for partial input.
#[derive(Clone, Copy, PartialEq, Eq, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Total number of tickets on sale
    pub total_tickets: u32,
    /// Number of tickets every vendor releases into the pool
    pub ticket_release_rate: u32,
    /// Number of tickets every customer retrieves from the pool
    pub customer_retrieval_rate: u32,
    /// Maximum number of tickets the pool holds at once
    pub max_ticket_capacity: u32,
    /// Number of vendor workers
    pub number_of_vendors: u32,
    /// Number of customer workers
    pub number_of_customers: u32,
}

impl Config {
    /// Check that every field is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        RawConfig::from(*self).into_config().map(|_| ())
    }
}

/// Configuration as supplied by an external collaborator
///
/// Every field may be missing. [`RawConfig::into_config()`] turns it into a
/// [`Config`] or reports all offending fields at once.
#[derive(Clone, Copy, PartialEq, Eq, Default, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct RawConfig {
    /// See [`Config::total_tickets`]
    pub total_tickets: Option<u32>,
    /// See [`Config::ticket_release_rate`]
    pub ticket_release_rate: Option<u32>,
    /// See [`Config::customer_retrieval_rate`]
    pub customer_retrieval_rate: Option<u32>,
    /// See [`Config::max_ticket_capacity`]
    pub max_ticket_capacity: Option<u32>,
    /// See [`Config::number_of_vendors`]
    pub number_of_vendors: Option<u32>,
    /// See [`Config::number_of_customers`]
    pub number_of_customers: Option<u32>,
}

impl RawConfig {
    /// Overlay the fields set in `other` on top of `self`
    pub fn merge(self, other: RawConfig) -> RawConfig {
        RawConfig {
            total_tickets: other.total_tickets.or(self.total_tickets),
            ticket_release_rate: other.ticket_release_rate.or(self.ticket_release_rate),
            customer_retrieval_rate: other
                .customer_retrieval_rate
                .or(self.customer_retrieval_rate),
            max_ticket_capacity: other.max_ticket_capacity.or(self.max_ticket_capacity),
            number_of_vendors: other.number_of_vendors.or(self.number_of_vendors),
            number_of_customers: other.number_of_customers.or(self.number_of_customers),
        }
    }

    /// Validate all fields and build the [`Config`]
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mut errors = Vec::new();
        let mut check = |field: &'static str, value: Option<u32>| match value {
            None => {
                errors.push(FieldError::new(field, FieldProblem::Missing));
                0
            }
            Some(0) => {
                errors.push(FieldError::new(field, FieldProblem::NotPositive));
                0
            }
            Some(v) => v,
        };

        let config = Config {
            total_tickets: check("total-tickets", self.total_tickets),
            ticket_release_rate: check("ticket-release-rate", self.ticket_release_rate),
            customer_retrieval_rate: check("customer-retrieval-rate", self.customer_retrieval_rate),
            max_ticket_capacity: check("max-ticket-capacity", self.max_ticket_capacity),
            number_of_vendors: check("number-of-vendors", self.number_of_vendors),
            number_of_customers: check("number-of-customers", self.number_of_customers),
        };

        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::new(errors))
        }
    }
}

impl From<Config> for RawConfig {
    fn from(config: Config) -> Self {
        RawConfig {
            total_tickets: Some(config.total_tickets),
            ticket_release_rate: Some(config.ticket_release_rate),
            customer_retrieval_rate: Some(config.customer_retrieval_rate),
            max_ticket_capacity: Some(config.max_ticket_capacity),
            number_of_vendors: Some(config.number_of_vendors),
            number_of_customers: Some(config.number_of_customers),
        }
    }
}

/// Identifier of a ticket travelling through the pool
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Ticket(String);

impl Ticket {
    /// Wrap an existing identifier
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Issue a ticket with a fresh, globally unique identifier
    pub fn issue() -> Self {
        Self(format!("Ticket-{}", Uuid::new_v4().simple()))
    }

    /// Get the identifier
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
