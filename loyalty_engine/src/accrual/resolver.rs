use std::time::Duration;

use thiserror::Error;

use crate::db_types::{AccrualReport, OrderNumber};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("The accrual resolver is throttling requests")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Could not reach the accrual resolver. {0}")]
    Transport(String),
    #[error("The accrual resolver replied with unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("Could not decode the accrual resolver's reply. {0}")]
    Decode(String),
    #[error("Invalid accrual resolver configuration. {0}")]
    Configuration(String),
}

impl ResolverError {
    /// Transient errors are worth asking again about on a later tick.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ResolverError::Configuration(_))
    }
}

/// Looks up the outcome of an order with the external accrual resolver.
///
/// Implementations must treat an order that the resolver does not know about yet as
/// [`crate::db_types::AccrualStatus::Registered`], not as an error.
#[allow(async_fn_in_trait)]
pub trait AccrualResolver {
    async fn resolve(&self, number: &OrderNumber) -> Result<AccrualReport, ResolverError>;
}
