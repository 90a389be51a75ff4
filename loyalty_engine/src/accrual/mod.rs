//! The client side of the external accrual resolver.
//!
//! [`AccrualResolver`] is the seam the reconciler depends on. [`HttpAccrualResolver`] is the production
//! implementation that talks to the resolver's REST API and absorbs throttling with exponential backoff.
mod http_resolver;
mod resolver;

pub use http_resolver::{default_backoff, HttpAccrualResolver, DEFAULT_RESOLVER_TIMEOUT};
pub use resolver::{AccrualResolver, ResolverError};
