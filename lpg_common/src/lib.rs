mod amount;

pub mod helpers;
pub mod op;
mod secret;

pub use amount::{Amount, AmountConversionError, CENTS_PER_UNIT};
pub use secret::Secret;
