//! Helpers for tests against a real SQLite database, a controllable clock, and a scripted accrual resolver.
mod clock;
mod prepare_env;
mod scripted_resolver;

pub use clock::MutableClock;
pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
pub use scripted_resolver::ScriptedResolver;
