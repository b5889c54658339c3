//! Plan execution engine.
//!
//! The executor is the state machine between plans and providers: it gates
//! on connection status, runs steps in order through the connector, records
//! runs with per-step results and rollback material, and replays recorded
//! rollback plans in reverse on request.

pub mod error;
pub mod executor;
pub mod rollback;

pub use error::ExecutorError;
pub use executor::Executor;
