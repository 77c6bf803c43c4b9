//! Async workflow driver
//!
//! Binds the synchronous selection state machine to the external payments
//! backend. The manager lock is only ever held between suspension points,
//! never across an `.await`.

pub mod backend;
pub mod driver;
pub mod mock;

pub use backend::SettlementBackend;
pub use driver::SettlementWorkflow;
pub use mock::{MockCall, MockSettlementBackend};
