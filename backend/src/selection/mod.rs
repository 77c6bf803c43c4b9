//! Candidate & Selection Manager
//!
//! Tracks which settlement candidates are selected for one merchant, derives
//! totals, and gates batch submission.

pub mod manager;
pub mod view;

pub use manager::{LoadOutcome, LoadTicket, SelectionManager};
pub use view::EngineView;
