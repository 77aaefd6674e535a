//! Alert classification and dispatch
//!
//! Classifies readings into alerts and delivers them to registered handlers.

mod bus;
pub mod evaluator;
mod notifier;
mod types;

pub use bus::{AlertHandler, EventBus};
pub use evaluator::evaluate;
pub use notifier::TerminalNotifier;
pub use types::{Alert, AlertKind, Condition, CONDITION_SEPARATOR};
