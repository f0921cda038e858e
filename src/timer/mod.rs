//! The persisted elapsed-timer record and its reconciliation against
//! the server.

pub mod interval;
pub mod reconcile;
pub mod store;

pub use interval::IntervalCache;
pub use reconcile::{ReconcilePolicy, TimerPhase, TimerReconciler};
pub use store::TimerStore;
