//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config + storage (injected) → Assemble pipeline → Mount routes → Bind listeners
//!
//! Supervision (startup.rs):
//!     HTTP task ─┐
//!                ├─ first to stop → trigger shutdown → wait for the other
//!     RPC task  ─┘
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then storage, then pipeline, then listeners
//! - Listeners start last (traffic only when ready)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{App, RunningApp};
