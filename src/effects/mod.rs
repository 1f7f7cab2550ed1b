//! The imperative shell: callbacks, firing and transition execution.
//!
//! The graph and resolution logic are pure; everything that runs user code
//! lives here.
//!
//! # Key Concepts
//!
//! - **Plans**: a resolved trigger becomes an ordered list of steps before
//!   any callback runs
//! - **Drivers**: the same plan runs synchronously or asynchronously
//! - **Scheduler**: nested fires run inline (immediate) or are queued

pub mod action;
pub(crate) mod engine;
pub mod error;
pub mod events;
pub mod machine;
pub mod scheduler;
pub mod storage;

pub use action::{LifecycleAction, TransitionAction, UnhandledAction};
pub use error::{MachineError, MachineResult};
pub use machine::{StateMachine, WeakStateMachine};
pub use scheduler::FiringMode;
