//! Core value types shared by the graph and the execution engine.
//!
//! - State and trigger keys via the [`State`] and [`Trigger`] traits
//! - Type-erased trigger arguments ([`Args`])
//! - Guard predicates with accumulated failure descriptions ([`Guard`])
//! - The [`Transition`] value handed to callbacks
//! - Trigger signatures for argument validation
//!
//! Nothing in this module performs side effects.

pub mod args;
pub mod guard;
pub mod signature;
pub mod state;
pub mod transition;

pub use args::{Arg, Args, IntoArgs};
pub use guard::{Guard, GuardCondition, IntoGuard};
pub use signature::{
    ArgType, ParameterError, ParameterList, SignatureRegistry, TriggerSignature,
    TriggerWithParameters,
};
pub use state::{State, Trigger};
pub use transition::Transition;
