//! Statehouse: hierarchical state machines with exact callback ordering
//!
//! States may be nested: a substate inherits every trigger its superstates
//! handle, moving between siblings never exits their common superstate, and
//! declared initial transitions drill down automatically after entry. Every
//! callback (entry, exit, activate, deactivate, notifications) runs in a
//! precisely defined order, synchronously or asynchronously.
//!
//! # Core Concepts
//!
//! - **Graph**: states linked by superstate relations, each with guarded
//!   trigger behaviors (fixed, reentrant, internal, ignored, dynamic)
//! - **Guards**: named predicates over trigger arguments, all evaluated once
//!   per fire so every unmet guard can be reported
//! - **Firing modes**: fires raised from inside a transition run either
//!   immediately or after the current fire completes
//! - **Introspection**: a serializable snapshot of the configuration
//!
//! # Example
//!
//! ```rust
//! use statehouse::{args, Args, StateMachine};
//!
//! #[derive(Clone, Copy, PartialEq, Debug)]
//! enum Heater { Off, On, Idle, Heating }
//!
//! #[derive(Clone, Copy, PartialEq, Debug)]
//! enum Event { PowerOn, PowerOff, Reading }
//!
//! let heater = StateMachine::new(Heater::Off);
//! heater.configure(Heater::Off).permit(Event::PowerOn, Heater::On).unwrap();
//! heater
//!     .configure(Heater::On)
//!     .initial_transition(Heater::Idle).unwrap()
//!     .permit(Event::PowerOff, Heater::Off).unwrap();
//! heater
//!     .configure(Heater::Idle)
//!     .substate_of(Heater::On).unwrap()
//!     .permit_if(Event::Reading, Heater::Heating, |a: &Args| {
//!         a.get::<f64>(0).is_some_and(|t| *t < 18.0)
//!     })
//!     .unwrap();
//! heater.configure(Heater::Heating).substate_of(Heater::On).unwrap();
//!
//! heater.fire(Event::PowerOn).unwrap();
//! assert_eq!(heater.state(), Heater::Idle);
//!
//! heater.fire_with(Event::Reading, args![16.5_f64]).unwrap();
//! assert_eq!(heater.state(), Heater::Heating);
//! assert!(heater.is_in_state(&Heater::On));
//!
//! heater.fire(Event::PowerOff).unwrap();
//! assert_eq!(heater.state(), Heater::Off);
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod graph;
pub mod reflection;

// Re-export commonly used types
pub use builder::{BuildError, ConfigurationError, StateConfiguration, StateMachineBuilder};
pub use crate::core::{
    Args, Guard, GuardCondition, IntoArgs, IntoGuard, ParameterError, ParameterList, State,
    Transition, Trigger, TriggerSignature, TriggerWithParameters,
};
pub use effects::{FiringMode, MachineError, MachineResult, StateMachine, WeakStateMachine};
pub use graph::{Permission, ResolutionError};
pub use reflection::{InvocationInfo, StateInfo, StateMachineInfo};
