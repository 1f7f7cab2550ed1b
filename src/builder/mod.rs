//! Builder API for configuring state machines.
//!
//! [`StateMachineBuilder`] chooses the state storage and firing mode;
//! [`StateConfiguration`] declares everything about one state. Structural
//! rules are enforced as each call is made, so an invalid graph is rejected
//! at the line that would create it.

pub mod configuration;
pub mod error;
pub mod machine;
pub mod macros;

pub use configuration::StateConfiguration;
pub use error::{BuildError, ConfigurationError};
pub use machine::StateMachineBuilder;
