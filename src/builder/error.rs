//! Errors raised while configuring and building state machines.

use thiserror::Error;

/// Structural violations detected by configuration calls.
///
/// Every variant except [`InitialTransitionNotDescendant`] is raised by the
/// configuration call that introduces the problem. Descendant validity of an
/// initial transition depends on the finished graph and is checked when the
/// chain is first followed.
///
/// [`InitialTransitionNotDescendant`]: ConfigurationError::InitialTransitionNotDescendant
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Configuring {state} as a substate of {superstate} creates an illegal cyclic configuration.")]
    CyclicSuperstate { state: String, superstate: String },

    #[error(
        "Permit() (and PermitIf()) require that the destination state is not equal to the source state. \
         To accept a trigger without changing state, use either Ignore() or PermitReentry(). \
         (state {state}, trigger {trigger})"
    )]
    SelfTransition { state: String, trigger: String },

    #[error("Setting the current state as the target destination state is not allowed. (state {state})")]
    InitialTransitionToSelf { state: String },

    #[error("This state has already been configured with an initial transition. (state {state})")]
    DuplicateInitialTransition { state: String },

    #[error("The target ({target}) for the initial transition is not a substate of {state}.")]
    InitialTransitionNotDescendant { state: String, target: String },

    #[error("Parameters for the trigger '{trigger}' have already been configured.")]
    ParametersAlreadyConfigured { trigger: String },
}

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial state and external state accessor are mutually exclusive")]
    ConflictingStateSource,
}
