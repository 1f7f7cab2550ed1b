//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{State, Trigger};
use crate::effects::scheduler::FiringMode;
use crate::effects::storage::StateStorage;
use crate::effects::StateMachine;
use std::marker::PhantomData;

type Accessor<S> = Box<dyn Fn() -> S + Send + Sync>;
type Mutator<S> = Box<dyn Fn(S) + Send + Sync>;

/// Builder for constructing state machines with a fluent API.
///
/// Exactly one state source is required: an initial state for internal
/// storage, or an external accessor/mutator pair.
///
/// ```rust
/// use statehouse::{FiringMode, StateMachineBuilder};
///
/// let machine = StateMachineBuilder::<&str, &str>::new()
///     .initial("idle")
///     .firing_mode(FiringMode::Immediate)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.state(), "idle");
/// assert_eq!(machine.firing_mode(), FiringMode::Immediate);
/// ```
pub struct StateMachineBuilder<S, T> {
    initial: Option<S>,
    external: Option<(Accessor<S>, Mutator<S>)>,
    mode: FiringMode,
    _trigger: PhantomData<fn(T)>,
}

impl<S: State, T: Trigger> StateMachineBuilder<S, T> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            external: None,
            mode: FiringMode::default(),
            _trigger: PhantomData,
        }
    }

    /// Keep state internally, starting in `state`.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Keep state with the caller.
    pub fn external_state<A, M>(mut self, accessor: A, mutator: M) -> Self
    where
        A: Fn() -> S + Send + Sync + 'static,
        M: Fn(S) + Send + Sync + 'static,
    {
        self.external = Some((Box::new(accessor), Box::new(mutator)));
        self
    }

    pub fn firing_mode(mut self, mode: FiringMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the state machine.
    /// Returns an error unless exactly one state source was given.
    pub fn build(self) -> Result<StateMachine<S, T>, BuildError> {
        let storage = match (self.initial, self.external) {
            (Some(_), Some(_)) => return Err(BuildError::ConflictingStateSource),
            (Some(initial), None) => StateStorage::internal(initial),
            (None, Some((accessor, mutator))) => StateStorage::external(accessor, mutator),
            (None, None) => return Err(BuildError::MissingInitialState),
        };

        Ok(StateMachine::from_storage(storage, self.mode))
    }
}

impl<S: State, T: Trigger> Default for StateMachineBuilder<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
