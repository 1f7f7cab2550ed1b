//! Fluent configuration of a single state.

use crate::builder::error::ConfigurationError;
use crate::core::state::render;
use crate::core::{Args, Guard, IntoGuard, State, Transition, Trigger};
use crate::effects::{LifecycleAction, TransitionAction};
use crate::graph::{BehaviorKind, Described, EntryAction, StateGraph, TriggerBehavior};
use crate::reflection::{callable_name, InvocationInfo};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Which item the next [`describe`](StateConfiguration::describe) applies to.
#[derive(Clone, Debug)]
enum LastAdded<T> {
    Activate,
    Deactivate,
    Entry,
    Exit,
    Behavior(T),
}

/// Handle for configuring one state, returned by
/// [`StateMachine::configure`](crate::StateMachine::configure).
///
/// Calls that can violate a structural rule return
/// `Result<Self, ConfigurationError>`; the others return `Self`, so both
/// chain naturally:
///
/// ```rust
/// use statehouse::StateMachine;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Player { Stopped, Playing, Paused }
///
/// let player = StateMachine::new(Player::Stopped);
/// player
///     .configure(Player::Paused)
///     .substate_of(Player::Playing).unwrap()
///     .permit("play", Player::Playing).unwrap()
///     .on_entry(|_| println!("paused"))
///     .describe("announce pause");
///
/// let info = player.info();
/// let paused = info.state(&Player::Paused).unwrap();
/// assert_eq!(paused.entry_actions[0].action.description(), "announce pause");
/// ```
pub struct StateConfiguration<'m, S, T> {
    graph: &'m RwLock<StateGraph<S, T>>,
    state: S,
    last: Option<LastAdded<T>>,
}

impl<'m, S: State, T: Trigger> StateConfiguration<'m, S, T> {
    pub(crate) fn new(graph: &'m RwLock<StateGraph<S, T>>, state: S) -> Self {
        graph.write().ensure(&state);
        Self {
            graph,
            state,
            last: None,
        }
    }

    /// The state being configured.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Make this state a substate of `superstate`.
    pub fn substate_of(self, superstate: S) -> Result<Self, ConfigurationError> {
        self.graph.write().set_superstate(&self.state, &superstate)?;
        Ok(self)
    }

    /// Enter `target` automatically whenever this state is entered.
    pub fn initial_transition(self, target: S) -> Result<Self, ConfigurationError> {
        self.graph.write().set_initial_transition(&self.state, &target)?;
        Ok(self)
    }

    // Trigger behaviors

    pub fn permit(self, trigger: T, destination: S) -> Result<Self, ConfigurationError> {
        self.permit_if(trigger, destination, Guard::always())
    }

    pub fn permit_if(
        self,
        trigger: T,
        destination: S,
        guard: impl IntoGuard,
    ) -> Result<Self, ConfigurationError> {
        if destination == self.state {
            return Err(ConfigurationError::SelfTransition {
                state: render(&self.state),
                trigger: render(&trigger),
            });
        }
        Ok(self.behavior(
            trigger,
            guard.into_guard(),
            BehaviorKind::Fixed {
                destination,
                reentry: false,
            },
        ))
    }

    /// Exit and re-enter this state when `trigger` fires, even from a substate.
    pub fn permit_reentry(self, trigger: T) -> Self {
        self.permit_reentry_if(trigger, Guard::always())
    }

    pub fn permit_reentry_if(self, trigger: T, guard: impl IntoGuard) -> Self {
        let destination = self.state.clone();
        self.behavior(
            trigger,
            guard.into_guard(),
            BehaviorKind::Fixed {
                destination,
                reentry: true,
            },
        )
    }

    /// Accept `trigger` without doing anything. Shadows superstate behaviors.
    pub fn ignore(self, trigger: T) -> Self {
        self.ignore_if(trigger, Guard::always())
    }

    pub fn ignore_if(self, trigger: T, guard: impl IntoGuard) -> Self {
        self.behavior(trigger, guard.into_guard(), BehaviorKind::Ignored)
    }

    /// Run `action` on `trigger` without exiting or entering any state.
    pub fn internal_transition<F>(self, trigger: T, action: F) -> Self
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        self.internal_transition_if(trigger, Guard::always(), action)
    }

    pub fn internal_transition_if<F>(self, trigger: T, guard: impl IntoGuard, action: F) -> Self
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        let info = InvocationInfo::of::<F>(false);
        self.behavior(
            trigger,
            guard.into_guard(),
            BehaviorKind::Internal {
                action: TransitionAction::from_fn(action),
                info,
            },
        )
    }

    pub fn internal_transition_async<F, Fut>(self, trigger: T, action: F) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.internal_transition_async_if(trigger, Guard::always(), action)
    }

    pub fn internal_transition_async_if<F, Fut>(
        self,
        trigger: T,
        guard: impl IntoGuard,
        action: F,
    ) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = InvocationInfo::of::<F>(true);
        self.behavior(
            trigger,
            guard.into_guard(),
            BehaviorKind::Internal {
                action: TransitionAction::from_async(action),
                info,
            },
        )
    }

    /// Transition to the state computed by `selector` from the trigger arguments.
    pub fn permit_dynamic<F>(self, trigger: T, selector: F) -> Self
    where
        F: Fn(&Args) -> S + Send + Sync + 'static,
    {
        self.permit_dynamic_if(trigger, selector, Guard::always())
    }

    pub fn permit_dynamic_if<F>(self, trigger: T, selector: F, guard: impl IntoGuard) -> Self
    where
        F: Fn(&Args) -> S + Send + Sync + 'static,
    {
        let description = callable_name::<F>();
        self.behavior(
            trigger,
            guard.into_guard(),
            BehaviorKind::Dynamic {
                selector: Arc::new(selector),
                description,
            },
        )
    }

    fn behavior(mut self, trigger: T, guard: Guard, kind: BehaviorKind<S, T>) -> Self {
        let behavior = TriggerBehavior::new(trigger.clone(), guard, kind);
        self.graph.write().add_behavior(&self.state, behavior);
        self.last = Some(LastAdded::Behavior(trigger));
        self
    }

    // Lifecycle actions

    pub fn on_activate<F>(self, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let info = InvocationInfo::of::<F>(false);
        self.activate_action(LifecycleAction::from_fn(action), info)
    }

    pub fn on_activate_async<F, Fut>(self, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = InvocationInfo::of::<F>(true);
        self.activate_action(LifecycleAction::from_async(action), info)
    }

    pub fn on_deactivate<F>(self, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let info = InvocationInfo::of::<F>(false);
        self.deactivate_action(LifecycleAction::from_fn(action), info)
    }

    pub fn on_deactivate_async<F, Fut>(self, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = InvocationInfo::of::<F>(true);
        self.deactivate_action(LifecycleAction::from_async(action), info)
    }

    /// Run `action` whenever this state is entered.
    pub fn on_entry<F>(self, action: F) -> Self
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        let info = InvocationInfo::of::<F>(false);
        self.entry_action(TransitionAction::from_fn(action), None, info)
    }

    pub fn on_entry_async<F, Fut>(self, action: F) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = InvocationInfo::of::<F>(true);
        self.entry_action(TransitionAction::from_async(action), None, info)
    }

    /// Run `action` when this state is entered because of `trigger`.
    pub fn on_entry_from<F>(self, trigger: T, action: F) -> Self
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        let info = InvocationInfo::of::<F>(false);
        self.entry_action(TransitionAction::from_fn(action), Some(trigger), info)
    }

    pub fn on_entry_from_async<F, Fut>(self, trigger: T, action: F) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = InvocationInfo::of::<F>(true);
        self.entry_action(TransitionAction::from_async(action), Some(trigger), info)
    }

    pub fn on_exit<F>(self, action: F) -> Self
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        let info = InvocationInfo::of::<F>(false);
        self.exit_action(TransitionAction::from_fn(action), info)
    }

    pub fn on_exit_async<F, Fut>(self, action: F) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = InvocationInfo::of::<F>(true);
        self.exit_action(TransitionAction::from_async(action), info)
    }

    fn activate_action(mut self, action: LifecycleAction, info: InvocationInfo) -> Self {
        self.graph
            .write()
            .ensure(&self.state)
            .activate_actions
            .push(Described { action, info });
        self.last = Some(LastAdded::Activate);
        self
    }

    fn deactivate_action(mut self, action: LifecycleAction, info: InvocationInfo) -> Self {
        self.graph
            .write()
            .ensure(&self.state)
            .deactivate_actions
            .push(Described { action, info });
        self.last = Some(LastAdded::Deactivate);
        self
    }

    fn entry_action(
        mut self,
        action: TransitionAction<S, T>,
        from_trigger: Option<T>,
        info: InvocationInfo,
    ) -> Self {
        self.graph
            .write()
            .ensure(&self.state)
            .entry_actions
            .push(EntryAction {
                action,
                from_trigger,
                info,
            });
        self.last = Some(LastAdded::Entry);
        self
    }

    fn exit_action(mut self, action: TransitionAction<S, T>, info: InvocationInfo) -> Self {
        self.graph
            .write()
            .ensure(&self.state)
            .exit_actions
            .push(Described { action, info });
        self.last = Some(LastAdded::Exit);
        self
    }

    /// Override the introspection description of the most recently added
    /// action, internal transition or dynamic selector.
    ///
    /// Fixed, reentry and ignored behaviors carry no description of their
    /// own; describe their guards with [`Guard::described`] instead. After
    /// one of those, this call leaves the configuration unchanged.
    pub fn describe(self, description: &str) -> Self {
        let Some(last) = self.last.clone() else {
            return self;
        };
        {
            let mut graph = self.graph.write();
            let node = graph.ensure(&self.state);
            match last {
                LastAdded::Activate => {
                    if let Some(item) = node.activate_actions.last_mut() {
                        item.info.set_description(description);
                    }
                }
                LastAdded::Deactivate => {
                    if let Some(item) = node.deactivate_actions.last_mut() {
                        item.info.set_description(description);
                    }
                }
                LastAdded::Entry => {
                    if let Some(item) = node.entry_actions.last_mut() {
                        item.info.set_description(description);
                    }
                }
                LastAdded::Exit => {
                    if let Some(item) = node.exit_actions.last_mut() {
                        item.info.set_description(description);
                    }
                }
                LastAdded::Behavior(trigger) => {
                    if let Some(behavior) = node
                        .behaviors_for_mut(&trigger)
                        .and_then(|list| list.last_mut())
                    {
                        if !behavior.describe(description) {
                            debug!(state = ?self.state, "behavior has no description to override");
                        }
                    }
                }
            }
        }
        self
    }
}
