//! The state machine facade.

use super::action::{TransitionAction, UnhandledAction};
use super::engine::{self, Plan, Route};
use super::error::MachineResult;
use super::events::EventRegistry;
use super::scheduler::{FiringMode, Scheduler};
use super::storage::StateStorage;
use crate::builder::configuration::StateConfiguration;
use crate::builder::error::ConfigurationError;
use crate::core::{
    Args, IntoArgs, ParameterList, SignatureRegistry, State, Transition, Trigger,
    TriggerSignature, TriggerWithParameters,
};
use crate::graph::{resolve, BehaviorKind, Permission, ResolutionError, StateGraph};
use crate::reflection::StateMachineInfo;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

pub(crate) struct Shared<S, T> {
    pub(crate) graph: RwLock<StateGraph<S, T>>,
    signatures: RwLock<SignatureRegistry<T>>,
    events: RwLock<EventRegistry<S, T>>,
    storage: StateStorage<S>,
    scheduler: Scheduler<T>,
    activated: AtomicBool,
}

/// What a fire resolved to, before any callback has run.
enum Prepared<S, T> {
    Run(Plan<S, T>),
    Unhandled {
        state: S,
        trigger: T,
        error: ResolutionError,
    },
}

/// A hierarchical state machine.
///
/// `StateMachine` is a cheap, cloneable handle; clones share the same
/// configuration and current state. Callbacks that need to fire back into
/// the machine should capture a [`WeakStateMachine`] from
/// [`downgrade`](Self::downgrade) so the machine does not keep itself alive.
///
/// # Example
///
/// ```rust
/// use statehouse::StateMachine;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Call { OffHook, Ringing, Connected, OnHold }
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Signal { Dial, Answer, Hold, Resume, HangUp }
///
/// let phone = StateMachine::new(Call::OffHook);
/// phone.configure(Call::OffHook).permit(Signal::Dial, Call::Ringing).unwrap();
/// phone.configure(Call::Ringing).permit(Signal::Answer, Call::Connected).unwrap();
/// phone
///     .configure(Call::Connected)
///     .permit(Signal::Hold, Call::OnHold).unwrap()
///     .permit(Signal::HangUp, Call::OffHook).unwrap();
/// phone
///     .configure(Call::OnHold)
///     .substate_of(Call::Connected).unwrap()
///     .permit(Signal::Resume, Call::Connected).unwrap();
///
/// phone.fire(Signal::Dial).unwrap();
/// phone.fire(Signal::Answer).unwrap();
/// phone.fire(Signal::Hold).unwrap();
///
/// assert_eq!(phone.state(), Call::OnHold);
/// assert!(phone.is_in_state(&Call::Connected));
/// assert!(phone.can_fire(&Signal::HangUp));
/// ```
pub struct StateMachine<S, T> {
    shared: Arc<Shared<S, T>>,
}

impl<S, T> Clone for StateMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Non-owning handle to a [`StateMachine`].
pub struct WeakStateMachine<S, T> {
    shared: Weak<Shared<S, T>>,
}

impl<S, T> Clone for WeakStateMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<S, T> WeakStateMachine<S, T> {
    pub fn upgrade(&self) -> Option<StateMachine<S, T>> {
        self.shared.upgrade().map(|shared| StateMachine { shared })
    }
}

impl<S: State, T: Trigger> StateMachine<S, T> {
    /// Machine with internal state storage and queued firing.
    pub fn new(initial: S) -> Self {
        Self::with_mode(initial, FiringMode::default())
    }

    /// Machine with internal state storage and the given firing mode.
    pub fn with_mode(initial: S, mode: FiringMode) -> Self {
        Self::from_storage(StateStorage::internal(initial), mode)
    }

    /// Machine whose current state lives with the caller.
    ///
    /// `mutator` is called at most once per completed fire, with the state
    /// the fire settled in.
    pub fn with_external_state<A, M>(accessor: A, mutator: M, mode: FiringMode) -> Self
    where
        A: Fn() -> S + Send + Sync + 'static,
        M: Fn(S) + Send + Sync + 'static,
    {
        Self::from_storage(StateStorage::external(accessor, mutator), mode)
    }

    pub(crate) fn from_storage(storage: StateStorage<S>, mode: FiringMode) -> Self {
        Self {
            shared: Arc::new(Shared {
                graph: RwLock::new(StateGraph::new()),
                signatures: RwLock::new(SignatureRegistry::default()),
                events: RwLock::new(EventRegistry::default()),
                storage,
                scheduler: Scheduler::new(mode),
                activated: AtomicBool::new(false),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakStateMachine<S, T> {
        WeakStateMachine {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Begin or continue configuring `state`.
    pub fn configure(&self, state: S) -> StateConfiguration<'_, S, T> {
        StateConfiguration::new(&self.shared.graph, state)
    }

    /// How fires raised during a fire are dispatched.
    pub fn firing_mode(&self) -> FiringMode {
        self.shared.scheduler.mode()
    }

    /// The current state; during a fire, the state the fire has reached.
    pub fn state(&self) -> S {
        self.shared.storage.current()
    }

    /// True when the current state is `state` or one of its substates.
    pub fn is_in_state(&self, state: &S) -> bool {
        let current = self.state();
        self.shared.graph.read().includes(state, &current)
    }

    pub fn is_activated(&self) -> bool {
        self.shared.activated.load(Ordering::Acquire)
    }

    // Notifications

    /// Called after each hop settles, before entry actions run.
    pub fn on_transitioned<F>(&self, callback: F)
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        self.shared
            .events
            .write()
            .on_transitioned(TransitionAction::from_fn(callback));
    }

    pub fn on_transitioned_async<F, Fut>(&self, callback: F)
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shared
            .events
            .write()
            .on_transitioned(TransitionAction::from_async(callback));
    }

    /// Called once per fire after every entry action, with the fire's
    /// source and the state finally reached.
    pub fn on_transition_completed<F>(&self, callback: F)
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        self.shared
            .events
            .write()
            .on_transition_completed(TransitionAction::from_fn(callback));
    }

    pub fn on_transition_completed_async<F, Fut>(&self, callback: F)
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shared
            .events
            .write()
            .on_transition_completed(TransitionAction::from_async(callback));
    }

    /// Handle unresolvable triggers instead of returning an error.
    ///
    /// The handler receives the current state, the trigger and the unmet
    /// guard descriptions. Ambiguous configurations are still returned as
    /// errors.
    pub fn on_unhandled_trigger<F>(&self, handler: F)
    where
        F: Fn(&S, &T, &[String]) + Send + Sync + 'static,
    {
        self.shared
            .events
            .write()
            .on_unhandled_trigger(UnhandledAction::from_fn(handler));
    }

    pub fn on_unhandled_trigger_async<F, Fut>(&self, handler: F)
    where
        F: Fn(S, T, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shared
            .events
            .write()
            .on_unhandled_trigger(UnhandledAction::from_async(handler));
    }

    // Trigger signatures

    /// Register the argument types of `trigger` and return a typed handle
    /// for firing it.
    pub fn set_trigger_parameters<P: ParameterList>(
        &self,
        trigger: T,
    ) -> Result<TriggerWithParameters<T, P>, ConfigurationError> {
        let typed = TriggerWithParameters::new(trigger);
        self.set_trigger_signature(typed.signature().clone())?;
        Ok(typed)
    }

    pub fn set_trigger_signature(
        &self,
        signature: TriggerSignature<T>,
    ) -> Result<(), ConfigurationError> {
        self.shared.signatures.write().register(signature)
    }

    // Querying triggers

    /// Triggers that would currently be accepted without arguments.
    pub fn permitted_triggers(&self) -> Vec<T> {
        self.permitted_triggers_with(Args::new())
    }

    /// Triggers that would currently be accepted with `args`, innermost
    /// state's triggers first.
    pub fn permitted_triggers_with(&self, args: impl IntoArgs) -> Vec<T> {
        let args = args.into_args();
        let state = self.state();
        let triggers = self.shared.graph.read().triggers_in_chain(&state);
        triggers
            .into_iter()
            .filter(|trigger| self.permission(&state, trigger, &args).is_permitted())
            .collect()
    }

    pub fn can_fire(&self, trigger: &T) -> bool {
        self.can_fire_with(trigger, Args::new())
    }

    pub fn can_fire_with(&self, trigger: &T, args: impl IntoArgs) -> bool {
        self.check_trigger(trigger, args).is_permitted()
    }

    /// Resolve `trigger` without firing it, reporting unmet guards.
    pub fn check_trigger(&self, trigger: &T, args: impl IntoArgs) -> Permission {
        let state = self.state();
        self.permission(&state, trigger, &args.into_args())
    }

    fn permission(&self, state: &S, trigger: &T, args: &Args) -> Permission {
        let levels = self.shared.graph.read().candidates_by_level(state, trigger);
        match resolve(levels, state, trigger, args) {
            Ok(_) => Permission::Permitted,
            Err(error) => Permission::from(&error),
        }
    }

    /// Snapshot of the configuration and current state.
    pub fn info(&self) -> StateMachineInfo<S, T> {
        let current = self.state();
        self.shared.graph.read().info(current)
    }

    // Firing

    /// Fire `trigger` without arguments.
    ///
    /// Fails with [`InvalidOperation`](crate::MachineError::InvalidOperation)
    /// before running anything if the transition would run an asynchronous
    /// callback.
    pub fn fire(&self, trigger: T) -> MachineResult<()> {
        self.fire_with(trigger, Args::new())
    }

    pub fn fire_with(&self, trigger: T, args: impl IntoArgs) -> MachineResult<()> {
        let args = args.into_args();
        match self.firing_mode() {
            FiringMode::Immediate => self.fire_immediate(trigger, args),
            FiringMode::Queued => self.fire_queued(trigger, args),
        }
    }

    /// Fire a trigger registered with [`set_trigger_parameters`](Self::set_trigger_parameters).
    pub fn fire_params<P: ParameterList>(
        &self,
        trigger: &TriggerWithParameters<T, P>,
        params: P,
    ) -> MachineResult<()> {
        self.fire_with(trigger.trigger().clone(), params.into_args())
    }

    pub async fn fire_async(&self, trigger: T) -> MachineResult<()> {
        self.fire_with_async(trigger, Args::new()).await
    }

    pub async fn fire_with_async(&self, trigger: T, args: impl IntoArgs) -> MachineResult<()> {
        let args = args.into_args();
        match self.firing_mode() {
            FiringMode::Immediate => self.fire_immediate_async(trigger, args).await,
            FiringMode::Queued => self.fire_queued_async(trigger, args).await,
        }
    }

    pub async fn fire_params_async<P: ParameterList>(
        &self,
        trigger: &TriggerWithParameters<T, P>,
        params: P,
    ) -> MachineResult<()> {
        self.fire_with_async(trigger.trigger().clone(), params.into_args())
            .await
    }

    fn fire_immediate(&self, trigger: T, args: Args) -> MachineResult<()> {
        let storage = &self.shared.storage;
        if storage.in_session() {
            debug!(trigger = ?trigger, "nested fire running immediately");
            return self.fire_one(trigger, args);
        }

        let session = storage.begin();
        self.fire_one(trigger, args)?;
        session.commit();
        Ok(())
    }

    fn fire_queued(&self, trigger: T, args: Args) -> MachineResult<()> {
        let scheduler = &self.shared.scheduler;
        let Some(_firing) = scheduler.try_begin() else {
            debug!(trigger = ?trigger, "fire in progress, queueing trigger");
            scheduler.enqueue(trigger, args);
            return Ok(());
        };

        self.fire_in_session(trigger, args)?;
        while let Some(next) = scheduler.dequeue() {
            debug!(trigger = ?next.trigger, "draining queued trigger");
            self.fire_in_session(next.trigger, next.args)?;
        }
        Ok(())
    }

    fn fire_in_session(&self, trigger: T, args: Args) -> MachineResult<()> {
        let session = self.shared.storage.begin();
        self.fire_one(trigger, args)?;
        session.commit();
        Ok(())
    }

    fn fire_one(&self, trigger: T, args: Args) -> MachineResult<()> {
        match self.prepare(trigger, args)? {
            Prepared::Run(plan) => engine::execute(&plan, &self.shared.storage),
            Prepared::Unhandled {
                state,
                trigger,
                error,
            } => {
                let handler = self.shared.events.read().unhandled();
                match handler {
                    Some(handler) => {
                        warn!(state = ?state, trigger = ?trigger, %error, "unhandled trigger");
                        handler.invoke(&state, &trigger, error.unmet_guards())
                    }
                    None => Err(error.into()),
                }
            }
        }
    }

    async fn fire_immediate_async(&self, trigger: T, args: Args) -> MachineResult<()> {
        let storage = &self.shared.storage;
        if storage.in_session() {
            debug!(trigger = ?trigger, "nested fire running immediately");
            return self.fire_one_async(trigger, args).await;
        }

        let session = storage.begin();
        self.fire_one_async(trigger, args).await?;
        session.commit();
        Ok(())
    }

    async fn fire_queued_async(&self, trigger: T, args: Args) -> MachineResult<()> {
        let scheduler = &self.shared.scheduler;
        let Some(_firing) = scheduler.try_begin() else {
            debug!(trigger = ?trigger, "fire in progress, queueing trigger");
            scheduler.enqueue(trigger, args);
            return Ok(());
        };

        self.fire_in_session_async(trigger, args).await?;
        while let Some(next) = scheduler.dequeue() {
            debug!(trigger = ?next.trigger, "draining queued trigger");
            self.fire_in_session_async(next.trigger, next.args).await?;
        }
        Ok(())
    }

    async fn fire_in_session_async(&self, trigger: T, args: Args) -> MachineResult<()> {
        let session = self.shared.storage.begin();
        self.fire_one_async(trigger, args).await?;
        session.commit();
        Ok(())
    }

    async fn fire_one_async(&self, trigger: T, args: Args) -> MachineResult<()> {
        match self.prepare(trigger, args)? {
            Prepared::Run(plan) => engine::execute_async(&plan, &self.shared.storage).await,
            Prepared::Unhandled {
                state,
                trigger,
                error,
            } => {
                let handler = self.shared.events.read().unhandled();
                match handler {
                    Some(handler) => {
                        warn!(state = ?state, trigger = ?trigger, %error, "unhandled trigger");
                        handler
                            .invoke_async(&state, &trigger, error.unmet_guards())
                            .await;
                        Ok(())
                    }
                    None => Err(error.into()),
                }
            }
        }
    }

    /// Validate, resolve and plan a fire. Runs guards and dynamic
    /// selectors; no lock is held while they execute.
    fn prepare(&self, trigger: T, args: Args) -> MachineResult<Prepared<S, T>> {
        self.shared.signatures.read().validate(&trigger, &args)?;

        let source = self.state();
        debug!(state = ?source, trigger = ?trigger, args = args.len(), "firing trigger");

        let levels = self.shared.graph.read().candidates_by_level(&source, &trigger);
        let resolved = match resolve(levels, &source, &trigger, &args) {
            Ok(resolved) => resolved,
            Err(error @ ResolutionError::Ambiguous { .. }) => return Err(error.into()),
            Err(error) => {
                return Ok(Prepared::Unhandled {
                    state: source,
                    trigger,
                    error,
                })
            }
        };

        let route = match resolved.behavior.kind() {
            BehaviorKind::Ignored => {
                debug!(state = ?source, trigger = ?trigger, "trigger ignored");
                return Ok(Prepared::Run(Plan::empty()));
            }
            BehaviorKind::Internal { action, .. } => {
                return Ok(Prepared::Run(Plan::internal(
                    source,
                    trigger,
                    args,
                    action.clone(),
                )));
            }
            BehaviorKind::Fixed {
                destination,
                reentry,
            } => Route {
                source,
                destination: destination.clone(),
                reentry: *reentry,
            },
            BehaviorKind::Dynamic { selector, .. } => {
                let destination = selector(&args);
                debug!(destination = ?destination, "dynamic destination selected");
                Route {
                    source,
                    destination,
                    reentry: false,
                }
            }
        };

        let plan = {
            let graph = self.shared.graph.read();
            let events = self.shared.events.read();
            Plan::transition(&graph, &events, route, trigger, args)?
        };
        Ok(Prepared::Run(plan))
    }

    // Activation

    /// Run activate actions from the outermost ancestor of the current state
    /// inward. A no-op when already activated.
    pub fn activate(&self) -> MachineResult<()> {
        if self.is_activated() {
            return Ok(());
        }
        let state = self.state();
        let path = self.shared.graph.read().activation_path(&state);
        engine::run_lifecycle(&path, "OnActivate", "Activate [activate_async]")?;
        self.shared.activated.store(true, Ordering::Release);
        Ok(())
    }

    pub async fn activate_async(&self) {
        if self.is_activated() {
            return;
        }
        let state = self.state();
        let path = self.shared.graph.read().activation_path(&state);
        engine::run_lifecycle_async(&path, "OnActivate").await;
        self.shared.activated.store(true, Ordering::Release);
    }

    /// Run deactivate actions from the current state outward. A no-op when
    /// not activated.
    pub fn deactivate(&self) -> MachineResult<()> {
        if !self.is_activated() {
            return Ok(());
        }
        let state = self.state();
        let path = self.shared.graph.read().deactivation_path(&state);
        engine::run_lifecycle(&path, "OnDeactivate", "Deactivate [deactivate_async]")?;
        self.shared.activated.store(false, Ordering::Release);
        Ok(())
    }

    pub async fn deactivate_async(&self) {
        if !self.is_activated() {
            return;
        }
        let state = self.state();
        let path = self.shared.graph.read().deactivation_path(&state);
        engine::run_lifecycle_async(&path, "OnDeactivate").await;
        self.shared.activated.store(false, Ordering::Release);
    }
}

impl<S: State, T: Trigger> fmt::Debug for StateMachine<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state())
            .field("firing_mode", &self.firing_mode())
            .field("activated", &self.is_activated())
            .finish()
    }
}
