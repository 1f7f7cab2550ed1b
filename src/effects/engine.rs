//! Transition execution.
//!
//! A resolved behavior is turned into a [`Plan`]: an ordered list of
//! [`Step`]s computed from the graph before any callback runs. The graph is
//! therefore never locked while user code executes, and the synchronous
//! driver can reject asynchronous callbacks before a single step has run.
//!
//! For a transition from `A` to `B` where `B` declares the initial
//! transition `C`, the plan reads:
//!
//! ```text
//! Exit A, Settle B, Notify A->B, Enter B, Checkpoint B,
//! Settle C, Notify B->C (initial), Enter C, Checkpoint C,
//! Complete A->C
//! ```

use super::action::{LifecycleAction, TransitionAction};
use super::error::{MachineError, MachineResult};
use super::events::EventRegistry;
use super::storage::StateStorage;
use crate::builder::error::ConfigurationError;
use crate::core::state::render;
use crate::core::{Args, State, Transition, Trigger};
use crate::graph::{Described, EntryAction, StateGraph};
use tracing::{debug, trace};

/// One unit of work in a plan.
pub(crate) enum Step<S, T> {
    Exit {
        state: S,
        actions: Vec<Described<TransitionAction<S, T>>>,
        transition: Transition<S, T>,
    },
    Settle(S),
    Notify(Transition<S, T>),
    Enter {
        state: S,
        actions: Vec<EntryAction<S, T>>,
        transition: Transition<S, T>,
    },
    /// Abandon the remaining hops if a nested immediate fire moved the
    /// working state away from the expected one.
    Checkpoint(S),
    Internal {
        state: S,
        action: TransitionAction<S, T>,
        transition: Transition<S, T>,
    },
    Complete {
        source: S,
        trigger: T,
        args: Args,
    },
}

/// Source and destination of a state-changing transition.
pub(crate) struct Route<S> {
    pub source: S,
    pub destination: S,
    /// Explicitly reentrant behavior; `destination` is the state that
    /// declared it.
    pub reentry: bool,
}

pub(crate) struct Plan<S, T> {
    steps: Vec<Step<S, T>>,
    transitioned: Vec<TransitionAction<S, T>>,
    completed: Vec<TransitionAction<S, T>>,
}

impl<S: State, T: Trigger> Plan<S, T> {
    /// Plan for an ignored trigger.
    pub fn empty() -> Self {
        Self {
            steps: Vec::new(),
            transitioned: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Plan for an internal transition: only the action runs.
    pub fn internal(state: S, trigger: T, args: Args, action: TransitionAction<S, T>) -> Self {
        let transition = Transition::new(state.clone(), state.clone(), trigger, args);
        Self {
            steps: vec![Step::Internal {
                state,
                action,
                transition,
            }],
            transitioned: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Plan for a state-changing transition, including every initial hop.
    ///
    /// Initial targets are validated here, so a misconfigured chain fails
    /// before any callback has run.
    pub fn transition(
        graph: &StateGraph<S, T>,
        events: &EventRegistry<S, T>,
        route: Route<S>,
        trigger: T,
        args: Args,
    ) -> Result<Self, ConfigurationError> {
        let Route {
            source,
            destination,
            reentry,
        } = route;
        let transition = Transition::new(
            source.clone(),
            destination.clone(),
            trigger.clone(),
            args.clone(),
        );
        let mut steps = Vec::new();
        let completion_source;

        if source == destination {
            steps.push(exit(graph, &source, &transition));
            steps.push(Step::Settle(destination.clone()));
            steps.push(Step::Notify(transition.clone()));
            steps.push(enter(graph, &destination, &transition));
            completion_source = source.clone();
        } else if reentry {
            for state in graph.ancestry(&source) {
                if state == destination {
                    break;
                }
                steps.push(exit(graph, &state, &transition));
            }
            let again = Transition::new(
                destination.clone(),
                destination.clone(),
                trigger.clone(),
                args.clone(),
            );
            steps.push(exit(graph, &destination, &again));
            steps.push(Step::Settle(destination.clone()));
            steps.push(Step::Notify(again.clone()));
            steps.push(enter(graph, &destination, &again));
            completion_source = destination.clone();
        } else {
            for state in graph.ancestry(&source) {
                if graph.includes(&state, &destination) {
                    break;
                }
                steps.push(exit(graph, &state, &transition));
            }
            steps.push(Step::Settle(destination.clone()));
            steps.push(Step::Notify(transition.clone()));
            let mut entering: Vec<S> = graph
                .ancestry(&destination)
                .into_iter()
                .take_while(|state| !graph.includes(state, &source))
                .collect();
            entering.reverse();
            for state in &entering {
                steps.push(enter(graph, state, &transition));
            }
            completion_source = source.clone();
        }
        steps.push(Step::Checkpoint(destination.clone()));

        let mut parent = destination;
        while let Some(target) = graph.initial_target(&parent)? {
            let notified = Transition::initial(
                parent.clone(),
                target.clone(),
                trigger.clone(),
                args.clone(),
            );
            let hop = Transition::initial(
                source.clone(),
                target.clone(),
                trigger.clone(),
                args.clone(),
            );
            steps.push(Step::Settle(target.clone()));
            steps.push(Step::Notify(notified));

            let mut entering: Vec<S> = graph
                .ancestry(&target)
                .into_iter()
                .take_while(|state| *state != parent)
                .collect();
            entering.reverse();
            for state in &entering {
                steps.push(enter(graph, state, &hop));
            }
            steps.push(Step::Checkpoint(target.clone()));
            parent = target;
        }

        steps.push(Step::Complete {
            source: completion_source,
            trigger,
            args,
        });

        Ok(Self {
            steps,
            transitioned: events.transitioned(),
            completed: events.completed(),
        })
    }

    /// The error a synchronous driver must return for this plan, if any
    /// callback it would run is asynchronous.
    pub fn async_requirement(&self) -> Option<MachineError> {
        for step in &self.steps {
            let context = match step {
                Step::Exit { state, actions, .. } if actions.iter().any(|a| a.action.is_async()) => {
                    format!("OnExit event for '{}' state", render(state))
                }
                Step::Enter { state, actions, .. } if actions.iter().any(|a| a.action.is_async()) => {
                    format!("OnEntry event for '{}' state", render(state))
                }
                Step::Internal { state, action, .. } if action.is_async() => {
                    format!("internal transition for '{}' state", render(state))
                }
                Step::Notify(_) if self.transitioned.iter().any(TransitionAction::is_async) => {
                    "OnTransitioned event".to_string()
                }
                Step::Complete { .. } if self.completed.iter().any(TransitionAction::is_async) => {
                    "OnTransitionCompleted event".to_string()
                }
                _ => continue,
            };
            return Some(MachineError::async_required(&context));
        }
        None
    }

    fn completion_index(&self) -> usize {
        self.steps
            .iter()
            .position(|step| matches!(step, Step::Complete { .. }))
            .unwrap_or(self.steps.len())
    }
}

fn exit<S: State, T: Trigger>(
    graph: &StateGraph<S, T>,
    state: &S,
    transition: &Transition<S, T>,
) -> Step<S, T> {
    Step::Exit {
        state: state.clone(),
        actions: graph.exit_actions(state),
        transition: transition.clone(),
    }
}

fn enter<S: State, T: Trigger>(
    graph: &StateGraph<S, T>,
    state: &S,
    transition: &Transition<S, T>,
) -> Step<S, T> {
    Step::Enter {
        state: state.clone(),
        actions: graph.entry_actions(state, transition.trigger()),
        transition: transition.clone(),
    }
}

/// Run a plan, refusing it up front if any callback is asynchronous.
pub(crate) fn execute<S: State, T: Trigger>(
    plan: &Plan<S, T>,
    storage: &StateStorage<S>,
) -> MachineResult<()> {
    if let Some(error) = plan.async_requirement() {
        return Err(error);
    }

    let mut index = 0;
    while let Some(step) = plan.steps.get(index) {
        index += 1;
        match step {
            Step::Exit {
                state,
                actions,
                transition,
            } => {
                trace!(state = ?state, "exiting");
                for exit in actions {
                    exit.action.invoke(transition)?;
                }
            }
            Step::Settle(state) => storage.settle(state.clone()),
            Step::Notify(transition) => {
                for callback in &plan.transitioned {
                    callback.invoke(transition)?;
                }
            }
            Step::Enter {
                state,
                actions,
                transition,
            } => {
                trace!(state = ?state, "entering");
                for entry in actions {
                    entry.action.invoke(transition)?;
                }
            }
            Step::Checkpoint(expected) => {
                if storage.current() != *expected {
                    debug!(expected = ?expected, "state moved by nested fire, completing early");
                    index = plan.completion_index();
                }
            }
            Step::Internal {
                state,
                action,
                transition,
            } => {
                trace!(state = ?state, "internal transition");
                action.invoke(transition)?;
            }
            Step::Complete {
                source,
                trigger,
                args,
            } => {
                let completed =
                    Transition::new(source.clone(), storage.current(), trigger.clone(), args.clone());
                for callback in &plan.completed {
                    callback.invoke(&completed)?;
                }
            }
        }
    }
    Ok(())
}

/// Run a plan, awaiting asynchronous callbacks in order.
pub(crate) async fn execute_async<S: State, T: Trigger>(
    plan: &Plan<S, T>,
    storage: &StateStorage<S>,
) -> MachineResult<()> {
    let mut index = 0;
    while let Some(step) = plan.steps.get(index) {
        index += 1;
        match step {
            Step::Exit {
                state,
                actions,
                transition,
            } => {
                trace!(state = ?state, "exiting");
                for exit in actions {
                    exit.action.invoke_async(transition).await;
                }
            }
            Step::Settle(state) => storage.settle(state.clone()),
            Step::Notify(transition) => {
                for callback in &plan.transitioned {
                    callback.invoke_async(transition).await;
                }
            }
            Step::Enter {
                state,
                actions,
                transition,
            } => {
                trace!(state = ?state, "entering");
                for entry in actions {
                    entry.action.invoke_async(transition).await;
                }
            }
            Step::Checkpoint(expected) => {
                let current = storage.current();
                if current != *expected {
                    debug!(expected = ?expected, current = ?current, "state moved by nested fire, completing early");
                    index = plan.completion_index();
                }
            }
            Step::Internal {
                state,
                action,
                transition,
            } => {
                trace!(state = ?state, "internal transition");
                action.invoke_async(transition).await;
            }
            Step::Complete {
                source,
                trigger,
                args,
            } => {
                let completed =
                    Transition::new(source.clone(), storage.current(), trigger.clone(), args.clone());
                for callback in &plan.completed {
                    callback.invoke_async(&completed).await;
                }
            }
        }
    }
    Ok(())
}

/// Activate or deactivate actions for a path of states.
pub(crate) type LifecyclePath<S> = Vec<(S, Vec<Described<LifecycleAction>>)>;

/// Run lifecycle actions synchronously, refusing the path up front if any
/// action is asynchronous.
pub(crate) fn run_lifecycle<S: State>(
    path: &LifecyclePath<S>,
    event: &str,
    entry_point: &str,
) -> MachineResult<()> {
    let blocked = path
        .iter()
        .find(|(_, actions)| actions.iter().any(|a| a.action.is_async()));
    if let Some((state, _)) = blocked {
        return Err(MachineError::async_activation_required(
            &format!("{event} event for '{}' state", render(state)),
            entry_point,
        ));
    }

    for (state, actions) in path {
        trace!(state = ?state, event, "running lifecycle actions");
        for described in actions {
            described.action.invoke()?;
        }
    }
    Ok(())
}

pub(crate) async fn run_lifecycle_async<S: State>(path: &LifecyclePath<S>, event: &str) {
    for (state, actions) in path {
        trace!(state = ?state, event, "running lifecycle actions");
        for described in actions {
            described.action.invoke_async().await;
        }
    }
}
