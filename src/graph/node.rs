//! A single state in the configuration graph.

use super::behavior::TriggerBehavior;
use crate::effects::{LifecycleAction, TransitionAction};
use crate::reflection::InvocationInfo;

/// An action together with its introspection description.
pub struct Described<A> {
    pub action: A,
    pub info: InvocationInfo,
}

impl<A: Clone> Clone for Described<A> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            info: self.info.clone(),
        }
    }
}

/// Entry action, optionally restricted to a single trigger.
pub struct EntryAction<S, T> {
    pub action: TransitionAction<S, T>,
    pub from_trigger: Option<T>,
    pub info: InvocationInfo,
}

impl<S, T: PartialEq> EntryAction<S, T> {
    pub fn applies_to(&self, trigger: &T) -> bool {
        self.from_trigger.as_ref().map_or(true, |t| t == trigger)
    }
}

impl<S, T: Clone> Clone for EntryAction<S, T> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            from_trigger: self.from_trigger.clone(),
            info: self.info.clone(),
        }
    }
}

/// Configuration of one state. Substates are derived from the superstate
/// links of other nodes and never stored here.
pub struct StateNode<S, T> {
    pub(crate) state: S,
    pub(crate) superstate: Option<S>,
    pub(crate) initial_transition: Option<S>,
    pub(crate) activate_actions: Vec<Described<LifecycleAction>>,
    pub(crate) deactivate_actions: Vec<Described<LifecycleAction>>,
    pub(crate) entry_actions: Vec<EntryAction<S, T>>,
    pub(crate) exit_actions: Vec<Described<TransitionAction<S, T>>>,
    pub(crate) behaviors: Vec<(T, Vec<TriggerBehavior<S, T>>)>,
}

impl<S, T: PartialEq> StateNode<S, T> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            superstate: None,
            initial_transition: None,
            activate_actions: Vec::new(),
            deactivate_actions: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            behaviors: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn superstate(&self) -> Option<&S> {
        self.superstate.as_ref()
    }

    pub fn initial_transition(&self) -> Option<&S> {
        self.initial_transition.as_ref()
    }

    /// Behaviors configured for `trigger`, in declaration order.
    pub fn behaviors_for(&self, trigger: &T) -> &[TriggerBehavior<S, T>] {
        self.behaviors
            .iter()
            .find(|(t, _)| t == trigger)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn behaviors_for_mut(&mut self, trigger: &T) -> Option<&mut Vec<TriggerBehavior<S, T>>> {
        self.behaviors
            .iter_mut()
            .find(|(t, _)| t == trigger)
            .map(|(_, list)| list)
    }

    pub(crate) fn add_behavior(&mut self, behavior: TriggerBehavior<S, T>)
    where
        T: Clone,
    {
        let position = self
            .behaviors
            .iter()
            .position(|(t, _)| t == behavior.trigger());
        match position {
            Some(index) => self.behaviors[index].1.push(behavior),
            None => {
                let trigger = behavior.trigger().clone();
                self.behaviors.push((trigger, vec![behavior]));
            }
        }
    }

    /// Triggers with at least one configured behavior, in first-configured order.
    pub fn triggers(&self) -> impl Iterator<Item = &T> {
        self.behaviors.iter().map(|(t, _)| t)
    }
}
