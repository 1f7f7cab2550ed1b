//! The configuration graph: an arena of state nodes linked by superstate keys.
//!
//! Nodes are looked up by key equality. Substates are never stored; they are
//! recomputed from the superstate links, so the graph carries no ownership
//! cycles and the superstate relation is the single source of truth. The
//! relation is kept acyclic by [`StateGraph::set_superstate`].

pub mod behavior;
pub mod node;
pub mod resolve;

pub use behavior::{BehaviorKind, Selector, TriggerBehavior};
pub use node::{Described, EntryAction, StateNode};
pub use resolve::{resolve, Level, Permission, ResolutionError, Resolved};

use crate::builder::error::ConfigurationError;
use crate::core::state::render;
use crate::core::{State, Trigger};
use crate::effects::{LifecycleAction, TransitionAction};
use crate::reflection::{
    DynamicTransitionInfo, EntryActionInfo, FixedTransitionInfo, IgnoredTriggerInfo,
    InternalTransitionInfo, StateInfo, StateMachineInfo,
};

/// Arena of configured states.
pub struct StateGraph<S, T> {
    nodes: Vec<StateNode<S, T>>,
}

impl<S: State, T: Trigger> Default for StateGraph<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, T: Trigger> StateGraph<S, T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// The node for `state`, if it has been configured or referenced.
    pub fn node(&self, state: &S) -> Option<&StateNode<S, T>> {
        self.nodes.iter().find(|node| node.state() == state)
    }

    /// The node for `state`, created on first reference.
    pub fn ensure(&mut self, state: &S) -> &mut StateNode<S, T> {
        let index = match self.nodes.iter().position(|node| node.state() == state) {
            Some(index) => index,
            None => {
                self.nodes.push(StateNode::new(state.clone()));
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[index]
    }

    /// Every known state, in configuration order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.nodes.iter().map(StateNode::state)
    }

    /// Direct superstate of `state`.
    pub fn superstate_of(&self, state: &S) -> Option<&S> {
        self.node(state).and_then(StateNode::superstate)
    }

    /// `state` followed by its ancestors, innermost first.
    pub fn ancestry(&self, state: &S) -> Vec<S> {
        let mut chain = vec![state.clone()];
        let mut cursor = self.superstate_of(state);
        while let Some(parent) = cursor {
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            cursor = self.superstate_of(parent);
        }
        chain
    }

    /// True when `state` equals `ancestor` or is a transitive substate of it.
    pub fn includes(&self, ancestor: &S, state: &S) -> bool {
        self.ancestry(state).contains(ancestor)
    }

    /// True when `descendant` is below `ancestor` at any depth.
    pub fn is_strict_descendant(&self, descendant: &S, ancestor: &S) -> bool {
        descendant != ancestor && self.includes(ancestor, descendant)
    }

    /// Direct substates, in configuration order.
    pub fn substates(&self, state: &S) -> Vec<S> {
        self.nodes
            .iter()
            .filter(|node| node.superstate() == Some(state))
            .map(|node| node.state().clone())
            .collect()
    }

    /// Link `state` under `superstate`, rejecting any link that would make a
    /// state its own ancestor.
    pub fn set_superstate(&mut self, state: &S, superstate: &S) -> Result<(), ConfigurationError> {
        if self.includes(state, superstate) {
            return Err(ConfigurationError::CyclicSuperstate {
                state: render(state),
                superstate: render(superstate),
            });
        }

        self.ensure(superstate);
        self.ensure(state).superstate = Some(superstate.clone());
        Ok(())
    }

    /// Declare the substate entered automatically after `state`. At most once
    /// per state; the target is validated when a fire enters `state`.
    pub fn set_initial_transition(&mut self, state: &S, target: &S) -> Result<(), ConfigurationError> {
        if state == target {
            return Err(ConfigurationError::InitialTransitionToSelf {
                state: render(state),
            });
        }

        let node = self.ensure(state);
        if node.initial_transition.is_some() {
            return Err(ConfigurationError::DuplicateInitialTransition {
                state: render(state),
            });
        }
        node.initial_transition = Some(target.clone());
        self.ensure(target);
        Ok(())
    }

    /// Declared initial target of `state`, checked to be a strict descendant.
    pub fn initial_target(&self, state: &S) -> Result<Option<S>, ConfigurationError> {
        let Some(target) = self.node(state).and_then(StateNode::initial_transition) else {
            return Ok(None);
        };

        if !self.is_strict_descendant(target, state) {
            return Err(ConfigurationError::InitialTransitionNotDescendant {
                state: render(state),
                target: render(target),
            });
        }
        Ok(Some(target.clone()))
    }

    /// Append a behavior to `state`, creating a fixed destination on reference.
    pub fn add_behavior(&mut self, state: &S, behavior: TriggerBehavior<S, T>) {
        if let BehaviorKind::Fixed { destination, .. } = behavior.kind() {
            let destination = destination.clone();
            self.ensure(&destination);
        }
        self.ensure(state).add_behavior(behavior);
    }

    /// Exit actions of `state`, in registration order.
    pub fn exit_actions(&self, state: &S) -> Vec<Described<TransitionAction<S, T>>> {
        self.node(state)
            .map(|node| node.exit_actions.clone())
            .unwrap_or_default()
    }

    /// Entry actions of `state` that apply to `trigger`.
    pub fn entry_actions(&self, state: &S, trigger: &T) -> Vec<EntryAction<S, T>> {
        self.node(state)
            .map(|node| {
                node.entry_actions
                    .iter()
                    .filter(|entry| entry.applies_to(trigger))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Activate actions along the ancestry of `state`, outermost state first.
    pub fn activation_path(&self, state: &S) -> Vec<(S, Vec<Described<LifecycleAction>>)> {
        let mut path: Vec<_> = self
            .ancestry(state)
            .into_iter()
            .map(|s| {
                let actions = self
                    .node(&s)
                    .map(|node| node.activate_actions.clone())
                    .unwrap_or_default();
                (s, actions)
            })
            .collect();
        path.reverse();
        path
    }

    /// Deactivate actions along the ancestry of `state`, innermost state first.
    pub fn deactivation_path(&self, state: &S) -> Vec<(S, Vec<Described<LifecycleAction>>)> {
        self.ancestry(state)
            .into_iter()
            .map(|s| {
                let actions = self
                    .node(&s)
                    .map(|node| node.deactivate_actions.clone())
                    .unwrap_or_default();
                (s, actions)
            })
            .collect()
    }

    /// Behaviors for `trigger` at each level of the ancestry of `state` that
    /// configures it, innermost first.
    pub fn candidates_by_level(&self, state: &S, trigger: &T) -> Vec<Level<S, T>> {
        self.ancestry(state)
            .into_iter()
            .filter_map(|owner| {
                let behaviors = self.node(&owner)?.behaviors_for(trigger).to_vec();
                if behaviors.is_empty() {
                    None
                } else {
                    Some(Level { owner, behaviors })
                }
            })
            .collect()
    }

    /// Every trigger configured anywhere along the ancestry of `state`,
    /// innermost first, without duplicates.
    pub fn triggers_in_chain(&self, state: &S) -> Vec<T> {
        let mut triggers: Vec<T> = Vec::new();
        for owner in self.ancestry(state) {
            let Some(node) = self.node(&owner) else {
                continue;
            };
            for trigger in node.triggers() {
                if !triggers.contains(trigger) {
                    triggers.push(trigger.clone());
                }
            }
        }
        triggers
    }

    /// Snapshot of the configuration. Never evaluates guards or selectors.
    pub fn info(&self, current_state: S) -> StateMachineInfo<S, T> {
        StateMachineInfo {
            current_state,
            states: self.nodes.iter().map(|node| self.state_info(node)).collect(),
        }
    }

    fn state_info(&self, node: &StateNode<S, T>) -> StateInfo<S, T> {
        let mut info = StateInfo {
            state: node.state().clone(),
            superstate: node.superstate().cloned(),
            substates: self.substates(node.state()),
            initial_transition: node.initial_transition().cloned(),
            activate_actions: node.activate_actions.iter().map(|a| a.info.clone()).collect(),
            entry_actions: node
                .entry_actions
                .iter()
                .map(|entry| EntryActionInfo {
                    action: entry.info.clone(),
                    from_trigger: entry.from_trigger.clone(),
                })
                .collect(),
            exit_actions: node.exit_actions.iter().map(|a| a.info.clone()).collect(),
            deactivate_actions: node.deactivate_actions.iter().map(|a| a.info.clone()).collect(),
            fixed_transitions: Vec::new(),
            internal_transitions: Vec::new(),
            ignored_triggers: Vec::new(),
            dynamic_transitions: Vec::new(),
        };

        for (trigger, behaviors) in &node.behaviors {
            for behavior in behaviors {
                let guards = behavior.guard().descriptions();
                match behavior.kind() {
                    BehaviorKind::Fixed {
                        destination,
                        reentry,
                    } => info.fixed_transitions.push(FixedTransitionInfo {
                        trigger: trigger.clone(),
                        destination: destination.clone(),
                        guards,
                        reentry: *reentry,
                    }),
                    BehaviorKind::Internal { info: action, .. } => {
                        info.internal_transitions.push(InternalTransitionInfo {
                            trigger: trigger.clone(),
                            action: action.clone(),
                            guards,
                        })
                    }
                    BehaviorKind::Ignored => info.ignored_triggers.push(IgnoredTriggerInfo {
                        trigger: trigger.clone(),
                        guards,
                    }),
                    BehaviorKind::Dynamic { description, .. } => {
                        info.dynamic_transitions.push(DynamicTransitionInfo {
                            trigger: trigger.clone(),
                            selector: description.clone(),
                            guards,
                        })
                    }
                }
            }
        }

        info
    }
}
