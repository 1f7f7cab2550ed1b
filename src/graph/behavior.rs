//! Trigger behaviors configured on a state.

use crate::core::{Args, Guard};
use crate::effects::TransitionAction;
use crate::reflection::InvocationInfo;
use std::fmt;
use std::sync::Arc;

/// Computes the destination of a dynamic transition from trigger arguments.
pub type Selector<S> = Arc<dyn Fn(&Args) -> S + Send + Sync>;

/// What happens when a behavior is selected.
pub enum BehaviorKind<S, T> {
    /// Move to `destination`. Reentrant behaviors always target the state
    /// that configured them.
    Fixed { destination: S, reentry: bool },
    /// Run `action` without leaving the state.
    Internal {
        action: TransitionAction<S, T>,
        info: InvocationInfo,
    },
    /// Accept the trigger and do nothing.
    Ignored,
    /// Destination computed from the arguments after the guard passed.
    Dynamic {
        selector: Selector<S>,
        description: String,
    },
}

impl<S: Clone, T> Clone for BehaviorKind<S, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed {
                destination,
                reentry,
            } => Self::Fixed {
                destination: destination.clone(),
                reentry: *reentry,
            },
            Self::Internal { action, info } => Self::Internal {
                action: action.clone(),
                info: info.clone(),
            },
            Self::Ignored => Self::Ignored,
            Self::Dynamic {
                selector,
                description,
            } => Self::Dynamic {
                selector: Arc::clone(selector),
                description: description.clone(),
            },
        }
    }
}

/// A guarded behavior for one trigger.
pub struct TriggerBehavior<S, T> {
    trigger: T,
    guard: Guard,
    kind: BehaviorKind<S, T>,
}

impl<S, T> TriggerBehavior<S, T> {
    pub fn new(trigger: T, guard: Guard, kind: BehaviorKind<S, T>) -> Self {
        Self {
            trigger,
            guard,
            kind,
        }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    pub fn kind(&self) -> &BehaviorKind<S, T> {
        &self.kind
    }

    /// Override the description of an internal action or dynamic selector.
    ///
    /// Returns false for kinds that carry no description.
    pub(crate) fn describe(&mut self, text: &str) -> bool {
        match &mut self.kind {
            BehaviorKind::Internal { info, .. } => {
                info.set_description(text);
                true
            }
            BehaviorKind::Dynamic { description, .. } => {
                *description = text.to_string();
                true
            }
            BehaviorKind::Fixed { .. } | BehaviorKind::Ignored => false,
        }
    }
}

impl<S: Clone, T: Clone> Clone for TriggerBehavior<S, T> {
    fn clone(&self) -> Self {
        Self {
            trigger: self.trigger.clone(),
            guard: self.guard.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl<S: fmt::Debug, T: fmt::Debug> fmt::Debug for TriggerBehavior<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("TriggerBehavior");
        out.field("trigger", &self.trigger)
            .field("guards", &self.guard.descriptions());
        match &self.kind {
            BehaviorKind::Fixed {
                destination,
                reentry,
            } => out.field("destination", destination).field("reentry", reentry),
            BehaviorKind::Internal { info, .. } => out.field("internal", &info.description()),
            BehaviorKind::Ignored => out.field("ignored", &true),
            BehaviorKind::Dynamic { description, .. } => out.field("selector", description),
        };
        out.finish()
    }
}
