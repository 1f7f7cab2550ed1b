//! Notification registries.

use super::action::{TransitionAction, UnhandledAction};

/// Callbacks notified about transitions and unhandled triggers.
///
/// Transitioned callbacks run once per hop (including chained initial
/// hops); completed callbacks run once per fire with the fire's source and
/// the final state. A single unhandled-trigger handler may be registered;
/// registering another replaces it.
pub struct EventRegistry<S, T> {
    transitioned: Vec<TransitionAction<S, T>>,
    completed: Vec<TransitionAction<S, T>>,
    unhandled: Option<UnhandledAction<S, T>>,
}

impl<S, T> Default for EventRegistry<S, T> {
    fn default() -> Self {
        Self {
            transitioned: Vec::new(),
            completed: Vec::new(),
            unhandled: None,
        }
    }
}

impl<S, T> EventRegistry<S, T> {
    pub fn on_transitioned(&mut self, action: TransitionAction<S, T>) {
        self.transitioned.push(action);
    }

    pub fn on_transition_completed(&mut self, action: TransitionAction<S, T>) {
        self.completed.push(action);
    }

    pub fn on_unhandled_trigger(&mut self, action: UnhandledAction<S, T>) {
        self.unhandled = Some(action);
    }

    pub fn transitioned(&self) -> Vec<TransitionAction<S, T>> {
        self.transitioned.clone()
    }

    pub fn completed(&self) -> Vec<TransitionAction<S, T>> {
        self.completed.clone()
    }

    pub fn unhandled(&self) -> Option<UnhandledAction<S, T>> {
        self.unhandled.clone()
    }
}
