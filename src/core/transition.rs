//! The value describing one resolved move through the state graph.

use super::args::Args;

/// Record of a transition handed to actions and notification callbacks.
///
/// Transitions are produced per fire (and per chained initial hop) and
/// discarded once the fire completes.
///
/// # Example
///
/// ```rust
/// use statehouse::{StateMachine, Transition};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Light { Off, On }
///
/// let seen: Arc<Mutex<Vec<(Light, Light)>>> = Arc::default();
/// let sink = Arc::clone(&seen);
///
/// let machine = StateMachine::new(Light::Off);
/// machine.configure(Light::Off).permit("flip", Light::On).unwrap();
/// machine.on_transitioned(move |t: &Transition<Light, &str>| {
///     sink.lock().unwrap().push((*t.source(), *t.destination()));
/// });
///
/// machine.fire("flip").unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![(Light::Off, Light::On)]);
/// ```
#[derive(Clone, Debug)]
pub struct Transition<S, T> {
    source: S,
    destination: S,
    trigger: T,
    args: Args,
    initial: bool,
}

impl<S: PartialEq, T> Transition<S, T> {
    /// A transition caused by an externally fired trigger.
    pub fn new(source: S, destination: S, trigger: T, args: Args) -> Self {
        Self {
            source,
            destination,
            trigger,
            args,
            initial: false,
        }
    }

    /// A hop chained internally by an initial-transition declaration.
    pub fn initial(source: S, destination: S, trigger: T, args: Args) -> Self {
        Self {
            source,
            destination,
            trigger,
            args,
            initial: true,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &S {
        &self.destination
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Arguments supplied when the trigger was fired.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// True when source and destination are the same state.
    pub fn is_reentry(&self) -> bool {
        self.source == self.destination
    }

    /// True for hops produced by initial-transition chaining.
    pub fn is_initial(&self) -> bool {
        self.initial
    }
}
