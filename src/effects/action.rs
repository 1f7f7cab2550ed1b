//! Callback variants stored by the machine.
//!
//! Every callback kind is a closed `Sync | Async` union. Synchronous drivers
//! inspect the variant before running anything and refuse async callbacks;
//! the asynchronous drivers run both.

use crate::core::Transition;
use crate::effects::error::MachineError;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

type SyncLifecycleFn = dyn Fn() + Send + Sync;
type AsyncLifecycleFn = dyn Fn() -> BoxFuture<'static, ()> + Send + Sync;
type SyncTransitionFn<S, T> = dyn Fn(&Transition<S, T>) + Send + Sync;
type AsyncTransitionFn<S, T> = dyn Fn(Transition<S, T>) -> BoxFuture<'static, ()> + Send + Sync;
type SyncUnhandledFn<S, T> = dyn Fn(&S, &T, &[String]) + Send + Sync;
type AsyncUnhandledFn<S, T> = dyn Fn(S, T, Vec<String>) -> BoxFuture<'static, ()> + Send + Sync;

/// Activate and deactivate actions.
pub enum LifecycleAction {
    Sync(Arc<SyncLifecycleFn>),
    Async(Arc<AsyncLifecycleFn>),
}

impl LifecycleAction {
    pub fn from_fn<F>(action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(action))
    }

    pub fn from_async<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(action()) }))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    pub(crate) fn invoke(&self) -> Result<(), MachineError> {
        match self {
            Self::Sync(action) => {
                action();
                Ok(())
            }
            Self::Async(_) => Err(MachineError::async_required("lifecycle action")),
        }
    }

    pub(crate) async fn invoke_async(&self) {
        match self {
            Self::Sync(action) => action(),
            Self::Async(action) => action().await,
        }
    }
}

impl Clone for LifecycleAction {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(action) => Self::Sync(Arc::clone(action)),
            Self::Async(action) => Self::Async(Arc::clone(action)),
        }
    }
}

/// Entry, exit, internal-transition and notification callbacks.
pub enum TransitionAction<S, T> {
    Sync(Arc<SyncTransitionFn<S, T>>),
    Async(Arc<AsyncTransitionFn<S, T>>),
}

impl<S, T> TransitionAction<S, T>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn from_fn<F>(action: F) -> Self
    where
        F: Fn(&Transition<S, T>) + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(action))
    }

    pub fn from_async<F, Fut>(action: F) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Arc::new(
            move |transition: Transition<S, T>| -> BoxFuture<'static, ()> {
                Box::pin(action(transition))
            },
        ))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    pub(crate) fn invoke(&self, transition: &Transition<S, T>) -> Result<(), MachineError> {
        match self {
            Self::Sync(action) => {
                action(transition);
                Ok(())
            }
            Self::Async(_) => Err(MachineError::async_required("transition action")),
        }
    }

    pub(crate) async fn invoke_async(&self, transition: &Transition<S, T>) {
        match self {
            Self::Sync(action) => action(transition),
            Self::Async(action) => action(transition.clone()).await,
        }
    }
}

impl<S, T> Clone for TransitionAction<S, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(action) => Self::Sync(Arc::clone(action)),
            Self::Async(action) => Self::Async(Arc::clone(action)),
        }
    }
}

/// Callback receiving triggers that could not be resolved.
///
/// Arguments are the current state, the trigger and the unmet guard
/// descriptions (empty when nothing was configured for the trigger).
pub enum UnhandledAction<S, T> {
    Sync(Arc<SyncUnhandledFn<S, T>>),
    Async(Arc<AsyncUnhandledFn<S, T>>),
}

impl<S, T> UnhandledAction<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn from_fn<F>(action: F) -> Self
    where
        F: Fn(&S, &T, &[String]) + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(action))
    }

    pub fn from_async<F, Fut>(action: F) -> Self
    where
        F: Fn(S, T, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Arc::new(
            move |state: S, trigger: T, unmet: Vec<String>| -> BoxFuture<'static, ()> {
                Box::pin(action(state, trigger, unmet))
            },
        ))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    pub(crate) fn invoke(&self, state: &S, trigger: &T, unmet: &[String]) -> Result<(), MachineError> {
        match self {
            Self::Sync(action) => {
                action(state, trigger, unmet);
                Ok(())
            }
            Self::Async(_) => Err(MachineError::async_required("OnUnhandledTrigger")),
        }
    }

    pub(crate) async fn invoke_async(&self, state: &S, trigger: &T, unmet: &[String]) {
        match self {
            Self::Sync(action) => action(state, trigger, unmet),
            Self::Async(action) => action(state.clone(), trigger.clone(), unmet.to_vec()).await,
        }
    }
}

impl<S, T> Clone for UnhandledAction<S, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(action) => Self::Sync(Arc::clone(action)),
            Self::Async(action) => Self::Async(Arc::clone(action)),
        }
    }
}
