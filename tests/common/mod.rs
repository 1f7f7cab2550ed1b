//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use parking_lot::Mutex;
use statehouse::Transition;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize)]
pub enum State {
    A,
    B,
    C,
    D,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize)]
pub enum Trigger {
    X,
    Y,
    Z,
}

/// Ordered record of callback invocations.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    /// Transition callback recording `label`.
    pub fn on(&self, label: &str) -> impl Fn(&Transition<State, Trigger>) + Send + Sync + 'static {
        let log = self.clone();
        let label = label.to_string();
        move |_: &Transition<State, Trigger>| log.push(label.clone())
    }

    /// Lifecycle callback recording `label`.
    pub fn lifecycle(&self, label: &str) -> impl Fn() + Send + Sync + 'static {
        let log = self.clone();
        let label = label.to_string();
        move || log.push(label.clone())
    }

    /// Transition callback recording `source->destination`.
    pub fn hops(&self) -> impl Fn(&Transition<State, Trigger>) + Send + Sync + 'static {
        let log = self.clone();
        move |t: &Transition<State, Trigger>| {
            log.push(format!("{:?}->{:?}", t.source(), t.destination()))
        }
    }
}
