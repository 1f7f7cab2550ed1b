//! Current-state storage and the working state of an in-progress fire.
//!
//! While a fire runs, every hop writes the working state held by the active
//! [`Session`]; readers see that working state. The backing store (internal
//! cell or the caller's mutator) is written once, when the outermost fire
//! commits.

use parking_lot::Mutex;

type Accessor<S> = Box<dyn Fn() -> S + Send + Sync>;
type Mutator<S> = Box<dyn Fn(S) + Send + Sync>;

enum Backend<S> {
    Internal(Mutex<S>),
    External {
        accessor: Accessor<S>,
        mutator: Mutator<S>,
    },
}

struct Session<S> {
    state: S,
    dirty: bool,
}

pub struct StateStorage<S> {
    backend: Backend<S>,
    session: Mutex<Option<Session<S>>>,
}

impl<S: Clone + Send + 'static> StateStorage<S> {
    pub fn internal(initial: S) -> Self {
        Self {
            backend: Backend::Internal(Mutex::new(initial)),
            session: Mutex::new(None),
        }
    }

    pub fn external<A, M>(accessor: A, mutator: M) -> Self
    where
        A: Fn() -> S + Send + Sync + 'static,
        M: Fn(S) + Send + Sync + 'static,
    {
        Self {
            backend: Backend::External {
                accessor: Box::new(accessor),
                mutator: Box::new(mutator),
            },
            session: Mutex::new(None),
        }
    }

    fn stored(&self) -> S {
        match &self.backend {
            Backend::Internal(cell) => cell.lock().clone(),
            Backend::External { accessor, .. } => accessor(),
        }
    }

    /// The working state during a fire, otherwise the stored state.
    pub fn current(&self) -> S {
        let working = self.session.lock().as_ref().map(|s| s.state.clone());
        match working {
            Some(state) => state,
            None => self.stored(),
        }
    }

    pub fn in_session(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Start a session seeded from the stored state.
    pub fn begin(&self) -> SessionGuard<'_, S> {
        let state = self.stored();
        *self.session.lock() = Some(Session {
            state,
            dirty: false,
        });
        SessionGuard {
            storage: self,
            finished: false,
        }
    }

    /// Move the working state; a no-op outside a session.
    pub fn settle(&self, state: S) {
        if let Some(session) = self.session.lock().as_mut() {
            session.state = state;
            session.dirty = true;
        }
    }

    fn finish(&self, commit: bool) {
        let session = self.session.lock().take();
        let Some(session) = session else {
            return;
        };
        if !commit || !session.dirty {
            return;
        }
        match &self.backend {
            Backend::Internal(cell) => *cell.lock() = session.state,
            Backend::External { mutator, .. } => mutator(session.state),
        }
    }
}

/// Ends the session on drop, discarding the working state unless committed.
pub struct SessionGuard<'a, S: Clone + Send + 'static> {
    storage: &'a StateStorage<S>,
    finished: bool,
}

impl<S: Clone + Send + 'static> SessionGuard<'_, S> {
    /// Write the working state to the backing store if any hop moved it.
    pub fn commit(mut self) {
        self.finished = true;
        self.storage.finish(true);
    }
}

impl<S: Clone + Send + 'static> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            self.storage.finish(false);
        }
    }
}
