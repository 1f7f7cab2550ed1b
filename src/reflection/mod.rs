//! Read-only introspection of a configured machine.
//!
//! [`StateMachine::info`](crate::StateMachine::info) produces a
//! [`StateMachineInfo`] describing every configured state without
//! evaluating a single guard or selector. The snapshot is serializable so a
//! diagnostic renderer can consume it as JSON.

mod info;

pub use info::{
    DynamicTransitionInfo, EntryActionInfo, FixedTransitionInfo, IgnoredTriggerInfo,
    InternalTransitionInfo, StateInfo, StateMachineInfo,
};

use serde::Serialize;

/// Placeholder used when no better description can be derived.
pub const DEFAULT_FUNCTION_DESCRIPTION: &str = "Function";

/// Best-effort human readable name for a callable type.
///
/// Named functions yield their last path segment; closures and other
/// anonymous callables yield [`DEFAULT_FUNCTION_DESCRIPTION`].
///
/// ```rust
/// use statehouse::reflection::callable_name;
///
/// fn open_valve() {}
///
/// fn name_of<F: Fn()>(_: &F) -> String {
///     callable_name::<F>()
/// }
///
/// assert_eq!(name_of(&open_valve), "open_valve");
/// assert_eq!(name_of(&|| {}), "Function");
/// ```
pub fn callable_name<F: ?Sized>() -> String {
    let full = std::any::type_name::<F>();
    if full.contains("{{closure}}") {
        return DEFAULT_FUNCTION_DESCRIPTION.to_string();
    }

    let without_generics = full.split('<').next().unwrap_or(full);
    match without_generics.rsplit("::").next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_FUNCTION_DESCRIPTION.to_string(),
    }
}

/// Description of a configured action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvocationInfo {
    description: String,
    is_async: bool,
}

impl InvocationInfo {
    pub fn new(description: impl Into<String>, is_async: bool) -> Self {
        Self {
            description: description.into(),
            is_async,
        }
    }

    /// Description derived from the callable type `F`.
    pub fn of<F: ?Sized>(is_async: bool) -> Self {
        Self::new(callable_name::<F>(), is_async)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub(crate) fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}
