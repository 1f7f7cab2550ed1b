//! Key traits for states and triggers.
//!
//! The engine never inspects a key beyond equality and `Debug` rendering, so
//! any cloneable, comparable value works: plain enums, strings, integers or
//! caller-defined structs.

use std::fmt::Debug;

/// Identity of a state in the configuration graph.
///
/// Blanket-implemented for every type that is `Clone + PartialEq + Debug +
/// Send + Sync + 'static`; callers never implement it by hand.
///
/// # Example
///
/// ```rust
/// use statehouse::State;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// fn assert_state<S: State>(_: &S) {}
/// assert_state(&Door::Open);
/// assert_state(&"locked");
/// ```
pub trait State: Clone + PartialEq + Debug + Send + Sync + 'static {}

impl<S> State for S where S: Clone + PartialEq + Debug + Send + Sync + 'static {}

/// Identity of a trigger fired at the machine.
///
/// Same requirements as [`State`]; blanket-implemented.
pub trait Trigger: Clone + PartialEq + Debug + Send + Sync + 'static {}

impl<T> Trigger for T where T: Clone + PartialEq + Debug + Send + Sync + 'static {}

/// Render a key for error messages and logs.
pub(crate) fn render<K: Debug>(key: &K) -> String {
    format!("{:?}", key)
}
