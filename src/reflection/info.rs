//! Snapshot types describing a configured state graph.

use super::InvocationInfo;
use serde::Serialize;

/// Entry action plus the trigger it is restricted to, if any.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryActionInfo<T> {
    pub action: InvocationInfo,
    pub from_trigger: Option<T>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FixedTransitionInfo<S, T> {
    pub trigger: T,
    pub destination: S,
    pub guards: Vec<String>,
    pub reentry: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InternalTransitionInfo<T> {
    pub trigger: T,
    pub action: InvocationInfo,
    pub guards: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IgnoredTriggerInfo<T> {
    pub trigger: T,
    pub guards: Vec<String>,
}

/// Dynamic transition; its destination is unknown until fired.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DynamicTransitionInfo<T> {
    pub trigger: T,
    pub selector: String,
    pub guards: Vec<String>,
}

/// Everything configured on one state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateInfo<S, T> {
    pub state: S,
    pub superstate: Option<S>,
    pub substates: Vec<S>,
    pub initial_transition: Option<S>,
    pub activate_actions: Vec<InvocationInfo>,
    pub entry_actions: Vec<EntryActionInfo<T>>,
    pub exit_actions: Vec<InvocationInfo>,
    pub deactivate_actions: Vec<InvocationInfo>,
    pub fixed_transitions: Vec<FixedTransitionInfo<S, T>>,
    pub internal_transitions: Vec<InternalTransitionInfo<T>>,
    pub ignored_triggers: Vec<IgnoredTriggerInfo<T>>,
    pub dynamic_transitions: Vec<DynamicTransitionInfo<T>>,
}

/// Snapshot of the whole machine: current state plus every configured state
/// in configuration order.
///
/// # Example
///
/// ```rust
/// use statehouse::StateMachine;
///
/// let machine = StateMachine::new("idle");
/// machine.configure("idle").permit("start", "running").unwrap();
/// machine.configure("running").substate_of("active").unwrap();
///
/// let info = machine.info();
/// assert_eq!(info.current_state, "idle");
/// assert_eq!(info.state(&"active").unwrap().substates, vec!["running"]);
///
/// let json = info.to_json().unwrap();
/// assert!(json.contains("\"destination\":\"running\""));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateMachineInfo<S, T> {
    pub current_state: S,
    pub states: Vec<StateInfo<S, T>>,
}

impl<S: PartialEq, T> StateMachineInfo<S, T> {
    /// Look up the description of one state.
    pub fn state(&self, state: &S) -> Option<&StateInfo<S, T>> {
        self.states.iter().find(|info| info.state == *state)
    }
}

impl<S: Serialize, T: Serialize> StateMachineInfo<S, T> {
    /// Render the snapshot as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
