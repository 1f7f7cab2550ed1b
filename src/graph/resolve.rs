//! Hierarchical trigger resolution.
//!
//! Resolution starts at the current state and walks outward. At each level
//! that configures the trigger, every guard is evaluated exactly once:
//!
//! - one satisfied behavior resolves the trigger at that level,
//! - several satisfied behaviors are an [`Ambiguous`](ResolutionError::Ambiguous) configuration,
//! - none escalates to the superstate.
//!
//! A level with an unsatisfied behavior therefore does not shadow its
//! ancestors; a satisfied one does.

use super::behavior::TriggerBehavior;
use crate::core::state::render;
use crate::core::Args;
use std::fmt::Debug;
use stillwater::validation::Validation;
use thiserror::Error;
use tracing::debug;

/// Why a fired trigger could not be resolved to a behavior.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolutionError {
    #[error("No valid leaving transitions are permitted from state '{state}' for trigger '{trigger}'. Consider ignoring the trigger.")]
    NotPermitted { state: String, trigger: String },

    #[error(
        "Trigger '{trigger}' is valid for transition from state '{state}' but a guard conditions are not met. Guard descriptions: '{}'.",
        .guards.join(", ")
    )]
    GuardsUnmet {
        state: String,
        trigger: String,
        guards: Vec<String>,
    },

    #[error("Multiple permitted exit transitions are configured from state '{state}' for trigger '{trigger}'. Guard clauses must be mutually exclusive.")]
    Ambiguous { state: String, trigger: String },
}

impl ResolutionError {
    /// Descriptions of the unmet guards; empty unless `GuardsUnmet`.
    pub fn unmet_guards(&self) -> &[String] {
        match self {
            Self::GuardsUnmet { guards, .. } => guards,
            Self::NotPermitted { .. } | Self::Ambiguous { .. } => &[],
        }
    }
}

/// Behaviors configured for one trigger at one level of the hierarchy.
pub struct Level<S, T> {
    pub owner: S,
    pub behaviors: Vec<TriggerBehavior<S, T>>,
}

/// The behavior selected for a fire together with the state that configured it.
pub struct Resolved<S, T> {
    pub owner: S,
    pub behavior: TriggerBehavior<S, T>,
}

/// Outcome of checking a trigger without firing it.
#[derive(Debug, Clone, PartialEq)]
pub enum Permission {
    Permitted,
    GuardsUnmet(Vec<String>),
    NotPermitted,
    Ambiguous,
}

impl Permission {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }
}

impl From<&ResolutionError> for Permission {
    fn from(error: &ResolutionError) -> Self {
        match error {
            ResolutionError::NotPermitted { .. } => Self::NotPermitted,
            ResolutionError::GuardsUnmet { guards, .. } => Self::GuardsUnmet(guards.clone()),
            ResolutionError::Ambiguous { .. } => Self::Ambiguous,
        }
    }
}

/// Resolve `trigger` against `levels`, ordered from the current state outward.
///
/// Only levels that configure the trigger are expected; the unmet guard
/// descriptions reported on failure are those of the outermost such level.
pub fn resolve<S, T>(
    levels: Vec<Level<S, T>>,
    state: &S,
    trigger: &T,
    args: &Args,
) -> Result<Resolved<S, T>, ResolutionError>
where
    S: Debug,
    T: Debug,
{
    let mut unmet: Option<Vec<String>> = None;

    for level in levels {
        let mut satisfied = Vec::new();
        let mut level_unmet = Vec::new();

        for behavior in level.behaviors {
            match behavior.guard().evaluate(args) {
                Validation::Success(_) => satisfied.push(behavior),
                Validation::Failure(errors) => level_unmet.extend(errors.iter().cloned()),
            }
        }

        if satisfied.len() > 1 {
            return Err(ResolutionError::Ambiguous {
                state: render(state),
                trigger: render(trigger),
            });
        }

        if let Some(behavior) = satisfied.pop() {
            debug!(state = ?state, trigger = ?trigger, owner = ?level.owner, "trigger resolved");
            return Ok(Resolved {
                owner: level.owner,
                behavior,
            });
        }

        debug!(owner = ?level.owner, trigger = ?trigger, "no guard satisfied, escalating");
        unmet = Some(level_unmet);
    }

    match unmet {
        None => Err(ResolutionError::NotPermitted {
            state: render(state),
            trigger: render(trigger),
        }),
        Some(guards) => Err(ResolutionError::GuardsUnmet {
            state: render(state),
            trigger: render(trigger),
            guards,
        }),
    }
}
