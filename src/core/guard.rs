//! Guard predicates for controlling trigger behaviors.
//!
//! A [`Guard`] is a conjunction of named [`GuardCondition`]s evaluated
//! against the arguments of the fired trigger. Evaluation visits every
//! condition exactly once and accumulates the descriptions of all unmet
//! conditions with Stillwater's `Validation`, so callers learn every reason
//! a trigger was refused in one pass.

use super::args::Args;
use crate::reflection::callable_name;
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Predicate = Arc<dyn Fn(&Args) -> bool + Send + Sync>;

/// A single named predicate over trigger arguments.
#[derive(Clone)]
pub struct GuardCondition {
    predicate: Predicate,
    description: String,
}

impl GuardCondition {
    /// Create a condition whose description is derived from the callable.
    ///
    /// Named functions are described by their name; closures fall back to
    /// the generic `"Function"` placeholder.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: callable_name::<F>(),
        }
    }

    /// Create a condition with an explicit description.
    pub fn described<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }

    pub fn check(&self, args: &Args) -> bool {
        (self.predicate)(args)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for GuardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardCondition")
            .field("description", &self.description)
            .finish()
    }
}

/// Conjunction of guard conditions gating a trigger behavior.
///
/// The empty guard is always met.
///
/// # Example
///
/// ```rust
/// use statehouse::{args, Guard};
///
/// let guard = Guard::described("positive", |a| a.get::<i32>(0).is_some_and(|v| *v > 0))
///     .and_described("even", |a| a.get::<i32>(0).is_some_and(|v| v % 2 == 0));
///
/// assert!(guard.is_met(&args![4_i32]));
/// assert_eq!(guard.unmet(&args![3_i32]), vec!["even".to_string()]);
/// assert_eq!(guard.unmet(&args![-3_i32]).len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Guard {
    conditions: Vec<GuardCondition>,
}

impl Guard {
    /// Guard with no conditions.
    pub fn always() -> Self {
        Self::default()
    }

    /// Guard with a single condition, description derived from the callable.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        GuardCondition::new(predicate).into()
    }

    /// Guard with a single, explicitly described condition.
    pub fn described<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        GuardCondition::described(description, predicate).into()
    }

    /// Guard requiring every given condition.
    pub fn all(conditions: impl IntoIterator<Item = GuardCondition>) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Add another condition.
    pub fn and<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(GuardCondition::new(predicate));
        self
    }

    /// Add another, explicitly described condition.
    pub fn and_described<F>(mut self, description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        self.conditions
            .push(GuardCondition::described(description, predicate));
        self
    }

    pub fn conditions(&self) -> &[GuardCondition] {
        &self.conditions
    }

    /// Descriptions of every condition, in declaration order.
    pub fn descriptions(&self) -> Vec<String> {
        self.conditions
            .iter()
            .map(|c| c.description().to_string())
            .collect()
    }

    /// Evaluate every condition once, accumulating ALL unmet descriptions.
    pub fn evaluate(&self, args: &Args) -> Validation<(), NonEmptyVec<String>> {
        let checks: Vec<Validation<(), NonEmptyVec<String>>> = self
            .conditions
            .iter()
            .map(|condition| {
                if condition.check(args) {
                    Validation::success(())
                } else {
                    Validation::fail(condition.description().to_string())
                }
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    /// Descriptions of the unmet conditions; empty when the guard is met.
    pub fn unmet(&self, args: &Args) -> Vec<String> {
        match self.evaluate(args) {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(unmet) => unmet.iter().cloned().collect(),
        }
    }

    pub fn is_met(&self, args: &Args) -> bool {
        self.evaluate(args).is_success()
    }
}

impl From<GuardCondition> for Guard {
    fn from(condition: GuardCondition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

/// Anything accepted where the configuration API expects a guard.
///
/// Implemented for [`Guard`], [`GuardCondition`] and plain predicates.
pub trait IntoGuard {
    fn into_guard(self) -> Guard;
}

impl IntoGuard for Guard {
    fn into_guard(self) -> Guard {
        self
    }
}

impl IntoGuard for GuardCondition {
    fn into_guard(self) -> Guard {
        self.into()
    }
}

impl<F> IntoGuard for F
where
    F: Fn(&Args) -> bool + Send + Sync + 'static,
{
    fn into_guard(self) -> Guard {
        Guard::new(self)
    }
}
