//! Errors returned by firing, activation and deactivation.

use crate::builder::error::ConfigurationError;
use crate::core::ParameterError;
use crate::graph::ResolutionError;
use thiserror::Error;

/// Failure of a machine operation.
///
/// A failed fire leaves the current state untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    InvalidOperation(String),
}

impl MachineError {
    /// A synchronous entry point met an asynchronous callback.
    pub(crate) fn async_required(context: &str) -> Self {
        Self::InvalidOperation(format!(
            "Cannot execute asynchronous action specified in {context}. \
             Use asynchronous version of Fire [fire_async]"
        ))
    }

    /// Same as [`async_required`](Self::async_required) for the activation path.
    pub(crate) fn async_activation_required(context: &str, entry_point: &str) -> Self {
        Self::InvalidOperation(format!(
            "Cannot execute asynchronous action specified in {context}. \
             Use asynchronous version of {entry_point}"
        ))
    }
}

pub type MachineResult<T> = Result<T, MachineError>;
