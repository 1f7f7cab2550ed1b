//! Trigger signatures: expected argument arity and types per trigger.

use super::args::{Args, IntoArgs};
use super::state::render;
use crate::builder::error::ConfigurationError;
use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::marker::PhantomData;
use thiserror::Error;

/// Errors raised when fired arguments do not match a trigger signature.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterError {
    #[error("Too many parameters have been supplied. Expecting {expected} but got {actual}.")]
    TooMany { expected: usize, actual: usize },

    #[error("An argument of type {type_name} is required in position {position}.")]
    Missing {
        type_name: &'static str,
        position: usize,
    },

    #[error("The argument in position {position} is of type {actual} but must be of type {expected}.")]
    WrongType {
        position: usize,
        actual: &'static str,
        expected: &'static str,
    },
}

/// Expected type of one trigger argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgType {
    id: Option<TypeId>,
    name: &'static str,
}

impl ArgType {
    /// Exactly the type `V`.
    pub fn of<V: Any>() -> Self {
        Self {
            id: Some(TypeId::of::<V>()),
            name: std::any::type_name::<V>(),
        }
    }

    /// Wildcard accepting a value of any type.
    pub fn any() -> Self {
        Self {
            id: None,
            name: "any",
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self, id: TypeId) -> bool {
        self.id.map_or(true, |expected| expected == id)
    }
}

/// Ordered argument types bound to a trigger.
#[derive(Clone, Debug)]
pub struct TriggerSignature<T> {
    trigger: T,
    types: Vec<ArgType>,
}

impl<T> TriggerSignature<T> {
    pub fn new(trigger: T, types: Vec<ArgType>) -> Self {
        Self { trigger, types }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn types(&self) -> &[ArgType] {
        &self.types
    }

    /// Check argument count and type compatibility.
    pub fn validate(&self, args: &Args) -> Result<(), ParameterError> {
        if args.len() > self.types.len() {
            return Err(ParameterError::TooMany {
                expected: self.types.len(),
                actual: args.len(),
            });
        }

        for (position, expected) in self.types.iter().enumerate() {
            let Some(arg) = args.arg(position) else {
                return Err(ParameterError::Missing {
                    type_name: expected.name(),
                    position,
                });
            };

            if !expected.accepts(arg.type_id()) {
                return Err(ParameterError::WrongType {
                    position,
                    actual: arg.type_name(),
                    expected: expected.name(),
                });
            }
        }

        Ok(())
    }
}

/// Tuple types usable as a typed trigger parameter list.
pub trait ParameterList: IntoArgs {
    fn arg_types() -> Vec<ArgType>;
}

macro_rules! tuple_parameter_list {
    ($($name:ident),+) => {
        impl<$($name: Any + Send + Sync),+> ParameterList for ($($name,)+) {
            fn arg_types() -> Vec<ArgType> {
                vec![$(ArgType::of::<$name>()),+]
            }
        }
    };
}

tuple_parameter_list!(A);
tuple_parameter_list!(A, B);
tuple_parameter_list!(A, B, C);
tuple_parameter_list!(A, B, C, D);

/// Typed handle for a trigger whose signature has been registered.
///
/// Returned by [`StateMachine::set_trigger_parameters`](crate::StateMachine::set_trigger_parameters);
/// firing through it guarantees the argument tuple matches the signature at
/// compile time.
#[derive(Debug)]
pub struct TriggerWithParameters<T, P> {
    signature: TriggerSignature<T>,
    _params: PhantomData<fn(P)>,
}

impl<T: Clone, P: ParameterList> TriggerWithParameters<T, P> {
    pub fn new(trigger: T) -> Self {
        Self {
            signature: TriggerSignature::new(trigger, P::arg_types()),
            _params: PhantomData,
        }
    }

    pub fn trigger(&self) -> &T {
        self.signature.trigger()
    }

    pub fn signature(&self) -> &TriggerSignature<T> {
        &self.signature
    }

    pub fn validate(&self, args: &Args) -> Result<(), ParameterError> {
        self.signature.validate(args)
    }
}

impl<T: Clone, P> Clone for TriggerWithParameters<T, P> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            _params: PhantomData,
        }
    }
}

/// Signatures registered on a machine, at most one per trigger.
#[derive(Debug)]
pub struct SignatureRegistry<T> {
    signatures: Vec<TriggerSignature<T>>,
}

impl<T> Default for SignatureRegistry<T> {
    fn default() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }
}

impl<T: PartialEq + Debug> SignatureRegistry<T> {
    pub fn register(&mut self, signature: TriggerSignature<T>) -> Result<(), ConfigurationError> {
        if self.get(signature.trigger()).is_some() {
            return Err(ConfigurationError::ParametersAlreadyConfigured {
                trigger: render(signature.trigger()),
            });
        }
        self.signatures.push(signature);
        Ok(())
    }

    pub fn get(&self, trigger: &T) -> Option<&TriggerSignature<T>> {
        self.signatures.iter().find(|s| s.trigger() == trigger)
    }

    /// Validate `args` for `trigger`; triggers without a signature accept anything.
    pub fn validate(&self, trigger: &T, args: &Args) -> Result<(), ParameterError> {
        match self.get(trigger) {
            Some(signature) => signature.validate(args),
            None => Ok(()),
        }
    }
}
