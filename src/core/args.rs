//! Type-erased trigger arguments.
//!
//! Triggers may carry any number of arguments of any `'static` type. The
//! arguments travel with the fire through guards, dynamic selectors and
//! entry/internal actions, and are type-checked against a registered
//! [`TriggerSignature`](crate::core::TriggerSignature) when one exists.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A single argument value with its runtime type information.
#[derive(Clone)]
pub struct Arg {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Arg {
    /// Wrap a value.
    pub fn new<V: Any + Send + Sync>(value: V) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<V>(),
            type_name: std::any::type_name::<V>(),
        }
    }

    /// Borrow the value if it has type `V`.
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.value.downcast_ref::<V>()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name)
    }
}

/// Ordered argument list passed with a fired trigger.
///
/// # Example
///
/// ```rust
/// use statehouse::{args, Args};
///
/// let args: Args = args![3_i32, "three".to_string()];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<i32>(0), Some(&3));
/// assert_eq!(args.get::<String>(1).map(String::as_str), Some("three"));
/// assert_eq!(args.get::<u8>(0), None);
/// ```
#[derive(Clone, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Empty argument list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a value, builder style.
    pub fn with<V: Any + Send + Sync>(mut self, value: V) -> Self {
        self.0.push(Arg::new(value));
        self
    }

    pub fn push<V: Any + Send + Sync>(&mut self, value: V) {
        self.0.push(Arg::new(value));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow argument `index` as a `V`; `None` when absent or of another type.
    pub fn get<V: Any>(&self, index: usize) -> Option<&V> {
        self.0.get(index).and_then(|arg| arg.downcast_ref::<V>())
    }

    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.0.iter()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Conversion into an argument list.
///
/// Implemented for [`Args`] itself, the unit type and tuples of up to four
/// values, so `fire_with(trigger, (1, "a"))` reads naturally.
pub trait IntoArgs {
    fn into_args(self) -> Args;
}

impl IntoArgs for Args {
    fn into_args(self) -> Args {
        self
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Args {
        Args::new()
    }
}

macro_rules! tuple_into_args {
    ($($name:ident),+) => {
        impl<$($name: Any + Send + Sync),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Args {
                let ($($name,)+) = self;
                Args::new()$(.with($name))+
            }
        }
    };
}

tuple_into_args!(A);
tuple_into_args!(A, B);
tuple_into_args!(A, B, C);
tuple_into_args!(A, B, C, D);
