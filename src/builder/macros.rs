//! Macros for ergonomic trigger arguments.

/// Build an [`Args`](crate::Args) list from a comma-separated sequence of
/// values of any `'static + Send + Sync` type.
///
/// # Example
///
/// ```
/// use statehouse::args;
///
/// let args = args![42_u32, "answer"];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<u32>(0), Some(&42));
///
/// let empty = args![];
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.with($value))+
    };
}
