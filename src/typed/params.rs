use crate::dispatcher::{BoundArgs, Signature};
use serde::de::DeserializeOwned;

/// Why bound arguments did not fit a [`CallParams`] struct
pub type ParamsError = serde_json::Error;

/// Typed handler parameters: one struct field per route parameter.
///
/// The struct is the single source of the route's [`Signature`], so the
/// declared shape and what the handler receives cannot drift apart. Usually
/// derived together with `serde::Deserialize`:
///
/// ```
/// use agirouter::CallParams;
///
/// #[derive(CallParams, serde::Deserialize)]
/// struct Check {
///     #[agi(default = "3")]
///     x: i64,
///     lang: Option<String>,
/// }
///
/// assert_eq!(Check::signature().names(), vec!["x", "lang"]);
/// ```
///
/// Binding stays best-effort; strictness applies when the bound values are
/// turned into the struct. A value that kept its raw text because it did
/// not convert fails there, so fields that must accept anything should be
/// `String` or `serde_json::Value`.
pub trait CallParams: Sized {
    /// Parameter shape of the route, in field order
    fn signature() -> Signature;

    /// Build the struct from the bound arguments of one call.
    ///
    /// # Errors
    ///
    /// A bound value does not deserialize into its field.
    fn from_args(args: &BoundArgs) -> Result<Self, ParamsError>;
}

/// Handlers that take no parameters besides the call context.
impl CallParams for () {
    fn signature() -> Signature {
        Signature::new()
    }

    fn from_args(_args: &BoundArgs) -> Result<Self, ParamsError> {
        Ok(())
    }
}

/// Deserialize bound arguments into `T` through their JSON object view.
///
/// # Errors
///
/// A bound value does not deserialize into its field of `T`.
pub fn deserialize_args<T: DeserializeOwned>(args: &BoundArgs) -> Result<T, ParamsError> {
    serde_json::from_value(args.to_value())
}
