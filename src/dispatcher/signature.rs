use crate::typed::{ArgumentModel, ModelShape, ParamType};
use serde_json::Value;
use std::sync::Arc;

/// How a declared parameter is bound. Decided once, at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Receives the call context itself
    Context,
    /// One value converted to the declared type
    Scalar(ParamType),
    /// A contiguous run of positional values built into an argument model
    ArgumentModel(ModelShape),
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: Arc<str>,
    kind: ParamKind,
    default: Option<Value>,
}

impl Param {
    /// The call-context parameter. Bound regardless of position and never
    /// consumes a positional value.
    #[must_use]
    pub fn context(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            kind: ParamKind::Context,
            default: None,
        }
    }

    #[must_use]
    pub fn scalar(name: &str, ty: ParamType) -> Self {
        Self {
            name: Arc::from(name),
            kind: ParamKind::Scalar(ty),
            default: None,
        }
    }

    /// An argument-model parameter consuming `M::fields().len()` positional
    /// values.
    #[must_use]
    pub fn model<M: ArgumentModel>(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            kind: ParamKind::ArgumentModel(ModelShape::of::<M>()),
            default: None,
        }
    }

    /// Declare a default.
    ///
    /// For scalars the default goes through the same best-effort conversion
    /// as wire values. For argument models an array default supplies the raw
    /// positional run; any other default builds the model from its field
    /// defaults alone.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// `true` when the parameter can be left unbound by the call
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.kind == ParamKind::Context
    }
}

/// Ordered parameter list of a handler.
///
/// ```
/// use agirouter::dispatcher::{Param, Signature};
/// use agirouter::typed::ParamType;
///
/// let sig = Signature::new()
///     .param(Param::context("request"))
///     .param(Param::scalar("x", ParamType::Int).with_default("3"));
/// assert_eq!(sig.names(), vec!["request", "x"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(Param::name).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<Param> for Signature {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}
