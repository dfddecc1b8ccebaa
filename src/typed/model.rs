use super::core::{convert, ParamType};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// One declared field of an argument model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelField {
    /// Field name
    pub name: &'static str,
    /// Declared conversion type
    pub ty: ParamType,
    /// Raw default used when no positional value reaches this field
    pub default: Option<&'static str>,
}

impl ModelField {
    #[must_use]
    pub const fn new(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            default: None,
        }
    }

    #[must_use]
    pub const fn with_default(mut self, raw: &'static str) -> Self {
        self.default = Some(raw);
        self
    }
}

/// A declarative aggregate populated positionally from raw call arguments.
///
/// Usually derived:
///
/// ```
/// use agirouter::ArgumentModel;
///
/// #[derive(ArgumentModel, serde::Deserialize)]
/// struct Caller {
///     number: i64,
///     name: String,
/// }
/// ```
pub trait ArgumentModel {
    /// Name used in logs and binding errors
    fn model_name() -> &'static str;

    /// Declared fields, in positional order
    fn fields() -> Vec<ModelField>;

    /// Build an instance from raw positional strings.
    fn build<S: AsRef<str>>(raw: &[S]) -> ModelInstance
    where
        Self: Sized,
    {
        ModelShape::of::<Self>().build(raw)
    }
}

/// Field layout of an argument model, captured once at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelShape {
    name: &'static str,
    fields: Arc<[ModelField]>,
}

impl ModelShape {
    #[must_use]
    pub fn new(name: &'static str, fields: Vec<ModelField>) -> Self {
        Self {
            name,
            fields: fields.into(),
        }
    }

    #[must_use]
    pub fn of<M: ArgumentModel>() -> Self {
        Self::new(M::model_name(), M::fields())
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[ModelField] {
        &self.fields
    }

    /// Number of positional values this model consumes
    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Map `raw` onto the declared fields by position.
    ///
    /// Each field gets `convert(raw, ty)`, so a value that does not convert
    /// stays as its original string. Fields past the end of `raw` get their
    /// default (converted the same way) or `null`. Surplus raw values are
    /// ignored. Construction never fails.
    #[must_use]
    pub fn build<S: AsRef<str>>(&self, raw: &[S]) -> ModelInstance {
        let values = self
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let value = match raw.get(idx) {
                    Some(s) => convert(s.as_ref(), field.ty),
                    None => field
                        .default
                        .map_or(Value::Null, |d| convert(d, field.ty)),
                };
                (field.name, value)
            })
            .collect();
        ModelInstance {
            model: self.name,
            values,
        }
    }
}

/// A constructed argument model. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: &'static str,
    values: Vec<(&'static str, Value)>,
}

impl ModelInstance {
    #[must_use]
    pub fn model_name(&self) -> &'static str {
        self.model
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, v)| v)
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(name, v)| (*name, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object view, keyed by field name
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, v)| ((*name).to_string(), v.clone()))
            .collect();
        Value::Object(map)
    }

    /// Deserialize into a typed struct.
    ///
    /// # Errors
    ///
    /// Fails when a field kept its raw string because conversion failed and
    /// the target field is not a string.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}
