use super::signature::{Param, ParamKind, Signature};
use crate::protocol::AgiError;
use crate::server::request::ParamVec;
use crate::typed::{convert_value, ModelInstance, ModelShape};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// One resolved handler argument.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Placeholder for the call context, which is passed to the handler directly
    Context,
    /// Scalar after best-effort conversion
    Value(Value),
    /// Constructed argument model
    Model(ModelInstance),
}

/// Resolved arguments of one handler invocation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<(Arc<str>, BoundValue)>,
}

impl BoundArgs {
    fn push(&mut self, name: Arc<str>, value: BoundValue) {
        self.values.push((name, value));
    }

    #[must_use]
    pub fn bound(&self, name: &str) -> Option<&BoundValue> {
        self.values
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Scalar value of `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.bound(name)? {
            BoundValue::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar value of `name` deserialized into `T`.
    ///
    /// `None` when the parameter is missing or its value does not fit `T`,
    /// e.g. a raw string kept after a failed integer conversion.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Argument model bound to `name`
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelInstance> {
        match self.bound(name)? {
            BoundValue::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Argument model bound to `name` deserialized into its typed struct.
    #[must_use]
    pub fn model_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.model(name).and_then(|m| m.deserialize().ok())
    }

    /// JSON object of every scalar and model, keyed by parameter name.
    ///
    /// The context placeholder is left out; models appear as objects.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .values
            .iter()
            .filter_map(|(name, v)| {
                let value = match v {
                    BoundValue::Context => return None,
                    BoundValue::Value(v) => v.clone(),
                    BoundValue::Model(m) => m.to_value(),
                };
                Some((name.to_string(), value))
            })
            .collect();
        Value::Object(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.values.iter().map(|(n, v)| (n.as_ref(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn first_query_value<'a>(query: &'a ParamVec, name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

fn default_run(default: &Value) -> Vec<String> {
    match default {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn missing(path: &str, param: &Param) -> AgiError {
    AgiError::Binding {
        path: path.to_string(),
        param: param.name().to_string(),
    }
}

fn bind_model(
    path: &str,
    param: &Param,
    shape: &ModelShape,
    args: &[String],
    pos: &mut usize,
) -> Result<ModelInstance, AgiError> {
    if *pos < args.len() {
        let end = (*pos + shape.arity()).min(args.len());
        let instance = shape.build(&args[*pos..end]);
        *pos = end;
        return Ok(instance);
    }
    match param.default() {
        Some(default) => Ok(shape.build(default_run(default).as_slice())),
        None => Err(missing(path, param)),
    }
}

/// Resolve every declared parameter of `signature` for one call.
///
/// Sources, per parameter, in order of precedence:
///
/// 1. the context parameter is bound to the call context, wherever it sits;
/// 2. the next unconsumed positional arguments, left to right (an argument
///    model takes a run as long as its field list);
/// 3. the first query parameter with the same name (scalars only);
/// 4. the declared default.
///
/// Scalars then go through [`convert_value`], which keeps the original value
/// when it does not convert. Surplus positional arguments and unknown query
/// parameters are ignored.
///
/// # Errors
///
/// [`AgiError::Binding`] for a parameter left without any value.
pub fn bind(
    path: &str,
    signature: &Signature,
    args: &[String],
    query: &ParamVec,
) -> Result<BoundArgs, AgiError> {
    let mut bound = BoundArgs::default();
    let mut pos = 0;

    for param in signature.params() {
        let value = match param.kind() {
            ParamKind::Context => BoundValue::Context,
            ParamKind::Scalar(ty) => {
                let raw = if let Some(arg) = args.get(pos) {
                    pos += 1;
                    Value::String(arg.clone())
                } else if let Some(q) = first_query_value(query, param.name()) {
                    Value::String(q.to_string())
                } else if let Some(default) = param.default() {
                    default.clone()
                } else {
                    return Err(missing(path, param));
                };
                BoundValue::Value(convert_value(raw, *ty))
            }
            ParamKind::ArgumentModel(shape) => {
                BoundValue::Model(bind_model(path, param, shape, args, &mut pos)?)
            }
        };
        bound.push(Arc::clone(param.name_arc()), value);
    }

    if pos < args.len() {
        debug!(
            path = %path,
            surplus = args.len() - pos,
            "Ignoring surplus positional arguments"
        );
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{ArgumentModel, ModelField, ParamType};
    use serde_json::json;

    struct Caller;

    impl ArgumentModel for Caller {
        fn model_name() -> &'static str {
            "Caller"
        }
        fn fields() -> Vec<ModelField> {
            vec![
                ModelField::new("number", ParamType::Int),
                ModelField::new("name", ParamType::Str),
            ]
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn query(pairs: &[(&str, &str)]) -> ParamVec {
        pairs
            .iter()
            .map(|(k, v)| (Arc::<str>::from(*k), (*v).to_string()))
            .collect()
    }

    fn check_sig() -> Signature {
        Signature::new()
            .param(Param::context("request"))
            .param(Param::scalar("x", ParamType::Int).with_default("3"))
    }

    #[test]
    fn test_query_beats_default() {
        let b = bind("check", &check_sig(), &[], &query(&[("x", "55")])).unwrap();
        assert_eq!(b.get("x"), Some(&json!(55)));
        assert_eq!(b.get_as::<i64>("x"), Some(55));
        assert_eq!(b.bound("request"), Some(&BoundValue::Context));
    }

    #[test]
    fn test_default_is_converted() {
        let b = bind("check", &check_sig(), &[], &ParamVec::new()).unwrap();
        assert_eq!(b.get("x"), Some(&json!(3)));
    }

    #[test]
    fn test_positional_beats_query() {
        let b = bind("check", &check_sig(), &args(&["7"]), &query(&[("x", "55")])).unwrap();
        assert_eq!(b.get("x"), Some(&json!(7)));
    }

    #[test]
    fn test_context_position_does_not_consume_args() {
        let sig = Signature::new()
            .param(Param::scalar("a", ParamType::Str))
            .param(Param::context("request"))
            .param(Param::scalar("b", ParamType::Int));
        let b = bind("p", &sig, &args(&["one", "2"]), &ParamVec::new()).unwrap();
        assert_eq!(b.get("a"), Some(&json!("one")));
        assert_eq!(b.get("b"), Some(&json!(2)));
        let names: Vec<&str> = b.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "request", "b"]);
    }

    #[test]
    fn test_failed_conversion_keeps_text() {
        let b = bind("check", &check_sig(), &args(&["fifty"]), &ParamVec::new()).unwrap();
        assert_eq!(b.get("x"), Some(&json!("fifty")));
        assert_eq!(b.get_as::<i64>("x"), None);
    }

    #[test]
    fn test_missing_required_is_binding_error() {
        let sig = Signature::new()
            .param(Param::context("request"))
            .param(Param::scalar("account", ParamType::Int));
        let err = bind("billing", &sig, &[], &query(&[("other", "1")])).unwrap_err();
        assert!(matches!(
            err,
            AgiError::Binding { ref path, ref param } if path == "billing" && param == "account"
        ));
    }

    #[test]
    fn test_model_consumes_contiguous_run() {
        let sig = Signature::new()
            .param(Param::scalar("mode", ParamType::Str))
            .param(Param::model::<Caller>("caller"))
            .param(Param::scalar("retries", ParamType::Int));
        let b = bind("p", &sig, &args(&["fast", "201", "alice", "4"]), &ParamVec::new()).unwrap();
        let caller = b.model("caller").unwrap();
        assert_eq!(caller.get("number"), Some(&json!(201)));
        assert_eq!(caller.get("name"), Some(&json!("alice")));
        assert_eq!(b.get("retries"), Some(&json!(4)));
    }

    #[test]
    fn test_model_short_run_and_field_fallback() {
        let sig = Signature::new().param(Param::model::<Caller>("caller"));
        let b = bind("p", &sig, &args(&["anonymous"]), &ParamVec::new()).unwrap();
        let caller = b.model("caller").unwrap();
        assert_eq!(caller.get("number"), Some(&json!("anonymous")));
        assert_eq!(caller.get("name"), Some(&Value::Null));
    }

    #[test]
    fn test_model_ignores_query_and_uses_default() {
        let sig = Signature::new().param(Param::model::<Caller>("caller"));
        let err = bind("p", &sig, &[], &query(&[("caller", "1")])).unwrap_err();
        assert!(matches!(err, AgiError::Binding { .. }));

        let sig = Signature::new()
            .param(Param::model::<Caller>("caller").with_default(json!(["0", "nobody"])));
        let b = bind("p", &sig, &[], &ParamVec::new()).unwrap();
        assert_eq!(b.model("caller").unwrap().get("name"), Some(&json!("nobody")));
    }

    #[test]
    fn test_surplus_args_and_unknown_query_ignored() {
        let sig = Signature::new().param(Param::scalar("a", ParamType::Str));
        let b = bind("p", &sig, &args(&["1", "2", "3"]), &query(&[("zzz", "9")])).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.get("a"), Some(&json!("1")));
    }
}
