use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::AppError;

/// Body of `POST /solve`. `inputs` stays untyped until [`SolveInputs::from_json`]
/// validates it, so shape errors surface as `MalformedInput`.
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub definition: String,
    #[serde(default)]
    pub inputs: Option<Value>,
}

/// A single typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
}

/// One parameter: a scalar or a list of scalars (list order is preserved)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamInput {
    Single(InputValue),
    List(Vec<InputValue>),
}

/// Validated solve inputs keyed by parameter name, iterated in name order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SolveInputs(BTreeMap<String, ParamInput>);

impl InputValue {
    /// Parse a JSON scalar. Integers outside the `i32` range become `Number`;
    /// null, objects and nested arrays are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => InputValue::Boolean(*b),
            Value::String(s) => InputValue::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => InputValue::Integer(i),
                _ => match n.as_f64() {
                    Some(f) => InputValue::Number(f),
                    None => InputValue::Text(n.to_string()),
                },
            },
            other => InputValue::Text(other.to_string()),
        }
    }

    /// Parse a query-string value: boolean, then integer, then float, then text
    pub fn from_query(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return InputValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return InputValue::Boolean(false);
        }
        if let Ok(i) = trimmed.parse::<i32>() {
            return InputValue::Integer(i64::from(i));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => InputValue::Number(f),
            _ => InputValue::Text(raw.to_string()),
        }
    }
}

impl ParamInput {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => ParamInput::List(items.iter().map(InputValue::from_json).collect()),
            scalar => ParamInput::Single(InputValue::from_json(scalar)),
        }
    }

    pub fn values(&self) -> &[InputValue] {
        match self {
            ParamInput::Single(value) => std::slice::from_ref(value),
            ParamInput::List(values) => values,
        }
    }
}

impl SolveInputs {
    /// Validate the `inputs` member of a solve request. A missing member means
    /// no inputs; anything other than a JSON object is rejected.
    pub fn from_json(inputs: Option<&Value>) -> Result<Self, AppError> {
        let map = match inputs {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(AppError::MalformedInput(format!(
                    "`inputs` must be an object, got {}",
                    json_kind(other)
                )))
            }
        };

        let mut params = BTreeMap::new();
        for (name, value) in map {
            check_param_name(name)?;
            params.insert(name.clone(), ParamInput::from_json(value));
        }
        Ok(Self(params))
    }

    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut params = BTreeMap::new();
        for (name, raw) in query {
            check_param_name(name)?;
            params.insert(name.clone(), ParamInput::Single(InputValue::from_query(raw)));
        }
        Ok(Self(params))
    }

    pub fn insert(&mut self, name: impl Into<String>, input: ParamInput) {
        self.0.insert(name.into(), input);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamInput)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable textual form used in cache keys (names sorted, values typed)
    pub fn canonical(&self) -> Result<String, AppError> {
        serde_json::to_string(&self.0)
            .map_err(|e| AppError::Internal(format!("cannot serialise inputs: {}", e)))
    }
}

fn check_param_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::MalformedInput(
            "parameter names must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_types_are_tagged_at_ingress() {
        assert_eq!(InputValue::from_json(&json!(3)), InputValue::Integer(3));
        assert_eq!(InputValue::from_json(&json!(2.5)), InputValue::Number(2.5));
        assert_eq!(
            InputValue::from_json(&json!("steel")),
            InputValue::Text("steel".to_string())
        );
        assert_eq!(InputValue::from_json(&json!(true)), InputValue::Boolean(true));
    }

    #[test]
    fn test_large_integers_become_numbers() {
        let big = i64::from(i32::MAX) + 1;
        assert_eq!(
            InputValue::from_json(&json!(big)),
            InputValue::Number(big as f64)
        );
    }

    #[test]
    fn test_unrecognised_shapes_are_stringified() {
        assert_eq!(
            InputValue::from_json(&json!({"x": 1})),
            InputValue::Text("{\"x\":1}".to_string())
        );
        assert_eq!(
            InputValue::from_json(&Value::Null),
            InputValue::Text("null".to_string())
        );
        // Nested arrays are not flattened
        assert_eq!(
            ParamInput::from_json(&json!([1, [2, 3]])),
            ParamInput::List(vec![
                InputValue::Integer(1),
                InputValue::Text("[2,3]".to_string())
            ])
        );
    }

    #[test]
    fn test_inputs_must_be_an_object() {
        let err = SolveInputs::from_json(Some(&json!([1, 2]))).unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
        let err = SolveInputs::from_json(Some(&json!("Count=3"))).unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));

        assert!(SolveInputs::from_json(None).unwrap().is_empty());
        assert!(SolveInputs::from_json(Some(&Value::Null)).unwrap().is_empty());
    }

    #[test]
    fn test_empty_parameter_name_rejected() {
        let err = SolveInputs::from_json(Some(&json!({" ": 1}))).unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }

    #[test]
    fn test_query_values_are_typed() {
        assert_eq!(InputValue::from_query("TRUE"), InputValue::Boolean(true));
        assert_eq!(InputValue::from_query("12"), InputValue::Integer(12));
        assert_eq!(InputValue::from_query("0.25"), InputValue::Number(0.25));
        assert_eq!(
            InputValue::from_query("NaN"),
            InputValue::Text("NaN".to_string())
        );
        assert_eq!(
            InputValue::from_query("red"),
            InputValue::Text("red".to_string())
        );
    }

    #[test]
    fn test_canonical_form_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"b": [1, 2], "a": "x"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": "x", "b": [1, 2]}"#).unwrap();
        let a = SolveInputs::from_json(Some(&a)).unwrap();
        let b = SolveInputs::from_json(Some(&b)).unwrap();
        assert_eq!(a.canonical().unwrap(), b.canonical().unwrap());
        assert_eq!(a.canonical().unwrap(), r#"{"a":"x","b":[1,2]}"#);
    }

    #[test]
    fn test_canonical_form_distinguishes_empty_and_null_inputs() {
        let empty = SolveInputs::default();
        let null = SolveInputs::from_json(Some(&json!({"a": null}))).unwrap();
        assert_eq!(empty.canonical().unwrap(), "{}");
        assert_eq!(null.canonical().unwrap(), r#"{"a":"null"}"#);
    }
}
