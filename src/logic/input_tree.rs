use std::collections::BTreeMap;

use crate::model::{
    InputValue, SolveInputs, WireInputTree, WireParam, WireValue, DEFAULT_BRANCH, TYPE_BOOLEAN,
    TYPE_INTEGER, TYPE_NUMBER, TYPE_TEXT,
};

/// Translate validated inputs into the solver's input tree.
///
/// One entry per parameter in name order, each with a single `{0}` branch.
/// Scalars become one value; lists are flattened into the branch in order.
/// A number is always a single value, never a repeat count.
pub fn build_input_tree(inputs: &SolveInputs) -> WireInputTree {
    inputs
        .iter()
        .map(|(name, input)| {
            let values = input.values().iter().map(wire_value).collect();
            let mut inner_tree = BTreeMap::new();
            inner_tree.insert(DEFAULT_BRANCH.to_string(), values);
            WireParam {
                param_name: name.clone(),
                inner_tree,
            }
        })
        .collect()
}

pub fn wire_value(value: &InputValue) -> WireValue {
    let (type_tag, data) = match value {
        InputValue::Integer(i) => (TYPE_INTEGER, i.to_string()),
        InputValue::Number(f) => (TYPE_NUMBER, serde_json::json!(f).to_string()),
        InputValue::Text(s) => (TYPE_TEXT, serde_json::Value::String(s.clone()).to_string()),
        InputValue::Boolean(b) => (TYPE_BOOLEAN, b.to_string()),
    };
    WireValue {
        type_tag: type_tag.to_string(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParamInput;
    use serde_json::json;

    fn inputs(value: serde_json::Value) -> SolveInputs {
        SolveInputs::from_json(Some(&value)).unwrap()
    }

    #[test]
    fn test_count_is_a_single_integer_value() {
        let tree = build_input_tree(&inputs(json!({"Count": 3})));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].param_name, "Count");
        assert_eq!(tree[0].inner_tree.len(), 1);

        let branch = tree[0].branch(DEFAULT_BRANCH).unwrap();
        assert_eq!(
            branch,
            &[WireValue {
                type_tag: "System.Int32".to_string(),
                data: "3".to_string(),
            }]
        );
    }

    #[test]
    fn test_each_type_has_its_own_tag() {
        let tree = build_input_tree(&inputs(json!({
            "a": 1,
            "b": 1.5,
            "c": "steel",
            "d": false
        })));
        let tags: Vec<&str> = tree
            .iter()
            .map(|param| param.branch(DEFAULT_BRANCH).unwrap()[0].type_tag.as_str())
            .collect();
        assert_eq!(
            tags,
            vec!["System.Int32", "System.Double", "System.String", "System.Boolean"]
        );

        let c = tree[2].branch(DEFAULT_BRANCH).unwrap();
        assert_eq!(c[0].data, "\"steel\"");
        let b = tree[1].branch(DEFAULT_BRANCH).unwrap();
        assert_eq!(b[0].data, "1.5");
    }

    #[test]
    fn test_lists_flatten_into_one_branch_in_order() {
        let tree = build_input_tree(&inputs(json!({"Points": [3, 1.5, "x"]})));
        let branch = tree[0].branch(DEFAULT_BRANCH).unwrap();
        let data: Vec<&str> = branch.iter().map(|v| v.data.as_str()).collect();
        assert_eq!(data, vec!["3", "1.5", "\"x\""]);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let forward = inputs(json!({"z": [1, 2], "a": true, "m": "mid"}));
        let mut backward = SolveInputs::default();
        backward.insert("m", ParamInput::Single(InputValue::Text("mid".to_string())));
        backward.insert("a", ParamInput::Single(InputValue::Boolean(true)));
        backward.insert(
            "z",
            ParamInput::List(vec![InputValue::Integer(1), InputValue::Integer(2)]),
        );

        let first = build_input_tree(&forward);
        assert_eq!(first, build_input_tree(&backward));
        assert_eq!(first, build_input_tree(&forward));

        let names: Vec<&str> = first.iter().map(|p| p.param_name.as_str()).collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_empty_list_yields_empty_branch() {
        let tree = build_input_tree(&inputs(json!({"Empty": []})));
        assert_eq!(tree[0].branch(DEFAULT_BRANCH).unwrap().len(), 0);
    }
}
