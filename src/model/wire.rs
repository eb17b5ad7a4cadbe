use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Branch path every parameter's values are placed under
pub const DEFAULT_BRANCH: &str = "{0}";

pub const TYPE_INTEGER: &str = "System.Int32";
pub const TYPE_NUMBER: &str = "System.Double";
pub const TYPE_TEXT: &str = "System.String";
pub const TYPE_BOOLEAN: &str = "System.Boolean";

/// One value in a branch. `data` holds the JSON text of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireValue {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParam {
    pub param_name: String,
    pub inner_tree: BTreeMap<String, Vec<WireValue>>,
}

pub type WireInputTree = Vec<WireParam>;

/// Request body for the compute solve and io endpoints.
/// Exactly one of `algo` and `pointer` is set.
#[derive(Debug, Clone, Serialize)]
pub struct SolvePayload {
    pub algo: Option<String>,
    pub pointer: Option<String>,
    pub values: WireInputTree,
}

impl WireParam {
    pub fn branch(&self, path: &str) -> Option<&[WireValue]> {
        self.inner_tree.get(path).map(Vec::as_slice)
    }
}
