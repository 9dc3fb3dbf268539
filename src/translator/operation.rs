use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

/// A validated operation: one root field with resolved argument values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub root: FieldSelection,
}

/// One selected field. `on` carries the type condition of the inline fragment
/// the field was selected in, if any.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSelection {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default)]
    pub selections: Vec<FieldSelection>,
    #[serde(default)]
    pub on: Option<String>,
}

impl Operation {
    pub fn query(root: FieldSelection) -> Self {
        Self {
            kind: OperationKind::Query,
            root,
        }
    }

    pub fn mutation(root: FieldSelection) -> Self {
        Self {
            kind: OperationKind::Mutation,
            root,
        }
    }
}

impl FieldSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Leaf selections for each name.
    pub fn leaves(names: &[&str]) -> Vec<FieldSelection> {
        names.iter().map(|name| FieldSelection::new(*name)).collect()
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        if let Value::Object(map) = arguments {
            self.arguments = map;
        }
        self
    }

    pub fn with_selections(mut self, selections: Vec<FieldSelection>) -> Self {
        self.selections = selections;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on_type(mut self, type_name: impl Into<String>) -> Self {
        self.on = Some(type_name.into());
        self
    }

    /// Key of this field in the response map.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Argument value, treating an explicit `null` as absent.
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name).filter(|v| !v.is_null())
    }

    pub fn object_argument(&self, name: &str) -> Option<&Map<String, Value>> {
        self.argument(name).and_then(Value::as_object)
    }

    /// First sub-selection named `name`.
    pub fn selection(&self, name: &str) -> Option<&FieldSelection> {
        self.selections.iter().find(|s| s.name == name)
    }

    /// Nesting depth of the selection tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .selections
            .iter()
            .map(FieldSelection::depth)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_operation() {
        let operation: Operation = serde_json::from_value(json!({
            "kind": "query",
            "root": {
                "name": "movies",
                "arguments": { "where": { "title": "M" } },
                "selections": [
                    { "name": "title" },
                    { "name": "actors", "alias": "cast", "selections": [{ "name": "name" }] }
                ]
            }
        }))
        .unwrap();
        assert_eq!(operation.kind, OperationKind::Query);
        assert_eq!(operation.root.depth(), 3);
        assert_eq!(operation.root.selections[1].response_key(), "cast");
        assert!(operation.root.object_argument("where").is_some());
    }
}
