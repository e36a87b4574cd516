use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Launch description of a task.
///
/// `kind` names a builder in the application's task registry; `args` and `kwargs` are handed to
/// that builder unchanged. The spec is serialized as JSON when it has to cross a process boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Registry key of the task builder (e.g. `"echo"`).
    pub kind: String,
    /// Positional construction arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    /// Keyword construction arguments.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub kwargs: Map<String, Value>,
}

impl TaskSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    pub fn with_arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn kwarg(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }
}

/// One entry of a hub's auto-launch list.
///
/// Serialized flat: `{"id": "echo", "kind": "echo", "kwargs": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoLaunch {
    pub id: String,
    #[serde(flatten)]
    pub spec: TaskSpec,
}

impl AutoLaunch {
    pub fn new(id: impl Into<String>, spec: TaskSpec) -> Self {
        Self { id: id.into(), spec }
    }
}
