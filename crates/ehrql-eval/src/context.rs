//! Evaluation context for query execution

use ehrql_types::Value;
use std::collections::HashMap;

/// Values bound to the parameters of a query for one evaluation run
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    /// Parameter values by name
    pub parameters: HashMap<String, Value>,
}

impl EvaluationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_parameter(name, value);
        self
    }

    /// Bind a parameter
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Get a parameter value
    pub fn get_parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}
