//! Results of a prior cross-flow analysis.

use indexmap::IndexMap;
use serde::Deserialize;

/// Names chosen ahead of translation by a whole-project analysis.
///
/// The translator only reads from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisContext {
    /// Legacy flow name → generated control-flow function name.
    #[serde(default)]
    pub control_flow_function_names: IndexMap<String, String>,

    /// Derived type name → type descriptor.
    #[serde(default)]
    pub derived_types: IndexMap<String, String>,
}

impl AnalysisContext {
    pub fn with_function_name(mut self, flow: &str, function: &str) -> Self {
        self.control_flow_function_names
            .insert(flow.to_string(), function.to_string());
        self
    }

    pub fn with_derived_type(mut self, name: &str, type_desc: &str) -> Self {
        self.derived_types.insert(name.to_string(), type_desc.to_string());
        self
    }

    pub fn function_name_for(&self, flow: &str) -> Option<&str> {
        self.control_flow_function_names.get(flow).map(String::as_str)
    }
}
