//! Per-file accumulators.

use indexmap::IndexMap;
use crate::ir::{CompilationUnit, Function, Import, ModuleTypeDef};

/// Declarations generated as a side effect while translating one legacy file.
///
/// Created when a file's translation starts and flushed into that file's
/// compilation unit once it is done.
#[derive(Debug, Default)]
pub struct FileState {
    pub name: String,
    functions: Vec<Function>,
    type_defs: IndexMap<String, ModuleTypeDef>,
    imports: Vec<Import>,
}

impl FileState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn add_helper_function(&mut self, function: Function) {
        tracing::debug!(file = %self.name, function = %function.name, "registered helper function");
        self.functions.push(function);
    }

    /// Adds a type definition; a later definition with the same name replaces
    /// the earlier one in place.
    pub fn add_type_def(&mut self, type_def: ModuleTypeDef) {
        self.type_defs.insert(type_def.name.clone(), type_def);
    }

    /// Moves everything accumulated into `unit`.
    ///
    /// Imports already present in the unit, or registered more than once,
    /// are emitted once.
    pub fn flush_into(self, unit: &mut CompilationUnit) {
        for import in self.imports {
            if !unit.imports.contains(&import) {
                unit.imports.push(import);
            }
        }
        unit.type_defs.extend(self.type_defs.into_values());
        unit.functions.extend(self.functions);
    }
}
