//! Conversion context threaded through a translation.
//!
//! `Context` bundles the project-wide state (symbol tables, name counters,
//! VM receivers), the accumulators of the file currently being translated,
//! and the read-only analysis results. It is passed by `&mut` through every
//! translator call, including recursive ones.

mod analysis;
mod file;
mod project;

pub use analysis::AnalysisContext;
pub use file::FileState;
pub use project::{ProjectState, Receiver, TempCategory};

use std::collections::HashSet;

use crate::ir::{CompilationUnit, Function, Import, ModuleTypeDef};

/// Translation context for one project.
#[derive(Debug, Default)]
pub struct Context {
    pub project: ProjectState,
    pub file: FileState,
    pub analysis: AnalysisContext,
    /// VM paths whose forwarding worker is declared in the function being built.
    workers_in_scope: HashSet<String>,
}

impl Context {
    pub fn new(analysis: AnalysisContext) -> Self {
        Self {
            project: ProjectState::new(),
            file: FileState::default(),
            analysis,
            workers_in_scope: HashSet::new(),
        }
    }

    /// Runs `build` as the body of a new function. Workers declared by an
    /// enclosing function are not visible inside it.
    pub fn in_function_scope<T>(&mut self, build: impl FnOnce(&mut Self) -> T) -> T {
        let outer = std::mem::take(&mut self.workers_in_scope);
        let result = build(self);
        self.workers_in_scope = outer;
        result
    }

    /// Claims the forwarding worker for `path` in the current function.
    /// Returns its name when the function does not declare it yet.
    pub fn claim_receiver_worker(&mut self, path: &str) -> Option<String> {
        let worker = self.project.resolve_or_create_receiver(path).worker_name();
        self.workers_in_scope.insert(path.to_string()).then_some(worker)
    }

    /// Starts a new file, discarding any unflushed per-file state.
    pub fn begin_file(&mut self, name: &str) {
        self.file = FileState::new(name);
    }

    /// Flushes the current file's accumulators into `unit`.
    pub fn finish_file(&mut self, unit: &mut CompilationUnit) {
        std::mem::take(&mut self.file).flush_into(unit);
    }

    pub fn register_flow_var(&mut self, name: &str, inferred: &str) -> String {
        self.project.register_flow_var(name, inferred)
    }

    pub fn register_session_var(&mut self, name: &str, inferred: &str) -> String {
        self.project.register_session_var(name, inferred)
    }

    pub fn next_temp(&mut self, category: TempCategory) -> String {
        self.project.next_temp(category)
    }

    pub fn add_import(&mut self, import: Import) {
        self.file.add_import(import);
    }

    pub fn add_helper_function(&mut self, function: Function) {
        self.file.add_helper_function(function);
    }

    pub fn add_type_def(&mut self, type_def: ModuleTypeDef) {
        self.file.add_type_def(type_def);
    }
}
