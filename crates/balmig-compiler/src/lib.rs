//! # Ballerina Migrator
//!
//! This crate is the backend of a migrator that turns legacy ESB integration
//! flows (listeners, routers, variable manipulation, HTTP and database
//! endpoints, exception strategies, in-process VM queues) into Ballerina
//! source code. Parsing the vendor configuration files is left to an
//! upstream parser; this crate consumes its node tree.
//!
//! ## Architecture
//!
//! ```text
//! Legacy flow tree (in memory or *.json)
//!        │
//!        ▼
//! ┌──────────────┐
//! │  Translate   │  Flow nodes → IR statements, one unit per file
//! │ (Context &mut)│  + project-wide `types` unit
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │      IR      │  Compilation units: imports, services, functions
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  Fragment → reparse → assemble → format
//! │ (IR → .bal)  │
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use balmig_compiler::{Migrator, MigratorConfig};
//!
//! let config = MigratorConfig {
//!     source_dir: "flows".into(),
//!     out_dir: "generated".into(),
//!     ..MigratorConfig::from_env()
//! };
//!
//! let result = Migrator::new(config).migrate_directory()?;
//! ```

pub mod codegen;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod ir;
pub mod legacy;
pub mod translate;

pub use codegen::{CodeGenerator, GeneratedModule};
pub use config::MigratorConfig;
pub use context::{AnalysisContext, Context};
pub use diagnostic::MigrateError;
pub use legacy::LegacyProject;

use ir::CompilationUnit;

/// Drives translation and generation for one project.
pub struct Migrator {
    config: MigratorConfig,
    analysis: AnalysisContext,
}

/// Result of a directory migration.
#[derive(Debug)]
pub struct MigrateResult {
    /// Number of legacy files translated.
    pub files: usize,
    /// Number of flows and sub-flows translated.
    pub flows: usize,
    /// Generated modules, in output order.
    pub modules: Vec<GeneratedModule>,
}

impl Migrator {
    /// Creates a new migrator with the given configuration.
    pub fn new(config: MigratorConfig) -> Self {
        Self {
            config,
            analysis: AnalysisContext::default(),
        }
    }

    /// Uses names chosen by a prior project analysis.
    pub fn with_analysis(mut self, analysis: AnalysisContext) -> Self {
        self.analysis = analysis;
        self
    }

    /// Translates every file of `project`, then the shared `types` unit.
    ///
    /// Files are translated in order with one context, so counters and
    /// variable tables carry across files.
    pub fn translate(&self, project: &LegacyProject) -> Result<Vec<CompilationUnit>, MigrateError> {
        let mut ctx = Context::new(self.analysis.clone());
        let mut units = Vec::with_capacity(project.files.len() + 1);

        for file in &project.files {
            units.push(translate::translate_file(&mut ctx, file)?);
        }
        units.push(translate::translate_project_types(&ctx));

        Ok(units)
    }

    /// Translates and generates `project`.
    ///
    /// Any translation, reparse or formatting error aborts the whole run; no
    /// module is returned unformatted in place of a failed one.
    pub fn migrate(&self, project: &LegacyProject) -> Result<Vec<GeneratedModule>, MigrateError> {
        let generator = CodeGenerator::new(&self.config);
        let units = self.translate(project)?;

        let mut modules = Vec::with_capacity(units.len());
        for unit in &units {
            let module = generator.generate(unit)?;
            tracing::info!(module = %module.name, path = %module.path.display(), "generated module");
            modules.push(module);
        }
        Ok(modules)
    }

    /// Loads the flow documents under `source_dir`, migrates them and writes
    /// the modules under `out_dir`.
    pub fn migrate_directory(&self) -> Result<MigrateResult, MigrateError> {
        let project = legacy::load_directory(&self.config.source_dir)?;
        let modules = self.migrate(&project)?;
        self.write_output(&modules)?;

        Ok(MigrateResult {
            files: project.files.len(),
            flows: project
                .files
                .iter()
                .map(|f| f.flows.len() + f.sub_flows.len())
                .sum(),
            modules,
        })
    }

    /// Writes generated modules to the output directory.
    fn write_output(&self, modules: &[GeneratedModule]) -> Result<(), MigrateError> {
        std::fs::create_dir_all(&self.config.out_dir)
            .map_err(|e| MigrateError::io(&self.config.out_dir, e.to_string()))?;

        for module in modules {
            let path = self.config.out_dir.join(&module.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MigrateError::io(parent, e.to_string()))?;
            }
            std::fs::write(&path, &module.source).map_err(|e| MigrateError::io(&path, e.to_string()))?;
        }

        Ok(())
    }
}
