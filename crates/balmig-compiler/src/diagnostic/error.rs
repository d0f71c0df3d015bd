//! Migrator error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors that can occur during migration.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum MigrateError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to read file '{path}': {message}")]
    #[diagnostic(code(balmig::io::read_error))]
    IoError {
        path: PathBuf,
        message: String,
    },

    #[error("Invalid flow document '{}': {message}", path.display())]
    #[diagnostic(
        code(balmig::io::invalid_flow_document),
        help("Flow documents are JSON serializations of the legacy node tree produced by the project parser")
    )]
    InvalidFlowDocument {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Translation Errors
    // =========================================================================
    #[error("Malformed {construct}: {message}")]
    #[diagnostic(
        code(balmig::translate::invariant_violation),
        help("The legacy parser must only hand over well-formed node trees. This is a bug in the upstream parser.")
    )]
    InvariantViolation {
        construct: String,
        message: String,
    },

    // =========================================================================
    // Code Generation Errors
    // =========================================================================
    #[error("Generated {entry} does not parse: {message}")]
    #[diagnostic(code(balmig::codegen::syntax_error))]
    SyntaxError {
        entry: &'static str,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("generated fragment breaks here")]
        span: SourceSpan,
    },

    #[error("Failed to format generated module '{module}': {message}")]
    #[diagnostic(
        code(balmig::codegen::format_failed),
        help("Set BAL_MIGRATE_SKIP_FORMATTING to emit the module without the formatting pass")
    )]
    FormatFailed {
        module: String,
        message: String,
    },
}

impl MigrateError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invariant violation for a legacy construct.
    pub fn invariant(construct: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            construct: construct.into(),
            message: message.into(),
        }
    }

    /// Creates a syntax error pointing into a generated fragment.
    pub fn syntax(
        entry: &'static str,
        fragment: &str,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::SyntaxError {
            entry,
            message: message.into(),
            src: NamedSource::new(entry, fragment.to_string()),
            span: (offset, len).into(),
        }
    }
}
