//! Ballerina source generation from compilation units.
//!
//! Declarations are not printed directly. Each one is rendered to a text
//! fragment and reparsed through the target grammar, so a broken fragment is
//! caught here rather than by whoever compiles the output:
//! - Lexer (logos token set of the target language)
//! - Syntax (structural parser for imports, members, blocks and statements)
//! - Format (canonical layout, verified by re-lexing)
//! - Generator (skeleton + body reparse, module assembly)

pub mod format;
pub mod generator;
pub mod lexer;
pub mod syntax;

pub use format::{format_module, to_source_code};
pub use generator::{CodeGenerator, GeneratedModule};
