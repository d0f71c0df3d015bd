//! Intermediate representation of the generated Ballerina program.
//!
//! The IR is produced by the flow translator and consumed by the code
//! generator. It is pure data: every node knows how to render itself as a
//! source fragment (`Display`), and the generator reparses those fragments
//! through the target grammar.

mod statement;
mod unit;

pub use statement::{render_block, ElseIf, OnFail, Statement, TypedBinding};
pub use unit::{
    render_parameters, render_return_type, ClassDef, Comment, CompilationUnit, ExternBinding,
    Function, FunctionBody, Import, Listener, ModuleTypeDef, ModuleVar, ObjectField, Parameter,
    Remote, Resource, Service,
};

use std::fmt;

/// An expression, already resolved to target-language text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression(String);

impl Expression {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Expression {
    fn from(text: String) -> Self {
        Expression(text)
    }
}

impl From<&str> for Expression {
    fn from(text: &str) -> Self {
        Expression(text.to_string())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A type descriptor, e.g. `http:Response` or `string?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDesc(String);

impl TypeDesc {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TypeDesc {
    fn from(text: String) -> Self {
        TypeDesc(text)
    }
}

impl From<&str> for TypeDesc {
    fn from(text: &str) -> Self {
        TypeDesc(text.to_string())
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
