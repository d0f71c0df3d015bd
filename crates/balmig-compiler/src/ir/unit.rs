//! Module-level declarations and the compilation unit that holds them.

use std::fmt;
use super::statement::{render_block, Statement};
use super::{Expression, TypeDesc};

/// One generated Ballerina source file.
///
/// Every collection is emitted in append order; nothing is deduplicated here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    pub name: String,
    pub imports: Vec<Import>,
    pub type_defs: Vec<ModuleTypeDef>,
    pub module_vars: Vec<ModuleVar>,
    pub listeners: Vec<Listener>,
    pub services: Vec<Service>,
    pub classes: Vec<ClassDef>,
    pub functions: Vec<Function>,
    /// Raw module-level declarations passed through unchanged.
    pub intrinsics: Vec<String>,
    /// Comments emitted at the end of the file.
    pub comments: Vec<String>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// `import org/module as alias;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    pub org: String,
    pub module: String,
    pub alias: Option<String>,
}

impl Import {
    pub fn new(org: &str, module: &str) -> Self {
        Self {
            org: org.to_string(),
            module: module.to_string(),
            alias: None,
        }
    }

    pub fn with_alias(org: &str, module: &str, alias: &str) -> Self {
        Self {
            alias: Some(alias.to_string()),
            ..Self::new(org, module)
        }
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import {}/{}", self.org, self.module)?;
        if let Some(alias) = &self.alias {
            write!(f, " as {}", alias)?;
        }
        f.write_str(";")
    }
}

/// `type Name <descriptor>;`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTypeDef {
    pub name: String,
    pub type_desc: TypeDesc,
}

impl ModuleTypeDef {
    pub fn new(name: impl Into<String>, type_desc: impl Into<TypeDesc>) -> Self {
        Self {
            name: name.into(),
            type_desc: type_desc.into(),
        }
    }
}

impl fmt::Display for ModuleTypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {} {};", self.name, self.type_desc)
    }
}

/// Module-level variable, optionally `final` or `configurable`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleVar {
    pub qualifier: Option<String>,
    pub type_desc: TypeDesc,
    pub name: String,
    pub expr: Expression,
}

impl fmt::Display for ModuleVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{} ", qualifier)?;
        }
        write!(f, "{} {} = {};", self.type_desc, self.name, self.expr)
    }
}

/// `listener http:Listener name = new (args);`
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub name: String,
    pub type_desc: TypeDesc,
    pub args: Vec<Expression>,
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(
            f,
            "listener {} {} = new ({});",
            self.type_desc,
            self.name,
            args.join(", ")
        )
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub type_desc: TypeDesc,
    pub name: String,
    pub default_expr: Option<Expression>,
}

impl Parameter {
    pub fn new(type_desc: impl Into<TypeDesc>, name: impl Into<String>) -> Self {
        Self {
            type_desc: type_desc.into(),
            name: name.into(),
            default_expr: None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_desc, self.name)?;
        if let Some(default) = &self.default_expr {
            write!(f, " = {}", default)?;
        }
        Ok(())
    }
}

/// Renders a parameter list without the surrounding parentheses.
pub fn render_parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders `returns T`, or nothing.
pub fn render_return_type(return_type: &Option<TypeDesc>) -> String {
    return_type
        .as_ref()
        .map(|t| format!("returns {}", t))
        .unwrap_or_default()
}

/// A function, method or helper.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub visibility: Option<String>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeDesc>,
    pub body: FunctionBody,
}

/// Function body: statements, or a binding to native code.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    External(ExternBinding),
}

/// `= @java:Method { 'class: "..", name: "..", paramTypes: [..] } external;`
#[derive(Debug, Clone, PartialEq)]
pub struct ExternBinding {
    pub annotation: String,
    pub class_name: String,
    pub method_name: Option<String>,
    pub param_types: Option<Vec<String>>,
}

impl Function {
    /// `public function name(params) returns T { body }`.
    pub fn public(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: Option<TypeDesc>,
        body: Vec<Statement>,
    ) -> Self {
        Self {
            visibility: Some("public".to_string()),
            name: name.into(),
            parameters,
            return_type,
            body: FunctionBody::Block(body),
        }
    }

    /// Module-private function.
    pub fn private(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: Option<TypeDesc>,
        body: Vec<Statement>,
    ) -> Self {
        Self {
            visibility: None,
            ..Self::public(name, parameters, return_type, body)
        }
    }

    /// The signature up to, but excluding, the body.
    pub fn signature(&self) -> String {
        let visibility = self
            .visibility
            .as_ref()
            .map(|v| format!("{} ", v))
            .unwrap_or_default();
        format!(
            "{}function {}({}) {}",
            visibility,
            self.name,
            render_parameters(&self.parameters),
            render_return_type(&self.return_type)
        )
    }
}

impl fmt::Display for ExternBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "= {} {{\n'class: \"{}\"", self.annotation, self.class_name)?;
        if let Some(name) = &self.method_name {
            write!(f, ",\nname: \"{}\"", name)?;
        }
        if let Some(types) = &self.param_types {
            let quoted: Vec<String> = types.iter().map(|t| format!("\"{}\"", t)).collect();
            write!(f, ",\nparamTypes: [{}]", quoted.join(", "))?;
        }
        f.write_str("\n} external;")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            FunctionBody::Block(statements) => {
                write!(f, "{} {}", self.signature(), render_block(statements))
            }
            FunctionBody::External(binding) => write!(f, "{} {}", self.signature(), binding),
        }
    }
}

/// `resource function get path(params) returns T { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub accessor: String,
    pub path: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeDesc>,
    pub body: Vec<Statement>,
}

impl Resource {
    pub fn signature(&self) -> String {
        format!(
            "resource function {} {}({}) {}",
            self.accessor,
            self.path,
            render_parameters(&self.parameters),
            render_return_type(&self.return_type)
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.signature(), render_block(&self.body))
    }
}

/// `remote function name(params) returns T { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Remote {
    pub function: Function,
}

/// A field of a service or class.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub type_desc: TypeDesc,
    pub name: String,
    pub default_expr: Option<Expression>,
}

impl fmt::Display for ObjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_desc, self.name)?;
        if let Some(default) = &self.default_expr {
            write!(f, " = {}", default)?;
        }
        f.write_str(";")
    }
}

/// A leading `//` comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment(pub String);

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.0.lines() {
            writeln!(f, "// {}", line)?;
        }
        Ok(())
    }
}

/// `service /base on listeners { .. }`
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub base_path: String,
    pub listener_refs: Vec<String>,
    pub fields: Vec<ObjectField>,
    pub init_func: Option<Function>,
    pub resources: Vec<Resource>,
    pub functions: Vec<Function>,
    pub remote_functions: Vec<Remote>,
    pub comment: Option<Comment>,
}

impl Service {
    pub fn new(base_path: impl Into<String>, listener_refs: Vec<String>) -> Self {
        Self {
            base_path: base_path.into(),
            listener_refs,
            fields: Vec::new(),
            init_func: None,
            resources: Vec::new(),
            functions: Vec::new(),
            remote_functions: Vec::new(),
            comment: None,
        }
    }
}

/// `class Name { *Inclusion; fields methods }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub type_inclusions: Vec<String>,
    pub fields: Vec<ObjectField>,
    pub methods: Vec<Function>,
}
