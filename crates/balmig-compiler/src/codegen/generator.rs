//! Compilation unit to Ballerina source.
//!
//! Every declaration is rendered as a small skeleton (header plus an empty
//! body), reparsed into a syntax node, and its statement list rendered and
//! reparsed separately as a body block. The nodes are assembled into one
//! [`ModulePart`] and printed.

use std::path::PathBuf;

use super::format::{format_module, to_source_code};
use super::syntax::{
    parse_function_body_block, parse_import_declaration, parse_leading_trivia, parse_module_member,
    parse_object_member, FunctionDefinition, ModuleMember, ModulePart, ObjectDeclaration, ObjectMember,
};
use crate::config::MigratorConfig;
use crate::diagnostic::MigrateError;
use crate::ir::{render_block, ClassDef, Comment, CompilationUnit, Function, FunctionBody, Service};

/// Source text of one generated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub name: String,
    /// Output path relative to the output directory.
    pub path: PathBuf,
    pub source: String,
}

/// Turns compilation units into source text.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    skip_formatting: bool,
    indent_width: usize,
}

impl CodeGenerator {
    pub fn new(config: &MigratorConfig) -> Self {
        Self {
            skip_formatting: config.skip_formatting,
            indent_width: config.indent_width,
        }
    }

    /// Generates the source of `unit`.
    pub fn generate(&self, unit: &CompilationUnit) -> Result<GeneratedModule, MigrateError> {
        let module = self.assemble(unit)?;

        let source = if self.skip_formatting {
            tracing::warn!(module = %unit.name, "formatting skipped");
            to_source_code(&module)
        } else {
            format_module(&module, &unit.name, self.indent_width)?
        };

        Ok(GeneratedModule {
            name: unit.name.clone(),
            path: PathBuf::from(format!("{}.bal", unit.name)),
            source,
        })
    }

    /// Builds the syntax tree of `unit` without printing it.
    pub fn assemble(&self, unit: &CompilationUnit) -> Result<ModulePart, MigrateError> {
        let mut module = ModulePart::default();

        for import in &unit.imports {
            module.imports.push(parse_import_declaration(&import.to_string())?);
        }

        // Module-level declarations: order fixes the layout of the output.
        for type_def in &unit.type_defs {
            module.members.push(parse_module_member(&type_def.to_string())?);
        }
        for var in &unit.module_vars {
            module.members.push(parse_module_member(&var.to_string())?);
        }
        for listener in &unit.listeners {
            module.members.push(parse_module_member(&listener.to_string())?);
        }
        for service in &unit.services {
            module.members.push(ModuleMember::Object(generate_service(service)?));
        }
        for class in &unit.classes {
            module.members.push(ModuleMember::Object(generate_class(class)?));
        }
        for function in &unit.functions {
            module.members.push(generate_module_function(function)?);
        }
        for intrinsic in &unit.intrinsics {
            module.members.push(parse_module_member(intrinsic)?);
        }

        if !unit.comments.is_empty() {
            let comments: String = unit.comments.iter().map(|c| Comment(c.clone()).to_string()).collect();
            module.eof_trivia = parse_leading_trivia(&comments)?;
        }

        Ok(module)
    }
}

fn generate_module_function(function: &Function) -> Result<ModuleMember, MigrateError> {
    match &function.body {
        FunctionBody::Block(body) => match parse_module_member(&format!("{} {{}}", function.signature()))? {
            ModuleMember::Function(definition) => Ok(ModuleMember::Function(attach_body(definition, body)?)),
            _ => Err(not_a_function(&function.name)),
        },
        FunctionBody::External(_) => parse_module_member(&function.to_string()),
    }
}

fn generate_method(header: String, body: &FunctionBody, name: &str) -> Result<ObjectMember, MigrateError> {
    match body {
        FunctionBody::Block(statements) => match parse_object_member(&format!("{} {{}}", header))? {
            ObjectMember::Method(definition) => Ok(ObjectMember::Method(attach_body(definition, statements)?)),
            ObjectMember::Field(_) => Err(not_a_function(name)),
        },
        FunctionBody::External(binding) => parse_object_member(&format!("{} {}", header, binding)),
    }
}

fn attach_body(
    definition: FunctionDefinition,
    body: &[crate::ir::Statement],
) -> Result<FunctionDefinition, MigrateError> {
    Ok(definition.with_body(parse_function_body_block(&render_block(body))?))
}

fn generate_service(service: &Service) -> Result<ObjectDeclaration, MigrateError> {
    let comment = service.comment.as_ref().map(|c| c.to_string()).unwrap_or_default();
    let skeleton = format!(
        "{}service {} on {} {{}}",
        comment,
        service.base_path,
        service.listener_refs.join(", ")
    );
    let declaration = parse_object_skeleton(&skeleton, "service")?;

    let mut members = Vec::new();
    for field in &service.fields {
        members.push(parse_object_member(&field.to_string())?);
    }
    if let Some(init) = &service.init_func {
        members.push(generate_method(init.signature(), &init.body, &init.name)?);
    }
    for resource in &service.resources {
        let body = FunctionBody::Block(resource.body.clone());
        members.push(generate_method(resource.signature(), &body, &resource.path)?);
    }
    for function in &service.functions {
        members.push(generate_method(function.signature(), &function.body, &function.name)?);
    }
    for remote in &service.remote_functions {
        let function = &remote.function;
        let header = format!("remote {}", function.signature());
        members.push(generate_method(header, &function.body, &function.name)?);
    }

    Ok(declaration.with_members(members))
}

fn generate_class(class: &ClassDef) -> Result<ObjectDeclaration, MigrateError> {
    let declaration = parse_object_skeleton(&format!("class {} {{}}", class.name), "class")?;

    let mut members = Vec::new();
    for inclusion in &class.type_inclusions {
        members.push(parse_object_member(&format!("*{};", inclusion))?);
    }
    for field in &class.fields {
        members.push(parse_object_member(&field.to_string())?);
    }
    for method in &class.methods {
        members.push(generate_method(method.signature(), &method.body, &method.name)?);
    }

    Ok(declaration.with_members(members))
}

fn parse_object_skeleton(skeleton: &str, kind: &str) -> Result<ObjectDeclaration, MigrateError> {
    match parse_module_member(skeleton)? {
        ModuleMember::Object(declaration) => Ok(declaration),
        _ => Err(MigrateError::invariant(kind, format!("`{}` is not an object declaration", skeleton))),
    }
}

fn not_a_function(name: &str) -> MigrateError {
    MigrateError::invariant("function", format!("`{}` did not render as a function definition", name))
}
