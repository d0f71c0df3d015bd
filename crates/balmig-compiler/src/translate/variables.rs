//! Variable, payload and logging nodes.

use super::expr::{convert_expr, convert_identifier, convert_mel, convert_string_literal, infer_type};
use super::{CONTEXT_REF, FLOW_VARS_ACCESS, PAYLOAD_ACCESS, SESSION_VARS_ACCESS};
use crate::context::{Context, TempCategory};
use crate::ir::{Import, Statement};
use crate::legacy::{LogLevel, VariableScope};

pub(super) fn convert_logger(ctx: &mut Context, level: LogLevel, message: &str) -> Vec<Statement> {
    ctx.add_import(Import::new("ballerina", "log"));
    let function = match level {
        LogLevel::Debug => "printDebug",
        LogLevel::Error => "printError",
        LogLevel::Warn => "printWarn",
        LogLevel::Info | LogLevel::Trace => "printInfo",
    };
    vec![Statement::literal(format!(
        "log:{}({});",
        function,
        convert_string_literal(message)
    ))]
}

pub(super) fn convert_set_variable(ctx: &mut Context, name: &str, value: &str) -> Vec<Statement> {
    let id = convert_identifier(name);
    let expr = convert_expr(value);
    ctx.register_flow_var(&id, infer_type(&expr));
    vec![Statement::literal(format!("{}.{} = {};", FLOW_VARS_ACCESS, id, expr))]
}

pub(super) fn convert_set_session_variable(ctx: &mut Context, name: &str, value: &str) -> Vec<Statement> {
    let id = convert_identifier(name);
    let expr = convert_expr(value);
    ctx.register_session_var(&id, infer_type(&expr));
    vec![Statement::literal(format!("{}.{} = {};", SESSION_VARS_ACCESS, id, expr))]
}

/// Clears a variable. Names that were never set produce no statement.
pub(super) fn convert_remove_variable(ctx: &mut Context, name: &str, scope: VariableScope) -> Vec<Statement> {
    let trimmed = name.trim();
    let bare = trimmed
        .strip_prefix("#[vars.")
        .or_else(|| trimmed.strip_prefix("#[flowVars."))
        .or_else(|| trimmed.strip_prefix("#[sessionVars."))
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    let id = convert_identifier(bare);

    let (registered, access) = match scope {
        VariableScope::Flow => (ctx.project.flow_var(&id).is_some(), FLOW_VARS_ACCESS),
        VariableScope::Session => (ctx.project.session_var(&id).is_some(), SESSION_VARS_ACCESS),
    };
    if !registered {
        return Vec::new();
    }
    vec![Statement::literal(format!("{}.{} = ();", access, id))]
}

pub(super) fn convert_set_payload(ctx: &mut Context, value: &str) -> Vec<Statement> {
    let expr = convert_expr(value);
    let temp = ctx.next_temp(TempCategory::Payload);
    vec![
        Statement::comment("set payload"),
        Statement::literal(format!("{} {} = {};", infer_type(&expr), temp, expr)),
        Statement::literal(format!("{} = {};", PAYLOAD_ACCESS, temp)),
    ]
}

pub(super) fn convert_flow_reference(ctx: &mut Context, flow_name: &str) -> Vec<Statement> {
    let function = ctx
        .analysis
        .function_name_for(flow_name)
        .map(str::to_string)
        .unwrap_or_else(|| convert_identifier(flow_name));
    vec![Statement::literal(format!("{}({});", function, CONTEXT_REF))]
}

pub(super) fn convert_object_to_json() -> Vec<Statement> {
    vec![
        Statement::comment("json transformation"),
        Statement::literal(format!("{0} = {0}.toJson();", PAYLOAD_ACCESS)),
    ]
}

pub(super) fn convert_object_to_string() -> Vec<Statement> {
    vec![
        Statement::comment("string transformation"),
        Statement::literal(format!("{0} = {0}.toString();", PAYLOAD_ACCESS)),
    ]
}

/// Inline script: each statement is resolved and terminated with `;`.
/// `//` comments are carried over as comments.
pub(super) fn convert_expression_component(ctx: &mut Context, content: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    for raw in split_script(content) {
        if let Some(comment) = raw.strip_prefix("//") {
            statements.push(Statement::comment(comment.trim()));
            continue;
        }
        let resolved = convert_mel(raw);
        if let Some((name, rhs)) = flow_var_assignment(&resolved) {
            ctx.register_flow_var(name, infer_type(rhs));
        }
        statements.push(Statement::literal(format!("{};", resolved)));
    }
    statements
}

/// Splits a script on `;` and newlines outside quotes and brackets. A `//`
/// comment runs to the end of its line and becomes a part of its own.
fn split_script(content: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        if in_comment {
            if c == '\n' {
                parts.push(&content[start..i]);
                start = i + 1;
                in_comment = false;
            }
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                '/' if depth <= 0 && content[i + 1..].starts_with('/') => {
                    parts.push(&content[start..i]);
                    start = i;
                    in_comment = true;
                }
                ';' | '\n' if depth <= 0 => {
                    parts.push(&content[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&content[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// `ctx.flowVars.x = rhs` → `("x", "rhs")`. Comparisons are not assignments.
fn flow_var_assignment(stmt: &str) -> Option<(&str, &str)> {
    let rest = stmt.strip_prefix(FLOW_VARS_ACCESS)?.strip_prefix('.')?;
    let eq = rest.find('=')?;
    let name = rest[..eq].trim();
    let rhs = &rest[eq + 1..];
    if rhs.starts_with('=') || name.is_empty() || name.contains(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'')) {
        return None;
    }
    Some((name, rhs.trim()))
}
