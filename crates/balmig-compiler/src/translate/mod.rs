//! Flow translator: legacy flow nodes → IR statements.
//!
//! Translation is a recursive walk over the node tree. Each node becomes an
//! ordered list of statements; helpers the node needs at module level
//! (enricher and async functions, transform methods, type definitions,
//! imports) are registered on the [`Context`] as a side effect.
//!
//! Siblings are always translated in source order. Generated names come from
//! project-wide counters, so reordering translations would rename things.

mod control;
mod endpoints;
mod expr;
mod file;
mod transform;
mod variables;

pub use expr::{convert_expr, convert_identifier, infer_type};
pub use file::{translate_file, translate_project_types, TYPES_UNIT_NAME};

use crate::context::Context;
use crate::diagnostic::MigrateError;
use crate::ir::{OnFail, Parameter, Statement};
use crate::legacy::FlowNode;

pub(crate) const CONTEXT_REF: &str = "ctx";
pub(crate) const CONTEXT_TYPE: &str = "Context";
pub(crate) const PAYLOAD_ACCESS: &str = "ctx.payload";
pub(crate) const FLOW_VARS_ACCESS: &str = "ctx.flowVars";
pub(crate) const SESSION_VARS_ACCESS: &str = "ctx.sessionVars";
pub(crate) const ERROR_TYPE: &str = "error";
pub(crate) const ON_FAIL_ERROR_VAR: &str = "e";

/// `(Context ctx)`, the parameter list of every generated flow function.
pub(crate) fn context_params() -> Vec<Parameter> {
    vec![Parameter::new(CONTEXT_TYPE, CONTEXT_REF)]
}

/// Translates a single node.
pub fn convert_block(ctx: &mut Context, node: &FlowNode) -> Result<Vec<Statement>, MigrateError> {
    tracing::trace!(kind = node.kind_name(), "translating node");
    match node {
        FlowNode::Logger { level, message } => Ok(variables::convert_logger(ctx, *level, message)),
        FlowNode::SetVariable { name, value } => Ok(variables::convert_set_variable(ctx, name, value)),
        FlowNode::SetSessionVariable { name, value } => {
            Ok(variables::convert_set_session_variable(ctx, name, value))
        }
        FlowNode::RemoveVariable { name, scope } => Ok(variables::convert_remove_variable(ctx, name, *scope)),
        FlowNode::SetPayload { value } => Ok(variables::convert_set_payload(ctx, value)),
        FlowNode::Choice { whens, otherwise } => control::convert_choice(ctx, whens, otherwise),
        FlowNode::FlowReference { flow_name } => Ok(variables::convert_flow_reference(ctx, flow_name)),
        FlowNode::ObjectToJson => Ok(variables::convert_object_to_json()),
        FlowNode::ObjectToString => Ok(variables::convert_object_to_string()),
        FlowNode::CatchExceptionStrategy(strategy) => control::convert_catch_exception_strategy(ctx, strategy),
        FlowNode::ChoiceExceptionStrategy { strategies } => {
            control::convert_choice_exception_strategy(ctx, strategies)
        }
        FlowNode::ReferenceExceptionStrategy { ref_name } => {
            Ok(control::convert_reference_exception_strategy(ctx, ref_name))
        }
        FlowNode::ExpressionComponent { content } => Ok(variables::convert_expression_component(ctx, content)),
        FlowNode::Enricher { source, target, inner } => {
            endpoints::convert_enricher(ctx, source, target, inner.as_deref())
        }
        FlowNode::HttpRequest(request) => Ok(endpoints::convert_http_request(ctx, request)),
        FlowNode::Database(database) => Ok(endpoints::convert_database(ctx, database)),
        FlowNode::Async { blocks } => endpoints::convert_async(ctx, blocks),
        FlowNode::VmOutboundEndpoint { path } => Ok(endpoints::convert_vm_outbound_endpoint(ctx, path)),
        FlowNode::TransformMessage { script } => Ok(transform::convert_transform_message(ctx, script)),
        FlowNode::Unsupported(block) => Ok(vec![expr::unsupported_placeholder(&block.element, &block.source)]),
    }
}

/// Translates a node sequence, concatenating the results in order.
pub fn convert_blocks(ctx: &mut Context, nodes: &[FlowNode]) -> Result<Vec<Statement>, MigrateError> {
    let mut statements = Vec::new();
    for node in nodes {
        statements.extend(convert_block(ctx, node)?);
    }
    Ok(statements)
}

/// Translates the node sequence that forms a whole function body.
///
/// An exception strategy guards everything before it: when a node turns into
/// a bare `do { } on fail ..`, the statements accumulated so far become the
/// body of that `do`. Worker declarations are hoisted to the top.
pub fn convert_top_level_blocks(ctx: &mut Context, nodes: &[FlowNode]) -> Result<Vec<Statement>, MigrateError> {
    ctx.in_function_scope(|ctx| -> Result<Vec<Statement>, MigrateError> {
        let mut body: Vec<Statement> = Vec::new();

        for node in nodes {
            let mut statements = convert_block(ctx, node)?;
            if let Some(on_fail) = take_bare_strategy(&mut statements) {
                body = vec![Statement::Do {
                    body: std::mem::take(&mut body),
                    on_fail,
                }];
                continue;
            }
            body.extend(statements);
        }

        Ok(hoist_workers(body))
    })
}

/// Returns the handler when `statements` is exactly one `do` with an empty body.
fn take_bare_strategy(statements: &mut Vec<Statement>) -> Option<OnFail> {
    match statements.as_slice() {
        [Statement::Do { body, .. }] if body.is_empty() => match statements.pop() {
            Some(Statement::Do { on_fail, .. }) => Some(on_fail),
            _ => None,
        },
        _ => None,
    }
}

/// Moves every worker declaration, at any nesting depth, to the front.
pub(crate) fn hoist_workers(statements: Vec<Statement>) -> Vec<Statement> {
    let mut workers = Vec::new();
    let mut body = collect_workers(statements, &mut workers);
    workers.append(&mut body);
    workers
}

fn collect_workers(statements: Vec<Statement>, workers: &mut Vec<Statement>) -> Vec<Statement> {
    let mut kept = Vec::with_capacity(statements.len());
    for stmt in statements {
        match stmt {
            Statement::Worker { .. } => workers.push(stmt),
            Statement::IfElse {
                condition,
                then_body,
                else_ifs,
                else_body,
            } => {
                let then_body = collect_workers(then_body, workers);
                let else_ifs = else_ifs
                    .into_iter()
                    .map(|mut arm| {
                        arm.body = collect_workers(arm.body, workers);
                        arm
                    })
                    .collect();
                let else_body = collect_workers(else_body, workers);
                kept.push(Statement::IfElse {
                    condition,
                    then_body,
                    else_ifs,
                    else_body,
                });
            }
            Statement::Do { body, mut on_fail } => {
                let body = collect_workers(body, workers);
                on_fail.body = collect_workers(on_fail.body, workers);
                kept.push(Statement::Do { body, on_fail });
            }
            Statement::Literal(_) => kept.push(stmt),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::{CatchStrategy, WhenClause};

    fn set_var(name: &str, value: &str) -> FlowNode {
        FlowNode::SetVariable {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn render(statements: &[Statement]) -> String {
        statements.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn strategy_wraps_preceding_statements() {
        let mut ctx = Context::default();
        let nodes = vec![
            set_var("a", "1"),
            set_var("b", "2"),
            FlowNode::CatchExceptionStrategy(CatchStrategy {
                when: None,
                blocks: vec![set_var("failed", "#[true]")],
            }),
        ];

        let body = convert_top_level_blocks(&mut ctx, &nodes).unwrap();

        assert_eq!(body.len(), 1);
        match &body[0] {
            Statement::Do { body, on_fail } => {
                assert_eq!(body.len(), 2);
                assert!(on_fail.binding.is_none());
                assert_eq!(on_fail.body, vec![Statement::literal("ctx.flowVars.failed = true;")]);
            }
            other => panic!("expected do statement, got {:?}", other),
        }
    }

    #[test]
    fn statements_after_strategy_stay_outside() {
        let mut ctx = Context::default();
        let nodes = vec![
            set_var("a", "1"),
            FlowNode::ReferenceExceptionStrategy { ref_name: "handler".to_string() },
            set_var("b", "2"),
        ];

        let body = convert_top_level_blocks(&mut ctx, &nodes).unwrap();

        assert_eq!(body.len(), 2);
        assert!(matches!(body[0], Statement::Do { .. }));
        assert_eq!(body[1], Statement::literal("ctx.flowVars.b = \"2\";"));
    }

    #[test]
    fn hoists_nested_workers() {
        let mut ctx = Context::default();
        let nodes = vec![
            set_var("a", "1"),
            FlowNode::Choice {
                whens: vec![WhenClause {
                    condition: "#[vars.a == '1']".to_string(),
                    blocks: vec![FlowNode::VmOutboundEndpoint { path: "/q".to_string() }],
                }],
                otherwise: vec![],
            },
        ];

        let body = convert_top_level_blocks(&mut ctx, &nodes).unwrap();

        assert!(matches!(body[0], Statement::Worker { .. }));
        assert!(matches!(body[2], Statement::IfElse { .. }));
        let text = render(&body);
        assert!(text.contains("ctx.payload -> vmReceive0Worker;"));
    }

    #[test]
    fn remove_of_unknown_variable_yields_nothing() {
        let mut ctx = Context::default();
        let nodes = vec![FlowNode::RemoveVariable {
            name: "ghost".to_string(),
            scope: Default::default(),
        }];
        assert!(convert_blocks(&mut ctx, &nodes).unwrap().is_empty());
    }
}
