//! Connector nodes: HTTP, database, async scopes, VM queues and enrichers.

use super::expr::{
    client_resource_path, convert_expr, convert_identifier, query_args, template_body, unsupported_placeholder,
};
use super::{
    context_params, convert_block, convert_top_level_blocks, hoist_workers, CONTEXT_REF, FLOW_VARS_ACCESS,
    PAYLOAD_ACCESS, SESSION_VARS_ACCESS,
};
use crate::context::{Context, TempCategory};
use crate::diagnostic::MigrateError;
use crate::ir::{Function, Import, ModuleTypeDef, Statement, TypeDesc};
use crate::legacy::{Database, DbOperation, FlowNode, HttpRequest};

/// Row type of database result streams.
pub(crate) const GENERIC_RECORD_TYPE: &str = "Record";
const ITERATOR_VAR: &str = "_iterator_";

pub(super) fn convert_enricher(
    ctx: &mut Context,
    source: &str,
    target: &str,
    inner: Option<&FlowNode>,
) -> Result<Vec<Statement>, MigrateError> {
    let source = convert_expr(source);
    let target = convert_expr(target);

    if let Some(var) = target.strip_prefix(FLOW_VARS_ACCESS).and_then(|t| t.strip_prefix('.')) {
        ctx.register_flow_var(var, "string");
    } else if let Some(var) = target.strip_prefix(SESSION_VARS_ACCESS).and_then(|t| t.strip_prefix('.')) {
        ctx.register_session_var(var, "string");
    }

    let Some(inner) = inner else {
        return Ok(vec![Statement::literal(format!("{} = {};", target, source))]);
    };

    let mut body = ctx.in_function_scope(|ctx| convert_block(ctx, inner).map(hoist_workers))?;
    body.push(Statement::literal(format!("return {};", source)));

    let name = ctx.next_temp(TempCategory::EnricherFunction);
    ctx.add_helper_function(Function::public(
        name.clone(),
        context_params(),
        Some(TypeDesc::from("string?")),
        body,
    ));

    Ok(vec![Statement::literal(format!(
        "{} = {}({}.clone());",
        target, name, CONTEXT_REF
    ))])
}

pub(super) fn convert_http_request(ctx: &mut Context, request: &HttpRequest) -> Vec<Statement> {
    ctx.add_import(Import::new("ballerina", "http"));

    let client = convert_identifier(&request.config_ref);
    let result = ctx.next_temp(TempCategory::ClientResult);
    let path = client_resource_path(&request.path);

    vec![
        Statement::comment("http client request"),
        Statement::literal(format!("http:Client {} = check new (\"{}\");", client, request.url)),
        Statement::literal(format!(
            "http:Response {} = check {}->{}.{}({});",
            result,
            client,
            path,
            request.method.to_lowercase(),
            query_args(&request.query_params)
        )),
        Statement::literal(format!("{} = check {}.getJsonPayload();", PAYLOAD_ACCESS, result)),
    ]
}

pub(super) fn convert_database(ctx: &mut Context, database: &Database) -> Vec<Statement> {
    ctx.add_import(Import::new("ballerina", "sql"));
    ctx.add_type_def(ModuleTypeDef::new(GENERIC_RECORD_TYPE, "record {}"));

    let client = convert_identifier(&database.config_ref);
    let query = ctx.next_temp(TempCategory::DbQuery);
    let stream = ctx.next_temp(TempCategory::DbStream);

    let mut stmts = vec![
        Statement::comment("database operation"),
        Statement::literal(format!(
            "sql:ParameterizedQuery {} = `{}`;",
            query,
            template_body(database.query.trim())
        )),
        Statement::literal(format!(
            "stream<{}, sql:Error?> {} = {}->query({});",
            GENERIC_RECORD_TYPE, stream, client, query
        )),
    ];

    stmts.extend(
        database
            .unsupported
            .iter()
            .map(|block| unsupported_placeholder(&block.element, &block.source)),
    );

    if database.operation == DbOperation::Select {
        let select = ctx.next_temp(TempCategory::DbSelect);
        stmts.push(Statement::literal(format!(
            "{0}[] {1} = check from {0} {2} in {3} select {2};",
            GENERIC_RECORD_TYPE, select, ITERATOR_VAR, stream
        )));
        stmts.push(Statement::literal(format!("{} = {};", PAYLOAD_ACCESS, select)));
    }
    stmts
}

pub(super) fn convert_async(ctx: &mut Context, blocks: &[FlowNode]) -> Result<Vec<Statement>, MigrateError> {
    let body = convert_top_level_blocks(ctx, blocks)?;
    let name = ctx.next_temp(TempCategory::AsyncFunction);
    ctx.add_helper_function(Function::public(name.clone(), context_params(), None, body));

    Ok(vec![
        Statement::comment("async operation"),
        Statement::literal(format!("_ = start {}({});", name, CONTEXT_REF)),
    ])
}

/// Hands the payload to the receiver for `path`. The forwarding worker is
/// declared with the first reference to the path in each function.
pub(super) fn convert_vm_outbound_endpoint(ctx: &mut Context, path: &str) -> Vec<Statement> {
    let receiver = ctx.project.resolve_or_create_receiver(path);
    let function = receiver.function_name.clone();
    let worker = receiver.worker_name();

    let mut stmts = Vec::with_capacity(3);
    if let Some(worker) = ctx.claim_receiver_worker(path) {
        stmts.push(Statement::Worker {
            name: worker,
            return_type: Some(TypeDesc::from("error?")),
            body: vec![
                Statement::comment("VM inbound endpoint"),
                Statement::literal("anydata receivedPayload = <- function;"),
                Statement::literal(format!("{} = receivedPayload;", PAYLOAD_ACCESS)),
                Statement::literal(format!("{}({});", function, CONTEXT_REF)),
            ],
        });
    }
    stmts.push(Statement::comment("VM outbound endpoint"));
    stmts.push(Statement::literal(format!("{} -> {};", PAYLOAD_ACCESS, worker)));
    stmts
}
