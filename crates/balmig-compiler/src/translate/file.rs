//! Whole-file and project-level translation.

use indexmap::IndexMap;

use super::expr::{client_resource_path, convert_identifier, quote_string};
use super::{context_params, convert_top_level_blocks, CONTEXT_REF, CONTEXT_TYPE, PAYLOAD_ACCESS};
use crate::context::Context;
use crate::diagnostic::MigrateError;
use crate::ir::{
    CompilationUnit, Expression, Function, Import, Listener, ModuleTypeDef, ModuleVar, Parameter, Resource,
    Service, Statement, TypeDesc,
};
use crate::legacy::{DbConfig, Flow, FlowSource, LegacyFile};

/// Name of the unit holding the project-wide record types.
pub const TYPES_UNIT_NAME: &str = "types";

const FLOW_VARS_TYPE: &str = "FlowVars";
const SESSION_VARS_TYPE: &str = "SessionVars";

/// Translates one legacy file into a compilation unit.
///
/// Project-wide state in `ctx` carries over from earlier files; the per-file
/// accumulators start fresh.
pub fn translate_file(ctx: &mut Context, file: &LegacyFile) -> Result<CompilationUnit, MigrateError> {
    tracing::debug!(file = %file.name, flows = file.flows.len(), sub_flows = file.sub_flows.len(), "translating file");
    ctx.begin_file(&file.name);
    let mut unit = CompilationUnit::new(file.name.clone());

    for db in &file.db_configs {
        ctx.add_import(Import::new("ballerinax", "mysql"));
        ctx.add_import(Import::with_alias("ballerinax", "mysql.driver", "_"));
        unit.module_vars.push(db_client(db));
    }

    if !file.http_listener_configs.is_empty() {
        ctx.add_import(Import::new("ballerina", "http"));
    }
    for config in &file.http_listener_configs {
        unit.listeners.push(Listener {
            name: convert_identifier(&config.name),
            type_desc: TypeDesc::from("http:Listener"),
            args: vec![Expression::from(config.port.to_string())],
        });
    }

    let mut services: IndexMap<String, Service> = IndexMap::new();
    for flow in &file.flows {
        let name = flow_function_name(ctx, flow);
        let body = convert_top_level_blocks(ctx, &flow.blocks)?;
        unit.functions.push(Function::public(name.clone(), context_params(), None, body));

        if let Some(FlowSource::HttpListener { config_ref, path, allowed_methods }) = &flow.source {
            let listener = convert_identifier(config_ref);
            let service = services.entry(listener.clone()).or_insert_with(|| {
                let base_path = file
                    .http_listener_configs
                    .iter()
                    .find(|c| &c.name == config_ref)
                    .map(|c| client_resource_path(&c.base_path))
                    .unwrap_or_else(|| "/".to_string());
                Service::new(base_path, vec![listener])
            });
            service.resources.extend(flow_resources(&name, path, allowed_methods));
        }
    }
    unit.services.extend(services.into_values());

    for sub_flow in &file.sub_flows {
        let name = ctx
            .analysis
            .function_name_for(&sub_flow.name)
            .map(str::to_string)
            .unwrap_or_else(|| convert_identifier(&sub_flow.name));
        let body = convert_top_level_blocks(ctx, &sub_flow.blocks)?;
        unit.functions.push(Function::private(name, context_params(), None, body));
    }

    ctx.finish_file(&mut unit);
    Ok(unit)
}

fn flow_function_name(ctx: &mut Context, flow: &Flow) -> String {
    if let Some(FlowSource::VmInbound { path }) = &flow.source {
        return ctx.project.define_receiver(path);
    }
    ctx.analysis
        .function_name_for(&flow.name)
        .map(str::to_string)
        .unwrap_or_else(|| convert_identifier(&flow.name))
}

fn db_client(db: &DbConfig) -> ModuleVar {
    let args = [&db.host, &db.user, &db.password, &db.database]
        .iter()
        .map(|a| quote_string(a))
        .collect::<Vec<_>>()
        .join(", ");
    ModuleVar {
        qualifier: Some("final".to_string()),
        type_desc: TypeDesc::from("mysql:Client"),
        name: convert_identifier(&db.name),
        expr: Expression::from(format!("check new ({}, {})", args, db.port)),
    }
}

/// One resource per allowed method, each running the flow on a fresh context.
fn flow_resources(function: &str, path: &str, allowed_methods: &[String]) -> Vec<Resource> {
    let accessors: Vec<String> = if allowed_methods.is_empty() {
        vec!["default".to_string()]
    } else {
        allowed_methods.iter().map(|m| m.trim().to_lowercase()).collect()
    };

    accessors
        .into_iter()
        .map(|accessor| Resource {
            accessor,
            path: resource_path(path),
            parameters: vec![Parameter::new("http:Request", "request")],
            return_type: Some(TypeDesc::from("http:Response")),
            body: vec![
                Statement::literal(format!("{} {} = {{}};", CONTEXT_TYPE, CONTEXT_REF)),
                Statement::literal(format!("{}({});", function, CONTEXT_REF)),
                Statement::literal("http:Response response = new;"),
                Statement::literal(format!("response.setPayload({}.toJson());", PAYLOAD_ACCESS)),
                Statement::literal("return response;"),
            ],
        })
        .collect()
}

/// Relative resource path: `/orders/{id}` → `orders/[string id]`, `/` → `.`.
fn resource_path(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment == "*" {
                "[string... rest]".to_string()
            } else if let Some(param) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                format!("[string {}]", convert_identifier(param))
            } else {
                client_resource_path(segment).trim_start_matches('/').to_string()
            }
        })
        .collect();
    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Builds the project-wide `types` unit.
///
/// Call after every file has been translated: the variable tables and the
/// VM receiver map must be complete.
pub fn translate_project_types(ctx: &Context) -> CompilationUnit {
    let mut unit = CompilationUnit::new(TYPES_UNIT_NAME);

    unit.type_defs.push(ModuleTypeDef::new(
        CONTEXT_TYPE,
        format!(
            "record {{|\nanydata payload = ();\n{} flowVars = {{}};\n{} sessionVars = {{}};\n|}}",
            FLOW_VARS_TYPE, SESSION_VARS_TYPE
        ),
    ));
    unit.type_defs.push(ModuleTypeDef::new(FLOW_VARS_TYPE, optional_fields(ctx.project.flow_vars())));
    unit.type_defs.push(ModuleTypeDef::new(SESSION_VARS_TYPE, optional_fields(ctx.project.session_vars())));

    for (name, type_desc) in &ctx.analysis.derived_types {
        unit.type_defs.push(ModuleTypeDef::new(name.clone(), type_desc.clone()));
    }

    let placeholders: Vec<Function> = ctx
        .project
        .undefined_receivers()
        .map(|(path, receiver)| {
            tracing::warn!(path, function = %receiver.function_name, "VM path has no inbound flow");
            Function::public(
                receiver.function_name.clone(),
                context_params(),
                None,
                vec![Statement::comment(&format!(
                    "TODO: no inbound flow listens on VM path '{}'",
                    path
                ))],
            )
        })
        .collect();
    unit.functions.extend(placeholders);

    unit
}

fn optional_fields(fields: &IndexMap<String, String>) -> String {
    let mut desc = String::from("record {|\n");
    for (name, type_desc) in fields {
        desc.push_str(&format!("{} {}?;\n", type_desc, name));
    }
    desc.push_str("|}");
    desc
}
