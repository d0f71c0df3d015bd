use pretty_assertions::assert_eq;
use serde_json::json;

use balmig_compiler::codegen::syntax::parse_function_body_block;
use balmig_compiler::ir::{render_block, OnFail, Statement};
use balmig_compiler::legacy::{load_file, LegacyFile, LegacyProject};
use balmig_compiler::{AnalysisContext, GeneratedModule, MigrateError, Migrator, MigratorConfig};

fn project(files: Vec<serde_json::Value>) -> LegacyProject {
    LegacyProject {
        files: files
            .into_iter()
            .map(|f| serde_json::from_value::<LegacyFile>(f).unwrap())
            .collect(),
    }
}

fn migrate(files: Vec<serde_json::Value>) -> Vec<GeneratedModule> {
    Migrator::new(MigratorConfig::default()).migrate(&project(files)).unwrap()
}

fn source<'a>(modules: &'a [GeneratedModule], name: &str) -> &'a str {
    &modules.iter().find(|m| m.name == name).unwrap().source
}

#[test]
fn set_then_remove_variable() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [
                { "kind": "set_variable", "name": "x", "value": "#[1]" },
                { "kind": "remove_variable", "name": "x" },
                { "kind": "remove_variable", "name": "#[vars.never]" }
            ]
        }]
    })]);

    assert_eq!(modules.len(), 2);
    assert_eq!(
        source(&modules, "main"),
        "public function main(Context ctx) {\n    ctx.flowVars.x = 1;\n    ctx.flowVars.x = ();\n}\n"
    );
    assert_eq!(
        source(&modules, "types"),
        "type Context record {|
    anydata payload = ();
    FlowVars flowVars = {};
    SessionVars sessionVars = {};
|};

type FlowVars record {|
    int x?;
|};

type SessionVars record {||};
"
    );
}

#[test]
fn first_inferred_type_wins_across_files() {
    let modules = migrate(vec![
        json!({
            "name": "a",
            "flows": [{ "name": "a", "blocks": [{ "kind": "set_variable", "name": "count", "value": "#[1]" }] }]
        }),
        json!({
            "name": "b",
            "flows": [{ "name": "b", "blocks": [{ "kind": "set_variable", "name": "count", "value": "hello" }] }]
        }),
    ]);

    let types = source(&modules, "types");
    assert!(types.contains("    int count?;\n"));
    assert!(!types.contains("string count?;"));
}

#[test]
fn last_choice_exception_clause_becomes_else() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [
                { "kind": "set_payload", "value": "start" },
                {
                    "kind": "choice_exception_strategy",
                    "strategies": [
                        { "when": "#[exception.causedBy(java.io.IOException)]",
                          "blocks": [{ "kind": "logger", "level": "ERROR", "message": "io" }] },
                        { "when": "#[exception.causedBy(java.lang.Exception)]",
                          "blocks": [{ "kind": "logger", "level": "ERROR", "message": "other" }] }
                    ]
                }
            ]
        }]
    })]);

    let main = source(&modules, "main");
    assert!(main.starts_with("import ballerina/log;\n\n"));
    assert!(main.contains("    do {\n"));
    assert!(main.contains("        ctx.payload = _payload0_;\n    } on fail error e {\n"));
    assert!(main.contains("        // TODO: if conditions may require some manual adjustments\n"));
    assert!(main.contains("            log:printError(\"io\");\n        } else {\n            log:printError(\"other\");\n        }\n"));
    assert!(!main.contains("else if"));
}

#[test]
fn choice_keeps_clause_order() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [{
                "kind": "choice",
                "whens": [
                    { "condition": "#[vars.a]", "blocks": [{ "kind": "flow_reference", "flow_name": "one" }] },
                    { "condition": "#[vars.b]", "blocks": [{ "kind": "flow_reference", "flow_name": "two" }] },
                    { "condition": "#[vars.c]", "blocks": [{ "kind": "flow_reference", "flow_name": "three" }] }
                ],
                "otherwise": [{ "kind": "flow_reference", "flow_name": "fallback" }]
            }]
        }]
    })]);

    assert_eq!(
        source(&modules, "main"),
        "public function main(Context ctx) {
    if (ctx.flowVars.a) {
        one(ctx);
    } else if (ctx.flowVars.b) {
        two(ctx);
    } else if (ctx.flowVars.c) {
        three(ctx);
    } else {
        fallback(ctx);
    }
}
"
    );
}

#[test]
fn vm_paths_share_receivers() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [
                { "kind": "vm_outbound_endpoint", "path": "/foo" },
                { "kind": "vm_outbound_endpoint", "path": "/foo" },
                { "kind": "vm_outbound_endpoint", "path": "/bar" }
            ]
        }]
    })]);

    let main = source(&modules, "main");
    assert_eq!(main.matches("worker vmReceive0Worker returns error? {").count(), 1);
    assert_eq!(main.matches("worker vmReceive1Worker returns error? {").count(), 1);
    assert_eq!(main.matches("ctx.payload -> vmReceive0Worker;").count(), 2);
    assert_eq!(main.matches("ctx.payload -> vmReceive1Worker;").count(), 1);
    assert!(main.contains("        vmReceive0(ctx);\n"));

    // Workers come before the statements that send to them.
    let worker_at = main.find("worker vmReceive1Worker").unwrap();
    let send_at = main.find("-> vmReceive0Worker").unwrap();
    assert!(worker_at < send_at);

    let types = source(&modules, "types");
    assert!(types.contains("public function vmReceive0(Context ctx) {\n    // TODO: no inbound flow listens on VM path '/foo'\n}\n"));
    assert!(types.contains("public function vmReceive1(Context ctx) {"));
}

#[test]
fn each_function_declares_its_own_workers() {
    let send = json!({ "kind": "vm_outbound_endpoint", "path": "/foo" });
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [
            { "name": "first", "blocks": [send.clone(), { "kind": "async", "blocks": [send.clone()] }] },
            { "name": "second", "blocks": [send.clone()] }
        ]
    })]);

    let main = source(&modules, "main");
    assert_eq!(main.matches("worker vmReceive0Worker returns error? {").count(), 3);
    assert_eq!(main.matches("ctx.payload -> vmReceive0Worker;").count(), 3);
    assert!(!main.contains("vmReceive1"));

    let async_helper = &main[main.find("public function async0(Context ctx) {").unwrap()..];
    let worker_at = async_helper.find("worker vmReceive0Worker").unwrap();
    let send_at = async_helper.find("ctx.payload -> vmReceive0Worker;").unwrap();
    assert!(worker_at < send_at);
}

#[test]
fn inbound_vm_flow_defines_receiver() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [
            { "name": "sender", "blocks": [{ "kind": "vm_outbound_endpoint", "path": "audit" }] },
            { "name": "auditor", "source": { "kind": "vm_inbound", "path": "audit" },
              "blocks": [{ "kind": "logger", "level": "INFO", "message": "got it" }] }
        ]
    })]);

    let main = source(&modules, "main");
    assert!(main.contains("public function vmReceive0(Context ctx) {\n    log:printInfo(\"got it\");\n}\n"));
    assert!(!source(&modules, "types").contains("function vmReceive0"));
}

#[test]
fn http_flow_becomes_service_resource() {
    let modules = migrate(vec![json!({
        "name": "orders",
        "http_listener_configs": [{ "name": "config", "port": 8081, "base_path": "/api" }],
        "flows": [{
            "name": "get-order",
            "source": { "kind": "http_listener", "config_ref": "config", "path": "/orders/{id}", "allowed_methods": ["GET"] },
            "blocks": [{ "kind": "object_to_json" }]
        }]
    })]);

    let orders = source(&modules, "orders");
    assert!(orders.starts_with("import ballerina/http;\n\nlistener http:Listener config = new (8081);\n\n"));
    assert!(orders.contains("service /api on config {\n    resource function get orders/[string id](http:Request request) returns http:Response {\n        Context ctx = {};\n        get_order(ctx);\n"));
    assert!(orders.contains("public function get_order(Context ctx) {\n"));
    assert!(orders.contains("    ctx.payload = ctx.payload.toJson();\n"));
}

#[test]
fn analysis_names_override_flow_names() {
    let project = project(vec![json!({
        "name": "main",
        "flows": [{ "name": "legacy-main", "blocks": [{ "kind": "flow_reference", "flow_name": "legacy-helper" }] }],
        "sub_flows": [{ "name": "legacy-helper", "blocks": [] }]
    })]);
    let analysis = AnalysisContext::default()
        .with_function_name("legacy-main", "mainFlow")
        .with_function_name("legacy-helper", "helperFlow");

    let modules = Migrator::new(MigratorConfig::default())
        .with_analysis(analysis)
        .migrate(&project)
        .unwrap();

    let main = source(&modules, "main");
    assert!(main.contains("public function mainFlow(Context ctx) {\n    helperFlow(ctx);\n}\n"));
    assert!(main.contains("function helperFlow(Context ctx) {\n}\n"));
}

#[test]
fn generated_names_are_unique_across_files() {
    let file = |name: &str| {
        json!({
            "name": name,
            "flows": [{ "name": name, "blocks": [
                { "kind": "set_payload", "value": "a" },
                { "kind": "set_payload", "value": "b" },
                { "kind": "async", "blocks": [{ "kind": "set_payload", "value": "c" }] }
            ] }]
        })
    };
    let modules = migrate(vec![file("one"), file("two")]);

    let one = source(&modules, "one");
    let two = source(&modules, "two");
    for name in ["_payload0_", "_payload1_", "_payload2_", "async0"] {
        assert!(one.contains(name), "{} missing from one", name);
        assert!(!two.contains(&format!("{} =", name)), "{} reused in two", name);
    }
    assert!(two.contains("_payload3_") && two.contains("async1"));
}

#[test]
fn unsupported_nodes_become_placeholders() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [{ "kind": "unsupported", "element": "jms:outbound-endpoint", "source": "<jms:outbound-endpoint queue=\"q\"/>" }]
        }]
    })]);

    let main = source(&modules, "main");
    assert!(main.contains("    // TODO: UNSUPPORTED BLOCK 'jms:outbound-endpoint' ENCOUNTERED. MANUAL CONVERSION REQUIRED.\n"));
    assert!(main.contains("    // <jms:outbound-endpoint queue=\"q\"/>\n"));
}

#[test]
fn mapping_conditions_stay_inside_parentheses() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [{
                "kind": "choice",
                "whens": [{ "condition": "#[payload == {}]", "blocks": [{ "kind": "set_payload", "value": "#[true]" }] }]
            }]
        }]
    })]);

    let main = source(&modules, "main");
    assert!(main.contains("    if (ctx.payload == {}) {\n        // set payload\n        boolean _payload0_ = true;\n"));
}

#[test]
fn indexed_variables_and_nested_query_parameters() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [
                { "kind": "set_payload", "value": "#[flowVars['order-id']]" },
                { "kind": "database", "operation": "select", "config_ref": "db",
                  "query": "SELECT * FROM t WHERE id = #[message.inboundProperties['http.query.params'].id]" }
            ]
        }]
    })]);

    let main = source(&modules, "main");
    assert!(main.contains("    anydata _payload0_ = ctx.flowVars[\"order-id\"];\n"));
    assert!(main.contains(
        "`SELECT * FROM t WHERE id = ${message.inboundProperties[\"http.query.params\"].id}`;"
    ));
}

#[test]
fn non_ascii_names_migrate() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [
                { "kind": "set_variable", "name": "café", "value": "#[vars.café]" },
                { "kind": "set_payload", "value": "#[größe]" },
                { "kind": "set_payload", "value": "#[vars.price § 2]" }
            ]
        }]
    })]);

    let main = source(&modules, "main");
    assert!(main.contains("    ctx.flowVars.caf_ = ctx.flowVars.caf_;\n"));
    assert!(main.contains("    anydata _payload0_ = größe;\n"));
    assert!(main.contains("    string _payload1_ = \"TODO: UNSUPPORTED EXPRESSION #[vars.price § 2]\";\n"));
}

#[test]
fn script_comments_are_kept_as_comments() {
    let modules = migrate(vec![json!({
        "name": "main",
        "flows": [{
            "name": "main",
            "blocks": [{ "kind": "expression_component", "content": "// set the flag\n\nflowVars.flag = true;\n" }]
        }]
    })]);

    let main = source(&modules, "main");
    assert!(main.contains("{\n    // set the flag\n    ctx.flowVars.flag = true;\n}\n"));
}

#[test]
fn empty_choice_aborts_the_run() {
    let project = project(vec![json!({
        "name": "main",
        "flows": [{ "name": "main", "blocks": [{ "kind": "choice", "whens": [] }] }]
    })]);

    let err = Migrator::new(MigratorConfig::default()).migrate(&project).unwrap_err();
    assert!(matches!(err, MigrateError::InvariantViolation { .. }));
}

#[test]
fn skip_formatting_keeps_minimal_whitespace() {
    let config = MigratorConfig {
        skip_formatting: true,
        ..MigratorConfig::default()
    };
    let modules = Migrator::new(config)
        .migrate(&project(vec![json!({
            "name": "main",
            "flows": [{ "name": "main", "blocks": [
                { "kind": "choice", "whens": [{ "condition": "#[vars.a]", "blocks": [{ "kind": "set_variable", "name": "b", "value": "#[1]" }] }] }
            ] }]
        })]))
        .unwrap();

    assert_eq!(
        source(&modules, "main"),
        "public function main(Context ctx) {\nif (ctx.flowVars.a) {\nctx.flowVars.b = 1;\n}\n}\n"
    );
}

#[test]
fn rendered_statements_reparse() {
    let statements = vec![
        Statement::comment("leading\ncomment"),
        Statement::literal("int a = 1;"),
        Statement::IfElse {
            condition: "a > 0".into(),
            then_body: vec![Statement::literal("a = 2;")],
            else_ifs: vec![balmig_compiler::ir::ElseIf {
                condition: "a < 0".into(),
                body: vec![Statement::literal("a = -a;")],
            }],
            else_body: vec![Statement::literal("a = 0;")],
        },
        Statement::Do {
            body: vec![Statement::literal("check f();")],
            on_fail: OnFail::bound(vec![Statement::literal("g(e);")], "error", "e"),
        },
        Statement::Do {
            body: Vec::new(),
            on_fail: OnFail::untyped(Vec::new()),
        },
        Statement::Worker {
            name: "W".to_string(),
            return_type: Some("error?".into()),
            body: vec![Statement::literal("anydata p = <- function;")],
        },
        Statement::literal("string s = string `a ${a} b`;"),
    ];

    let block = parse_function_body_block(&render_block(&statements)).unwrap();
    assert_eq!(block.statements.len(), 6);
}

#[test]
fn migrates_a_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let source_dir = dir.path().join("flows");
    let out_dir = dir.path().join("generated");
    std::fs::create_dir_all(source_dir.join("orders")).unwrap();

    let document = json!({
        "flows": [{ "name": "main", "blocks": [{ "kind": "set_payload", "value": "ok" }] }]
    });
    std::fs::write(source_dir.join("orders").join("api.json"), document.to_string()).unwrap();
    std::fs::write(source_dir.join("notes.txt"), "ignored").unwrap();

    let config = MigratorConfig {
        source_dir,
        out_dir: out_dir.clone(),
        ..MigratorConfig::default()
    };
    let result = Migrator::new(config).migrate_directory().unwrap();

    assert_eq!(result.files, 1);
    assert_eq!(result.flows, 1);
    assert_eq!(result.modules.len(), 2);

    let written = std::fs::read_to_string(out_dir.join("orders_api.bal")).unwrap();
    assert!(written.contains("    string _payload0_ = \"ok\";\n    ctx.payload = _payload0_;\n"));
    assert!(out_dir.join("types.bal").exists());
}

#[test]
fn invalid_documents_are_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

    let config = MigratorConfig {
        source_dir: dir.path().to_path_buf(),
        out_dir: dir.path().join("out"),
        ..MigratorConfig::default()
    };
    let err = Migrator::new(config).migrate_directory().unwrap_err();
    assert!(matches!(err, MigrateError::InvalidFlowDocument { .. }));
}

#[test]
fn sample_document_migrates() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/orders.json");
    let file = load_file(&path).unwrap();
    let modules = Migrator::new(MigratorConfig::default())
        .migrate(&LegacyProject { files: vec![file] })
        .unwrap();

    let orders = source(&modules, "orders");
    assert!(orders.contains("service /api on config {"));
    assert!(orders.contains("if (ctx.flowVars.id == \"0\") {\n"));
    assert!(orders.contains("worker vmReceive0Worker returns error? {"));
    assert!(orders.contains("public function vmReceive0(Context ctx) {"));
    assert!(!source(&modules, "types").contains("function vmReceive0"));
}
