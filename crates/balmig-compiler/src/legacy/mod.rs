//! Legacy integration-flow object model.
//!
//! This is what the vendor project parsers hand over: an immutable, ordered
//! tree of typed flow nodes. Parsing the vendor XML is not this crate's
//! concern; the model derives `Deserialize` so parsed trees can also be
//! exchanged as JSON documents (one document per legacy configuration file).

mod load;

pub use load::{load_directory, load_file};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// All legacy files of one project, in translation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyProject {
    pub files: Vec<LegacyFile>,
}

/// One legacy configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyFile {
    /// Module name of the generated file (e.g., "orders").
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub http_listener_configs: Vec<HttpListenerConfig>,

    #[serde(default)]
    pub db_configs: Vec<DbConfig>,

    #[serde(default)]
    pub flows: Vec<Flow>,

    #[serde(default)]
    pub sub_flows: Vec<SubFlow>,
}

/// A flow: an optional message source followed by processing nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub name: String,

    #[serde(default)]
    pub source: Option<FlowSource>,

    #[serde(default)]
    pub blocks: Vec<FlowNode>,
}

/// A private flow without a message source, only reachable by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubFlow {
    pub name: String,

    #[serde(default)]
    pub blocks: Vec<FlowNode>,
}

/// Message source that starts a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowSource {
    HttpListener {
        config_ref: String,
        path: String,
        #[serde(default)]
        allowed_methods: Vec<String>,
    },
    VmInbound {
        path: String,
    },
}

/// `<http:listener-config>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpListenerConfig {
    pub name: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub base_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9090
}

/// `<db:config>` for a MySQL connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// One processing node of a flow.
///
/// This is a closed set: the translator matches on it exhaustively, so a new
/// legacy construct cannot be added without teaching the translator about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowNode {
    Logger {
        #[serde(default)]
        level: LogLevel,
        message: String,
    },
    SetVariable {
        name: String,
        value: String,
    },
    SetSessionVariable {
        name: String,
        value: String,
    },
    RemoveVariable {
        name: String,
        #[serde(default)]
        scope: VariableScope,
    },
    SetPayload {
        value: String,
    },
    Choice {
        whens: Vec<WhenClause>,
        #[serde(default)]
        otherwise: Vec<FlowNode>,
    },
    FlowReference {
        flow_name: String,
    },
    ObjectToJson,
    ObjectToString,
    CatchExceptionStrategy(CatchStrategy),
    ChoiceExceptionStrategy {
        strategies: Vec<CatchStrategy>,
    },
    ReferenceExceptionStrategy {
        ref_name: String,
    },
    ExpressionComponent {
        content: String,
    },
    Enricher {
        source: String,
        target: String,
        #[serde(default)]
        inner: Option<Box<FlowNode>>,
    },
    HttpRequest(HttpRequest),
    Database(Database),
    Async {
        blocks: Vec<FlowNode>,
    },
    VmOutboundEndpoint {
        path: String,
    },
    TransformMessage {
        script: String,
    },
    Unsupported(UnsupportedBlock),
}

impl FlowNode {
    /// Short name of the node kind, used in diagnostics and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FlowNode::Logger { .. } => "logger",
            FlowNode::SetVariable { .. } => "set-variable",
            FlowNode::SetSessionVariable { .. } => "set-session-variable",
            FlowNode::RemoveVariable { .. } => "remove-variable",
            FlowNode::SetPayload { .. } => "set-payload",
            FlowNode::Choice { .. } => "choice",
            FlowNode::FlowReference { .. } => "flow-ref",
            FlowNode::ObjectToJson => "object-to-json-transformer",
            FlowNode::ObjectToString => "object-to-string-transformer",
            FlowNode::CatchExceptionStrategy(_) => "catch-exception-strategy",
            FlowNode::ChoiceExceptionStrategy { .. } => "choice-exception-strategy",
            FlowNode::ReferenceExceptionStrategy { .. } => "exception-strategy",
            FlowNode::ExpressionComponent { .. } => "expression-component",
            FlowNode::Enricher { .. } => "enricher",
            FlowNode::HttpRequest(_) => "http:request",
            FlowNode::Database(_) => "db operation",
            FlowNode::Async { .. } => "async",
            FlowNode::VmOutboundEndpoint { .. } => "vm:outbound-endpoint",
            FlowNode::TransformMessage { .. } => "transform-message",
            FlowNode::Unsupported(_) => "unsupported",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Error,
    #[default]
    Info,
    Trace,
    Warn,
}

/// Which variable table a remove-variable node targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    #[default]
    Flow,
    Session,
}

/// `<when expression="...">` inside a choice router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhenClause {
    pub condition: String,
    #[serde(default)]
    pub blocks: Vec<FlowNode>,
}

/// `<catch-exception-strategy>`, standalone or inside a choice strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatchStrategy {
    /// Predicate selecting this strategy; only meaningful inside a choice strategy.
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub blocks: Vec<FlowNode>,
}

/// `<http:request>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub config_ref: String,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub query_params: IndexMap<String, String>,
}

/// `<db:select>`, `<db:insert>`, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub operation: DbOperation,
    pub config_ref: String,
    pub query: String,
    /// Child elements the translator has no mapping for.
    #[serde(default)]
    pub unsupported: Vec<UnsupportedBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbOperation {
    Select,
    Insert,
    Update,
    Delete,
    Execute,
}

/// A construct the parser recognized but the migrator cannot convert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsupportedBlock {
    /// Element name, e.g. "jms:outbound-endpoint".
    pub element: String,
    /// Raw source of the element, kept for the placeholder comment.
    #[serde(default)]
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_nodes() {
        let json = r#"[
            {"kind": "logger", "level": "WARN", "message": "hi"},
            {"kind": "object_to_json"},
            {"kind": "catch_exception_strategy", "blocks": [{"kind": "set_payload", "value": "x"}]},
            {"kind": "database", "operation": "select", "config_ref": "db", "query": "SELECT 1"}
        ]"#;
        let nodes: Vec<FlowNode> = serde_json::from_str(json).unwrap();

        assert_eq!(nodes.len(), 4);
        assert!(matches!(nodes[0], FlowNode::Logger { level: LogLevel::Warn, .. }));
        assert!(matches!(nodes[1], FlowNode::ObjectToJson));
        match &nodes[2] {
            FlowNode::CatchExceptionStrategy(strategy) => {
                assert!(strategy.when.is_none());
                assert_eq!(strategy.blocks.len(), 1);
            }
            other => panic!("unexpected node {:?}", other),
        }
        assert_eq!(nodes[3].kind_name(), "db operation");
    }

    #[test]
    fn rejects_unknown_kind() {
        let result: Result<FlowNode, _> = serde_json::from_str(r#"{"kind": "jms_endpoint"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_listener_config() {
        let config: HttpListenerConfig = serde_json::from_str(r#"{"name": "cfg"}"#).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert!(config.base_path.is_empty());
    }
}
