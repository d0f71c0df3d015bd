//! Legacy expression and identifier resolution.
//!
//! Legacy values are either plain text, a single `#[..]` expression, or text
//! with embedded `#[..]` expressions. They resolve to a string literal, a
//! rewritten target expression, or a string template respectively.

use indexmap::IndexMap;

use super::{FLOW_VARS_ACCESS, PAYLOAD_ACCESS, SESSION_VARS_ACCESS};
use crate::ir::Statement;

/// Reserved words that must be quoted with `'` when used as identifiers.
const RESERVED: &[&str] = &[
    "abstract", "annotation", "any", "anydata", "as", "boolean", "break", "byte", "check",
    "checkpanic", "class", "client", "configurable", "const", "continue", "decimal", "distinct",
    "do", "else", "enum", "error", "external", "fail", "false", "final", "float", "foreach",
    "fork", "from", "function", "future", "handle", "if", "import", "in", "int", "is", "isolated",
    "join", "json", "let", "listener", "lock", "map", "match", "never", "new", "null", "object",
    "on", "panic", "private", "public", "readonly", "record", "remote", "resource", "retry",
    "return", "returns", "select", "service", "start", "stream", "string", "table", "transaction",
    "trap", "true", "type", "typedesc", "typeof", "var", "wait", "where", "while", "worker",
    "xml",
];

/// Converts a legacy name into a valid identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets a `_`
/// prefix and reserved words are quoted.
pub fn convert_identifier(name: &str) -> String {
    let mut id: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if id.is_empty() {
        return "_".to_string();
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    if RESERVED.contains(&id.as_str()) {
        id.insert(0, '\'');
    }
    id
}

/// Returns the inside of a value that is exactly one `#[..]` expression.
pub(crate) fn strip_expression_wrapper(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix("#[")?.strip_suffix(']')?;
    // `#[a] and #[b]` is two expressions, not one
    match split_template(trimmed).as_slice() {
        [Segment::Expr(_)] => Some(inner.trim()),
        _ => None,
    }
}

/// Resolves a legacy value to a target expression.
pub fn convert_expr(raw: &str) -> String {
    if let Some(inner) = strip_expression_wrapper(raw) {
        return convert_mel(inner);
    }
    if raw.contains("#[") {
        return string_template(raw);
    }
    quote_string(raw)
}

/// Resolves a legacy value to a string-typed expression.
pub(crate) fn convert_string_literal(raw: &str) -> String {
    if raw.contains("#[") {
        string_template(raw)
    } else {
        quote_string(raw)
    }
}

/// Infers a type descriptor from a resolved expression.
pub fn infer_type(expr: &str) -> &'static str {
    let expr = expr.trim();
    if (expr.starts_with('"') && expr.ends_with('"') && expr.len() >= 2) || expr.starts_with("string `") {
        "string"
    } else if expr == "true" || expr == "false" {
        "boolean"
    } else if expr.parse::<i64>().is_ok() {
        "int"
    } else if expr.contains('.') && expr.parse::<f64>().is_ok() {
        "decimal"
    } else if expr.starts_with('{') {
        "map<anydata>"
    } else if expr.starts_with('[') {
        "anydata[]"
    } else {
        "anydata"
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Expr(&'a str),
}

/// Splits `text #[expr] text` into segments. An unterminated `#[` is text.
fn split_template(raw: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let bytes = raw.as_bytes();
    let mut text_start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'#' && bytes[i + 1] == b'[' {
            let mut depth = 0usize;
            let mut end = None;
            for (j, &b) in bytes.iter().enumerate().skip(i + 1) {
                match b {
                    b'[' => depth += 1,
                    b']' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let Some(end) = end else { break };
            if text_start < i {
                segments.push(Segment::Text(&raw[text_start..i]));
            }
            segments.push(Segment::Expr(&raw[i + 2..end]));
            i = end + 1;
            text_start = i;
        } else {
            i += 1;
        }
    }
    if text_start < raw.len() {
        segments.push(Segment::Text(&raw[text_start..]));
    }
    segments
}

fn string_template(raw: &str) -> String {
    format!("string `{}`", template_body(raw))
}

/// Template text for `raw` with each `#[..]` turned into a `${..}`
/// interpolation, without the enclosing backticks.
pub(crate) fn template_body(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for segment in split_template(raw) {
        match segment {
            Segment::Text(text) => out.push_str(&escape_template_text(text)),
            Segment::Expr(expr) => {
                out.push_str("${");
                out.push_str(&convert_mel(expr.trim()));
                out.push('}');
            }
        }
    }
    out
}

/// Backticks cannot be escaped inside a template; they are interpolated.
pub(crate) fn escape_template_text(text: &str) -> String {
    text.replace('`', "${\"`\"}")
}

pub(crate) fn quote_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Punctuation that passes through expression rewriting unchanged.
const PASSTHROUGH_PUNCTUATION: &str = "+-*/%<>=!?&|^~@#$()[]{}.,:;";

/// Rewrites the inside of a `#[..]` expression.
///
/// Variable and payload selectors are mapped onto the context record,
/// word operators onto symbols, single-quoted strings onto double-quoted
/// ones and `null` onto `()`. Other identifiers, numbers and operators pass
/// through. An expression with characters outside that set becomes a marked
/// string literal.
pub(crate) fn convert_mel(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' || c == '"' {
            i = copy_string(&chars, i, &mut out);
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
            }
            // a trailing `.` belongs to whatever follows
            let mut end = i;
            while end > start && chars[end - 1] == '.' {
                end -= 1;
            }
            let path: String = chars[start..end].iter().collect();
            let indexed = chars.get(end) == Some(&'[');
            out.push_str(&rewrite_path(&path, indexed));
            out.extend(&chars[end..i]);
        } else if c.is_ascii_digit() || c.is_ascii_whitespace() || PASSTHROUGH_PUNCTUATION.contains(c) {
            out.push(c);
            i += 1;
        } else {
            return unsupported_expression(expr);
        }
    }
    out
}

/// A marked string literal standing in for an expression with no translation.
fn unsupported_expression(expr: &str) -> String {
    tracing::warn!(expression = expr, "unsupported expression left for manual conversion");
    quote_string(&format!("TODO: UNSUPPORTED EXPRESSION #[{}]", expr))
}

/// Copies a quoted string starting at `start` as a double-quoted literal and
/// returns the index after its closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == quote {
            out.push('"');
            return i + 1;
        }
        if c == '"' {
            out.push_str("\\\"");
        } else {
            out.push(c);
        }
        i += 1;
    }
    out.push('"');
    i
}

/// `indexed` is set when the path is followed by `[`, as in `flowVars['k']`.
fn rewrite_path(path: &str, indexed: bool) -> String {
    let mut segments = path.split('.');
    let head = segments.next().unwrap_or_default();
    let rest: Vec<&str> = segments.collect();

    let (base, fields) = match head {
        "and" if rest.is_empty() => return "&&".to_string(),
        "or" if rest.is_empty() => return "||".to_string(),
        "not" if rest.is_empty() => return "!".to_string(),
        "null" if rest.is_empty() => return "()".to_string(),
        "flowVars" | "vars" if indexed || !rest.is_empty() => (FLOW_VARS_ACCESS, &rest[..]),
        "sessionVars" if indexed || !rest.is_empty() => (SESSION_VARS_ACCESS, &rest[..]),
        "payload" => (PAYLOAD_ACCESS, &rest[..]),
        "message" if rest.first() == Some(&"payload") => (PAYLOAD_ACCESS, &rest[1..]),
        _ => return path.to_string(),
    };

    let mut out = base.to_string();
    for field in fields {
        out.push('.');
        out.push_str(&convert_identifier(field));
    }
    out
}

/// `/users/{id}/#[vars.x]` → `/users/[id]/[ctx.flowVars.x]`.
pub(crate) fn client_resource_path(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.trim().is_empty())
        .map(|segment| {
            let segment = segment.trim();
            if let Some(inner) = strip_expression_wrapper(segment) {
                format!("[{}]", convert_mel(inner))
            } else if let Some(param) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                format!("[{}]", convert_identifier(param))
            } else {
                escape_path_segment(segment)
            }
        })
        .collect();
    format!("/{}", segments.join("/"))
}

fn escape_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Query parameters as named arguments: `k = <expr>, ..`.
pub(crate) fn query_args(params: &IndexMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{} = {}", convert_identifier(key), convert_expr(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A marked TODO comment standing in for a construct with no translation.
pub(crate) fn unsupported_placeholder(element: &str, source: &str) -> Statement {
    tracing::warn!(element, "unsupported construct left for manual conversion");
    let mut text = format!(
        "TODO: UNSUPPORTED BLOCK '{}' ENCOUNTERED. MANUAL CONVERSION REQUIRED.\n---------------------------------------------------------------",
        element
    );
    for line in source.lines().filter(|l| !l.trim().is_empty()) {
        text.push('\n');
        text.push_str(line.trim_end());
    }
    Statement::comment(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(convert_identifier("order-id"), "order_id");
        assert_eq!(convert_identifier("1st"), "_1st");
        assert_eq!(convert_identifier("string"), "'string");
        assert_eq!(convert_identifier("my flow"), "my_flow");
    }

    #[test]
    fn plain_text_is_string_literal() {
        assert_eq!(convert_expr("hello \"world\""), "\"hello \\\"world\\\"\"");
    }

    #[test]
    fn rewrites_variable_selectors() {
        assert_eq!(convert_expr("#[vars.count]"), "ctx.flowVars.count");
        assert_eq!(convert_expr("#[flowVars.count]"), "ctx.flowVars.count");
        assert_eq!(convert_expr("#[sessionVars.user.name]"), "ctx.sessionVars.user.name");
        assert_eq!(convert_expr("#[message.payload]"), "ctx.payload");
        assert_eq!(convert_expr("#[payload.id]"), "ctx.payload.id");
    }

    #[test]
    fn rewrites_operators_and_literals() {
        assert_eq!(
            convert_expr("#[vars.a == 'x' and not vars.b or vars.c != null]"),
            "ctx.flowVars.a == \"x\" && ! ctx.flowVars.b || ctx.flowVars.c != ()"
        );
        assert_eq!(convert_expr("#[42]"), "42");
        assert_eq!(convert_expr("#['it\"s']"), "\"it\\\"s\"");
    }

    #[test]
    fn rewrites_indexed_variable_selectors() {
        assert_eq!(convert_expr("#[flowVars['order-id']]"), "ctx.flowVars[\"order-id\"]");
        assert_eq!(convert_expr("#[vars[\"k\"]]"), "ctx.flowVars[\"k\"]");
        assert_eq!(convert_expr("#[sessionVars['k'].name]"), "ctx.sessionVars[\"k\"].name");
        assert_eq!(convert_expr("#[flowVars]"), "flowVars");
    }

    #[test]
    fn non_ascii_identifiers_are_sanitized() {
        assert_eq!(convert_expr("#[vars.café]"), "ctx.flowVars.caf_");
        assert_eq!(convert_expr("#[größe + 1]"), "größe + 1");
    }

    #[test]
    fn unmappable_characters_become_marked_literal() {
        assert_eq!(
            convert_expr("#[vars.price § 2]"),
            "\"TODO: UNSUPPORTED EXPRESSION #[vars.price § 2]\""
        );
        assert_eq!(
            convert_expr("total #[`x`]"),
            "string `total ${\"TODO: UNSUPPORTED EXPRESSION #[`x`]\"}`"
        );
    }

    #[test]
    fn mixed_text_becomes_template() {
        assert_eq!(
            convert_expr("Hello #[vars.name]!"),
            "string `Hello ${ctx.flowVars.name}!`"
        );
        assert_eq!(
            convert_expr("#[vars.a] and #[vars.b]"),
            "string `${ctx.flowVars.a} and ${ctx.flowVars.b}`"
        );
    }

    #[test]
    fn nested_brackets_stay_in_one_expression() {
        assert_eq!(convert_expr("#[payload[0]]"), "ctx.payload[0]");
    }

    #[test]
    fn infers_types() {
        assert_eq!(infer_type("\"a\""), "string");
        assert_eq!(infer_type("string `a${b}`"), "string");
        assert_eq!(infer_type("12"), "int");
        assert_eq!(infer_type("1.5"), "decimal");
        assert_eq!(infer_type("true"), "boolean");
        assert_eq!(infer_type("ctx.payload"), "anydata");
    }

    #[test]
    fn resource_paths() {
        assert_eq!(client_resource_path("/"), "/");
        assert_eq!(client_resource_path("/users/{id}"), "/users/[id]");
        assert_eq!(client_resource_path("orders/#[vars.id]/items"), "/orders/[ctx.flowVars.id]/items");
        assert_eq!(client_resource_path("/api/v-1"), "/api/v\\-1");
    }

    #[test]
    fn query_arguments_keep_order() {
        let mut params = IndexMap::new();
        params.insert("limit".to_string(), "10".to_string());
        params.insert("q".to_string(), "#[vars.term]".to_string());
        assert_eq!(query_args(&params), "limit = \"10\", q = ctx.flowVars.term");
    }

    #[test]
    fn placeholder_quotes_source() {
        let stmt = unsupported_placeholder("jms:outbound-endpoint", "<jms:outbound-endpoint queue=\"q\"/>");
        let text = stmt.to_string();
        assert!(text.contains("// TODO: UNSUPPORTED BLOCK 'jms:outbound-endpoint'"));
        assert!(text.contains("// <jms:outbound-endpoint queue=\"q\"/>"));
    }
}
