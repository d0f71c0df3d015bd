//! Inline transformation scripts (DataWeave).
//!
//! Only the structural subset is translated: literals, `payload` and `vars`
//! selectors, object and array constructors. Anything else (operators,
//! `map`, functions, `$(..)` interpolation) is left as a TODO placeholder.

use super::expr::{convert_identifier, quote_string, unsupported_placeholder};
use super::{context_params, CONTEXT_REF, FLOW_VARS_ACCESS, PAYLOAD_ACCESS};
use crate::context::{Context, TempCategory};
use crate::ir::{Function, Statement, TypeDesc};

const HEADER_SEPARATOR: &str = "---";

pub(super) fn convert_transform_message(ctx: &mut Context, script: &str) -> Vec<Statement> {
    let body = script_body(script);
    let Some(expr) = DwParser::new(body).parse() else {
        return vec![unsupported_placeholder("transform-message", script)];
    };

    let method = ctx.next_temp(TempCategory::DwMethod);
    let output = ctx.next_temp(TempCategory::DwOutput);
    ctx.add_helper_function(Function::private(
        method.clone(),
        context_params(),
        Some(TypeDesc::from("json|error")),
        vec![Statement::literal(format!("return {};", expr))],
    ));

    vec![
        Statement::comment("data transformation"),
        Statement::literal(format!("json {} = check {}({});", output, method, CONTEXT_REF)),
        Statement::literal(format!("{} = {};", PAYLOAD_ACCESS, output)),
    ]
}

/// The part after the `---` header separator, or the whole script.
fn script_body(script: &str) -> &str {
    let mut offset = 0;
    for line in script.split_inclusive('\n') {
        offset += line.len();
        if line.trim() == HEADER_SEPARATOR {
            return &script[offset..];
        }
    }
    script
}

struct DwParser {
    chars: Vec<char>,
    pos: usize,
}

impl DwParser {
    fn new(body: &str) -> Self {
        Self {
            chars: body.chars().collect(),
            pos: 0,
        }
    }

    /// The whole body as one expression, or `None` outside the subset.
    fn parse(mut self) -> Option<String> {
        let value = self.parse_value()?;
        self.skip_whitespace();
        (self.pos == self.chars.len()).then_some(value)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Option<String> {
        self.skip_whitespace();
        match self.peek()? {
            '{' => self.parse_object(),
            '[' => self.parse_array(),
            '"' | '\'' => self.parse_string().map(|s| quote_string(&s)),
            c if c.is_ascii_digit() || c == '-' => self.parse_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.parse_selector(),
            _ => None,
        }
    }

    fn parse_object(&mut self) -> Option<String> {
        self.pos += 1;
        let mut fields = Vec::new();
        if !self.eat('}') {
            loop {
                self.skip_whitespace();
                let key = match self.peek()? {
                    '"' | '\'' => self.parse_string()?,
                    _ => self.parse_word()?,
                };
                if !self.eat(':') {
                    return None;
                }
                let value = self.parse_value()?;
                fields.push(format!("{}: {}", quote_string(&key), value));
                if self.eat('}') {
                    break;
                }
                if !self.eat(',') {
                    return None;
                }
            }
        }
        Some(format!("{{{}}}", fields.join(", ")))
    }

    fn parse_array(&mut self) -> Option<String> {
        self.pos += 1;
        let mut items = Vec::new();
        if !self.eat(']') {
            loop {
                items.push(self.parse_value()?);
                if self.eat(']') {
                    break;
                }
                if !self.eat(',') {
                    return None;
                }
            }
        }
        Some(format!("[{}]", items.join(", ")))
    }

    /// Raw contents of a quoted string. Interpolated strings are rejected.
    fn parse_string(&mut self) -> Option<String> {
        let quote = self.peek()?;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self.peek()?;
            self.pos += 1;
            match c {
                '\\' => {
                    out.push(self.peek()?);
                    self.pos += 1;
                }
                '$' if self.peek() == Some('(') => return None,
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Option<String> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>().ok().map(|_| text)
    }

    fn parse_word(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    fn parse_selector(&mut self) -> Option<String> {
        let head = self.parse_word()?;
        let mut fields = Vec::new();
        while self.peek() == Some('.') {
            self.pos += 1;
            fields.push(convert_identifier(&self.parse_word()?));
        }

        let base = match head.as_str() {
            "true" | "false" if fields.is_empty() => return Some(head),
            "null" if fields.is_empty() => return Some("()".to_string()),
            "payload" => PAYLOAD_ACCESS.to_string(),
            "vars" if !fields.is_empty() => format!("{}.{}", FLOW_VARS_ACCESS, fields.remove(0)),
            _ => return None,
        };

        if fields.is_empty() {
            Some(format!("{}.toJson()", base))
        } else {
            Some(format!("check {}.toJson().{}", base, fields.join(".")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::CompilationUnit;

    const HEADER: &str = "%dw 2.0\noutput application/json\n---\n";

    fn render(statements: &[Statement]) -> String {
        statements.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn object_script_becomes_helper() {
        let mut ctx = Context::default();
        let script = format!("{}{{\n  id: payload.id,\n  \"name\": vars.user.name,\n  tags: ['a', 1, true, null]\n}}", HEADER);

        let text = render(&convert_transform_message(&mut ctx, &script));

        assert!(text.contains("json _dwOutput0_ = check dwMethod0(ctx);"));
        assert!(text.contains("ctx.payload = _dwOutput0_;"));

        let mut unit = CompilationUnit::new("main");
        ctx.finish_file(&mut unit);
        assert_eq!(
            unit.functions[0].to_string(),
            "function dwMethod0(Context ctx) returns json|error {\nreturn {\"id\": check ctx.payload.toJson().id, \"name\": check ctx.flowVars.user.toJson().name, \"tags\": [\"a\", 1, true, ()]};\n}"
        );
    }

    #[test]
    fn bare_payload_without_header() {
        let mut ctx = Context::default();
        convert_transform_message(&mut ctx, "payload");

        let mut unit = CompilationUnit::new("main");
        ctx.finish_file(&mut unit);
        assert!(unit.functions[0].to_string().contains("return ctx.payload.toJson();"));
    }

    #[test]
    fn unsupported_script_is_left_as_todo() {
        let mut ctx = Context::default();
        let script = format!("{}payload map (item) -> item.id", HEADER);

        let stmts = convert_transform_message(&mut ctx, &script);

        assert_eq!(stmts.len(), 1);
        let text = render(&stmts);
        assert!(text.contains("// TODO: UNSUPPORTED BLOCK 'transform-message'"));
        assert!(text.contains("// payload map (item) -> item.id"));
    }

    #[test]
    fn interpolated_string_is_unsupported() {
        assert!(DwParser::new("\"Hello $(payload.name)\"").parse().is_none());
    }
}
