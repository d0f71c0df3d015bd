//! Statement intermediate representation.

use std::fmt;
use super::{Expression, TypeDesc};

/// IR representation of a statement in a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Already-rendered target text, emitted verbatim. Also carries comments.
    Literal(String),

    /// if cond { .. } else if cond { .. } else { .. }
    IfElse {
        condition: Expression,
        then_body: Vec<Statement>,
        else_ifs: Vec<ElseIf>,
        else_body: Vec<Statement>,
    },

    /// do { .. } on fail .. { .. }
    Do {
        body: Vec<Statement>,
        on_fail: OnFail,
    },

    /// worker W returns T { .. }
    Worker {
        name: String,
        return_type: Option<TypeDesc>,
        body: Vec<Statement>,
    },
}

/// An `else if` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

/// The failure handler attached to a `do` block.
#[derive(Debug, Clone, PartialEq)]
pub struct OnFail {
    pub body: Vec<Statement>,
    pub binding: Option<TypedBinding>,
}

/// `error e` in `on fail error e`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBinding {
    pub type_desc: TypeDesc,
    pub name: String,
}

impl Statement {
    /// A statement passed through as-is.
    pub fn literal(text: impl Into<String>) -> Self {
        Statement::Literal(text.into())
    }

    /// A line comment (one `//` line per input line), separated from the
    /// preceding statement by a blank line.
    pub fn comment(text: &str) -> Self {
        let mut out = String::from("\n\n");
        for line in text.lines() {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
        Statement::Literal(out)
    }

    /// An `if` chain without `else if` arms.
    pub fn if_else(condition: Expression, then_body: Vec<Statement>, else_body: Vec<Statement>) -> Self {
        Statement::IfElse {
            condition,
            then_body,
            else_ifs: Vec::new(),
            else_body,
        }
    }
}

impl OnFail {
    /// `on fail { .. }`: any error handled, nothing bound.
    pub fn untyped(body: Vec<Statement>) -> Self {
        Self { body, binding: None }
    }

    /// `on fail <type> <name> { .. }`.
    pub fn bound(body: Vec<Statement>, type_desc: impl Into<TypeDesc>, name: impl Into<String>) -> Self {
        Self {
            body,
            binding: Some(TypedBinding {
                type_desc: type_desc.into(),
                name: name.into(),
            }),
        }
    }
}

/// Renders a statement list as the contents of a `{ }` block.
pub fn render_block(statements: &[Statement]) -> String {
    let mut out = String::from("{\n");
    for stmt in statements {
        out.push_str(&stmt.to_string());
        out.push('\n');
    }
    out.push('}');
    out
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Literal(text) => f.write_str(text),
            Statement::IfElse {
                condition,
                then_body,
                else_ifs,
                else_body,
            } => {
                write!(f, "if ({}) {}", condition, render_block(then_body))?;
                for arm in else_ifs {
                    write!(f, " else if ({}) {}", arm.condition, render_block(&arm.body))?;
                }
                if !else_body.is_empty() {
                    write!(f, " else {}", render_block(else_body))?;
                }
                Ok(())
            }
            Statement::Do { body, on_fail } => {
                write!(f, "do {} {}", render_block(body), on_fail)
            }
            Statement::Worker {
                name,
                return_type,
                body,
            } => {
                write!(f, "worker {}", name)?;
                if let Some(ret) = return_type {
                    write!(f, " returns {}", ret)?;
                }
                write!(f, " {}", render_block(body))
            }
        }
    }
}

impl fmt::Display for OnFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            Some(binding) => write!(
                f,
                "on fail {} {} {}",
                binding.type_desc,
                binding.name,
                render_block(&self.body)
            ),
            None => write!(f, "on fail {}", render_block(&self.body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Statement {
        Statement::literal(s)
    }

    #[test]
    fn renders_if_chain_in_order() {
        let stmt = Statement::IfElse {
            condition: Expression::from("a"),
            then_body: vec![lit("x();")],
            else_ifs: vec![
                ElseIf { condition: Expression::from("b"), body: vec![lit("y();")] },
                ElseIf { condition: Expression::from("c"), body: vec![] },
            ],
            else_body: vec![lit("z();")],
        };
        let text = stmt.to_string();

        let a = text.find("if (a)").unwrap();
        let b = text.find("else if (b)").unwrap();
        let c = text.find("else if (c)").unwrap();
        let z = text.find("else {").unwrap();
        assert!(a < b && b < c && c < z);
    }

    #[test]
    fn parenthesizes_mapping_conditions() {
        let stmt = Statement::if_else(Expression::from("ctx.payload == {}"), vec![lit("x();")], vec![]);
        assert_eq!(stmt.to_string(), "if (ctx.payload == {}) {\nx();\n}");
    }

    #[test]
    fn omits_empty_else() {
        let stmt = Statement::if_else(Expression::from("a"), vec![lit("x();")], vec![]);
        assert!(!stmt.to_string().contains("else"));
    }

    #[test]
    fn renders_do_with_bound_handler() {
        let stmt = Statement::Do {
            body: vec![lit("foo();")],
            on_fail: OnFail::bound(vec![lit("bar(e);")], "error", "e"),
        };
        let text = stmt.to_string();

        assert!(text.starts_with("do {"));
        assert!(text.contains("} on fail error e {"));
        assert!(text.contains("bar(e);"));
    }

    #[test]
    fn renders_untyped_handler() {
        let on_fail = OnFail::untyped(vec![]);
        assert_eq!(on_fail.to_string(), "on fail {\n}");
    }

    #[test]
    fn renders_worker() {
        let stmt = Statement::Worker {
            name: "W".to_string(),
            return_type: Some(TypeDesc::from("error?")),
            body: vec![lit("a();")],
        };
        assert_eq!(stmt.to_string(), "worker W returns error? {\na();\n}");
    }

    #[test]
    fn comment_prefixes_every_line() {
        let stmt = Statement::comment("first\nsecond");
        assert_eq!(stmt.to_string(), "\n\n// first\n// second\n");
    }
}
