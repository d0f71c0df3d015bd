//! Canonical formatting of an assembled module.
//!
//! Layout rules: `indent_width` spaces per level, one import per line, a
//! blank line between module members and around object methods, one
//! statement per line with nested blocks broken across lines, comments on
//! their own line, at most one blank line between statements and none at the
//! start of a block. Closed records in declarations get one field per line.
//!
//! Only whitespace changes. The output is re-lexed and compared with the
//! tree's tokens; any difference is a [`MigrateError::FormatFailed`].

use super::lexer::{lex, Token, TokenKind};
use super::syntax::{
    Block, Declaration, FunctionBodyNode, FunctionDefinition, ModuleMember, ModulePart, ObjectDeclaration,
    ObjectMember, Part, StatementNode, Trivia,
};
use crate::diagnostic::MigrateError;

/// Formats `module` canonically.
pub fn format_module(module: &ModulePart, name: &str, indent_width: usize) -> Result<String, MigrateError> {
    let mut printer = Printer::new(true, indent_width);
    printer.module(module);
    verify(module, &printer.out, name)?;
    Ok(printer.out)
}

/// Prints `module` without the formatting pass: original token spacing, no
/// indentation, no blank lines.
pub fn to_source_code(module: &ModulePart) -> String {
    let mut printer = Printer::new(false, 0);
    printer.module(module);
    printer.out
}

struct Printer {
    out: String,
    canonical: bool,
    indent: usize,
    indent_width: usize,
}

impl Printer {
    fn new(canonical: bool, indent_width: usize) -> Self {
        Self {
            out: String::new(),
            canonical,
            indent: 0,
            indent_width,
        }
    }

    fn line(&mut self, text: &str) {
        if self.canonical {
            self.out.push_str(&" ".repeat(self.indent * self.indent_width));
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if self.canonical && !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn join<'a>(&self, tokens: impl IntoIterator<Item = &'a Token>) -> String {
        let tokens: Vec<&Token> = tokens.into_iter().collect();
        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 && self.needs_space(tokens[i - 1], token, tokens.get(i + 1).copied()) {
                out.push(' ');
            }
            out.push_str(&token.text);
        }
        out
    }

    fn needs_space(&self, prev: &Token, next: &Token, after: Option<&Token>) -> bool {
        use TokenKind::*;

        if prev.is_word() && next.is_word() {
            return true;
        }
        if !self.canonical {
            return next.spaced;
        }
        // `resource function get .()`: the dot is the resource path.
        if next.is(Dot) && prev.is_word() && after.is_some_and(|t| t.is(LParen)) {
            return true;
        }
        if matches!(next.kind, Semicolon | Comma | Dot | RParen | RBracket) {
            return false;
        }
        if matches!(prev.kind, LParen | LBracket | Dot) {
            return false;
        }
        if prev.is(LBracePipe) && next.is(PipeRBrace) {
            return false;
        }
        if prev.kind == Comma || prev.is_assignment() || next.is_assignment() {
            return true;
        }
        next.spaced
    }

    /// Leading comments of a module or object member; blank lines are
    /// decided by the member layout instead.
    fn comments(&mut self, trivia: &[Trivia]) {
        for item in trivia {
            if let Trivia::Comment(text) = item {
                self.line(text);
            }
        }
    }

    fn module(&mut self, module: &ModulePart) {
        for import in &module.imports {
            self.comments(&import.leading);
            let text = self.join(&import.tokens);
            self.line(&text);
        }

        for member in &module.members {
            self.blank();
            match member {
                ModuleMember::Function(function) => self.function(function),
                ModuleMember::Object(object) => self.object(object),
                ModuleMember::Declaration(declaration) => self.declaration(declaration),
            }
        }

        if module.eof_trivia.iter().any(|t| matches!(t, Trivia::Comment(_))) {
            self.blank();
            self.comments(&module.eof_trivia);
        }
    }

    fn function(&mut self, function: &FunctionDefinition) {
        self.comments(&function.leading);
        match &function.body {
            FunctionBodyNode::Block(block) => {
                let header = self.join(&function.header);
                self.line(&format!("{} {{", header));
                self.nested(block);
                self.line("}");
            }
            FunctionBodyNode::External(tokens) => {
                let text = self.join(function.header.iter().chain(tokens));
                self.line(&text);
            }
        }
    }

    fn object(&mut self, object: &ObjectDeclaration) {
        self.comments(&object.leading);
        let header = self.join(&object.header);
        self.line(&format!("{} {{", header));
        self.indent += 1;

        let mut previous_was_method = None;
        for member in &object.members {
            let is_method = matches!(member, ObjectMember::Method(_));
            if let Some(previous) = previous_was_method {
                if previous || is_method {
                    self.blank();
                }
            }
            match member {
                ObjectMember::Field(declaration) => self.declaration(declaration),
                ObjectMember::Method(function) => self.function(function),
            }
            previous_was_method = Some(is_method);
        }
        self.trailing(&object.trailing);

        self.indent -= 1;
        self.line("}");
    }

    fn declaration(&mut self, declaration: &Declaration) {
        self.comments(&declaration.leading);
        let tokens = &declaration.tokens;

        if self.canonical {
            if let Some((open, close)) = closed_record_bounds(tokens) {
                if close > open + 1 {
                    let head = self.join(&tokens[..=open]);
                    self.line(&head);
                    self.indent += 1;
                    for field in split_fields(&tokens[open + 1..close]) {
                        let text = self.join(field);
                        self.line(&text);
                    }
                    self.indent -= 1;
                    let tail = self.join(&tokens[close..]);
                    self.line(&tail);
                    return;
                }
            }
        }

        let text = self.join(tokens);
        self.line(&text);
    }

    /// Statements of `block` one level deeper.
    fn nested(&mut self, block: &Block) {
        self.indent += 1;
        let mut emitted = false;
        for statement in &block.statements {
            self.statement_trivia(&statement.leading, &mut emitted);
            self.statement(statement);
            emitted = true;
        }
        self.trailing(&block.trailing);
        self.indent -= 1;
    }

    fn statement_trivia(&mut self, trivia: &[Trivia], emitted: &mut bool) {
        for item in trivia {
            match item {
                Trivia::BlankLine if *emitted => self.blank(),
                Trivia::BlankLine => {}
                Trivia::Comment(text) => {
                    self.line(text);
                    *emitted = true;
                }
            }
        }
    }

    /// Trivia before a closing `}`: comments kept, blank lines only between them.
    fn trailing(&mut self, trivia: &[Trivia]) {
        let Some(last_comment) = trivia.iter().rposition(|t| matches!(t, Trivia::Comment(_))) else {
            return;
        };
        let mut emitted = !self.out.ends_with("{\n");
        self.statement_trivia(&trivia[..=last_comment], &mut emitted);
    }

    fn statement(&mut self, statement: &StatementNode) {
        let mut pending: Vec<&Token> = Vec::new();
        let mut after_block = false;

        for part in &statement.parts {
            match part {
                Part::Token(token) => pending.push(token),
                Part::Block(block) => {
                    let head = self.compose(after_block, &pending);
                    if head.is_empty() {
                        self.line("{");
                    } else {
                        self.line(&format!("{} {{", head));
                    }
                    self.nested(block);
                    pending.clear();
                    after_block = true;
                }
            }
        }

        let tail = self.compose(after_block, &pending);
        if !tail.is_empty() {
            self.line(&tail);
        }
    }

    /// Line text for `tokens`, prefixed with the `}` of a preceding block.
    fn compose(&self, after_block: bool, tokens: &[&Token]) -> String {
        let text = self.join(tokens.iter().copied());
        match (after_block, text.is_empty()) {
            (false, _) => text,
            (true, true) => "}".to_string(),
            (true, false) => format!("}} {}", text),
        }
    }
}

/// Indices of the outermost `{|` and its matching `|}`.
fn closed_record_bounds(tokens: &[Token]) -> Option<(usize, usize)> {
    let open = tokens.iter().position(|t| t.is(TokenKind::LBracePipe))?;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind.opens() {
            depth += 1;
        } else if token.kind.closes() {
            depth -= 1;
            if depth == 0 {
                return token.is(TokenKind::PipeRBrace).then_some((open, i));
            }
        }
    }
    None
}

/// Splits record fields after each depth-0 `;`.
fn split_fields(tokens: &[Token]) -> Vec<&[Token]> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind.opens() {
            depth += 1;
        } else if token.kind.closes() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is(TokenKind::Semicolon) {
            fields.push(&tokens[start..=i]);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        fields.push(&tokens[start..]);
    }
    fields
}

/// Checks that `output` holds exactly the tokens and comments of `module`.
fn verify(module: &ModulePart, output: &str, name: &str) -> Result<(), MigrateError> {
    let mut expected = Vec::new();
    collect_module(module, &mut expected);

    let actual = lex(output).map_err(|e| MigrateError::FormatFailed {
        module: name.to_string(),
        message: format!("formatted output does not lex at offset {}", e.span.start),
    })?;

    for (i, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if want.0 != got.kind || want.1 != got.text {
            return Err(MigrateError::FormatFailed {
                module: name.to_string(),
                message: format!("token {} changed from `{}` to `{}`", i, want.1, got.text),
            });
        }
    }
    if expected.len() != actual.len() {
        return Err(MigrateError::FormatFailed {
            module: name.to_string(),
            message: format!("expected {} tokens, found {}", expected.len(), actual.len()),
        });
    }
    Ok(())
}

type Expected<'a> = Vec<(TokenKind, &'a str)>;

fn collect_trivia<'a>(trivia: &'a [Trivia], out: &mut Expected<'a>) {
    for item in trivia {
        if let Trivia::Comment(text) = item {
            out.push((TokenKind::LineComment, text.as_str()));
        }
    }
}

fn collect_tokens<'a>(tokens: &'a [Token], out: &mut Expected<'a>) {
    out.extend(tokens.iter().map(|t| (t.kind, t.text.as_str())));
}

fn collect_module<'a>(module: &'a ModulePart, out: &mut Expected<'a>) {
    for import in &module.imports {
        collect_trivia(&import.leading, out);
        collect_tokens(&import.tokens, out);
    }
    for member in &module.members {
        match member {
            ModuleMember::Function(function) => collect_function(function, out),
            ModuleMember::Object(object) => {
                collect_trivia(&object.leading, out);
                collect_tokens(&object.header, out);
                out.push((TokenKind::LBrace, "{"));
                for member in &object.members {
                    match member {
                        ObjectMember::Field(declaration) => collect_declaration(declaration, out),
                        ObjectMember::Method(function) => collect_function(function, out),
                    }
                }
                collect_trivia(&object.trailing, out);
                out.push((TokenKind::RBrace, "}"));
            }
            ModuleMember::Declaration(declaration) => collect_declaration(declaration, out),
        }
    }
    collect_trivia(&module.eof_trivia, out);
}

fn collect_declaration<'a>(declaration: &'a Declaration, out: &mut Expected<'a>) {
    collect_trivia(&declaration.leading, out);
    collect_tokens(&declaration.tokens, out);
}

fn collect_function<'a>(function: &'a FunctionDefinition, out: &mut Expected<'a>) {
    collect_trivia(&function.leading, out);
    collect_tokens(&function.header, out);
    match &function.body {
        FunctionBodyNode::Block(block) => collect_block(block, out),
        FunctionBodyNode::External(tokens) => collect_tokens(tokens, out),
    }
}

fn collect_block<'a>(block: &'a Block, out: &mut Expected<'a>) {
    out.push((TokenKind::LBrace, "{"));
    for statement in &block.statements {
        collect_trivia(&statement.leading, out);
        for part in &statement.parts {
            match part {
                Part::Token(token) => out.push((token.kind, token.text.as_str())),
                Part::Block(nested) => collect_block(nested, out),
            }
        }
    }
    collect_trivia(&block.trailing, out);
    out.push((TokenKind::RBrace, "}"));
}
