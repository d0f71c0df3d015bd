//! Structural parser for generated Ballerina source.
//!
//! This is not a full Ballerina parser. It checks what the generator can get
//! wrong when gluing fragments together (balanced delimiters, terminated
//! statements, well-placed comments) and builds just enough structure for the
//! formatter: module members, object members, blocks and statements. Tokens
//! inside a statement or declaration are kept flat.
//!
//! Entry points mirror the fragments the generator produces:
//! [`parse_import_declaration`], [`parse_module_member`],
//! [`parse_object_member`] and [`parse_function_body_block`].

use super::lexer::{lex, Token, TokenKind};
use crate::diagnostic::MigrateError;

/// Statements whose depth-0 `{` opens a nested block.
const COMPOUND_STATEMENT_KEYWORDS: &[&str] =
    &["if", "do", "worker", "foreach", "while", "lock", "fork", "transaction", "retry"];

/// Qualifiers skipped when deciding what kind of member follows.
const QUALIFIERS: &[&str] = &[
    "public", "private", "isolated", "final", "configurable", "client", "readonly", "distinct",
    "transactional", "remote", "resource",
];

/// Comments and blank lines attached in front of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trivia {
    Comment(String),
    BlankLine,
}

/// A whole source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModulePart {
    pub imports: Vec<ImportDeclaration>,
    pub members: Vec<ModuleMember>,
    /// Trivia in front of the end of file.
    pub eof_trivia: Vec<Trivia>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub leading: Vec<Trivia>,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleMember {
    Function(FunctionDefinition),
    /// Services and classes.
    Object(ObjectDeclaration),
    /// Everything terminated by `;`: type definitions, variables, listeners.
    Declaration(Declaration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub leading: Vec<Trivia>,
    /// Everything up to the body.
    pub header: Vec<Token>,
    pub body: FunctionBodyNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBodyNode {
    Block(Block),
    /// `= @annotation {..} external;`
    External(Vec<Token>),
}

impl FunctionDefinition {
    /// Replaces the body.
    pub fn with_body(mut self, block: Block) -> Self {
        self.body = FunctionBodyNode::Block(block);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDeclaration {
    pub leading: Vec<Trivia>,
    pub header: Vec<Token>,
    pub members: Vec<ObjectMember>,
    pub trailing: Vec<Trivia>,
}

impl ObjectDeclaration {
    /// Replaces the member list.
    pub fn with_members(mut self, members: Vec<ObjectMember>) -> Self {
        self.members = members;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Field(Declaration),
    Method(FunctionDefinition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub leading: Vec<Trivia>,
    /// Tokens including the terminating `;`.
    pub tokens: Vec<Token>,
}

/// `{ statements }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<StatementNode>,
    /// Trivia in front of the closing `}`.
    pub trailing: Vec<Trivia>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementNode {
    pub leading: Vec<Trivia>,
    pub parts: Vec<Part>,
}

/// A piece of a statement: a token, or a nested block of a compound statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Token(Token),
    Block(Block),
}

pub fn parse_import_declaration(source: &str) -> Result<ImportDeclaration, MigrateError> {
    let mut parser = Parser::new("import declaration", source)?;
    let import = parser.parse_import()?;
    parser.finish()?;
    Ok(import)
}

pub fn parse_module_member(source: &str) -> Result<ModuleMember, MigrateError> {
    let mut parser = Parser::new("module member", source)?;
    let member = parser.parse_module_member()?;
    parser.finish()?;
    Ok(member)
}

pub fn parse_object_member(source: &str) -> Result<ObjectMember, MigrateError> {
    let mut parser = Parser::new("object member", source)?;
    let leading = parser.leading_trivia();
    let member = parser.parse_object_member(leading)?;
    parser.finish()?;
    Ok(member)
}

pub fn parse_function_body_block(source: &str) -> Result<Block, MigrateError> {
    let mut parser = Parser::new("function body", source)?;
    let block = parser.parse_block()?;
    parser.finish()?;
    Ok(block)
}

/// Parses `comments` as trivia.
///
/// Comments only exist attached to a node, so they are parsed as the leading
/// trivia of a throwaway import and taken from there.
pub fn parse_leading_trivia(comments: &str) -> Result<Vec<Trivia>, MigrateError> {
    parse_import_declaration(&format!("{}\nimport x/y;", comments)).map(|import| import.leading)
}

enum MemberKind {
    Function,
    Object,
    Declaration,
    Missing,
}

struct Parser<'s> {
    entry: &'static str,
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(entry: &'static str, source: &'s str) -> Result<Self, MigrateError> {
        let tokens = lex(source).map_err(|e| {
            MigrateError::syntax(entry, source, e.span.start, e.span.len(), "unrecognized input")
        })?;
        Ok(Self {
            entry,
            source,
            tokens,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.is(kind))
    }

    /// Takes the current token. Callers check `peek` first.
    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn error(&self, message: &str) -> MigrateError {
        let (offset, len) = match self.peek() {
            Some(token) => (token.span.start, token.span.len()),
            None => (self.source.len(), 0),
        };
        MigrateError::syntax(self.entry, self.source, offset, len, message)
    }

    fn finish(&self) -> Result<(), MigrateError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.error("unexpected input after the end of the fragment")),
        }
    }

    fn leading_trivia(&mut self) -> Vec<Trivia> {
        let mut trivia = Vec::new();
        while let Some(token) = self.peek() {
            let blank = token.newlines >= 2;
            let comment = token.is(TokenKind::LineComment).then(|| token.text.trim_end().to_string());
            if blank && trivia.last() != Some(&Trivia::BlankLine) {
                trivia.push(Trivia::BlankLine);
            }
            match comment {
                Some(text) => {
                    trivia.push(Trivia::Comment(text));
                    self.pos += 1;
                }
                None => break,
            }
        }
        trivia
    }

    /// Classifies the member ahead by its first token after any qualifiers.
    fn member_kind(&self) -> MemberKind {
        let keyword = self.tokens[self.pos..]
            .iter()
            .find(|t| !(t.is(TokenKind::Identifier) && QUALIFIERS.contains(&t.text.as_str())));
        match keyword.map(|t| t.text.as_str()) {
            Some("function") => MemberKind::Function,
            Some("service") | Some("class") => MemberKind::Object,
            Some(_) => MemberKind::Declaration,
            None => MemberKind::Missing,
        }
    }

    fn parse_import(&mut self) -> Result<ImportDeclaration, MigrateError> {
        let leading = self.leading_trivia();
        if !self.peek().is_some_and(|t| t.is_keyword("import")) {
            return Err(self.error("expected `import`"));
        }
        let tokens = self.collect_terminated()?;
        Ok(ImportDeclaration { leading, tokens })
    }

    fn parse_module_member(&mut self) -> Result<ModuleMember, MigrateError> {
        let leading = self.leading_trivia();
        match self.member_kind() {
            MemberKind::Function => Ok(ModuleMember::Function(self.parse_function(leading)?)),
            MemberKind::Object => Ok(ModuleMember::Object(self.parse_object(leading)?)),
            MemberKind::Declaration => Ok(ModuleMember::Declaration(Declaration {
                leading,
                tokens: self.collect_terminated()?,
            })),
            MemberKind::Missing => Err(self.error("expected a module member")),
        }
    }

    fn parse_object_member(&mut self, leading: Vec<Trivia>) -> Result<ObjectMember, MigrateError> {
        match self.member_kind() {
            MemberKind::Function => Ok(ObjectMember::Method(self.parse_function(leading)?)),
            MemberKind::Object | MemberKind::Declaration => Ok(ObjectMember::Field(Declaration {
                leading,
                tokens: self.collect_terminated()?,
            })),
            MemberKind::Missing => Err(self.error("expected an object member")),
        }
    }

    fn parse_function(&mut self, leading: Vec<Trivia>) -> Result<FunctionDefinition, MigrateError> {
        let header = self.collect_header(|t| t.is(TokenKind::LBrace) || t.is(TokenKind::Assign))?;
        let body = if self.at(TokenKind::LBrace) {
            FunctionBodyNode::Block(self.parse_block()?)
        } else {
            FunctionBodyNode::External(self.collect_terminated()?)
        };
        Ok(FunctionDefinition { leading, header, body })
    }

    fn parse_object(&mut self, leading: Vec<Trivia>) -> Result<ObjectDeclaration, MigrateError> {
        let header = self.collect_header(|t| t.is(TokenKind::LBrace))?;
        self.pos += 1;

        let mut members = Vec::new();
        loop {
            let trivia = self.leading_trivia();
            match self.peek() {
                None => return Err(self.error("object body is not closed")),
                Some(token) if token.is(TokenKind::RBrace) => {
                    self.pos += 1;
                    return Ok(ObjectDeclaration {
                        leading,
                        header,
                        members,
                        trailing: trivia,
                    });
                }
                Some(_) => members.push(self.parse_object_member(trivia)?),
            }
        }
    }

    fn parse_block(&mut self) -> Result<Block, MigrateError> {
        if !self.at(TokenKind::LBrace) {
            return Err(self.error("expected `{`"));
        }
        self.pos += 1;

        let mut statements = Vec::new();
        loop {
            let leading = self.leading_trivia();
            match self.peek() {
                None => return Err(self.error("block is not closed")),
                Some(token) if token.is(TokenKind::RBrace) => {
                    self.pos += 1;
                    return Ok(Block {
                        statements,
                        trailing: leading,
                    });
                }
                Some(_) => statements.push(self.parse_statement(leading)?),
            }
        }
    }

    fn parse_statement(&mut self, leading: Vec<Trivia>) -> Result<StatementNode, MigrateError> {
        let compound = self
            .peek()
            .is_some_and(|t| COMPOUND_STATEMENT_KEYWORDS.iter().any(|k| t.is_keyword(k)));
        let mut parts = Vec::new();
        let mut depth = 0usize;

        loop {
            let Some(token) = self.peek() else {
                return Err(self.error("statement is not terminated"));
            };
            let kind = token.kind;

            if kind == TokenKind::LineComment {
                return Err(self.error("comment inside a statement"));
            }
            if depth == 0 {
                if kind == TokenKind::Semicolon {
                    parts.push(Part::Token(self.bump()));
                    return Ok(StatementNode { leading, parts });
                }
                if compound && kind == TokenKind::LBrace {
                    parts.push(Part::Block(self.parse_block()?));
                    if self.continues_compound() {
                        continue;
                    }
                    return Ok(StatementNode { leading, parts });
                }
                if kind.closes() {
                    return Err(self.error("expected `;`"));
                }
            }

            if kind.opens() {
                depth += 1;
            } else if kind.closes() {
                depth -= 1;
            }
            parts.push(Part::Token(self.bump()));
        }
    }

    /// `else` and `on fail` continue a compound statement after its block.
    fn continues_compound(&self) -> bool {
        match self.peek() {
            Some(token) if token.is_keyword("else") => true,
            Some(token) if token.is_keyword("on") => self.peek_at(1).is_some_and(|t| t.is_keyword("fail")),
            _ => false,
        }
    }

    /// Tokens up to, not including, the first depth-0 token matching `stop`.
    fn collect_header(&mut self, stop: impl Fn(&Token) -> bool) -> Result<Vec<Token>, MigrateError> {
        let mut header = Vec::new();
        let mut depth = 0usize;
        loop {
            let Some(token) = self.peek() else {
                return Err(self.error("unexpected end of input"));
            };
            if depth == 0 && stop(token) {
                return Ok(header);
            }
            depth = self.track_depth(depth)?;
            header.push(self.bump());
        }
    }

    /// Tokens up to and including the first depth-0 `;`.
    fn collect_terminated(&mut self) -> Result<Vec<Token>, MigrateError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let Some(token) = self.peek() else {
                return Err(self.error("expected `;`"));
            };
            if depth == 0 && token.is(TokenKind::Semicolon) {
                tokens.push(self.bump());
                return Ok(tokens);
            }
            depth = self.track_depth(depth)?;
            tokens.push(self.bump());
        }
    }

    /// New nesting depth after the current token.
    fn track_depth(&self, depth: usize) -> Result<usize, MigrateError> {
        let Some(token) = self.peek() else {
            return Ok(depth);
        };
        if token.is(TokenKind::LineComment) {
            return Err(self.error("comment inside a declaration"));
        }
        if token.kind.opens() {
            Ok(depth + 1)
        } else if token.kind.closes() {
            depth.checked_sub(1).ok_or_else(|| self.error("unbalanced closing delimiter"))
        } else {
            Ok(depth)
        }
    }
}
