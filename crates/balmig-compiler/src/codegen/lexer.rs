//! Lexer for generated Ballerina source.
//!
//! Tokenizes with Logos. Whitespace is folded into the following token
//! (`spaced`, `newlines`) rather than emitted; line comments are kept as
//! tokens so the parser can turn them into trivia.

use std::ops::Range;
use logos::{Lexer, Logos};

/// A token with its kind, text and layout information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Range<usize>,
    /// Preceded by whitespace or a line break.
    pub spaced: bool,
    /// Line breaks between this token and the previous one.
    pub newlines: usize,
}

impl Token {
    /// Whether `self` and `other` are the same token, ignoring layout.
    pub fn same_as(&self, other: &Token) -> bool {
        self.kind == other.kind && self.text == other.text
    }

    /// Identifiers, keywords and literals: two of these in a row need a space.
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::Number | TokenKind::StringLiteral | TokenKind::Template
        )
    }

    /// `=` and compound assignments such as `+=`.
    pub fn is_assignment(&self) -> bool {
        match self.kind {
            TokenKind::Assign => true,
            TokenKind::Operator => matches!(self.text.as_str(), "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^="),
            _ => false,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == keyword
    }
}

/// Token kinds recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos)]
pub enum TokenKind {
    #[regex(r"[ \t\r\f]+")]
    Whitespace,

    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    // Keywords are identifiers; the parser decides by text.
    #[regex(r"'?([\p{L}_]|\\[^A-Za-z0-9_\s])([\p{L}\p{N}_]|\\[^A-Za-z0-9_\s])*")]
    Identifier,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[token("`", lex_template)]
    Template,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("{|")]
    LBracePipe,
    #[token("|}")]
    PipeRBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,
    #[token("->")]
    RightArrow,
    #[token("<-")]
    LeftArrow,
    #[token("=>")]
    FatArrow,
    #[token("=")]
    Assign,

    #[regex(r"==|!=|===|!==|<=|>=|&&|\|\||[+\-*/%&|^~]=|\?:|\?\.|\.\.<|[+\-*/%<>!?&|^~@#$]")]
    Operator,
}

impl TokenKind {
    /// Opens a nesting level inside a statement or declaration.
    pub fn opens(self) -> bool {
        matches!(
            self,
            TokenKind::LBrace | TokenKind::LBracePipe | TokenKind::LParen | TokenKind::LBracket
        )
    }

    pub fn closes(self) -> bool {
        matches!(
            self,
            TokenKind::RBrace | TokenKind::PipeRBrace | TokenKind::RParen | TokenKind::RBracket
        )
    }
}

/// Scans a backtick template up to its closing backtick, skipping over
/// `${..}` interpolations.
fn lex_template(lex: &mut Lexer<TokenKind>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'`' => {
                lex.bump(i + 1);
                return true;
            }
            b'$' if bytes.get(i + 1) == Some(&b'{') => match interpolation_len(&bytes[i + 2..]) {
                Some(len) => i += 2 + len,
                None => return false,
            },
            _ => i += 1,
        }
    }
    false
}

/// Length of an interpolation body, including its closing `}`.
fn interpolation_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Source range the lexer could not tokenize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub span: Range<usize>,
}

/// Lex source code into tokens.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut spaced = false;
    let mut newlines = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = result.map_err(|_| LexError { span: span.clone() })?;

        match kind {
            TokenKind::Whitespace => spaced = true,
            TokenKind::Newline => {
                spaced = true;
                newlines += 1;
            }
            _ => {
                tokens.push(Token {
                    kind,
                    text: source[span.clone()].to_string(),
                    span,
                    spaced,
                    newlines,
                });
                spaced = false;
                newlines = 0;
            }
        }
    }

    Ok(tokens)
}
