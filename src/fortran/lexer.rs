//! Tokenisation of Fortran meta data modules using logos.
//!
//! Only the free-form subset that meta modules use is recognised. Comments
//! and `&` continuations are skipped, so a statement split over several
//! lines arrives as one run of tokens; newlines and `;` end statements.

use logos::Logos;
use std::fmt;

/// Fortran token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f]+")]
#[logos(skip r"![^\n]*")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"&[ \t]*(![^\n]*)?\r?\n([ \t]*(![^\n]*)?\r?\n)*[ \t]*&?")]
#[logos(skip r"&")]
pub enum Token {
    #[regex(r"\r?\n")]
    Newline,

    #[token(";")]
    Semicolon,

    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r#""([^"\n]|"")*""#, unquote)]
    #[regex(r"'([^'\n]|'')*'", unquote)]
    Str(String),

    #[regex(r"[0-9]+(\.[0-9]*)?([eEdD][+-]?[0-9]+)?(_[A-Za-z0-9_]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eEdD][+-]?[0-9]+)?(_[A-Za-z0-9_]+)?", |lex| lex.slice().to_string())]
    Number(String),

    /// `.true.`, `.false.`, `.and.` and friends
    #[regex(r"\.[A-Za-z]+\.(_[A-Za-z0-9_]+)?", |lex| lex.slice().to_string())]
    DotOp(String),

    #[token("(/")]
    ArrayOpen,
    #[token("/)")]
    ArrayClose,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token("//")]
    Concat,
    #[token("%")]
    Percent,

    #[regex(r"\*\*|==|/=|<=|>=|=>|[*+\-/<>]", |lex| lex.slice().to_string())]
    Operator(String),
}

/// Strip the delimiters from a character literal and undouble embedded quotes
fn unquote(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let quote = &slice[..1];
    let inner = &slice[1..slice.len() - 1];
    inner.replace(&format!("{quote}{quote}"), quote)
}

impl Token {
    /// Identifier text, if this is an identifier
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is the identifier `name`, ignoring case
    pub fn is_ident(&self, name: &str) -> bool {
        self.ident().is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    fn ends_statement(&self) -> bool {
        matches!(self, Token::Newline | Token::Semicolon)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Newline => f.write_str("end of line"),
            Token::Semicolon => f.write_str(";"),
            Token::Ident(name) => f.write_str(name),
            Token::Str(text) => write!(f, "\"{}\"", text.replace('"', "\"\"")),
            Token::Number(text) | Token::DotOp(text) | Token::Operator(text) => f.write_str(text),
            Token::ArrayOpen => f.write_str("(/"),
            Token::ArrayClose => f.write_str("/)"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::Comma => f.write_str(","),
            Token::Assign => f.write_str("="),
            Token::DoubleColon => f.write_str("::"),
            Token::Colon => f.write_str(":"),
            Token::Concat => f.write_str("//"),
            Token::Percent => f.write_str("%"),
        }
    }
}

/// A token and the line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub token: Token,
    pub line: usize,
}

/// Input that matched no token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub fragment: String,
}

/// Tokenise a whole source file
pub fn tokenize(source: &str) -> Result<Vec<Located>, LexError> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset);

    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        let line = line_of(span.start);
        match result {
            Ok(token) => tokens.push(Located { token, line }),
            Err(()) => {
                return Err(LexError {
                    line,
                    fragment: source[span].to_string(),
                })
            }
        }
    }
    Ok(tokens)
}

/// One Fortran statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub tokens: Vec<Token>,
}

impl Statement {
    /// Leading identifier, lower-cased
    pub fn keyword(&self) -> Option<String> {
        self.tokens
            .first()
            .and_then(Token::ident)
            .map(str::to_ascii_lowercase)
    }

    /// Index of the first occurrence of `token` outside any parentheses or
    /// array constructor
    pub fn top_level_index(&self, token: &Token) -> Option<usize> {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate() {
            match t {
                Token::LParen | Token::LBracket | Token::ArrayOpen => depth += 1,
                Token::RParen | Token::RBracket | Token::ArrayClose => {
                    depth = depth.saturating_sub(1)
                }
                _ if depth == 0 && t == token => return Some(i),
                _ => {}
            }
        }
        None
    }

    /// Type declarations carry a top-level `::`
    pub fn is_declaration(&self) -> bool {
        self.top_level_index(&Token::DoubleColon).is_some()
    }
}

/// Group tokens into statements, dropping empty ones
pub fn split_statements(tokens: Vec<Located>) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut line = 0;

    for located in tokens {
        if located.token.ends_statement() {
            if !current.is_empty() {
                statements.push(Statement {
                    line,
                    tokens: std::mem::take(&mut current),
                });
            }
            continue;
        }
        if current.is_empty() {
            line = located.line;
        }
        current.push(located.token);
    }
    if !current.is_empty() {
        statements.push(Statement {
            line,
            tokens: current,
        });
    }
    statements
}
