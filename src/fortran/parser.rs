//! Expression parsing for the right-hand side of meta data statements.
//!
//! Covers literals, names and component references, calls and structure
//! constructors with keyword arguments, array constructors (`[..]` and
//! `(/../)`, with an optional `type-spec ::` prefix) and character
//! concatenation. Any other operator expression is kept as source text.

use std::fmt;

use super::lexer::Token;

/// One argument of a call or structure constructor
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub keyword: Option<String>,
    pub value: Expr,
}

/// A parsed Fortran expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Character literal, concatenations already joined
    Str(String),
    /// Numeric literal, kind suffix included
    Number(String),
    Logical(bool),
    /// Name or component reference (`a%b`)
    Name(String),
    Call { name: String, args: Vec<Arg> },
    Array(Vec<Expr>),
    /// Anything built from other operators, as source text
    Operation(String),
}

impl Expr {
    /// Text of a scalar value: the contents of a string, a name or a number
    pub fn as_text(&self) -> Option<String> {
        match self {
            Expr::Str(text) | Expr::Name(text) | Expr::Number(text) => Some(text.clone()),
            Expr::Logical(value) => Some(if *value { ".true." } else { ".false." }.to_string()),
            _ => None,
        }
    }

    /// Numeric value, ignoring any kind suffix
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(text) => parse_number(text),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str(text) => write!(f, "\"{}\"", text.replace('"', "\"\"")),
            Expr::Number(text) | Expr::Name(text) | Expr::Operation(text) => f.write_str(text),
            Expr::Logical(value) => f.write_str(if *value { ".true." } else { ".false." }),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(keyword) = &arg.keyword {
                        write!(f, "{keyword}=")?;
                    }
                    write!(f, "{}", arg.value)?;
                }
                f.write_str(")")
            }
            Expr::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Parse a Fortran numeric literal: kind suffixes are dropped and `d`
/// exponents accepted
pub fn parse_number(text: &str) -> Option<f64> {
    let value = match text.find('_') {
        Some(idx) => &text[..idx],
        None => text,
    };
    value.replace(['d', 'D'], "e").parse().ok()
}

/// Parse a Fortran integer literal, dropping any kind suffix
pub fn parse_integer(text: &str) -> Option<i64> {
    let value = match text.trim().find('_') {
        Some(idx) => &text.trim()[..idx],
        None => text.trim(),
    };
    value.parse().ok()
}

fn is_binary_operator(token: &Token) -> bool {
    match token {
        Token::Operator(_) | Token::Colon => true,
        Token::DotOp(op) => logical_literal(op).is_none(),
        _ => false,
    }
}

fn logical_literal(op: &str) -> Option<bool> {
    let lower = op.to_ascii_lowercase();
    if lower.starts_with(".true.") {
        Some(true)
    } else if lower.starts_with(".false.") {
        Some(false)
    } else {
        None
    }
}

/// Recursive-descent parser over the tokens of one statement
pub struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ExprParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Number of tokens consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected '{expected}', found '{token}'")),
            None => Err(format!("expected '{expected}', found end of statement")),
        }
    }

    /// Parse a full expression
    pub fn parse_expr(&mut self) -> Result<Expr, String> {
        let first = self.parse_concat()?;
        if !self.peek().is_some_and(is_binary_operator) {
            return Ok(first);
        }

        let mut text = first.to_string();
        while let Some(op) = self.peek().filter(|t| is_binary_operator(t)) {
            self.pos += 1;
            text.push_str(&format!(" {op} "));
            text.push_str(&self.parse_concat()?.to_string());
        }
        Ok(Expr::Operation(text))
    }

    fn parse_concat(&mut self) -> Result<Expr, String> {
        let first = self.parse_primary()?;
        if self.peek() != Some(&Token::Concat) {
            return Ok(first);
        }

        let mut text = match first {
            Expr::Str(text) => text,
            other => return Err(format!("cannot concatenate non-character value {other}")),
        };
        while self.peek() == Some(&Token::Concat) {
            self.pos += 1;
            match self.parse_primary()? {
                Expr::Str(part) => text.push_str(&part),
                other => return Err(format!("cannot concatenate non-character value {other}")),
            }
        }
        Ok(Expr::Str(text))
    }

    /// Parse a single operand
    pub fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Str(text)) => Ok(Expr::Str(text.clone())),
            Some(Token::Number(text)) => Ok(Expr::Number(text.clone())),
            Some(Token::Operator(sign)) if sign == "-" || sign == "+" => {
                match self.parse_primary()? {
                    Expr::Number(text) if sign == "-" => Ok(Expr::Number(format!("-{text}"))),
                    Expr::Number(text) => Ok(Expr::Number(text)),
                    other => Ok(Expr::Operation(format!("{sign}{other}"))),
                }
            }
            Some(Token::DotOp(op)) => logical_literal(op)
                .map(Expr::Logical)
                .ok_or_else(|| format!("unexpected operator '{op}'")),
            Some(Token::Ident(name)) => {
                let mut name = name.clone();
                while self.peek() == Some(&Token::Percent) {
                    self.pos += 1;
                    match self.advance() {
                        Some(Token::Ident(component)) => {
                            name.push('%');
                            name.push_str(component);
                        }
                        _ => return Err(format!("expected component name after '{name}%'")),
                    }
                }
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => self.parse_array(&Token::RBracket),
            Some(Token::ArrayOpen) => self.parse_array(&Token::ArrayClose),
            Some(token) => Err(format!("unexpected '{token}'")),
            None => Err("unexpected end of statement".to_string()),
        }
    }

    /// Arguments after an opening parenthesis, up to and including the close
    fn parse_args(&mut self) -> Result<Vec<Arg>, String> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            let keyword = match (self.peek(), self.peek_at(1)) {
                (Some(Token::Ident(keyword)), Some(Token::Assign)) => {
                    self.pos += 2;
                    Some(keyword.clone())
                }
                _ => None,
            };
            let value = self.parse_expr()?;
            args.push(Arg { keyword, value });

            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(format!("expected ',' or ')', found '{token}'")),
                None => return Err("unclosed argument list".to_string()),
            }
        }
    }

    fn parse_array(&mut self, close: &Token) -> Result<Expr, String> {
        self.skip_type_spec();
        let mut items = Vec::new();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(Expr::Array(items));
        }
        loop {
            items.push(self.parse_expr()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(token) if token == close => return Ok(Expr::Array(items)),
                Some(token) => return Err(format!("expected ',' or '{close}', found '{token}'")),
                None => return Err("unclosed array constructor".to_string()),
            }
        }
    }

    /// Skip `type-spec ::` at the start of an array constructor
    fn skip_type_spec(&mut self) {
        let start = self.pos;
        if matches!(self.peek(), Some(Token::Ident(_))) {
            self.pos += 1;
            if self.peek() == Some(&Token::LParen) {
                let mut depth = 0usize;
                while let Some(token) = self.advance() {
                    match token {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            if self.peek() == Some(&Token::DoubleColon) {
                self.pos += 1;
                return;
            }
        }
        self.pos = start;
    }
}

/// Parse a complete expression from a token slice
pub fn parse_expression(tokens: &[Token]) -> Result<Expr, String> {
    let mut parser = ExprParser::new(tokens);
    let expr = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected '{token}' after expression")),
    }
}
