// Author: Dustin Pilgrim
// License: MIT

use std::str::Chars;
use crate::JobspecError;

mod scanner;
mod tokenizer;

/// Deepest nesting of expressions, blocks and quoted strings a document may use.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- literals ---
    Ident(String),
    Number(f64),
    Bool(bool),
    Null,
    /// Quoted string or heredoc, split into literal text and raw `${...}` sources.
    Template(Vec<TemplateSegment>),

    // --- structure ---
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Equals,
    Colon,
    Comma,
    Dot,
    Question,
    FatArrow,

    // --- operators ---
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,

    // --- layout ---
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSegment {
    Literal(String),
    /// Source text between `${` and the matching `}`.
    Interpolation(String),
}

pub struct Lexer<'a> {
    file: &'a str,
    input: Chars<'a>,
    peek: Option<char>,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a str, input: &'a str) -> Self {
        Self::starting_at(file, input, 1)
    }

    /// Lexer for a fragment that begins on `line` of the enclosing document.
    pub fn starting_at(file: &'a str, input: &'a str, line: usize) -> Self {
        let mut lexer = Lexer {
            file,
            input: input.chars(),
            peek: None,
            line,
            column: 0,
            token_line: line,
            token_column: 0,
        };
        lexer.peek = lexer.input.next();
        lexer
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Position where the most recently returned token started.
    pub fn token_position(&self) -> (usize, usize) {
        (self.token_line, self.token_column)
    }

    /// Normal tokenization (newlines are significant)
    pub fn next_token(&mut self) -> Result<Token, JobspecError> {
        tokenizer::next_token_with_flag(self, false)
    }

    /// Tokenization inside brackets, braces of a map and call parentheses (newlines ignored)
    pub fn next_token_nested(&mut self) -> Result<Token, JobspecError> {
        tokenizer::next_token_with_flag(self, true)
    }

    pub(crate) fn error(&self, message: impl Into<String>, hint: Option<&str>) -> JobspecError {
        JobspecError::Syntax {
            file: self.file.to_string(),
            message: message.into(),
            line: self.line,
            column: self.column,
            hint: hint.map(str::to_string),
        }
    }
}
