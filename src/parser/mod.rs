use crate::ast::{Attribute, Block, Body, BodyItem, Expression, TemplatePart};
use crate::lexer::{Lexer, TemplateSegment, Token};
use crate::JobspecError;

mod collection;
mod document;
mod expression;
mod template;

pub use crate::lexer::MAX_NESTING_DEPTH;

/// Parse a whole document into its top-level body.
///
/// Nothing is evaluated here; attribute values stay as expression trees.
pub fn parse_body(file: &str, input: &str) -> Result<Body, JobspecError> {
    let mut parser = Parser::new(file, input)?;
    parser.parse_document()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    file: &'a str,
    peek: Option<Token>,
    peek_pos: (usize, usize),
    /// Depth of `(`, `[` and map `{` groups; newlines are insignificant inside them.
    nesting: usize,
    /// Recursion depth of nested expressions and blocks.
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(file: &'a str, input: &'a str) -> Result<Self, JobspecError> {
        Self::from_lexer(file, Lexer::new(file, input))
    }

    /// Parser for an expression embedded at `line` (template interpolations).
    pub(crate) fn fragment(
        file: &'a str,
        input: &'a str,
        line: usize,
        depth: usize,
    ) -> Result<Self, JobspecError> {
        let mut parser = Self::from_lexer(file, Lexer::starting_at(file, input, line))?;
        parser.nesting = 1;
        parser.depth = depth;
        if parser.peek == Some(Token::Newline) {
            parser.bump()?;
        }
        Ok(parser)
    }

    fn from_lexer(file: &'a str, mut lexer: Lexer<'a>) -> Result<Self, JobspecError> {
        let peek = Some(lexer.next_token()?);
        let peek_pos = lexer.token_position();
        Ok(Self {
            lexer,
            file,
            peek,
            peek_pos,
            nesting: 0,
            depth: 0,
        })
    }

    pub(crate) fn bump(&mut self) -> Result<Token, JobspecError> {
        let curr = self.peek.take().ok_or_else(|| JobspecError::Syntax {
            file: self.file.to_string(),
            message: "Unexpected end of input".into(),
            line: self.lexer.line(),
            column: self.lexer.column(),
            hint: None,
        })?;
        let next = if self.nesting > 0 {
            self.lexer.next_token_nested()?
        } else {
            self.lexer.next_token()?
        };
        self.peek = Some(next);
        self.peek_pos = self.lexer.token_position();
        Ok(curr)
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.peek.as_ref()
    }

    pub(crate) fn peek_is(&self, token: &Token) -> bool {
        self.peek.as_ref() == Some(token)
    }

    pub(crate) fn peek_is_ident(&self, name: &str) -> bool {
        matches!(self.peek.as_ref(), Some(Token::Ident(ident)) if ident == name)
    }

    pub(crate) fn expect(&mut self, expected: Token) -> Result<Token, JobspecError> {
        if !self.peek_is(&expected) {
            let found = self.peek.clone().unwrap_or(Token::Eof);
            return Err(self.error(
                format!("Expected {}, got {}", describe(&expected), describe(&found)),
                None,
            ));
        }
        self.bump()
    }

    /// Consume the opening token of a group; tokens inside skip newlines.
    pub(crate) fn open_group(&mut self) -> Result<Token, JobspecError> {
        self.nesting += 1;
        self.bump()
    }

    /// Consume the closing token of a group.
    pub(crate) fn close_group(&mut self, closing: Token) -> Result<(), JobspecError> {
        if !self.peek_is(&closing) {
            let found = self.peek.clone().unwrap_or(Token::Eof);
            return Err(self.error(
                format!("Expected {}, got {}", describe(&closing), describe(&found)),
                None,
            ));
        }
        self.nesting = self.nesting.saturating_sub(1);
        self.bump()?;
        Ok(())
    }

    /// Enter one level of expression or block nesting.
    pub(crate) fn descend(&mut self) -> Result<(), JobspecError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(
                format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH),
                Some("Split deeply nested values into variables"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.ascend_by(1);
    }

    pub(crate) fn ascend_by(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn line(&self) -> usize {
        self.peek_pos.0
    }

    pub(crate) fn file(&self) -> &'a str {
        self.file
    }

    pub(crate) fn error(&self, message: impl Into<String>, hint: Option<&str>) -> JobspecError {
        JobspecError::Syntax {
            file: self.file.to_string(),
            message: message.into(),
            line: self.peek_pos.0,
            column: self.peek_pos.1,
            hint: hint.map(str::to_string),
        }
    }

    pub fn parse_document(&mut self) -> Result<Body, JobspecError> {
        document::parse_document(self)
    }

    pub fn parse_expression(&mut self) -> Result<Expression, JobspecError> {
        expression::parse_expression(self)
    }
}

/// Human-readable token name for error messages.
pub(crate) fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier '{}'", name),
        Token::Number(n) => format!("number {}", n),
        Token::Bool(b) => format!("'{}'", b),
        Token::Null => "'null'".into(),
        Token::Template(_) => "string".into(),
        Token::LBrace => "'{'".into(),
        Token::RBrace => "'}'".into(),
        Token::LBracket => "'['".into(),
        Token::RBracket => "']'".into(),
        Token::LParen => "'('".into(),
        Token::RParen => "')'".into(),
        Token::Equals => "'='".into(),
        Token::Colon => "':'".into(),
        Token::Comma => "','".into(),
        Token::Dot => "'.'".into(),
        Token::Question => "'?'".into(),
        Token::FatArrow => "'=>'".into(),
        Token::Plus => "'+'".into(),
        Token::Minus => "'-'".into(),
        Token::Star => "'*'".into(),
        Token::Slash => "'/'".into(),
        Token::Percent => "'%'".into(),
        Token::Bang => "'!'".into(),
        Token::EqEq => "'=='".into(),
        Token::NotEq => "'!='".into(),
        Token::Lt => "'<'".into(),
        Token::LtEq => "'<='".into(),
        Token::Gt => "'>'".into(),
        Token::GtEq => "'>='".into(),
        Token::AndAnd => "'&&'".into(),
        Token::OrOr => "'||'".into(),
        Token::Newline => "newline".into(),
        Token::Eof => "end of input".into(),
    }
}
