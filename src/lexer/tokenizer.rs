use super::*;
use super::scanner::{bump, peek_next, skip_whitespace_and_comments};
use crate::utils::dedent;

pub(super) fn next_token_with_flag(lexer: &mut Lexer, skip_newlines: bool) -> Result<Token, JobspecError> {
    skip_whitespace_and_comments(lexer, skip_newlines)?;

    lexer.token_line = lexer.line;
    lexer.token_column = lexer.column + 1;

    match lexer.peek {
        Some('\n') => tokenize_symbol(lexer, Token::Newline),
        Some('{') => tokenize_symbol(lexer, Token::LBrace),
        Some('}') => tokenize_symbol(lexer, Token::RBrace),
        Some('[') => tokenize_symbol(lexer, Token::LBracket),
        Some(']') => tokenize_symbol(lexer, Token::RBracket),
        Some('(') => tokenize_symbol(lexer, Token::LParen),
        Some(')') => tokenize_symbol(lexer, Token::RParen),
        Some(',') => tokenize_symbol(lexer, Token::Comma),
        Some(':') => tokenize_symbol(lexer, Token::Colon),
        Some('.') => tokenize_symbol(lexer, Token::Dot),
        Some('?') => tokenize_symbol(lexer, Token::Question),
        Some('+') => tokenize_symbol(lexer, Token::Plus),
        Some('-') => tokenize_symbol(lexer, Token::Minus),
        Some('*') => tokenize_symbol(lexer, Token::Star),
        Some('/') => tokenize_symbol(lexer, Token::Slash),
        Some('%') => tokenize_symbol(lexer, Token::Percent),
        Some('=') => match peek_next(lexer) {
            Some('=') => tokenize_pair(lexer, Token::EqEq),
            Some('>') => tokenize_pair(lexer, Token::FatArrow),
            _ => tokenize_symbol(lexer, Token::Equals),
        },
        Some('!') => match peek_next(lexer) {
            Some('=') => tokenize_pair(lexer, Token::NotEq),
            _ => tokenize_symbol(lexer, Token::Bang),
        },
        Some('<') => match peek_next(lexer) {
            Some('<') => tokenize_heredoc(lexer),
            Some('=') => tokenize_pair(lexer, Token::LtEq),
            _ => tokenize_symbol(lexer, Token::Lt),
        },
        Some('>') => match peek_next(lexer) {
            Some('=') => tokenize_pair(lexer, Token::GtEq),
            _ => tokenize_symbol(lexer, Token::Gt),
        },
        Some('&') if peek_next(lexer) == Some('&') => tokenize_pair(lexer, Token::AndAnd),
        Some('|') if peek_next(lexer) == Some('|') => tokenize_pair(lexer, Token::OrOr),
        Some('"') => tokenize_string(lexer),
        Some(c) if c.is_ascii_digit() => tokenize_number(lexer),
        Some(c) if c.is_alphabetic() || c == '_' => tokenize_identifier_or_keyword(lexer),
        Some(ch) => tokenize_unexpected_char(lexer, ch),
        None => Ok(Token::Eof),
    }
}

fn tokenize_symbol(lexer: &mut Lexer, token: Token) -> Result<Token, JobspecError> {
    bump(lexer);
    Ok(token)
}

fn tokenize_pair(lexer: &mut Lexer, token: Token) -> Result<Token, JobspecError> {
    bump(lexer);
    bump(lexer);
    Ok(token)
}

fn tokenize_string(lexer: &mut Lexer) -> Result<Token, JobspecError> {
    bump(lexer); // consume opening '"'
    let mut raw = String::new();
    read_quoted_raw(lexer, &mut raw, 0)?;

    segment_template(&raw, true)
        .map(Token::Template)
        .map_err(|message| lexer.error(message, None))
}

/// Collect the raw text of a quoted string up to (not including) the closing quote.
///
/// Escapes are kept as written; `${ ... }` sections are copied whole so that
/// quotes nested inside them do not end the string.
fn read_quoted_raw(lexer: &mut Lexer, raw: &mut String, depth: usize) -> Result<(), JobspecError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(lexer.error(
            format!("Strings nested deeper than {} levels", MAX_NESTING_DEPTH),
            Some("Split deeply nested values into variables"),
        ));
    }
    loop {
        match bump(lexer) {
            None | Some('\n') => {
                return Err(lexer.error(
                    "String literal not closed",
                    Some("Quoted strings must end on the line they start"),
                ));
            }
            Some('"') => return Ok(()),
            Some('\\') => {
                raw.push('\\');
                match bump(lexer) {
                    Some(c) if c != '\n' => raw.push(c),
                    _ => {
                        return Err(lexer.error("Trailing backslash in string", None));
                    }
                }
            }
            Some('$') if lexer.peek == Some('$') && peek_next(lexer) == Some('{') => {
                bump(lexer);
                bump(lexer);
                raw.push_str("$${");
            }
            Some('$') if lexer.peek == Some('{') => {
                bump(lexer);
                raw.push_str("${");
                read_interpolation_raw(lexer, raw, depth)?;
            }
            Some(c) => raw.push(c),
        }
    }
}

fn read_interpolation_raw(lexer: &mut Lexer, raw: &mut String, depth: usize) -> Result<(), JobspecError> {
    let mut depth = 1;
    loop {
        let ch = bump(lexer).ok_or_else(|| {
            lexer.error("Interpolation not closed", Some("Close the expression with '}'"))
        })?;
        raw.push(ch);
        match ch {
            '"' => {
                read_quoted_raw(lexer, raw, depth + 1)?;
                raw.push('"');
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

fn tokenize_heredoc(lexer: &mut Lexer) -> Result<Token, JobspecError> {
    bump(lexer); // '<'
    bump(lexer); // '<'

    let strip_indent = if lexer.peek == Some('-') {
        bump(lexer);
        true
    } else {
        false
    };

    let mut marker = String::new();
    while let Some(ch) = lexer.peek {
        if ch.is_alphanumeric() || ch == '_' {
            marker.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }
    if marker.is_empty() {
        return Err(lexer.error(
            "Expected heredoc marker after '<<'",
            Some("Write heredocs as <<EOF ... EOF"),
        ));
    }

    if lexer.peek == Some('\r') {
        bump(lexer);
    }
    if bump(lexer) != Some('\n') {
        return Err(lexer.error("Heredoc marker must be followed by a newline", None));
    }

    let mut content = String::new();
    loop {
        let mut line = String::new();
        while let Some(ch) = lexer.peek {
            if ch == '\n' {
                break;
            }
            line.push(ch);
            bump(lexer);
        }

        if line.trim() == marker {
            break; // the newline after the marker is left for the parser
        }
        if lexer.peek.is_none() {
            return Err(lexer.error(
                format!("Heredoc not closed, expected '{}'", marker),
                None,
            ));
        }
        bump(lexer); // '\n'
        content.push_str(line.trim_end_matches('\r'));
        content.push('\n');
    }

    if strip_indent {
        content = dedent(&content);
    }

    segment_template(&content, false)
        .map(Token::Template)
        .map_err(|message| lexer.error(message, None))
}

fn tokenize_number(lexer: &mut Lexer) -> Result<Token, JobspecError> {
    let mut num = String::new();

    while let Some(ch) = lexer.peek {
        if ch.is_ascii_digit() {
            num.push(ch);
            bump(lexer);
        } else if ch == '.' && peek_next(lexer).is_some_and(|c| c.is_ascii_digit()) {
            num.push(ch);
            bump(lexer);
        } else if (ch == 'e' || ch == 'E')
            && peek_next(lexer).is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            num.push(ch);
            bump(lexer);
            if let Some(sign) = lexer.peek.filter(|c| *c == '+' || *c == '-') {
                num.push(sign);
                bump(lexer);
            }
        } else {
            break;
        }
    }

    num.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| lexer.error(format!("Invalid number '{}'", num), None))
}

fn tokenize_identifier_or_keyword(lexer: &mut Lexer) -> Result<Token, JobspecError> {
    let mut ident = String::new();

    while let Some(ch) = lexer.peek {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            ident.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }

    let token = match ident.as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "null" => Token::Null,
        _ => Token::Ident(ident),
    };

    Ok(token)
}

fn tokenize_unexpected_char(lexer: &mut Lexer, ch: char) -> Result<Token, JobspecError> {
    bump(lexer);
    Err(lexer.error(
        format!("Unexpected character '{}'", ch),
        Some("Unexpected character in input"),
    ))
}

/// Split template text into literal runs and raw interpolation sources.
///
/// `escapes` enables backslash escapes (quoted strings); heredocs take their
/// text verbatim apart from the `$${` escape.
fn segment_template(raw: &str, escapes: bool) -> Result<Vec<TemplateSegment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if escapes => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('u') => {
                        let hex: String = chars.by_ref().take(4).collect();
                        u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| format!("Invalid unicode escape '\\u{}'", hex))?
                    }
                    Some(other) => other,
                    None => return Err("Trailing backslash in string".into()),
                };
                literal.push(escaped);
            }
            '$' if chars.peek() == Some(&'$') && chars.clone().nth(1) == Some('{') => {
                chars.next();
                chars.next();
                literal.push_str("${");
            }
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                if !literal.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(TemplateSegment::Interpolation(capture_interpolation(&mut chars)?));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() || segments.is_empty() {
        segments.push(TemplateSegment::Literal(literal));
    }
    Ok(segments)
}

fn capture_interpolation(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String, String> {
    let mut inner = String::new();
    let mut depth = 1;
    let mut in_string = false;
    let mut escaped = false;

    loop {
        let ch = chars
            .next()
            .ok_or_else(|| "Interpolation not closed, expected '}'".to_string())?;

        if in_string {
            inner.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(inner);
                }
            }
            _ => {}
        }
        inner.push(ch);
    }
}
