use super::*;

/// Advance the character iterator and update line/column tracking
pub(super) fn bump(lexer: &mut Lexer) -> Option<char> {
    let curr = lexer.peek;
    if let Some(c) = curr {
        if c == '\n' {
            lexer.line += 1;
            lexer.column = 0;
        } else {
            lexer.column += 1;
        }
    }
    lexer.peek = lexer.input.next();
    curr
}

/// Character after the current one, without consuming anything
pub(super) fn peek_next(lexer: &Lexer) -> Option<char> {
    lexer.input.clone().next()
}

/// Skip whitespace and comments (`#`, `//` and `/* */`)
pub(super) fn skip_whitespace_and_comments(
    lexer: &mut Lexer,
    skip_newlines: bool,
) -> Result<(), JobspecError> {
    while let Some(c) = lexer.peek {
        match c {
            ' ' | '\t' | '\r' => {
                bump(lexer);
            }
            '\n' if skip_newlines => {
                bump(lexer);
            }
            '\n' => break,
            '#' => skip_line_comment(lexer),
            '/' if peek_next(lexer) == Some('/') => skip_line_comment(lexer),
            '/' if peek_next(lexer) == Some('*') => {
                bump(lexer);
                bump(lexer);
                let mut closed = false;
                while let Some(ch) = bump(lexer) {
                    if ch == '*' && lexer.peek == Some('/') {
                        bump(lexer);
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(lexer.error(
                        "Block comment not closed",
                        Some("Close the comment with */"),
                    ));
                }
            }
            _ => break,
        }
    }
    Ok(())
}

/// Skip to the end of the line, leaving the newline for the tokenizer
fn skip_line_comment(lexer: &mut Lexer) {
    while let Some(ch) = lexer.peek {
        if ch == '\n' {
            break;
        }
        bump(lexer);
    }
}
