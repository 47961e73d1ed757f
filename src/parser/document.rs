use std::collections::HashSet;

use super::*;

pub(super) fn parse_document(parser: &mut Parser) -> Result<Body, JobspecError> {
    let body = parse_body_items(parser, false)?;
    if !parser.peek_is(&Token::Eof) {
        return Err(parser.error("Unexpected '}' at top level", None));
    }
    Ok(body)
}

/// Parse attributes and blocks until `}` (nested) or end of input (top level).
fn parse_body_items(parser: &mut Parser, nested: bool) -> Result<Body, JobspecError> {
    let mut items = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    while let Some(tok) = parser.peek() {
        match tok {
            Token::Newline => {
                parser.bump()?;
            }
            Token::Eof if nested => {
                return Err(parser.error("Unexpected end of input inside block", Some("Close the block with '}'")));
            }
            Token::Eof | Token::RBrace => break,
            Token::Ident(_) => {
                let item = parse_item(parser)?;
                if let BodyItem::Attribute(attr) = &item {
                    if !seen.insert(attr.name.clone()) {
                        return Err(JobspecError::Syntax {
                            file: parser.file().to_string(),
                            message: format!("Duplicate attribute '{}'", attr.name),
                            line: attr.line,
                            column: 0,
                            hint: Some("Each attribute may only be set once per block".into()),
                        });
                    }
                }
                items.push(item);
            }
            other => {
                return Err(parser.error(
                    format!("Unexpected {}", describe(other)),
                    Some("Expected an attribute or block"),
                ));
            }
        }
    }

    Ok(Body { items })
}

fn parse_item(parser: &mut Parser) -> Result<BodyItem, JobspecError> {
    let line = parser.line();
    let name = if let Token::Ident(name) = parser.bump()? {
        name
    } else {
        unreachable!()
    };

    if parser.peek_is(&Token::Equals) {
        parser.bump()?;
        let expr = parser.parse_expression()?;
        expect_item_end(parser)?;
        return Ok(BodyItem::Attribute(Attribute { name, expr, line }));
    }

    let mut labels = Vec::new();
    loop {
        match parser.peek() {
            Some(Token::Template(_)) => {
                if let Token::Template(segments) = parser.bump()? {
                    labels.push(literal_label(parser, segments)?);
                }
            }
            Some(Token::Ident(_)) => {
                if let Token::Ident(label) = parser.bump()? {
                    labels.push(label);
                }
            }
            Some(Token::LBrace) => break,
            _ => {
                return Err(parser.error(
                    format!("Expected '=' or a block after '{}'", name),
                    Some("Attributes are written as name = value, blocks as type \"label\" { ... }"),
                ));
            }
        }
    }

    parser.expect(Token::LBrace)?;
    parser.descend()?;
    let body = parse_body_items(parser, true);
    parser.ascend();
    let body = body?;
    parser.expect(Token::RBrace)?;
    expect_item_end(parser)?;

    Ok(BodyItem::Block(Block {
        block_type: name,
        labels,
        body,
        line,
    }))
}

fn literal_label(parser: &Parser, segments: Vec<TemplateSegment>) -> Result<String, JobspecError> {
    let mut label = String::new();
    for segment in segments {
        match segment {
            TemplateSegment::Literal(text) => label.push_str(&text),
            TemplateSegment::Interpolation(_) => {
                return Err(parser.error(
                    "Block labels must be literal strings",
                    Some("Use a dynamic block to compute labels"),
                ));
            }
        }
    }
    Ok(label)
}

/// Attributes and blocks end at a newline, a closing brace or end of input.
fn expect_item_end(parser: &mut Parser) -> Result<(), JobspecError> {
    match parser.peek() {
        Some(Token::Newline) => {
            parser.bump()?;
            Ok(())
        }
        Some(Token::RBrace) | Some(Token::Eof) => Ok(()),
        Some(other) => Err(parser.error(
            format!("Unexpected {} after value", describe(other)),
            Some("Put each attribute on its own line"),
        )),
        None => Ok(()),
    }
}
