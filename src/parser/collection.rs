use crate::value::Value;

use super::*;

pub(super) fn parse_call_args(parser: &mut Parser) -> Result<Vec<Expression>, JobspecError> {
    parser.open_group()?; // consume (
    let mut args = Vec::new();

    while !parser.peek_is(&Token::RParen) {
        args.push(parser.parse_expression()?);
        if parser.peek_is(&Token::Comma) {
            parser.bump()?;
        } else {
            break;
        }
    }

    parser.close_group(Token::RParen)?;
    Ok(args)
}

pub(super) fn parse_list(parser: &mut Parser) -> Result<Expression, JobspecError> {
    parser.open_group()?; // consume [

    if parser.peek_is_ident("for") {
        let expr = parse_for(parser, false)?;
        parser.close_group(Token::RBracket)?;
        return Ok(expr);
    }

    let mut items = Vec::new();
    while !parser.peek_is(&Token::RBracket) {
        items.push(parser.parse_expression()?);
        if parser.peek_is(&Token::Comma) {
            parser.bump()?;
        } else {
            break;
        }
    }

    parser.close_group(Token::RBracket)?;
    Ok(Expression::ListLiteral(items))
}

pub(super) fn parse_map(parser: &mut Parser) -> Result<Expression, JobspecError> {
    parser.open_group()?; // consume {

    if parser.peek_is_ident("for") {
        let expr = parse_for(parser, true)?;
        parser.close_group(Token::RBrace)?;
        return Ok(expr);
    }

    let mut entries = Vec::new();
    while !parser.peek_is(&Token::RBrace) {
        let key = match parser.parse_expression()? {
            // bare identifiers are literal keys, as in `{ region = "x" }`
            Expression::Reference(path) if path.len() == 1 => {
                Expression::Literal(Value::String(path.into_iter().next().unwrap_or_default()))
            }
            other => other,
        };

        match parser.peek() {
            Some(Token::Equals) | Some(Token::Colon) => {
                parser.bump()?;
            }
            _ => {
                return Err(parser.error(
                    "Expected '=' or ':' after map key",
                    Some("Map entries are written as key = value"),
                ));
            }
        }

        let value = parser.parse_expression()?;
        entries.push((key, value));

        if parser.peek_is(&Token::Comma) {
            parser.bump()?;
        }
    }

    parser.close_group(Token::RBrace)?;
    Ok(Expression::MapLiteral(entries))
}

/// `for [key,] value in collection : [key_expr =>] value_expr [if condition]`
fn parse_for(parser: &mut Parser, map: bool) -> Result<Expression, JobspecError> {
    parser.bump()?; // consume `for`

    let first = expect_ident(parser, "Expected iterator name after 'for'")?;
    let (key_var, value_var) = if parser.peek_is(&Token::Comma) {
        parser.bump()?;
        let second = expect_ident(parser, "Expected value name after ','")?;
        (Some(first), second)
    } else {
        (None, first)
    };

    if !parser.peek_is_ident("in") {
        return Err(parser.error("Expected 'in' in for expression", None));
    }
    parser.bump()?;

    let collection = parser.parse_expression()?;
    parser.expect(Token::Colon)?;

    let first_expr = parser.parse_expression()?;
    let (key_expr, value_expr) = if map {
        parser.expect(Token::FatArrow)?;
        (Some(Box::new(first_expr)), parser.parse_expression()?)
    } else {
        (None, first_expr)
    };

    let condition = if parser.peek_is_ident("if") {
        parser.bump()?;
        Some(Box::new(parser.parse_expression()?))
    } else {
        None
    };

    Ok(Expression::ForExpr {
        collection: Box::new(collection),
        key_var,
        value_var,
        key_expr,
        value_expr: Box::new(value_expr),
        condition,
    })
}

fn expect_ident(parser: &mut Parser, message: &str) -> Result<String, JobspecError> {
    match parser.peek() {
        Some(Token::Ident(_)) => match parser.bump()? {
            Token::Ident(name) => Ok(name),
            _ => unreachable!(),
        },
        _ => Err(parser.error(message, None)),
    }
}
