use crate::ast::{BinaryOp, UnaryOp};
use crate::value::Value;

use super::*;

pub(super) fn parse_expression(parser: &mut Parser) -> Result<Expression, JobspecError> {
    parser.descend()?;
    let expr = parse_conditional(parser);
    parser.ascend();
    expr
}

fn parse_conditional(parser: &mut Parser) -> Result<Expression, JobspecError> {
    let condition = parse_binary(parser, 0)?;

    if !parser.peek_is(&Token::Question) {
        return Ok(condition);
    }
    parser.bump()?; // consume ?
    let then_expr = parse_expression(parser)?;
    parser.expect(Token::Colon)?;
    let else_expr = parse_expression(parser)?;

    Ok(Expression::Conditional {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

/// Binding power of a binary operator token; higher binds tighter.
fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    let op = match token {
        Token::OrOr => (BinaryOp::Or, 1),
        Token::AndAnd => (BinaryOp::And, 2),
        Token::EqEq => (BinaryOp::Eq, 3),
        Token::NotEq => (BinaryOp::NotEq, 3),
        Token::Lt => (BinaryOp::Lt, 4),
        Token::LtEq => (BinaryOp::LtEq, 4),
        Token::Gt => (BinaryOp::Gt, 4),
        Token::GtEq => (BinaryOp::GtEq, 4),
        Token::Plus => (BinaryOp::Add, 5),
        Token::Minus => (BinaryOp::Sub, 5),
        Token::Star => (BinaryOp::Mul, 6),
        Token::Slash => (BinaryOp::Div, 6),
        Token::Percent => (BinaryOp::Mod, 6),
        _ => return None,
    };
    Some(op)
}

fn parse_binary(parser: &mut Parser, min_power: u8) -> Result<Expression, JobspecError> {
    let mut lhs = parse_unary(parser)?;
    // each chained operator adds a level to the tree
    let mut chained = 0;

    while let Some((op, power)) = parser.peek().and_then(binary_op) {
        if power <= min_power {
            break;
        }
        parser.bump()?;
        parser.descend()?;
        chained += 1;
        let rhs = parse_binary(parser, power)?;
        lhs = Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }

    parser.ascend_by(chained);
    Ok(lhs)
}

fn parse_unary(parser: &mut Parser) -> Result<Expression, JobspecError> {
    let op = match parser.peek() {
        Some(Token::Bang) => UnaryOp::Not,
        Some(Token::Minus) => UnaryOp::Negate,
        _ => return parse_postfix(parser),
    };
    parser.bump()?;
    parser.descend()?;
    let operand = parse_unary(parser);
    parser.ascend();
    let operand = operand?;

    // Fold negative number literals so `-1` stays a plain literal.
    if let (UnaryOp::Negate, Expression::Literal(Value::Number(n))) = (op, &operand) {
        return Ok(Expression::Literal(Value::Number(-n)));
    }

    Ok(Expression::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn parse_postfix(parser: &mut Parser) -> Result<Expression, JobspecError> {
    let mut expr = parse_primary(parser)?;
    let mut chained = 0;

    loop {
        match parser.peek() {
            Some(Token::Dot) => {
                parser.bump()?; // consume .
                let name = match parser.bump()? {
                    Token::Ident(name) => name,
                    Token::Number(n) if n.fract() == 0.0 && n >= 0.0 => format!("{}", n as u64),
                    _ => {
                        return Err(parser.error("Expected attribute name after '.'", None));
                    }
                };
                expr = match expr {
                    Expression::Reference(mut path) => {
                        path.push(name);
                        Expression::Reference(path)
                    }
                    other => {
                        parser.descend()?;
                        chained += 1;
                        Expression::Index {
                            collection: Box::new(other),
                            key: Box::new(Expression::Literal(Value::String(name))),
                        }
                    }
                };
            }
            Some(Token::LBracket) => {
                parser.descend()?;
                chained += 1;
                parser.open_group()?;
                let key = parse_expression(parser)?;
                parser.close_group(Token::RBracket)?;
                expr = Expression::Index {
                    collection: Box::new(expr),
                    key: Box::new(key),
                };
            }
            _ => break,
        }
    }

    parser.ascend_by(chained);
    Ok(expr)
}

fn parse_primary(parser: &mut Parser) -> Result<Expression, JobspecError> {
    match parser.peek() {
        Some(Token::Number(_)) => match parser.bump()? {
            Token::Number(n) => Ok(Expression::Literal(Value::Number(n))),
            _ => unreachable!(),
        },
        Some(Token::Bool(_)) => match parser.bump()? {
            Token::Bool(b) => Ok(Expression::Literal(Value::Bool(b))),
            _ => unreachable!(),
        },
        Some(Token::Null) => {
            parser.bump()?;
            Ok(Expression::Literal(Value::Null))
        }
        Some(Token::Template(_)) => {
            let line = parser.line();
            match parser.bump()? {
                Token::Template(segments) => {
                    template::template_expression(parser.file(), segments, line, parser.depth())
                },
                _ => unreachable!(),
            }
        }
        Some(Token::Ident(_)) => {
            let name = match parser.bump()? {
                Token::Ident(name) => name,
                _ => unreachable!(),
            };
            if parser.peek_is(&Token::LParen) {
                let args = collection::parse_call_args(parser)?;
                return Ok(Expression::FunctionCall { name, args });
            }
            Ok(Expression::Reference(vec![name]))
        }
        Some(Token::LParen) => {
            parser.open_group()?;
            let inner = parse_expression(parser)?;
            parser.close_group(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::LBracket) => collection::parse_list(parser),
        Some(Token::LBrace) => collection::parse_map(parser),
        Some(other) => Err(parser.error(
            format!("Unexpected {} in expression", describe(other)),
            Some("Expected a value"),
        )),
        None => Err(parser.error("Unexpected end of input", None)),
    }
}
