use crate::value::Value;

use super::*;

/// Turn lexed template segments into an expression.
///
/// A template without interpolations is a plain string literal; anything
/// else stays an `Interpolation`, so its result is always a string.
pub(super) fn template_expression(
    file: &str,
    segments: Vec<TemplateSegment>,
    line: usize,
    depth: usize,
) -> Result<Expression, JobspecError> {
    if let [TemplateSegment::Literal(text)] = segments.as_slice() {
        return Ok(Expression::Literal(Value::String(text.clone())));
    }

    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            TemplateSegment::Literal(text) => parts.push(TemplatePart::Literal(text)),
            TemplateSegment::Interpolation(inner) => {
                let expr = parse_fragment(file, &inner, line, depth)?;
                parts.push(TemplatePart::Interpolation {
                    expr,
                    source: format!("${{{}}}", inner),
                });
            }
        }
    }

    Ok(Expression::Interpolation(parts))
}

fn parse_fragment(file: &str, inner: &str, line: usize, depth: usize) -> Result<Expression, JobspecError> {
    let mut parser = Parser::fragment(file, inner, line, depth)?;
    if parser.peek_is(&Token::Eof) {
        return Err(parser.error("Empty interpolation '${}'", None));
    }
    let expr = parser.parse_expression()?;
    if !parser.peek_is(&Token::Eof) {
        let found = parser.peek().cloned().unwrap_or(Token::Eof);
        return Err(parser.error(
            format!("Unexpected {} in interpolation", describe(&found)),
            None,
        ));
    }
    Ok(expr)
}
