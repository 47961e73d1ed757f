use std::fmt;

use crate::value::Value;

/// Ordered sequence of attributes and nested blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub items: Vec<BodyItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    Attribute(Attribute),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub block_type: String,
    pub labels: Vec<String>,
    pub body: Body,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    /// `source` is the verbatim `${...}` text, kept for pass-through.
    Interpolation { expr: Expression, source: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

/// Unevaluated expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Interpolation(Vec<TemplatePart>),
    Reference(Vec<String>), // e.g. vars.region_var
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    ForExpr {
        collection: Box<Expression>,
        key_var: Option<String>,
        value_var: String,
        key_expr: Option<Box<Expression>>,
        value_expr: Box<Expression>,
        condition: Option<Box<Expression>>,
    },
    ListLiteral(Vec<Expression>),
    MapLiteral(Vec<(Expression, Expression)>),
    Index {
        collection: Box<Expression>,
        key: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
}

impl Body {
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter().filter_map(|item| match item {
            BodyItem::Attribute(attr) => Some(attr),
            BodyItem::Block(_) => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            BodyItem::Block(block) => Some(block),
            BodyItem::Attribute(_) => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().find(|a| a.name == name)
    }

    pub fn blocks_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks().filter(move |b| b.block_type == block_type)
    }
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Renders the expression back to source form.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Interpolation(parts) => {
                write!(f, "\"")?;
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => write!(f, "{}", text)?,
                        TemplatePart::Interpolation { source, .. } => write!(f, "{}", source)?,
                    }
                }
                write!(f, "\"")
            }
            Expression::Reference(path) => write!(f, "{}", path.join(".")),
            Expression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expression::ForExpr {
                collection,
                key_var,
                value_var,
                key_expr,
                value_expr,
                condition,
            } => {
                let (open, close) = if key_expr.is_some() { ("{", "}") } else { ("[", "]") };
                write!(f, "{}for ", open)?;
                if let Some(k) = key_var {
                    write!(f, "{}, ", k)?;
                }
                write!(f, "{} in {} : ", value_var, collection)?;
                if let Some(k) = key_expr {
                    write!(f, "{} => ", k)?;
                }
                write!(f, "{}", value_expr)?;
                if let Some(c) = condition {
                    write!(f, " if {}", c)?;
                }
                write!(f, "{}", close)
            }
            Expression::ListLiteral(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expression::MapLiteral(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expression::Index { collection, key } => write!(f, "{}[{}]", collection, key),
            Expression::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
            },
            Expression::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
            } => write!(f, "{} ? {} : {}", condition, then_expr, else_expr),
        }
    }
}
