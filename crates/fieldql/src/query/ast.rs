//! Abstract Syntax Tree (AST) for query expressions.

use std::fmt;

use serde::Serialize;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Comparator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Gte,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Lte,
    /// `~` (substring match)
    #[serde(rename = "~")]
    Contains,
    /// `!~`
    #[serde(rename = "!~")]
    NotContains,
    /// `in`
    #[serde(rename = "in")]
    In,
    /// `not in`
    #[serde(rename = "not in")]
    NotIn,
}

impl Comparator {
    /// Returns the operator as written in a query.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Contains => "~",
            Comparator::NotContains => "!~",
            Comparator::In => "in",
            Comparator::NotIn => "not in",
        }
    }

    /// Returns true for `in` and `not in`, which take a list operand.
    pub fn is_list_operator(self) -> bool {
        matches!(self, Comparator::In | Comparator::NotIn)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A binary logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    /// `and`
    And,
    /// `or`
    Or,
}

/// A dotted field path such as `author.email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamePath {
    /// Path segments in order, root-most first.
    pub segments: Vec<String>,
    /// Offset of the first character of the path.
    pub offset: usize,
}

impl NamePath {
    /// Creates a name path.
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>, offset: usize) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            offset,
        }
    }

    /// Returns the path joined with dots.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for NamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// The value of a literal as written in the query, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LiteralValue {
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// Quoted string literal (already unescaped).
    String(String),
    /// `true` or `false`.
    Bool(bool),
    /// `null`.
    Null,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(n) => write!(f, "{n}"),
            LiteralValue::Float(n) => write!(f, "{n}"),
            LiteralValue::String(s) => f.write_str(&quote(s)),
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

/// A literal together with its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    /// The literal value.
    #[serde(flatten)]
    pub value: LiteralValue,
    /// Offset of the literal's first character.
    pub offset: usize,
}

impl Literal {
    /// Creates a literal.
    pub fn new(value: LiteralValue, offset: usize) -> Self {
        Self { value, offset }
    }
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operand {
    /// A single literal.
    Literal(Literal),
    /// A bracketed list of literals, used with `in` / `not in`.
    List {
        /// Items in source order.
        items: Vec<Literal>,
        /// Offset of the opening bracket.
        offset: usize,
    },
    /// Another field (field-to-field comparison).
    Name(NamePath),
}

impl Operand {
    /// Returns the offset of the operand's first character.
    pub fn offset(&self) -> usize {
        match self {
            Operand::Literal(literal) => literal.offset,
            Operand::List { offset, .. } => *offset,
            Operand::Name(path) => path.offset,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(literal) => write!(f, "{}", literal.value),
            Operand::List { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item.value)?;
                }
                f.write_str("]")
            }
            Operand::Name(path) => write!(f, "{path}"),
        }
    }
}

/// A leaf comparison: `field op value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// The field being compared.
    pub field: NamePath,
    /// The comparison operator.
    pub op: Comparator,
    /// The right-hand side.
    pub value: Operand,
    /// Offset of the comparison (the start of the field name).
    pub offset: usize,
}

/// A parsed query expression.
///
/// AND and OR nodes are strictly binary and left-associative; NOT applies to
/// a complete sub-expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Expr {
    /// Logical AND / OR of two expressions.
    Logical {
        /// The operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },

    /// Logical NOT of an expression.
    Not {
        /// The negated expression.
        operand: Box<Expr>,
        /// Offset of the `not` keyword.
        offset: usize,
    },

    /// A field comparison.
    Comparison(Comparison),
}

impl Expr {
    /// Creates an AND node.
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates an OR node.
    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a NOT node.
    pub fn negate(operand: Expr, offset: usize) -> Self {
        Expr::Not {
            operand: Box::new(operand),
            offset,
        }
    }

    /// Returns the offset where this expression starts.
    pub fn offset(&self) -> usize {
        match self {
            Expr::Logical { left, .. } => left.offset(),
            Expr::Not { offset, .. } => *offset,
            Expr::Comparison(comparison) => comparison.offset,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Logical { op, left, right } => {
                let keyword = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                write!(f, "({left} {keyword} {right})")
            }
            Expr::Not { operand, .. } => write!(f, "not {operand}"),
            Expr::Comparison(c) => write!(f, "{} {} {}", c.field, c.op, c.value),
        }
    }
}

/// Quotes a string using double quotes, escaping quotes and backslashes.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
