//! Predicate tree produced by the translator.
//!
//! A [`Predicate`] is independent of any storage engine: field references
//! carry their path and semantic type, and values are already coerced to
//! native types. Hosts walk the tree to build their own queries, or use
//! [`PredicateEvaluator`](crate::PredicateEvaluator) to filter JSON records.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::query::{quote, Comparator};
use crate::schema::FieldType;

/// Format used when rendering dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used when rendering datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A reference to a resolved field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    /// Path segments from the root model.
    pub path: Vec<String>,
    /// Semantic type of the field.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldRef {
    /// Creates a field reference.
    pub fn new<S: Into<String>>(path: impl IntoIterator<Item = S>, field_type: FieldType) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            field_type,
        }
    }

    /// Returns the path joined with dots, as written in queries.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    /// Returns the path joined with double underscores (`author__name`),
    /// the lookup form relational data layers commonly expect.
    pub fn lookup(&self) -> String {
        self.path.join("__")
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// A value coerced to the type of the field it is compared with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ScalarValue {
    /// Whole number.
    Int(i64),
    /// Decimal number.
    Float(f64),
    /// Text, also used for choice values.
    Text(String),
    /// Boolean.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time, without a time zone.
    DateTime(NaiveDateTime),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(n) => write!(f, "{n}"),
            ScalarValue::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.1}"),
            ScalarValue::Float(n) => write!(f, "{n}"),
            ScalarValue::Text(s) => f.write_str(&quote(s)),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Date(d) => write!(f, "\"{}\"", d.format(DATE_FORMAT)),
            ScalarValue::DateTime(dt) => write!(f, "\"{}\"", dt.format(DATETIME_FORMAT)),
        }
    }
}

/// The right-hand side of a [`Predicate::Compare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateValue {
    /// A single value.
    Scalar(ScalarValue),
    /// Values for `in` / `not in`; never empty.
    List(Vec<ScalarValue>),
    /// Another field of the same record.
    Field(FieldRef),
}

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateValue::Scalar(value) => write!(f, "{value}"),
            PredicateValue::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            PredicateValue::Field(field) => write!(f, "{field}"),
        }
    }
}

/// A storage-independent boolean filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `field op value`.
    Compare {
        /// The compared field.
        field: FieldRef,
        /// The operator; never `=`/`!=` against null.
        op: Comparator,
        /// The coerced right-hand side.
        value: PredicateValue,
    },
    /// `field = null` (or `!= null` when negated).
    IsNull {
        /// The checked field.
        field: FieldRef,
        /// True for "is not null".
        negated: bool,
    },
    /// Matches no records, produced by `in []`.
    Nothing,
    /// Both sides match.
    And(Box<Predicate>, Box<Predicate>),
    /// Either side matches.
    Or(Box<Predicate>, Box<Predicate>),
    /// The operand does not match.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates an AND node.
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR node.
    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    /// Creates a NOT node.
    pub fn negate(operand: Predicate) -> Self {
        Predicate::Not(Box::new(operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { field, op, value } => write!(f, "{field} {op} {value}"),
            Predicate::IsNull {
                field,
                negated: false,
            } => write!(f, "{field} = null"),
            Predicate::IsNull {
                field,
                negated: true,
            } => write!(f, "{field} != null"),
            Predicate::Nothing => f.write_str("<no match>"),
            Predicate::And(left, right) => write!(f, "({left} and {right})"),
            Predicate::Or(left, right) => write!(f, "({left} or {right})"),
            Predicate::Not(operand) => write!(f, "not {operand}"),
        }
    }
}
