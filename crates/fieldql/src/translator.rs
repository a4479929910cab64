//! Translation of parsed expressions into predicates.
//!
//! The translator resolves every field path against a [`Schema`], checks the
//! operator against the field's type and coerces literals to native values.
//! Translation is all-or-nothing: the first problem is returned as an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{QueryResult, TranslationError};
use crate::predicate::{FieldRef, Predicate, PredicateValue, ScalarValue, DATE_FORMAT};
use crate::query::{Comparator, Comparison, Expr, Literal, LiteralValue, LogicalOp, NamePath, Operand};
use crate::schema::{Field, FieldType, Schema};

/// Accepted datetime layouts, tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Translates expressions against one schema.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'s> {
    schema: &'s Schema,
}

impl<'s> Translator<'s> {
    /// Creates a translator for `schema`.
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Translates an expression tree into a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Schema`](crate::QueryError::Schema) for paths
    /// that do not resolve and [`QueryError::Translation`](crate::QueryError::Translation)
    /// for unsupported operators and values that do not fit the field.
    pub fn translate(&self, expr: &Expr) -> QueryResult<Predicate> {
        match expr {
            Expr::Logical { op, left, right } => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                Ok(match op {
                    LogicalOp::And => Predicate::and(left, right),
                    LogicalOp::Or => Predicate::or(left, right),
                })
            }
            Expr::Not { operand, .. } => Ok(Predicate::negate(self.translate(operand)?)),
            Expr::Comparison(comparison) => self.translate_comparison(comparison),
        }
    }

    fn resolve(&self, path: &NamePath) -> QueryResult<&'s Field> {
        self.schema
            .resolve(&path.segments)
            .map_err(|e| e.at(path.offset).into())
    }

    fn translate_comparison(&self, comparison: &Comparison) -> QueryResult<Predicate> {
        let Comparison {
            field: path,
            op,
            value,
            ..
        } = comparison;
        let op = *op;
        let field = self.resolve(path)?;
        let field_ref = FieldRef::new(field.path.iter().cloned(), field.field_type);

        // Null checks bypass the operator table.
        if let Operand::Literal(Literal {
            value: LiteralValue::Null,
            offset,
        }) = value
        {
            return match op {
                Comparator::Eq | Comparator::Ne => Ok(Predicate::IsNull {
                    field: field_ref,
                    negated: op == Comparator::Ne,
                }),
                _ => Err(TranslationError::new(
                    format!("null can only be compared with '=' or '!=', not '{op}'"),
                    *offset,
                )
                .with_path(field.dotted())
                .into()),
            };
        }

        if !self.schema.comparable_types(field).contains(&op) {
            return Err(TranslationError::new(
                format!(
                    "operator '{op}' not supported for {} field '{}'",
                    field.field_type,
                    field.dotted()
                ),
                comparison.offset,
            )
            .with_path(field.dotted())
            .into());
        }

        let value = match value {
            Operand::List { items, offset } => {
                if !op.is_list_operator() {
                    return Err(TranslationError::new(
                        format!("operator '{op}' does not accept a list"),
                        *offset,
                    )
                    .with_path(field.dotted())
                    .into());
                }
                if items.is_empty() {
                    return Ok(match op {
                        Comparator::NotIn => Predicate::negate(Predicate::Nothing),
                        _ => Predicate::Nothing,
                    });
                }
                let values = items
                    .iter()
                    .map(|item| match item.value {
                        LiteralValue::Null => Err(TranslationError::new(
                            "null is not allowed in a list; use '= null' instead",
                            item.offset,
                        )
                        .with_path(field.dotted())),
                        _ => coerce(field, item),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                PredicateValue::List(values)
            }
            Operand::Literal(literal) => {
                if op.is_list_operator() {
                    return Err(TranslationError::new(
                        format!("operator '{op}' requires a list such as [1, 2]"),
                        literal.offset,
                    )
                    .with_path(field.dotted())
                    .into());
                }
                PredicateValue::Scalar(coerce(field, literal)?)
            }
            Operand::Name(other_path) => {
                if op.is_list_operator() {
                    return Err(TranslationError::new(
                        format!("operator '{op}' requires a list, not the field '{other_path}'"),
                        other_path.offset,
                    )
                    .with_path(field.dotted())
                    .into());
                }
                let other = self.resolve(other_path)?;
                if !compatible(field.field_type, other.field_type) {
                    return Err(TranslationError::new(
                        format!(
                            "cannot compare {} field '{}' with {} field '{}'",
                            field.field_type,
                            field.dotted(),
                            other.field_type,
                            other.dotted()
                        ),
                        other_path.offset,
                    )
                    .with_path(field.dotted())
                    .into());
                }
                PredicateValue::Field(FieldRef::new(other.path.iter().cloned(), other.field_type))
            }
        };

        Ok(Predicate::Compare {
            field: field_ref,
            op,
            value,
        })
    }
}

/// Translates an expression tree against a schema.
///
/// # Example
///
/// ```
/// use fieldql_rs::{translate, FieldDef, ModelDef, ModelRegistry, QueryParser, Schema};
///
/// let registry = ModelRegistry::new()
///     .with_model("book", ModelDef::new([FieldDef::number("pages")]));
/// let schema = Schema::new(registry, "book").unwrap();
///
/// let expr = QueryParser::parse(r#"pages >= "300""#).unwrap();
/// let predicate = translate(&expr, &schema).unwrap();
/// assert_eq!(predicate.to_string(), "pages >= 300");
/// ```
pub fn translate(expr: &Expr, schema: &Schema) -> QueryResult<Predicate> {
    Translator::new(schema).translate(expr)
}

/// Returns true if fields of these types may be compared with each other.
fn compatible(left: FieldType, right: FieldType) -> bool {
    left == right
        || matches!(
            (left, right),
            (FieldType::Text, FieldType::Choice) | (FieldType::Choice, FieldType::Text)
        )
}

/// Coerces a literal to the native type of `field`.
fn coerce(field: &Field, literal: &Literal) -> Result<ScalarValue, TranslationError> {
    let mismatch = |expected: &str| {
        TranslationError::new(
            format!(
                "{} field '{}' expects {expected}, got {}",
                field.field_type,
                field.dotted(),
                literal.value
            ),
            literal.offset,
        )
        .with_path(field.dotted())
    };

    match (field.field_type, &literal.value) {
        (FieldType::Number, LiteralValue::Int(n)) => Ok(ScalarValue::Int(*n)),
        (FieldType::Number, LiteralValue::Float(n)) => Ok(ScalarValue::Float(*n)),
        (FieldType::Number, LiteralValue::String(s)) => {
            parse_number(s).ok_or_else(|| mismatch("a number"))
        }
        (FieldType::Number, _) => Err(mismatch("a number")),

        (FieldType::Boolean, LiteralValue::Bool(b)) => Ok(ScalarValue::Bool(*b)),
        (FieldType::Boolean, _) => Err(mismatch("true or false")),

        (FieldType::Text, LiteralValue::String(s)) => Ok(ScalarValue::Text(s.clone())),
        (FieldType::Text, _) => Err(mismatch("a quoted string")),

        (FieldType::Choice, LiteralValue::String(s)) => choice(field, s, literal.offset),
        (FieldType::Choice, LiteralValue::Int(n)) => choice(field, &n.to_string(), literal.offset),
        (FieldType::Choice, _) => Err(mismatch("one of its declared values")),

        (FieldType::Date, LiteralValue::String(s)) => parse_date(s)
            .map(ScalarValue::Date)
            .ok_or_else(|| mismatch("a date like \"2024-01-31\"")),
        (FieldType::Date, _) => Err(mismatch("a date like \"2024-01-31\"")),

        (FieldType::DateTime, LiteralValue::String(s)) => parse_datetime(s)
            .map(ScalarValue::DateTime)
            .ok_or_else(|| mismatch("a datetime like \"2024-01-31 13:45:00\"")),
        (FieldType::DateTime, _) => Err(mismatch("a datetime like \"2024-01-31 13:45:00\"")),

        (FieldType::Relation, _) => Err(TranslationError::new(
            format!("relation '{}' cannot be compared directly", field.dotted()),
            literal.offset,
        )
        .with_path(field.dotted())),
    }
}

fn choice(field: &Field, input: &str, offset: usize) -> Result<ScalarValue, TranslationError> {
    match field.choice_value(input) {
        Some(value) => Ok(ScalarValue::Text(value.to_string())),
        None => {
            let allowed: Vec<&str> = field.suggestions.iter().map(|s| s.value.as_str()).collect();
            Err(TranslationError::new(
                format!(
                    "'{input}' is not a valid value for '{}'; expected one of: {}",
                    field.dotted(),
                    allowed.join(", ")
                ),
                offset,
            )
            .with_path(field.dotted()))
        }
    }
}

/// Parses text as an integer, or failing that a finite decimal (`"1e3"` is accepted).
pub(crate) fn parse_number(s: &str) -> Option<ScalarValue> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(ScalarValue::Int(n));
    }
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(ScalarValue::Float)
}

/// Parses a `YYYY-MM-DD` date.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Parses a datetime in any accepted layout; a bare date means midnight.
pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}
