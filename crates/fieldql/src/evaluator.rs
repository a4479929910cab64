//! Predicate evaluation against JSON records.
//!
//! [`PredicateEvaluator`] is a reference executor for hosts that keep their
//! data in memory. Records are `serde_json::Value` objects; a field path walks
//! nested objects, and arrays along the way fan out so that a comparison
//! matches if any reached value matches.
//!
//! # Example
//!
//! ```
//! use fieldql_rs::{search, FieldDef, ModelDef, ModelRegistry, PredicateEvaluator, Schema};
//! use serde_json::json;
//!
//! let registry = ModelRegistry::new()
//!     .with_model("book", ModelDef::new([FieldDef::number("pages")]));
//! let schema = Schema::new(registry, "book").unwrap();
//! let predicate = search("pages > 100", &schema).unwrap().unwrap();
//!
//! let records = vec![json!({"pages": 320}), json!({"pages": 48})];
//! let evaluator = PredicateEvaluator::new(&predicate);
//! assert_eq!(evaluator.filter_records(&records), vec![&records[0]]);
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::predicate::{FieldRef, Predicate, PredicateValue, ScalarValue};
use crate::query::Comparator;
use crate::schema::FieldType;
use crate::translator::{parse_date, parse_datetime, parse_number};

static NULL: Value = Value::Null;

/// Evaluates a predicate against JSON records.
///
/// Missing keys and JSON `null` count as null. Comparisons against null
/// never match, so negated operators (`!=`, `!~`, `not in`) do match them.
/// `~` is a case-insensitive substring test.
#[derive(Debug, Clone, Copy)]
pub struct PredicateEvaluator<'a> {
    predicate: &'a Predicate,
}

impl<'a> PredicateEvaluator<'a> {
    /// Creates a new evaluator.
    pub fn new(predicate: &'a Predicate) -> Self {
        Self { predicate }
    }

    /// Returns true if the record matches the predicate.
    pub fn matches(&self, record: &Value) -> bool {
        self.evaluate(self.predicate, record)
    }

    /// Filters a slice of records, returning only those that match.
    pub fn filter_records<'b>(&self, records: &'b [Value]) -> Vec<&'b Value> {
        records.iter().filter(|record| self.matches(record)).collect()
    }

    fn evaluate(&self, predicate: &Predicate, record: &Value) -> bool {
        match predicate {
            Predicate::Compare { field, op, value } => self.compare(record, field, *op, value),
            Predicate::IsNull { field, negated } => {
                let values = lookup(record, &field.path);
                let is_null = values.is_empty() || values.iter().any(|v| v.is_null());
                is_null != *negated
            }
            Predicate::Nothing => false,
            Predicate::And(left, right) => {
                self.evaluate(left, record) && self.evaluate(right, record)
            }
            Predicate::Or(left, right) => self.evaluate(left, record) || self.evaluate(right, record),
            Predicate::Not(inner) => !self.evaluate(inner, record),
        }
    }

    fn compare(&self, record: &Value, field: &FieldRef, op: Comparator, value: &PredicateValue) -> bool {
        let (positive, negated) = match op {
            Comparator::Ne => (Comparator::Eq, true),
            Comparator::NotContains => (Comparator::Contains, true),
            Comparator::NotIn => (Comparator::In, true),
            other => (other, false),
        };

        let left = lookup(record, &field.path);
        let matched = match value {
            PredicateValue::Scalar(scalar) => left.iter().any(|v| holds(v, positive, scalar)),
            PredicateValue::List(items) => left
                .iter()
                .any(|v| items.iter().any(|item| holds(v, Comparator::Eq, item))),
            PredicateValue::Field(other) => {
                let right: Vec<ScalarValue> = lookup(record, &other.path)
                    .into_iter()
                    .filter_map(|v| to_scalar(v, other.field_type))
                    .collect();
                left.iter()
                    .any(|v| right.iter().any(|scalar| holds(v, positive, scalar)))
            }
        };

        matched != negated
    }
}

/// Collects the values at `path`, fanning out over arrays.
fn lookup<'v>(record: &'v Value, path: &[String]) -> Vec<&'v Value> {
    let mut current = Vec::new();
    flatten(record, &mut current);

    for segment in path {
        let mut next = Vec::new();
        for value in current {
            flatten(value.get(segment).unwrap_or(&NULL), &mut next);
        }
        current = next;
    }
    current
}

fn flatten<'v>(value: &'v Value, out: &mut Vec<&'v Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten(item, out)),
        other => out.push(other),
    }
}

/// Tests one record value against one operand.
fn holds(value: &Value, op: Comparator, operand: &ScalarValue) -> bool {
    let ordering = || compare_value(value, operand);
    match op {
        Comparator::Eq | Comparator::In => ordering() == Some(Ordering::Equal),
        Comparator::Ne | Comparator::NotIn => ordering().is_some_and(Ordering::is_ne),
        Comparator::Gt => ordering() == Some(Ordering::Greater),
        Comparator::Gte => ordering().is_some_and(Ordering::is_ge),
        Comparator::Lt => ordering() == Some(Ordering::Less),
        Comparator::Lte => ordering().is_some_and(Ordering::is_le),
        Comparator::Contains => contains(value, operand),
        Comparator::NotContains => !contains(value, operand),
    }
}

fn contains(value: &Value, operand: &ScalarValue) -> bool {
    match (as_text(value), operand) {
        (Some(text), ScalarValue::Text(needle)) => {
            text.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => false,
    }
}

/// Orders a record value relative to an operand; `None` if incomparable.
fn compare_value(value: &Value, operand: &ScalarValue) -> Option<Ordering> {
    match operand {
        ScalarValue::Int(n) => match value.as_i64() {
            Some(i) => Some(i.cmp(n)),
            None => as_number(value)?.partial_cmp(&(*n as f64)),
        },
        ScalarValue::Float(n) => as_number(value)?.partial_cmp(n),
        ScalarValue::Text(text) => Some(as_text(value)?.as_ref().cmp(text.as_str())),
        ScalarValue::Bool(b) => Some(value.as_bool()?.cmp(b)),
        ScalarValue::Date(d) => Some(as_date(value)?.cmp(d)),
        ScalarValue::DateTime(dt) => Some(as_datetime(value)?.cmp(dt)),
    }
}

/// Converts a record value to the native type of a field.
fn to_scalar(value: &Value, field_type: FieldType) -> Option<ScalarValue> {
    match field_type {
        FieldType::Number => match value.as_i64() {
            Some(n) => Some(ScalarValue::Int(n)),
            None => as_number(value).map(ScalarValue::Float),
        },
        FieldType::Text | FieldType::Choice => {
            as_text(value).map(|text| ScalarValue::Text(text.into_owned()))
        }
        FieldType::Boolean => value.as_bool().map(ScalarValue::Bool),
        FieldType::Date => as_date(value).map(ScalarValue::Date),
        FieldType::DateTime => as_datetime(value).map(ScalarValue::DateTime),
        FieldType::Relation => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match parse_number(s)? {
            ScalarValue::Int(n) => Some(n as f64),
            ScalarValue::Float(n) => Some(n),
            _ => None,
        },
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?;
    parse_date(s).or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    parse_datetime(value.as_str()?)
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
