//! Query expression evaluation for in-memory document filtering.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use nichedoc_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, QueryVisitor},
    value::{Fields, Value},
};

/// Comparable view of a [`Value`].
///
/// Integers compare exactly with integers. An integer equals a double only
/// when the double is integral and converts back to the same `i64`, so `1`
/// and `1.0` compare equal the way the remote store compares numbers.
/// Booleans stay separate.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Timestamp(&'a DateTime<Utc>),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(BTreeMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Boolean(value) => Comparable::Bool(*value),
            Value::Integer(value) => Comparable::Integer(*value),
            Value::Double(value) => Comparable::Double(*value),
            Value::Timestamp(value) => Comparable::Timestamp(value),
            Value::String(value) => Comparable::String(value),
            Value::Array(values) => Comparable::Array(values.iter().map(Comparable::from).collect()),
            Value::Map(fields) => Comparable::Map(
                fields
                    .iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Integer(a), Comparable::Integer(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Integer(int), Comparable::Double(double))
            | (Comparable::Double(double), Comparable::Integer(int)) => integer_equals_double(*int, *double),
            (Comparable::Timestamp(a), Comparable::Timestamp(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

// 2^63 as f64; `i64::MAX as f64` rounds up to this value.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn integer_equals_double(int: i64, double: f64) -> bool {
    double.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&double) && double as i64 == int
}

pub(crate) struct DocumentEvaluator<'a> {
    fields: &'a Fields,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(fields: &'a Fields) -> Self {
        Self { fields }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_eq(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.fields.get(field) else {
            return Ok(false);
        };

        // A NaN condition matches stored NaNs, like the remote IS_NAN filter.
        if let Value::Double(wanted) = value {
            if wanted.is_nan() {
                return Ok(matches!(field_value, Value::Double(stored) if stored.is_nan()));
            }
        }

        Ok(Comparable::from(field_value) == Comparable::from(value))
    }
}
