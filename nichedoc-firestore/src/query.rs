//! Query translation from nichedoc expressions to Firestore structured queries.

use serde_json::{Value as JsonValue, json};

use nichedoc_core::{
    error::DocumentStoreError,
    query::{Expr, Query, QueryVisitor},
    value::Value,
};

use crate::codec::{encode_value, quote_field_path};

/// Translates filter expressions into the `where` clause of a structured query.
///
/// An equality becomes a `fieldFilter` with `EQUAL` (a `unaryFilter` for null
/// and NaN); a conjunction becomes one flat `compositeFilter` with `AND` over
/// all of its equalities.
pub(crate) struct StructuredQueryTranslator;

impl StructuredQueryTranslator {
    fn collect_filters(&mut self, exprs: &[Expr], out: &mut Vec<JsonValue>) -> Result<(), DocumentStoreError> {
        for expr in exprs {
            match expr {
                Expr::And(nested) => self.collect_filters(nested, out)?,
                Expr::Eq { field, value } => out.push(self.visit_eq(field, value)?),
            }
        }

        Ok(())
    }
}

impl QueryVisitor for StructuredQueryTranslator {
    type Output = JsonValue;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let mut filters = Vec::new();
        self.collect_filters(exprs, &mut filters)?;

        match filters.len() {
            0 => Err(DocumentStoreError::InvalidQuery("empty conjunction".to_string())),
            1 => Ok(filters.remove(0)),
            _ => Ok(json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
        }
    }

    fn visit_eq(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error> {
        if field.is_empty() {
            return Err(DocumentStoreError::InvalidQuery("empty field path".to_string()));
        }

        let field_path = json!({ "fieldPath": quote_field_path(field) });

        // Firestore rejects EQUAL against null or NaN.
        let unary = match value {
            Value::Null => Some("IS_NULL"),
            Value::Double(number) if number.is_nan() => Some("IS_NAN"),
            _ => None,
        };

        Ok(match unary {
            Some(op) => json!({ "unaryFilter": { "op": op, "field": field_path } }),
            None => json!({
                "fieldFilter": {
                    "field": field_path,
                    "op": "EQUAL",
                    "value": encode_value(value),
                }
            }),
        })
    }
}

/// Builds the `runQuery` request body for `collection`.
pub fn structured_query(collection: &str, query: &Query) -> Result<JsonValue, DocumentStoreError> {
    let mut structured = json!({
        "from": [{ "collectionId": collection }],
        "limit": i32::try_from(query.limit).unwrap_or(i32::MAX),
    });

    if let Some(filter) = &query.filter {
        structured["where"] = StructuredQueryTranslator.visit_expr(filter)?;
    }

    Ok(json!({ "structuredQuery": structured }))
}
