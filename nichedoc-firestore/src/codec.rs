//! Conversion between [`Value`]s and Firestore's typed JSON encoding.
//!
//! Every wire value is a single-key object whose key names the type:
//!
//! ```json
//! { "stringValue": "Python" }
//! { "integerValue": "42" }
//! { "mapValue": { "fields": { "level": { "integerValue": "3" } } } }
//! ```
//!
//! Decoding never fails as a whole: an entry with an unknown tag or a
//! malformed payload is dropped from its enclosing map or array and logged.

use serde_json::{Map as JsonMap, Value as JsonValue, json};

use nichedoc_core::{
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    value::{Fields, Value, format_timestamp, parse_timestamp},
};

/// Encodes a single value.
pub fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::String(value) => json!({ "stringValue": value }),
        Value::Integer(value) => json!({ "integerValue": value.to_string() }),
        Value::Double(value) => json!({ "doubleValue": encode_double(*value) }),
        Value::Boolean(value) => json!({ "booleanValue": value }),
        Value::Null => json!({ "nullValue": null }),
        Value::Timestamp(value) => json!({ "timestampValue": format_timestamp(value) }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn encode_double(value: f64) -> JsonValue {
    if value.is_nan() {
        JsonValue::from("NaN")
    } else if value == f64::INFINITY {
        JsonValue::from("Infinity")
    } else if value == f64::NEG_INFINITY {
        JsonValue::from("-Infinity")
    } else {
        JsonValue::from(value)
    }
}

/// Encodes a field map into the `fields` object of a document body.
pub fn encode_fields(fields: &Fields) -> JsonValue {
    JsonValue::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect::<JsonMap<_, _>>(),
    )
}

/// Decodes a single wire value, `None` when the tag is unknown or the
/// payload malformed.
pub fn decode_value(wire: &JsonValue) -> Option<Value> {
    let object = wire.as_object()?;
    let (tag, payload) = object.iter().next()?;

    let decoded = match tag.as_str() {
        "stringValue" => payload.as_str().map(|value| Value::String(value.to_string())),
        "integerValue" => decode_integer(payload).map(Value::Integer),
        "doubleValue" => decode_double(payload).map(Value::Double),
        "booleanValue" => payload.as_bool().map(Value::Boolean),
        "nullValue" => Some(Value::Null),
        "timestampValue" => payload.as_str().and_then(parse_timestamp).map(Value::Timestamp),
        "arrayValue" => Some(Value::Array(decode_array(payload))),
        "mapValue" => Some(Value::Map(
            payload
                .get("fields")
                .map(decode_fields)
                .unwrap_or_default(),
        )),
        _ => None,
    };

    if decoded.is_none() {
        tracing::warn!(tag = %tag, payload = %payload, "Dropping undecodable Firestore value");
    }

    decoded
}

fn decode_integer(payload: &JsonValue) -> Option<i64> {
    match payload {
        JsonValue::String(text) => text.parse().ok(),
        JsonValue::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn decode_double(payload: &JsonValue) -> Option<f64> {
    match payload {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => match text.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn decode_array(payload: &JsonValue) -> Vec<Value> {
    payload
        .get("values")
        .and_then(JsonValue::as_array)
        .map(|values| values.iter().filter_map(decode_value).collect())
        .unwrap_or_default()
}

/// Decodes a `fields` object. Entries that fail to decode are left out.
pub fn decode_fields(wire: &JsonValue) -> Fields {
    let Some(object) = wire.as_object() else {
        return Fields::new();
    };

    object
        .iter()
        .filter_map(|(key, value)| decode_value(value).map(|value| (key.clone(), value)))
        .collect()
}

/// Trailing segment of a document resource name.
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Decodes a document resource (`name`, `fields`, timestamps).
pub fn decode_document(wire: &JsonValue) -> DocumentStoreResult<Document> {
    let name = wire
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| DocumentStoreError::Serialization("document without a name".to_string()))?;

    let fields = wire.get("fields").map(decode_fields).unwrap_or_default();

    Ok(Document::new(document_id(name), fields))
}

/// Quotes a field path unless it is a plain identifier.
///
/// Plain identifiers start with a letter or underscore and continue with
/// letters, digits or underscores. Anything else is wrapped in backticks with
/// embedded backticks and backslashes escaped.
pub fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        return field.to_string();
    }

    let escaped = field.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}
