//! Documents and typed records.
//!
//! A [`Document`] is what backends hand back: an identifier plus decoded
//! [`Fields`]. A [`Record`] is an application type that can be converted to and
//! from those fields through serde, so handlers can work with structs instead of
//! raw maps.

use serde::{Serialize, Serializer, de::DeserializeOwned, ser::SerializeMap};
use serde_json::Value as JsonValue;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    value::{Fields, Value, fields_from_json, fields_to_json},
};

/// Key under which the document identifier is exposed in flattened output.
pub const ID_FIELD: &str = "_id";

/// A stored document: its identifier and its decoded fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self { id: id.into(), fields }
    }

    /// The document identifier (the trailing segment of its resource path).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Returns a single field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field as a string slice when it holds a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn into_parts(self) -> (String, Fields) {
        (self.id, self.fields)
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Returns the fields with the identifier merged in under `_id`, the shape
    /// route handlers render.
    pub fn into_fields_with_id(self) -> Fields {
        let mut fields = self.fields;
        fields.insert(ID_FIELD.to_string(), Value::String(self.id));
        fields
    }

    /// Renders the document as a flat JSON object with an `_id` key.
    pub fn to_json(&self) -> JsonValue {
        let mut object = fields_to_json(&self.fields);
        object.insert(ID_FIELD.to_string(), JsonValue::String(self.id.clone()));
        JsonValue::Object(object)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in self.fields.iter().filter(|(key, _)| key.as_str() != ID_FIELD) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Checks that a collection name can be used as a single path segment.
pub fn validate_collection(name: &str) -> DocumentStoreResult<()> {
    validate_segment(name, "collection name")
}

/// Checks that a document ID can be used as a single path segment.
pub fn validate_document_id(id: &str) -> DocumentStoreResult<()> {
    validate_segment(id, "document id")
}

fn validate_segment(segment: &str, what: &str) -> DocumentStoreResult<()> {
    if segment.is_empty() {
        return Err(DocumentStoreError::InvalidDocument(format!("{what} must not be empty")));
    }
    if segment.contains('/') {
        return Err(DocumentStoreError::InvalidDocument(format!(
            "{what} `{segment}` must not contain `/`"
        )));
    }
    if segment == "." || segment == ".." {
        return Err(DocumentStoreError::InvalidDocument(format!(
            "{what} `{segment}` is reserved"
        )));
    }

    Ok(())
}

/// Application type stored as a document in a fixed collection.
///
/// Records convert through serde: struct fields become document fields, and an
/// optional field serialized as `_id` receives the document identifier on the
/// way back.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Skill {
///     #[serde(rename = "_id", default, skip_serializing)]
///     pub id: Option<String>,
///     pub name: String,
///     pub category: String,
/// }
///
/// impl Record for Skill {
///     fn collection_name() -> &'static str {
///         "skills"
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns the name of the collection this record lives in.
    fn collection_name() -> &'static str;
}

/// Conversion helpers automatically implemented for every [`Record`].
pub trait RecordExt: Record {
    /// Converts the record into document fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to a JSON object.
    fn to_fields(&self) -> DocumentStoreResult<Fields>;

    /// Builds the record from a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields do not match the record's shape.
    fn from_document(document: Document) -> DocumentStoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn to_fields(&self) -> DocumentStoreResult<Fields> {
        match serde_json::to_value(self)? {
            JsonValue::Object(mut object) => {
                object.remove(ID_FIELD);
                Ok(fields_from_json(object))
            }
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "record for `{}` serialized to {} instead of an object",
                R::collection_name(),
                json_kind(&other)
            ))),
        }
    }

    fn from_document(document: Document) -> DocumentStoreResult<Self> {
        Ok(serde_json::from_value(document.to_json())?)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Skill {
        #[serde(rename = "_id", default, skip_serializing)]
        id: Option<String>,
        name: String,
        level: i64,
    }

    impl Record for Skill {
        fn collection_name() -> &'static str {
            "skills"
        }
    }

    #[test]
    fn flattens_id_into_json() {
        let document = Document::new("abc", fields! { "name" => "Rust" });
        assert_eq!(document.to_json(), json!({ "_id": "abc", "name": "Rust" }));
        assert_eq!(serde_json::to_value(&document).unwrap(), json!({ "_id": "abc", "name": "Rust" }));
    }

    #[test]
    fn records_round_trip_through_documents() {
        let skill = Skill { id: None, name: "Rust".into(), level: 3 };
        let fields = skill.to_fields().unwrap();
        assert_eq!(fields, fields! { "name" => "Rust", "level" => 3 });

        let restored = Skill::from_document(Document::new("s-1", fields)).unwrap();
        assert_eq!(restored.id.as_deref(), Some("s-1"));
        assert_eq!(restored.level, 3);
    }

    #[test]
    fn rejects_bad_path_segments() {
        assert!(validate_collection("skills").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_document_id("a/b").is_err());
        assert!(validate_document_id("..").is_err());
    }

    #[test]
    fn merges_id_into_fields() {
        let fields = Document::new("q1", fields! { "question" => "Why?" }).into_fields_with_id();
        assert_eq!(fields.get(ID_FIELD), Some(&Value::String("q1".into())));
    }
}
