//! Firestore REST documents: typed value encoding and document decoding.

use crate::error::{StoreError, StoreResult};
use serde_json::{json, Map, Value};

/// Encodes a plain JSON value as a Firestore typed value.
pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // integers travel as decimal strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes an object as a Firestore `fields` map.
pub(crate) fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Decodes a Firestore typed value into plain JSON.
pub(crate) fn decode_value(value: &Value) -> StoreResult<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected typed value, got {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| StoreError::Decode(format!("bad integerValue {}", inner)))
        }
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            let decoded = values
                .map(|vs| vs.iter().map(decode_value).collect::<StoreResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(decoded))
        }
        "mapValue" => Ok(Value::Object(decode_fields(inner.get("fields"))?)),
        other => Err(StoreError::Decode(format!("unsupported value type {}", other))),
    }
}

/// Decodes a Firestore `fields` map (absent means empty).
pub(crate) fn decode_fields(fields: Option<&Value>) -> StoreResult<Map<String, Value>> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    let obj = fields
        .as_object()
        .ok_or_else(|| StoreError::Decode("fields is not an object".to_string()))?;
    obj.iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

/// A fetched document: its id (last path segment) and plain-JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decodes a REST document resource. Resource names carry the raw id,
    /// so the last segment is taken verbatim.
    pub fn from_resource(resource: &Value) -> StoreResult<Self> {
        let name = resource
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("document has no name".to_string()))?;
        let id = name
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("bad document name {}", name)))?;
        Ok(Self {
            id: id.to_string(),
            fields: decode_fields(resource.get("fields"))?,
        })
    }

    /// String array field; absent or malformed yields empty.
    pub fn string_array(&self, field: &str) -> Vec<String> {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .map(|vs| {
                vs.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// String field.
    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}
