//! Property value encoding.
//!
//! A serialized property value is one type-discriminator byte followed by the
//! payload. The engine stores the two halves in separate cells and keys index
//! entries on the payload alone, so it only ever needs to split and rejoin.
//!
//! [`TaggedSerializer`] is the bundled serializer for [`Value`]. Integer and
//! float payloads are encoded so that byte order matches numeric order, which
//! keeps index range lookups meaningful for numbers.

use crate::errors::{GraphStoreError, Result};

/// A serialized value split into its discriminator and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedValue {
    pub type_tag: u8,
    pub payload: Vec<u8>,
}

impl TypedValue {
    pub fn new(type_tag: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            type_tag,
            payload: payload.into(),
        }
    }

    /// Splits `tag ++ payload`. An empty input has no discriminator and is rejected.
    pub fn split(serialized: &[u8]) -> Result<Self> {
        match serialized.split_first() {
            Some((tag, payload)) => Ok(Self::new(*tag, payload)),
            None => Err(GraphStoreError::invalid_input(
                "serialized value has no type discriminator",
            )),
        }
    }

    /// Reassembles the serialized form.
    pub fn join(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 1);
        out.push(self.type_tag);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Object to bytes boundary. Output must start with exactly one discriminator byte.
pub trait ValueSerializer {
    type Value;

    fn serialize(&self, value: &Self::Value) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value>;
}

pub const TAG_NULL: u8 = 0;
pub const TAG_BOOL: u8 = 1;
pub const TAG_INT: u8 = 2;
pub const TAG_FLOAT: u8 = 3;
pub const TAG_STRING: u8 = 4;
pub const TAG_BYTES: u8 = 5;
pub const TAG_JSON: u8 = 6;

const SIGN_BIT: u64 = 1 << 63;

/// Property values understood by [`TaggedSerializer`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TaggedSerializer;

impl TaggedSerializer {
    /// Payload bytes of `value`, without the discriminator. Useful for index lookups.
    pub fn payload(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(self.encode(value)?.payload)
    }

    fn encode(&self, value: &Value) -> Result<TypedValue> {
        let typed = match value {
            Value::Null => TypedValue::new(TAG_NULL, Vec::new()),
            Value::Bool(b) => TypedValue::new(TAG_BOOL, vec![u8::from(*b)]),
            Value::Int(i) => TypedValue::new(TAG_INT, ((*i as u64) ^ SIGN_BIT).to_be_bytes()),
            Value::Float(f) => {
                let bits = f.to_bits();
                let ordered = if bits & SIGN_BIT != 0 {
                    !bits
                } else {
                    bits ^ SIGN_BIT
                };
                TypedValue::new(TAG_FLOAT, ordered.to_be_bytes())
            }
            Value::String(s) => TypedValue::new(TAG_STRING, s.as_bytes()),
            Value::Bytes(b) => TypedValue::new(TAG_BYTES, b.as_slice()),
            Value::Json(j) => TypedValue::new(TAG_JSON, serde_json::to_vec(j)?),
        };
        Ok(typed)
    }
}

fn fixed8(tag: u8, payload: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = payload.try_into().map_err(|_| {
        GraphStoreError::serialization(format!(
            "type {tag} expects an 8-byte payload, got {}",
            payload.len()
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

impl ValueSerializer for TaggedSerializer {
    type Value = Value;

    fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(self.encode(value)?.join())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value> {
        let TypedValue { type_tag, payload } = TypedValue::split(bytes)?;
        match type_tag {
            TAG_NULL => Ok(Value::Null),
            TAG_BOOL => match payload.as_slice() {
                [0] => Ok(Value::Bool(false)),
                [1] => Ok(Value::Bool(true)),
                _ => Err(GraphStoreError::serialization("malformed bool payload")),
            },
            TAG_INT => Ok(Value::Int((fixed8(type_tag, &payload)? ^ SIGN_BIT) as i64)),
            TAG_FLOAT => {
                let ordered = fixed8(type_tag, &payload)?;
                let bits = if ordered & SIGN_BIT != 0 {
                    ordered ^ SIGN_BIT
                } else {
                    !ordered
                };
                Ok(Value::Float(f64::from_bits(bits)))
            }
            TAG_STRING => String::from_utf8(payload)
                .map(Value::String)
                .map_err(|e| GraphStoreError::serialization(e.to_string())),
            TAG_BYTES => Ok(Value::Bytes(payload)),
            TAG_JSON => Ok(Value::Json(serde_json::from_slice(&payload)?)),
            other => Err(GraphStoreError::serialization(format!(
                "unknown type discriminator {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join() {
        let typed = TypedValue::split(&[7, b'a', b'b']).unwrap();
        assert_eq!(typed.type_tag, 7);
        assert_eq!(typed.payload, b"ab");
        assert_eq!(typed.join(), vec![7, b'a', b'b']);

        let bare = TypedValue::split(&[3]).unwrap();
        assert!(bare.payload.is_empty());
    }

    #[test]
    fn test_split_rejects_empty() {
        assert!(matches!(
            TypedValue::split(&[]),
            Err(GraphStoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_values_survive_serialization() {
        let ser = TaggedSerializer;
        let values = [
            Value::Null,
            Value::Bool(true),
            Value::Int(-42),
            Value::Float(2.5),
            Value::from("red"),
            Value::Bytes(vec![0, 255]),
            Value::Json(serde_json::json!({"a": [1, 2]})),
        ];
        for value in values {
            let bytes = ser.serialize(&value).unwrap();
            assert_eq!(ser.deserialize(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_integer_payload_order_matches_numeric_order() {
        let ser = TaggedSerializer;
        let mut payloads: Vec<Vec<u8>> = [i64::MIN, -5, -1, 0, 1, 7, i64::MAX]
            .iter()
            .map(|i| ser.payload(&Value::Int(*i)).unwrap())
            .collect();
        let sorted = {
            let mut p = payloads.clone();
            p.sort();
            p
        };
        assert_eq!(payloads, sorted);
        payloads.dedup();
        assert_eq!(payloads.len(), 7);
    }

    #[test]
    fn test_float_payload_order_matches_numeric_order() {
        let ser = TaggedSerializer;
        let floats = [f64::NEG_INFINITY, -10.5, -0.25, 0.0, 0.25, 3.0, f64::INFINITY];
        let payloads: Vec<Vec<u8>> = floats
            .iter()
            .map(|f| ser.payload(&Value::Float(*f)).unwrap())
            .collect();
        assert!(payloads.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_unknown_tag_and_bad_payload() {
        let ser = TaggedSerializer;
        assert!(matches!(
            ser.deserialize(&[99]),
            Err(GraphStoreError::Serialization(_))
        ));
        assert!(matches!(
            ser.deserialize(&[TAG_INT, 1, 2]),
            Err(GraphStoreError::Serialization(_))
        ));
        assert!(matches!(
            ser.deserialize(&[TAG_BOOL, 2]),
            Err(GraphStoreError::Serialization(_))
        ));
    }
}
