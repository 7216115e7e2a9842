// Submission payloads for `POST /cfg` and `POST /run`.
//
// Operator input arrives as raw strings. Values are coerced before they go
// on the wire so the JSON generation of the firmware receives real numbers,
// and a field name repeated within one submission accumulates into a list
// instead of overwriting the earlier value.

use serde_json::{Map, Value};

/// How a device generation expects submissions to be encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitEncoding {
    /// `application/x-www-form-urlencoded`, lists as repeated keys.
    #[default]
    Form,
    /// A JSON object, lists as arrays.
    Json,
}

/// A single coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    /// A numeric field submitted more than once, in submission order.
    Numbers(Vec<f64>),
    Text(String),
    /// A repeated field where at least one value was not numeric.
    Texts(Vec<String>),
}

impl FieldValue {
    /// Coerce raw operator input: `true`/`false` become booleans, numbers
    /// written in canonical form become numbers, the rest stays text.
    ///
    /// Input such as `00123456` or `1e3` parses as a number but would not
    /// survive being written back out, so it is kept verbatim.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() && n.to_string() == trimmed => Self::Number(n),
                _ => Self::Text(raw.to_owned()),
            },
        }
    }

    /// Fold a repeated occurrence of the same field into this value.
    fn accumulate(self, next: Self) -> Self {
        match (self, next) {
            (Self::Number(a), Self::Number(b)) => Self::Numbers(vec![a, b]),
            (Self::Numbers(mut list), Self::Number(b)) => {
                list.push(b);
                Self::Numbers(list)
            }
            (Self::Numbers(mut list), Self::Numbers(more)) => {
                list.extend(more);
                Self::Numbers(list)
            }
            (Self::Texts(mut list), other) => {
                list.extend(other.form_values());
                Self::Texts(list)
            }
            (first, other) => {
                let mut list = first.form_values();
                list.extend(other.form_values());
                Self::Texts(list)
            }
        }
    }

    /// String renderings used for form encoding, one per wire occurrence.
    fn form_values(&self) -> Vec<String> {
        match self {
            Self::Bool(b) => vec![b.to_string()],
            Self::Number(n) => vec![n.to_string()],
            Self::Numbers(list) => list.iter().map(ToString::to_string).collect(),
            Self::Text(s) => vec![s.clone()],
            Self::Texts(list) => list.clone(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => json_number(*n),
            Self::Numbers(list) => Value::Array(list.iter().copied().map(json_number).collect()),
            Self::Text(s) => Value::String(s.clone()),
            Self::Texts(list) => Value::Array(list.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Integral values go out as JSON integers; firmware parsers are happier
/// with `30` than `30.0`.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn json_number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// An ordered set of named fields for one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    fields: Vec<(String, FieldValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `name=value` pairs, coercing every value.
    pub fn from_raw_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut payload = Self::new();
        for (name, raw) in pairs {
            payload.insert(name, FieldValue::coerce(raw.as_ref()));
        }
        payload
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a field. A name already present accumulates rather than
    /// overwriting.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            let previous = std::mem::replace(&mut slot.1, FieldValue::Bool(false));
            slot.1 = previous.accumulate(value);
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Flatten into `(key, value)` string pairs, lists as repeated keys.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .flat_map(|(name, value)| {
                value
                    .form_values()
                    .into_iter()
                    .map(move |v| (name.clone(), v))
            })
            .collect()
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}
