//! value.rs - Dynamic value model for structured log fields.
//!
//! `Value` is a closed set of shapes the filter knows how to walk. Plain data
//! converts in through `From` or, for any `Serialize` type, through
//! `Value::from_serialize`. `Value::Shared` wraps an `Arc<RwLock<Value>>` so
//! callers can hand over graphs that alias or even contain themselves.
//!
//! License: MIT OR APACHE 2.0

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Serialize, Serializer};
use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::config::{CIRCULAR_REFERENCE, MAX_DEPTH_EXCEEDED, MAX_RECURSION_DEPTH};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Struct(StructValue),
    Shared(SharedValue),
    /// A value with no data shape (a handle, a callback). Carried as its
    /// description and never inspected.
    Opaque(String),
}

/// A named record whose fields may be hidden or renamed on output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    pub name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    /// Serialized name, if different from `name`.
    pub rename: Option<String>,
    pub value: Value,
    /// Unexported fields never appear in filtered or serialized output.
    pub exported: bool,
}

impl StructField {
    /// The name the field is emitted under.
    pub fn key(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

impl StructValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds an exported field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(StructField {
            name: name.into(),
            rename: None,
            value: value.into(),
            exported: true,
        });
        self
    }

    /// Adds an exported field emitted under `rename`.
    pub fn renamed(mut self, name: impl Into<String>, rename: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(StructField {
            name: name.into(),
            rename: Some(rename.into()),
            value: value.into(),
            exported: true,
        });
        self
    }

    /// Adds a field that is never emitted.
    pub fn private(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(StructField {
            name: name.into(),
            rename: None,
            value: value.into(),
            exported: false,
        });
        self
    }
}

/// Shared, mutable node. Equality and hashing are by identity.
#[derive(Clone, Default)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    pub fn new(value: impl Into<Value>) -> Self {
        SharedValue(Arc::new(RwLock::new(value.into())))
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read()
    }

    /// Replaces the pointee. This is how cycles are built.
    pub fn set(&self, value: impl Into<Value>) {
        *self.0.write() = value.into();
    }

    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedValue {
    // Never descends: the pointee may contain this node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:#x})", self.id())
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Shared(_) => "shared",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Converts any serializable value. Serialization failures become an
    /// `Opaque` describing the error.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Value {
        match serde_json::to_value(value) {
            Ok(json) => Value::from(json),
            Err(e) => Value::Opaque(format!("<unserializable: {}>", e)),
        }
    }

    /// Converts to JSON. Shared nodes are followed; a node already on the
    /// current path becomes the circular-reference marker and nesting past the
    /// recursion limit becomes the depth marker.
    pub fn to_json(&self) -> Json {
        let mut path = HashSet::new();
        to_json_guarded(self, &mut path, 0)
    }
}

fn to_json_guarded(value: &Value, path: &mut HashSet<usize>, depth: usize) -> Json {
    if depth > MAX_RECURSION_DEPTH {
        return Json::String(MAX_DEPTH_EXCEEDED.to_string());
    }
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::UInt(u) => Json::Number((*u).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Opaque(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(
            items
                .iter()
                .map(|v| to_json_guarded(v, path, depth + 1))
                .collect(),
        ),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json_guarded(v, path, depth + 1)))
                .collect(),
        ),
        Value::Struct(s) => {
            let mut obj = JsonMap::new();
            for field in s.fields.iter().filter(|f| f.exported) {
                obj.insert(field.key().to_string(), to_json_guarded(&field.value, path, depth + 1));
            }
            Json::Object(obj)
        }
        Value::Shared(shared) => {
            let id = shared.id();
            if !path.insert(id) {
                return Json::String(CIRCULAR_REFERENCE.to_string());
            }
            let out = to_json_guarded(&shared.read(), path, depth + 1);
            path.remove(&id);
            out
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    /// Strings print bare; everything else prints as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Opaque(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(obj) => Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64, isize);
impl_from_int!(UInt, u64, u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

impl From<SharedValue> for Value {
    fn from(v: SharedValue) -> Self {
        Value::Shared(v)
    }
}
