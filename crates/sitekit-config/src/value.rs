//! Untyped configuration values.
//!
//! A [`RawValue`] is what a config file loader (plus CLI overrides) hands to the
//! engine. It mirrors a JSON tree with one extra variant: [`Callable`], an opaque host
//! function. Callables are only ever inspected for shape, except for the `server`
//! setting which may be computed from the active command.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeSeq};

/// Object map used by [`RawValue::Object`].
pub type RawMap = BTreeMap<String, RawValue>;

type CallableFn = dyn Fn(&RawValue) -> RawValue + Send + Sync;

/// A loosely-typed configuration value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<RawValue>),
    Object(RawMap),
    Function(Callable),
}

impl RawValue {
    /// Build an object from key/value pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, RawValue)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array from values.
    pub fn array(items: impl IntoIterator<Item = RawValue>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// An empty object.
    pub fn empty_object() -> Self {
        Self::Object(RawMap::new())
    }

    /// JavaScript-style truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) => true,
        }
    }

    /// Short type name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
        }
    }

    /// Human-readable summary of the value for error reports.
    ///
    /// Scalars are shown literally, containers only by their type.
    pub fn summary(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => format!("'{s}'"),
            other => other.type_name().to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RawMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut RawMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a key if this value is an object.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Recursively flatten nested arrays and drop falsy entries, preserving order.
    ///
    /// Non-array values are returned unchanged.
    pub fn flatten_truthy(self) -> Self {
        fn walk(items: Vec<RawValue>, out: &mut Vec<RawValue>) {
            for item in items {
                match item {
                    RawValue::Array(nested) => walk(nested, out),
                    item if item.is_truthy() => out.push(item),
                    _ => {}
                }
            }
        }

        match self {
            Self::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                walk(items, &mut out);
                Self::Array(out)
            }
            other => other,
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as J;

        match value {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => Self::Number(n),
            J::String(s) => Self::String(s),
            J::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            J::Object(map) => Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<Callable> for RawValue {
    fn from(value: Callable) -> Self {
        Self::Function(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u16> for RawValue {
    fn from(value: u16) -> Self {
        Self::Number(value.into())
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Self::Function(f) => f.serialize(serializer),
        }
    }
}

/// An opaque host function embedded in a configuration tree.
///
/// Besides the function itself a callable may carry named side attributes. The CLI
/// merger uses them to attach `port`/`host` overrides to a `server` function whose
/// result is not known until the command is.
#[derive(Clone)]
pub struct Callable {
    name: Option<String>,
    func: Arc<CallableFn>,
    attrs: RawMap,
}

impl Callable {
    pub fn new(func: impl Fn(&RawValue) -> RawValue + Send + Sync + 'static) -> Self {
        Self {
            name: None,
            func: Arc::new(func),
            attrs: RawMap::new(),
        }
    }

    /// Attach a display name, e.g. the plugin's export name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a side attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&RawValue> {
        self.attrs.get(key)
    }

    /// Invoke the function.
    pub fn call(&self, arg: &RawValue) -> RawValue {
        (self.func)(arg)
    }
}

impl Serialize for Callable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func) && self.attrs == other.attrs
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[Function {name}]"),
            None => f.write_str("[Function]"),
        }
    }
}
