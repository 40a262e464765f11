use crate::model::ResourceAddress;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute name -> value, in declaration order. Equality ignores order.
pub type Attributes = IndexMap<String, Value>;

/// An attribute value as declared in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(Attributes),
    Reference(Reference),
    /// An expression that cannot be evaluated statically (function calls, templates,
    /// conditionals). Keeps the source text and every reference it mentions.
    Expression {
        source: String,
        references: Vec<Reference>,
    },
    /// Known only after apply, e.g. the `id` of a resource that does not exist yet.
    Unknown,
}

/// A pointer from an attribute to something else in the graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum Reference {
    Resource {
        address: ResourceAddress,
        /// Attribute path below the resource (`["id"]`, `["tags", "Name"]`).
        #[serde(default)]
        path: Vec<String>,
    },
    Variable {
        name: String,
    },
    Local {
        name: String,
    },
    Module {
        name: String,
    },
}

impl Reference {
    pub fn resource(address: ResourceAddress, path: &[&str]) -> Self {
        Reference::Resource {
            address,
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn variable(name: &str) -> Self {
        Reference::Variable {
            name: name.to_string(),
        }
    }

    pub fn local(name: &str) -> Self {
        Reference::Local {
            name: name.to_string(),
        }
    }

    /// The resource this reference points at, if any.
    pub fn target_resource(&self) -> Option<&ResourceAddress> {
        match self {
            Reference::Resource { address, .. } => Some(address),
            _ => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Resource { address, path } => {
                write!(f, "{address}")?;
                for seg in path {
                    write!(f, ".{seg}")?;
                }
                Ok(())
            }
            Reference::Variable { name } => write!(f, "var.{name}"),
            Reference::Local { name } => write!(f, "local.{name}"),
            Reference::Module { name } => write!(f, "module.{name}"),
        }
    }
}

impl Value {
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Map lookup; `None` for anything that is not a map or lacks the key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// One step of optional chaining: a map key, or a list index.
    pub fn get_segment(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Walk a path of map keys / list indices; `None` as soon as a step is absent.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, seg| current.get_segment(seg))
    }

    /// Items as a list: lists yield their items, any other value yields itself.
    pub fn iter_items(&self) -> impl Iterator<Item = &Value> {
        let items: Vec<&Value> = match self {
            Value::List(items) => items.iter().collect(),
            other => vec![other],
        };
        items.into_iter()
    }

    /// True when the value is fully concrete (no references, expressions or unknowns).
    pub fn is_known(&self) -> bool {
        match self {
            Value::Reference(_) | Value::Expression { .. } | Value::Unknown => false,
            Value::List(items) => items.iter().all(Value::is_known),
            Value::Map(map) => map.values().all(Value::is_known),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Reference(_) => "reference",
            Value::Expression { .. } => "expression",
            Value::Unknown => "unknown",
        }
    }

    /// Every reference mentioned anywhere inside the value, in encounter order.
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Value::Reference(r) => out.push(r),
            Value::Expression { references, .. } => out.extend(references.iter()),
            Value::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Value::Map(map) => map.values().for_each(|v| v.collect_references(out)),
            _ => {}
        }
    }

    /// JSON view of a concrete value; references and expressions render as strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Unknown => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Reference(r) => serde_json::Value::String(format!("${{{r}}}")),
            Value::Expression { source, .. } => serde_json::Value::String(source.clone()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Reference(r) => write!(f, "{r}"),
            Value::Expression { source, .. } => f.write_str(source),
            Value::Unknown => f.write_str("(known after apply)"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
