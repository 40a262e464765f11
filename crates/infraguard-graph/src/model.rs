use crate::error::GraphError;
use crate::value::{Attributes, Value};
use infraguard_types::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `resource "type" "name"`
    Managed,
    /// `data "type" "name"`
    Data,
}

/// Identity of a resource: unique within a graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceAddress {
    pub mode: Mode,
    pub resource_type: String,
    pub name: String,
}

impl ResourceAddress {
    pub fn managed(resource_type: &str, name: &str) -> Self {
        Self {
            mode: Mode::Managed,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        }
    }

    pub fn data(resource_type: &str, name: &str) -> Self {
        Self {
            mode: Mode::Data,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse `type.name` or `data.type.name`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            ["data", ty, name] if !ty.is_empty() && !name.is_empty() => Some(Self::data(ty, name)),
            [ty, name] if !ty.is_empty() && !name.is_empty() && *ty != "data" => {
                Some(Self::managed(ty, name))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Managed => write!(f, "{}.{}", self.resource_type, self.name),
            Mode::Data => write!(f, "data.{}.{}", self.resource_type, self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub address: ResourceAddress,
    pub attributes: Attributes,
    /// Explicit `depends_on` entries, in declaration order.
    #[serde(default)]
    pub depends_on: Vec<ResourceAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Resource {
    pub fn new(address: ResourceAddress, attributes: Attributes) -> Self {
        Self {
            address,
            attributes,
            depends_on: Vec::new(),
            location: None,
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.address.resource_type
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Same configuration, ignoring where it was declared.
    pub fn same_config(&self, other: &Resource) -> bool {
        self.attributes == other.attributes && self.depends_on == other.depends_on
    }
}

/// Declared variable type constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarType {
    String,
    Number,
    Bool,
    List,
    Set,
    Tuple,
    Map,
    Object,
    Any,
}

impl VarType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "string" => VarType::String,
            "number" => VarType::Number,
            "bool" => VarType::Bool,
            "list" => VarType::List,
            "set" => VarType::Set,
            "tuple" => VarType::Tuple,
            "map" => VarType::Map,
            "object" => VarType::Object,
            "any" => VarType::Any,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::String => "string",
            VarType::Number => "number",
            VarType::Bool => "bool",
            VarType::List => "list",
            VarType::Set => "set",
            VarType::Tuple => "tuple",
            VarType::Map => "map",
            VarType::Object => "object",
            VarType::Any => "any",
        }
    }

    /// Whether `value` satisfies the constraint. Values that are not known statically are
    /// accepted.
    pub fn accepts(&self, value: &Value) -> bool {
        if matches!(
            value,
            Value::Null | Value::Reference(_) | Value::Expression { .. } | Value::Unknown
        ) {
            return true;
        }
        match self {
            VarType::Any => true,
            VarType::String => matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
            VarType::Number => value.as_i64().is_some() || matches!(value, Value::Number(_)),
            VarType::Bool => value.as_bool().is_some(),
            VarType::List | VarType::Set | VarType::Tuple => matches!(value, Value::List(_)),
            VarType::Map | VarType::Object => matches!(value, Value::Map(_)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<VarType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
    /// Value bound for this run (input or default); `None` until bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Variable {
    /// The value a reference to this variable sees: bound value, else default.
    pub fn effective_value(&self) -> Option<&Value> {
        self.value.as_ref().or(self.default.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// The whole configuration. Built once by the parser and never mutated afterwards;
/// operations that change it (merging files, binding variables) return a new graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub locals: Vec<Local>,
    #[serde(default)]
    pub modules: Vec<Module>,
    /// Resources and data sources in declaration order.
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl Graph {
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Look up a managed resource by type and name.
    pub fn lookup(&self, resource_type: &str, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| {
            r.address.mode == Mode::Managed
                && r.address.resource_type == resource_type
                && r.address.name == name
        })
    }

    pub fn lookup_address(&self, address: &ResourceAddress) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.address == address)
    }

    /// Managed resources of one type, in declaration order.
    pub fn list_resources<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources
            .iter()
            .filter(move |r| r.address.mode == Mode::Managed && r.address.resource_type == resource_type)
    }

    /// Data sources of one type, in declaration order.
    pub fn list_data_sources<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources
            .iter()
            .filter(move |r| r.address.mode == Mode::Data && r.address.resource_type == resource_type)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn local(&self, name: &str) -> Option<&Local> {
        self.locals.iter().find(|l| l.name == name)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.name == name)
    }

    /// Append another file's declarations, rejecting duplicates across files.
    pub fn merge(mut self, other: Graph) -> Result<Graph, GraphError> {
        for provider in other.providers {
            if let Some(first) = self
                .providers
                .iter()
                .find(|p| p.name == provider.name && p.alias == provider.alias)
            {
                return Err(GraphError::duplicate(
                    "provider",
                    provider_key(&provider),
                    &first.location,
                    &provider.location,
                ));
            }
            self.providers.push(provider);
        }
        for variable in other.variables {
            if let Some(first) = self.variable(&variable.name) {
                return Err(GraphError::duplicate(
                    "variable",
                    variable.name.clone(),
                    &first.location,
                    &variable.location,
                ));
            }
            self.variables.push(variable);
        }
        for local in other.locals {
            if let Some(first) = self.local(&local.name) {
                return Err(GraphError::duplicate(
                    "local",
                    local.name.clone(),
                    &first.location,
                    &local.location,
                ));
            }
            self.locals.push(local);
        }
        for module in other.modules {
            if let Some(first) = self.module(&module.name) {
                return Err(GraphError::duplicate(
                    "module",
                    module.name.clone(),
                    &first.location,
                    &module.location,
                ));
            }
            self.modules.push(module);
        }
        for resource in other.resources {
            if let Some(first) = self.lookup_address(&resource.address) {
                return Err(GraphError::duplicate(
                    "resource",
                    resource.address.to_string(),
                    &first.location,
                    &resource.location,
                ));
            }
            self.resources.push(resource);
        }
        for output in other.outputs {
            if let Some(first) = self.output(&output.name) {
                return Err(GraphError::duplicate(
                    "output",
                    output.name.clone(),
                    &first.location,
                    &output.location,
                ));
            }
            self.outputs.push(output);
        }
        Ok(self)
    }
}

pub(crate) fn provider_key(provider: &Provider) -> String {
    match &provider.alias {
        Some(alias) => format!("{}.{}", provider.name, alias),
        None => provider.name.clone(),
    }
}
