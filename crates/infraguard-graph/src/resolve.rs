use crate::error::GraphError;
use crate::model::{Graph, VarType};
use crate::parse::parse_literal;
use crate::value::{Reference, Value};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// A variable value supplied for one run.
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    /// Command-line text (`--var name=value`), converted according to the declared type.
    Raw(String),
    /// An already-typed value, e.g. from a `*.tfvars` file.
    Value(Value),
}

/// Per-run reference resolver. Holds the chain of references currently being resolved so a
/// cycle is reported instead of recursing forever; there is no cache shared between runs.
pub struct Resolver<'g> {
    graph: &'g Graph,
    stack: Vec<Reference>,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            stack: Vec::new(),
        }
    }

    /// Follow a reference to the value it currently denotes.
    ///
    /// Resource attributes that are not declared (computed ones like `id`) resolve to
    /// [`Value::Unknown`], as do module outputs.
    pub fn resolve(&mut self, reference: &Reference) -> Result<Value, GraphError> {
        if self.stack.contains(reference) {
            let chain: Vec<String> = self
                .stack
                .iter()
                .chain(std::iter::once(reference))
                .map(|r| r.to_string())
                .collect();
            return Err(GraphError::unresolved(
                reference,
                format!("reference cycle: {}", chain.join(" -> ")),
            ));
        }
        self.stack.push(reference.clone());
        let result = self.resolve_target(reference);
        self.stack.pop();
        result
    }

    fn resolve_target(&mut self, reference: &Reference) -> Result<Value, GraphError> {
        let graph = self.graph;
        match reference {
            Reference::Variable { name } => {
                let Some(variable) = graph.variable(name) else {
                    return Err(GraphError::unresolved(reference, "variable is not declared"));
                };
                let Some(value) = variable.effective_value() else {
                    return Err(GraphError::MissingVariable {
                        name: name.clone(),
                        location: variable.location.clone(),
                    });
                };
                self.resolve_value(value)
            }
            Reference::Local { name } => {
                let Some(local) = graph.local(name) else {
                    return Err(GraphError::unresolved(reference, "local is not declared"));
                };
                self.resolve_value(&local.value)
            }
            Reference::Module { .. } => Ok(Value::Unknown),
            Reference::Resource { address, path } => {
                let Some(resource) = graph.lookup_address(address) else {
                    return Err(GraphError::unresolved(reference, "resource is not declared"));
                };
                let mut segments: Vec<&str> = path.iter().map(String::as_str).collect();
                // `aws_instance.db[0].id`: instances share one configuration.
                if segments.first().is_some_and(|s| s.parse::<usize>().is_ok()) {
                    segments.remove(0);
                }
                let Some((first, rest)) = segments.split_first() else {
                    return Ok(Value::Unknown);
                };
                let Some(attribute) = resource.attributes.get(*first) else {
                    return Ok(Value::Unknown);
                };
                let resolved = self.resolve_value(attribute)?;
                Ok(resolved.get_path(rest).cloned().unwrap_or(Value::Unknown))
            }
        }
    }

    /// Resolve every reference inside `value`. Expressions stay expressions, but the
    /// variables and locals they mention must resolve.
    pub fn resolve_value(&mut self, value: &Value) -> Result<Value, GraphError> {
        match value {
            Value::Reference(reference) => self.resolve(reference),
            Value::List(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Value::Map(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.resolve_value(item)?);
                }
                Ok(Value::Map(out))
            }
            Value::Expression { references, .. } => {
                for reference in references {
                    if matches!(reference, Reference::Variable { .. } | Reference::Local { .. }) {
                        self.resolve(reference)?;
                    }
                }
                Ok(value.clone())
            }
            _ => Ok(value.clone()),
        }
    }
}

impl Graph {
    pub fn resolve(&self, reference: &Reference) -> Result<Value, GraphError> {
        Resolver::new(self).resolve(reference)
    }

    pub fn resolve_value(&self, value: &Value) -> Result<Value, GraphError> {
        Resolver::new(self).resolve_value(value)
    }

    /// Bind variable values for one run: supplied inputs first, then defaults.
    ///
    /// Fails on a variable without any value, on a value that does not fit the declared type,
    /// and on locals that cannot be resolved with the bound values.
    pub fn bind_variables(
        mut self,
        inputs: &IndexMap<String, InputValue>,
    ) -> Result<Graph, GraphError> {
        for name in inputs.keys() {
            if self.variable(name).is_none() {
                warn!(variable = %name, "value supplied for undeclared variable");
            }
        }

        for variable in &mut self.variables {
            let value = match inputs.get(&variable.name) {
                Some(InputValue::Value(value)) => value.clone(),
                Some(InputValue::Raw(raw)) => {
                    convert_raw(raw, variable.var_type.as_ref()).ok_or_else(|| {
                        GraphError::VariableType {
                            name: variable.name.clone(),
                            expected: type_label(variable.var_type.as_ref()),
                            found: format!("`{raw}`"),
                            location: variable.location.clone(),
                        }
                    })?
                }
                None => match &variable.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(GraphError::MissingVariable {
                            name: variable.name.clone(),
                            location: variable.location.clone(),
                        });
                    }
                },
            };

            if let Some(var_type) = &variable.var_type
                && !var_type.accepts(&value)
            {
                return Err(GraphError::VariableType {
                    name: variable.name.clone(),
                    expected: var_type.as_str().to_string(),
                    found: value.type_name().to_string(),
                    location: variable.location.clone(),
                });
            }
            debug!(variable = %variable.name, "bound variable");
            variable.value = Some(value);
        }

        let mut resolver = Resolver::new(&self);
        for local in &self.locals {
            resolver.resolve(&Reference::local(&local.name))?;
        }
        Ok(self)
    }
}

fn type_label(var_type: Option<&VarType>) -> String {
    var_type.map_or("any", VarType::as_str).to_string()
}

fn convert_raw(raw: &str, var_type: Option<&VarType>) -> Option<Value> {
    match var_type {
        None | Some(VarType::String) | Some(VarType::Any) => Some(Value::string(raw)),
        Some(VarType::Number) => {
            let trimmed = raw.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Value::Number(i.into()));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }
        Some(VarType::Bool) => raw.trim().parse::<bool>().ok().map(Value::Bool),
        Some(_) => parse_literal(raw).ok(),
    }
}
