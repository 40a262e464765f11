use crate::error::GraphError;
use crate::model::{Graph, Resource, ResourceAddress, provider_key};
use crate::value::{Reference, Value};
use infraguard_types::Location;
use std::collections::BTreeSet;

impl Graph {
    /// Resources `resource` depends on: those referenced from its attributes (directly or
    /// through locals) followed by its explicit `depends_on`, without repeats.
    pub fn dependencies(&self, resource: &Resource) -> Vec<ResourceAddress> {
        let mut out = self.reference_dependencies(resource);
        for address in &resource.depends_on {
            if !out.contains(address) {
                out.push(address.clone());
            }
        }
        out
    }

    /// Resources referenced from the attributes of `resource`, ignoring `depends_on`.
    pub fn reference_dependencies(&self, resource: &Resource) -> Vec<ResourceAddress> {
        let mut out = Vec::new();
        let mut seen_locals = BTreeSet::new();
        for value in resource.attributes.values() {
            self.collect_resource_targets(value, &mut seen_locals, &mut out);
        }
        out
    }

    /// Resources a value depends on, expanding locals transitively.
    pub fn value_dependencies(&self, value: &Value) -> Vec<ResourceAddress> {
        let mut out = Vec::new();
        self.collect_resource_targets(value, &mut BTreeSet::new(), &mut out);
        out
    }

    fn collect_resource_targets<'a>(
        &'a self,
        value: &'a Value,
        seen_locals: &mut BTreeSet<&'a str>,
        out: &mut Vec<ResourceAddress>,
    ) {
        for reference in value.references() {
            match reference {
                Reference::Resource { address, .. } => {
                    if !out.contains(address) {
                        out.push(address.clone());
                    }
                }
                Reference::Local { name } => {
                    let Some(local) = self.local(name) else {
                        continue;
                    };
                    if seen_locals.insert(local.name.as_str()) {
                        self.collect_resource_targets(&local.value, seen_locals, out);
                    }
                }
                Reference::Variable { .. } | Reference::Module { .. } => {}
            }
        }
    }

    /// Check that every reference and `depends_on` entry names something declared.
    pub fn validate_references(&self) -> Result<(), GraphError> {
        for resource in &self.resources {
            let from = resource.address.to_string();
            for value in resource.attributes.values() {
                self.check_targets(&from, value, &resource.location)?;
            }
            for target in &resource.depends_on {
                if self.lookup_address(target).is_none() {
                    return Err(GraphError::Reference {
                        from,
                        target: target.to_string(),
                        location: resource.location.clone(),
                    });
                }
            }
        }
        for local in &self.locals {
            self.check_targets(&format!("local.{}", local.name), &local.value, &local.location)?;
        }
        for output in &self.outputs {
            self.check_targets(&format!("output.{}", output.name), &output.value, &output.location)?;
        }
        for provider in &self.providers {
            let from = format!("provider.{}", provider_key(provider));
            for value in provider.attributes.values() {
                self.check_targets(&from, value, &provider.location)?;
            }
        }
        for module in &self.modules {
            let from = format!("module.{}", module.name);
            for value in module.attributes.values() {
                self.check_targets(&from, value, &module.location)?;
            }
        }
        Ok(())
    }

    fn check_targets(
        &self,
        from: &str,
        value: &Value,
        location: &Option<Location>,
    ) -> Result<(), GraphError> {
        for reference in value.references() {
            let (exists, target) = match reference {
                Reference::Resource { address, .. } => {
                    (self.lookup_address(address).is_some(), address.to_string())
                }
                Reference::Variable { name } => (self.variable(name).is_some(), reference.to_string()),
                Reference::Local { name } => (self.local(name).is_some(), reference.to_string()),
                Reference::Module { name } => (self.module(name).is_some(), reference.to_string()),
            };
            if !exists {
                return Err(GraphError::Reference {
                    from: from.to_string(),
                    target,
                    location: location.clone(),
                });
            }
        }
        Ok(())
    }
}
