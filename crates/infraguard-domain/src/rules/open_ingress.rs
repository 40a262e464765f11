use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, checked, resolve, resource_finding, strings};
use infraguard_graph::{Graph, Resource, Value};
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;

const OPEN_SOURCES: &[&str] = &["0.0.0.0/0", "::/0"];

/// Ingress from anywhere to a sensitive port (or to every port).
pub struct OpenIngress {
    severity: Severity,
    allow: Vec<String>,
    sensitive_ports: Vec<u16>,
}

/// One ingress permission, normalized from the three ways it can be declared.
struct IngressRule {
    /// `ingress[1]` for nested blocks, the attribute holding the source otherwise.
    attribute: String,
    sources: Vec<String>,
    protocol: Option<String>,
    from_port: Option<i64>,
    to_port: Option<i64>,
    /// A port is set but not statically known (a `dynamic` block iterator, a computed value).
    ports_unknown: bool,
}

impl IngressRule {
    fn from_fields(attribute: String, fields: &Value, source_keys: &[&str], protocol_key: &str) -> Self {
        let sources = source_keys
            .iter()
            .filter_map(|key| fields.get(key))
            .flat_map(|v| strings(v).into_iter().map(str::to_string))
            .collect();
        let protocol = fields.get(protocol_key).and_then(|p| match p {
            Value::String(s) => Some(s.to_ascii_lowercase()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let port = |key: &str| fields.get(key).filter(|v| !matches!(v, Value::Null));
        let ports_unknown = ["from_port", "to_port"]
            .iter()
            .filter_map(|key| port(*key))
            .any(|v| v.as_i64().is_none());
        Self {
            attribute,
            sources,
            protocol,
            from_port: port("from_port").and_then(Value::as_i64),
            to_port: port("to_port").and_then(Value::as_i64),
            ports_unknown,
        }
    }

    fn open_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .map(String::as_str)
            .filter(|s| OPEN_SOURCES.contains(s))
            .collect()
    }

    fn all_traffic(&self) -> bool {
        matches!(self.protocol.as_deref(), Some("-1" | "all"))
    }

    /// Sensitive ports inside the rule's port range.
    fn exposed_ports(&self, sensitive: &[u16]) -> Vec<u16> {
        if self.all_traffic() || self.ports_unknown {
            return sensitive.to_vec();
        }
        let (Some(from), Some(to)) = (self.from_port, self.to_port.or(self.from_port)) else {
            return Vec::new();
        };
        sensitive
            .iter()
            .copied()
            .filter(|p| from <= i64::from(*p) && i64::from(*p) <= to)
            .collect()
    }
}

impl OpenIngress {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
            sensitive_ports: policy.options.sensitive_ports.clone(),
        }
    }

    fn ingress_rules(graph: &Graph, resource: &Resource) -> Result<Vec<IngressRule>, RuleError> {
        let mut out = Vec::new();
        match resource.resource_type() {
            "aws_security_group" => {
                let Some(ingress) = resource.attribute("ingress") else {
                    return Ok(out);
                };
                for (i, item) in ingress.iter_items().enumerate() {
                    if item.as_map().is_none() {
                        continue;
                    }
                    let fields = resolve(graph, item)?;
                    out.push(IngressRule::from_fields(
                        format!("ingress[{i}]"),
                        &fields,
                        &["cidr_blocks", "ipv6_cidr_blocks"],
                        "protocol",
                    ));
                }
            }
            "aws_security_group_rule" => {
                let fields = resolve(graph, &Value::Map(resource.attributes.clone()))?;
                if fields.get("type").and_then(Value::as_str) == Some("ingress") {
                    out.push(IngressRule::from_fields(
                        "cidr_blocks".to_string(),
                        &fields,
                        &["cidr_blocks", "ipv6_cidr_blocks"],
                        "protocol",
                    ));
                }
            }
            "aws_vpc_security_group_ingress_rule" => {
                let fields = resolve(graph, &Value::Map(resource.attributes.clone()))?;
                out.push(IngressRule::from_fields(
                    "cidr_ipv4".to_string(),
                    &fields,
                    &["cidr_ipv4", "cidr_ipv6"],
                    "ip_protocol",
                ));
            }
            _ => {}
        }
        Ok(out)
    }
}

const INGRESS_TYPES: &[&str] = &[
    "aws_security_group",
    "aws_security_group_rule",
    "aws_vpc_security_group_ingress_rule",
];

impl Rule for OpenIngress {
    fn id(&self) -> &str {
        ids::RULE_SECURITY_OPEN_INGRESS
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        let allow = Allowlist::new(&self.allow)?;
        let mut out = Vec::new();

        for resource_type in INGRESS_TYPES {
            for resource in checked(graph, resource_type, &allow) {
                for rule in Self::ingress_rules(graph, resource)? {
                    let open = rule.open_sources();
                    if open.is_empty() {
                        continue;
                    }
                    let ports = rule.exposed_ports(&self.sensitive_ports);
                    if ports.is_empty() {
                        continue;
                    }
                    let what = if rule.all_traffic() {
                        "all traffic".to_string()
                    } else if rule.ports_unknown {
                        "ports not known until apply".to_string()
                    } else {
                        let list: Vec<String> = ports.iter().map(u16::to_string).collect();
                        format!("port {}", list.join(", "))
                    };
                    out.push(resource_finding(
                        ids::CODE_OPEN_INGRESS,
                        resource,
                        Some(&rule.attribute),
                        format!("{} allows {} from {}", resource.address, what, open.join(", ")),
                        "Restrict the source CIDR to known networks, or reach the service through a bastion or VPN.",
                        json!({
                            "sources": open,
                            "ports": ports,
                            "protocol": rule.protocol,
                            "from_port": rule.from_port,
                            "to_port": rule.to_port,
                            "ports_known": !rule.ports_unknown,
                        }),
                    ));
                }
            }
        }

        Ok(out)
    }
}
