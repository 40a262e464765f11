use crate::error::GraphError;
use crate::model::{
    Graph, Local, Module, Output, Provider, Resource, ResourceAddress, VarType, Variable,
};
use crate::value::{Attributes, Reference, Value};
use hcl_edit::Span;
use hcl_edit::expr::{Expression, ObjectKey, TraversalOperator, UnaryOperator};
use hcl_edit::structure::{Attribute, Block, BlockLabel, Body, Structure};
use hcl_edit::template::{Directive, Element, Template};
use indexmap::IndexMap;
use infraguard_types::{Location, SourcePath};
use tracing::debug;

/// Roots that look like traversals but never name a graph entity.
const BUILTIN_ROOTS: &[&str] = &["count", "each", "self", "path", "terraform"];

/// Resource-level blocks that steer the tool, not the resource.
const META_BLOCKS: &[&str] = &["lifecycle", "provisioner", "connection"];

/// Parse a single configuration text (recorded as `main.tf`) and check its references.
pub fn parse(text: &str) -> Result<Graph, GraphError> {
    let graph = parse_file("main.tf", text)?;
    graph.validate_references()?;
    Ok(graph)
}

/// Parse one file of a configuration directory.
///
/// Duplicates inside the file are rejected; references are not checked here because they may
/// point into sibling files. Use [`parse_files`] (or [`Graph::validate_references`]) for that.
pub fn parse_file(path: &str, text: &str) -> Result<Graph, GraphError> {
    let file = SourcePath::new(path);
    let body = hcl_edit::parser::parse_body(text).map_err(|e| {
        let loc = e.location();
        GraphError::parse(
            e.message().to_string(),
            Some(Location {
                path: file.clone(),
                line: Some(loc.line() as u32),
                col: Some(loc.column() as u32),
            }),
        )
    })?;

    let mut cx = Converter::new(&file, text);
    let raw = cx.body_to_graph(&body)?;
    debug!(
        file = %file,
        resources = raw.resources.len(),
        variables = raw.variables.len(),
        "parsed configuration file"
    );
    Graph::default().merge(raw)
}

/// Parse and merge every file of one configuration, then check references across them.
pub fn parse_files<P: AsRef<str>, T: AsRef<str>>(files: &[(P, T)]) -> Result<Graph, GraphError> {
    let mut graph = Graph::default();
    for (path, text) in files {
        graph = graph.merge(parse_file(path.as_ref(), text.as_ref())?)?;
    }
    graph.validate_references()?;
    Ok(graph)
}

/// Parse a `*.tfvars` file: top-level `name = literal` assignments only.
pub fn parse_tfvars(text: &str) -> Result<IndexMap<String, Value>, GraphError> {
    parse_assignments("terraform.tfvars", text)
}

pub(crate) fn parse_assignments(
    path: &str,
    text: &str,
) -> Result<IndexMap<String, Value>, GraphError> {
    let file = SourcePath::new(path);
    let body = hcl_edit::parser::parse_body(text).map_err(|e| {
        GraphError::parse(
            e.message().to_string(),
            Some(Location {
                path: file.clone(),
                line: Some(e.location().line() as u32),
                col: Some(e.location().column() as u32),
            }),
        )
    })?;

    let mut cx = Converter::new(&file, text);
    let mut out = IndexMap::new();
    for structure in body.iter() {
        let Structure::Attribute(attr) = structure else {
            return Err(GraphError::parse(
                "blocks are not allowed in variable files",
                cx.location_of(structure.span()),
            ));
        };
        let value = cx.expr_to_value(&attr.value);
        if !value.references().is_empty() {
            return Err(GraphError::parse(
                format!("value of `{}` must be a literal", attr.key.as_str()),
                cx.location_of(attr.span()),
            ));
        }
        out.insert(attr.key.as_str().to_string(), value);
    }
    Ok(out)
}

/// Parse a standalone literal expression such as `["a", "b"]` or `{ env = "prod" }`.
pub(crate) fn parse_literal(text: &str) -> Result<Value, GraphError> {
    let file = SourcePath::new("<input>");
    let expr = hcl_edit::parser::parse_expr(text)
        .map_err(|e| GraphError::parse(e.message().to_string(), None))?;
    let value = Converter::new(&file, text).expr_to_value(&expr);
    if !value.references().is_empty() {
        return Err(GraphError::parse("input values must be literals", None));
    }
    Ok(value)
}

/// Calculate the 1-based line and column from a byte offset in the source text.
fn byte_offset_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let before = &source[..offset.min(source.len())];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let col = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line as u32, col as u32)
}

/// Walks one parsed file. `scope` holds names bound by enclosing `for` expressions and
/// `dynamic` block iterators.
struct Converter<'a> {
    file: &'a SourcePath,
    source: &'a str,
    scope: Vec<String>,
}

impl<'a> Converter<'a> {
    fn new(file: &'a SourcePath, source: &'a str) -> Self {
        Self {
            file,
            source,
            scope: Vec::new(),
        }
    }

    fn location_of(&self, span: Option<std::ops::Range<usize>>) -> Option<Location> {
        let (line, col) = byte_offset_to_line_col(self.source, span?.start);
        Some(Location {
            path: self.file.clone(),
            line: Some(line),
            col: Some(col),
        })
    }

    fn source_of(&self, expr: &Expression) -> String {
        expr.span()
            .and_then(|range| self.source.get(range))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| expr.to_string().trim().to_string())
    }

    fn body_to_graph(&mut self, body: &Body) -> Result<Graph, GraphError> {
        let mut graph = Graph::default();
        for structure in body.iter() {
            let block = match structure {
                Structure::Block(block) => block,
                Structure::Attribute(attr) => {
                    return Err(GraphError::parse(
                        format!(
                            "unexpected top-level attribute `{}`",
                            attr.key.as_str()
                        ),
                        self.location_of(attr.span()),
                    ));
                }
            };
            match block.ident.as_str() {
                "resource" => graph.resources.push(self.resource(block, false)?),
                "data" => graph.resources.push(self.resource(block, true)?),
                "variable" => graph.variables.push(self.variable(block)?),
                "locals" => graph.locals.extend(self.locals(block)?),
                "provider" => graph.providers.push(self.provider(block)?),
                "output" => graph.outputs.push(self.output(block)?),
                "module" => graph.modules.push(self.module(block)?),
                other => {
                    debug!(block = other, file = %self.file, "skipping top-level block");
                }
            }
        }
        Ok(graph)
    }

    fn labels<const N: usize>(&self, block: &Block, what: &str) -> Result<[String; N], GraphError> {
        let labels: Vec<String> = block
            .labels
            .iter()
            .map(|label| match label {
                BlockLabel::String(s) => s.value().to_string(),
                BlockLabel::Ident(ident) => ident.as_str().to_string(),
            })
            .collect();
        labels.try_into().map_err(|labels: Vec<String>| {
            GraphError::parse(
                format!(
                    "`{}` block needs {N} label(s) ({what}), found {}",
                    block.ident.as_str(),
                    labels.len()
                ),
                self.location_of(block.span()),
            )
        })
    }

    fn resource(&mut self, block: &Block, data: bool) -> Result<Resource, GraphError> {
        let [resource_type, name] = self.labels::<2>(block, "type and name")?;
        let address = if data {
            ResourceAddress::data(&resource_type, &name)
        } else {
            ResourceAddress::managed(&resource_type, &name)
        };
        let location = self.location_of(block.span());

        let mut depends_on = Vec::new();
        if let Some(attr) = block.body.get_attribute("depends_on") {
            depends_on = self.depends_on(&address, attr)?;
        }
        let attributes = self.body_to_attributes(&block.body, &["depends_on"], true)?;

        Ok(Resource {
            address,
            attributes,
            depends_on,
            location,
        })
    }

    fn depends_on(
        &mut self,
        from: &ResourceAddress,
        attr: &Attribute,
    ) -> Result<Vec<ResourceAddress>, GraphError> {
        let location = self.location_of(attr.span());
        let Expression::Array(items) = &attr.value else {
            return Err(GraphError::parse(
                format!("`depends_on` of `{from}` must be a list"),
                location,
            ));
        };
        let mut out: Vec<ResourceAddress> = Vec::new();
        for item in items.iter() {
            match self.expr_to_value(item) {
                Value::Reference(Reference::Resource { address, path }) if path.is_empty() => {
                    if !out.contains(&address) {
                        out.push(address);
                    }
                }
                other => {
                    return Err(GraphError::parse(
                        format!("`depends_on` of `{from}` must name resources, found `{other}`"),
                        location,
                    ));
                }
            }
        }
        Ok(out)
    }

    fn variable(&mut self, block: &Block) -> Result<Variable, GraphError> {
        let [name] = self.labels::<1>(block, "name")?;
        let location = self.location_of(block.span());

        let var_type = match block.body.get_attribute("type") {
            Some(attr) => Some(self.type_constraint(&name, attr)?),
            None => None,
        };
        let default = block
            .body
            .get_attribute("default")
            .map(|attr| self.expr_to_value(&attr.value));
        let description = block
            .body
            .get_attribute("description")
            .and_then(|attr| self.expr_to_value(&attr.value).as_str().map(str::to_string));
        let sensitive = block
            .body
            .get_attribute("sensitive")
            .and_then(|attr| self.expr_to_value(&attr.value).as_bool())
            .unwrap_or(false);

        Ok(Variable {
            name,
            var_type,
            default,
            description,
            sensitive,
            value: None,
            location,
        })
    }

    fn type_constraint(&self, name: &str, attr: &Attribute) -> Result<VarType, GraphError> {
        let keyword = match &attr.value {
            Expression::Variable(ident) => ident.as_str().to_string(),
            Expression::FuncCall(call) => call.name.name.as_str().to_string(),
            other => self.source_of(other),
        };
        VarType::from_keyword(&keyword).ok_or_else(|| {
            GraphError::parse(
                format!("variable `{name}` has unsupported type `{keyword}`"),
                self.location_of(attr.span()),
            )
        })
    }

    fn locals(&mut self, block: &Block) -> Result<Vec<Local>, GraphError> {
        let mut out: Vec<Local> = Vec::new();
        for structure in block.body.iter() {
            let Structure::Attribute(attr) = structure else {
                return Err(GraphError::parse(
                    "`locals` may only contain attributes",
                    self.location_of(structure.span()),
                ));
            };
            out.push(Local {
                name: attr.key.as_str().to_string(),
                value: self.expr_to_value(&attr.value),
                location: self.location_of(attr.span()),
            });
        }
        Ok(out)
    }

    fn provider(&mut self, block: &Block) -> Result<Provider, GraphError> {
        let [name] = self.labels::<1>(block, "name")?;
        let location = self.location_of(block.span());
        let mut attributes = self.body_to_attributes(&block.body, &[], false)?;
        let alias = attributes
            .shift_remove("alias")
            .and_then(|v| v.as_str().map(str::to_string));
        Ok(Provider {
            name,
            alias,
            attributes,
            location,
        })
    }

    fn output(&mut self, block: &Block) -> Result<Output, GraphError> {
        let [name] = self.labels::<1>(block, "name")?;
        let location = self.location_of(block.span());
        let Some(attr) = block.body.get_attribute("value") else {
            return Err(GraphError::parse(
                format!("output `{name}` has no `value`"),
                location,
            ));
        };
        let value = self.expr_to_value(&attr.value);
        let sensitive = block
            .body
            .get_attribute("sensitive")
            .and_then(|attr| self.expr_to_value(&attr.value).as_bool())
            .unwrap_or(false);
        Ok(Output {
            name,
            value,
            sensitive,
            location,
        })
    }

    fn module(&mut self, block: &Block) -> Result<Module, GraphError> {
        let [name] = self.labels::<1>(block, "name")?;
        let location = self.location_of(block.span());
        let mut attributes = self.body_to_attributes(&block.body, &[], true)?;
        let source = attributes
            .shift_remove("source")
            .and_then(|v| v.as_str().map(str::to_string));
        Ok(Module {
            name,
            source,
            attributes,
            location,
        })
    }

    /// Attributes plus nested blocks. Every nested block name maps to a list of maps, one per
    /// block occurrence; `dynamic` blocks contribute their `content` to that list.
    fn body_to_attributes(
        &mut self,
        body: &Body,
        skip: &[&str],
        skip_meta: bool,
    ) -> Result<Attributes, GraphError> {
        let mut attributes = Attributes::new();
        for structure in body.iter() {
            match structure {
                Structure::Attribute(attr) => {
                    let key = attr.key.as_str();
                    if skip.contains(&key) {
                        continue;
                    }
                    if attributes.contains_key(key) {
                        return Err(GraphError::parse(
                            format!("attribute `{key}` is declared more than once"),
                            self.location_of(attr.span()),
                        ));
                    }
                    let value = if key == "provider" || key == "providers" {
                        self.provider_meta(&attr.value)
                    } else {
                        self.expr_to_value(&attr.value)
                    };
                    attributes.insert(key.to_string(), value);
                }
                Structure::Block(block) => {
                    let ident = block.ident.as_str();
                    if skip_meta && META_BLOCKS.contains(&ident) {
                        continue;
                    }
                    let (key, value) = if ident == "dynamic" {
                        let [label] = self.labels::<1>(block, "block name")?;
                        let value = self.dynamic_block(&label, block)?;
                        (label, value)
                    } else {
                        let inner = self.body_to_attributes(&block.body, &[], false)?;
                        (ident.to_string(), Value::Map(inner))
                    };
                    match attributes.get_mut(&key) {
                        Some(Value::List(items)) => items.push(value),
                        Some(_) => {
                            return Err(GraphError::parse(
                                format!("`{key}` is declared both as attribute and block"),
                                self.location_of(block.span()),
                            ));
                        }
                        None => {
                            attributes.insert(key, Value::List(vec![value]));
                        }
                    }
                }
            }
        }
        Ok(attributes)
    }

    /// `provider = aws.west` names a provider configuration, not a resource.
    fn provider_meta(&self, expr: &Expression) -> Value {
        match expr {
            Expression::Object(object) => Value::Map(
                object
                    .iter()
                    .map(|(k, v)| (self.object_key(k), self.provider_meta(v.expr())))
                    .collect(),
            ),
            Expression::String(s) => Value::string(s.value().as_str()),
            other => Value::string(self.source_of(other)),
        }
    }

    /// The `content` body as a map, plus the `for_each` expression. Fields bound to the
    /// iterator are expressions without references; literal fields stay concrete.
    fn dynamic_block(&mut self, label: &str, block: &Block) -> Result<Value, GraphError> {
        let iterator = block
            .body
            .get_attribute("iterator")
            .and_then(|attr| match &attr.value {
                Expression::Variable(ident) => Some(ident.as_str().to_string()),
                _ => None,
            })
            .unwrap_or_else(|| label.to_string());

        let for_each = match block.body.get_attribute("for_each") {
            Some(attr) => self.expr_to_value(&attr.value),
            None => Value::Null,
        };

        self.scope.push(iterator);
        let content = match block.body.blocks().find(|b| b.ident.as_str() == "content") {
            Some(content) => self.body_to_attributes(&content.body, &[], false),
            None => Ok(Attributes::new()),
        };
        self.scope.pop();

        let mut fields = content?;
        fields.insert("for_each".to_string(), for_each);
        Ok(Value::Map(fields))
    }

    fn object_key(&self, key: &ObjectKey) -> String {
        match key {
            ObjectKey::Ident(ident) => ident.as_str().to_string(),
            ObjectKey::Expression(Expression::String(s)) => s.value().to_string(),
            ObjectKey::Expression(expr) => self.source_of(expr),
        }
    }

    /// Convert an expression to a value; anything not statically known becomes
    /// [`Value::Expression`] with the references it mentions.
    fn expr_to_value(&mut self, expr: &Expression) -> Value {
        match expr {
            Expression::Null(_) => Value::Null,
            Expression::Bool(b) => Value::Bool(*b.value()),
            Expression::Number(n) => number_value(n.value()).unwrap_or_else(|| self.opaque(expr)),
            Expression::String(s) => Value::string(s.value().as_str()),
            Expression::Array(items) => {
                Value::List(items.iter().map(|item| self.expr_to_value(item)).collect())
            }
            Expression::Object(object) => {
                let mut map = Attributes::new();
                for (k, v) in object.iter() {
                    let key = self.object_key(k);
                    let value = self.expr_to_value(v.expr());
                    map.insert(key, value);
                }
                Value::Map(map)
            }
            Expression::StringTemplate(template) => self.template_value(expr, template.iter()),
            Expression::HeredocTemplate(heredoc) => {
                self.template_value(expr, heredoc.template.iter())
            }
            Expression::Parenthesis(inner) => self.expr_to_value(inner.inner()),
            Expression::Traversal(_) | Expression::Variable(_) => {
                self.traversal_value(expr).unwrap_or_else(|| self.opaque(expr))
            }
            Expression::UnaryOp(op) => match (op.operator.value(), &op.expr) {
                (UnaryOperator::Neg, Expression::Number(n)) => {
                    match n.value().as_i64().and_then(|i| i.checked_neg()) {
                        Some(i) => Value::Number(i.into()),
                        None => self.opaque(expr),
                    }
                }
                _ => self.opaque(expr),
            },
            Expression::FuncCall(call)
                if call.name.namespace.is_empty()
                    && call.name.name.as_str() == "jsonencode"
                    && call.args.iter().count() == 1 =>
            {
                match call.args.iter().next() {
                    Some(arg) => self.expr_to_value(arg),
                    None => self.opaque(expr),
                }
            }
            _ => self.opaque(expr),
        }
    }

    fn opaque(&mut self, expr: &Expression) -> Value {
        let mut references = Vec::new();
        self.collect_references(expr, &mut references);
        Value::Expression {
            source: self.source_of(expr),
            references: dedup(references),
        }
    }

    fn template_value<'t>(
        &mut self,
        expr: &Expression,
        elements: impl Iterator<Item = &'t Element>,
    ) -> Value {
        let elements: Vec<&Element> = elements.collect();
        match elements.as_slice() {
            [Element::Interpolation(interp)] => return self.expr_to_value(&interp.expr),
            items if items.iter().all(|e| matches!(e, Element::Literal(_))) => {
                let mut text = String::new();
                for element in items {
                    if let Element::Literal(lit) = element {
                        text.push_str(lit.value());
                    }
                }
                return Value::String(text);
            }
            _ => {}
        }
        self.opaque(expr)
    }

    /// Map a traversal (`aws_vpc.main.id`, `var.region`, `data.aws_ami.ubuntu.id`) to a
    /// reference. `None` when it names something that is not a graph entity.
    fn traversal_value(&mut self, expr: &Expression) -> Option<Value> {
        let (root, operators): (&str, Vec<&TraversalOperator>) = match expr {
            Expression::Variable(ident) => (ident.as_str(), Vec::new()),
            Expression::Traversal(traversal) => (
                traversal.expr.as_variable()?.as_str(),
                traversal.operators.iter().map(|op| op.value()).collect(),
            ),
            _ => return None,
        };
        if BUILTIN_ROOTS.contains(&root) || self.scope.iter().any(|s| s == root) {
            return None;
        }

        let mut segments: Vec<String> = Vec::new();
        let mut dynamic = false;
        for op in &operators {
            match static_segment(op) {
                Some(seg) if !dynamic => segments.push(seg),
                _ => dynamic = true,
            }
        }

        let (reference, consumed) = match (root, segments.as_slice()) {
            ("var", [name, ..]) => (Reference::variable(name), 1),
            ("local", [name, ..]) => (Reference::local(name), 1),
            ("module", [name, ..]) => (
                Reference::Module {
                    name: name.to_string(),
                },
                1,
            ),
            ("data", [ty, name, rest @ ..]) => (
                Reference::Resource {
                    address: ResourceAddress::data(ty, name),
                    path: rest.to_vec(),
                },
                2 + rest.len(),
            ),
            (ty, [name, rest @ ..]) if !matches!(ty, "var" | "local" | "module" | "data") => (
                Reference::Resource {
                    address: ResourceAddress::managed(ty, name),
                    path: rest.to_vec(),
                },
                1 + rest.len(),
            ),
            _ => return None,
        };

        if !dynamic && consumed == segments.len() {
            return Some(Value::Reference(reference));
        }
        let mut references = vec![reference];
        for op in operators {
            if let TraversalOperator::Index(index) = op {
                self.collect_references(index, &mut references);
            }
        }
        Some(Value::Expression {
            source: self.source_of(expr),
            references: dedup(references),
        })
    }

    fn collect_references(&mut self, expr: &Expression, out: &mut Vec<Reference>) {
        match expr {
            Expression::Null(_)
            | Expression::Bool(_)
            | Expression::Number(_)
            | Expression::String(_) => {}
            Expression::Variable(_) | Expression::Traversal(_) => {
                match self.traversal_value(expr) {
                    Some(value) => out.extend(value.references().into_iter().cloned()),
                    None => {
                        if let Expression::Traversal(traversal) = expr {
                            if traversal.expr.as_variable().is_none() {
                                self.collect_references(&traversal.expr, out);
                            }
                            for op in traversal.operators.iter() {
                                if let TraversalOperator::Index(index) = op.value() {
                                    self.collect_references(index, out);
                                }
                            }
                        }
                    }
                }
            }
            Expression::Array(items) => {
                for item in items.iter() {
                    self.collect_references(item, out);
                }
            }
            Expression::Object(object) => {
                for (k, v) in object.iter() {
                    if let ObjectKey::Expression(key) = k {
                        self.collect_references(key, out);
                    }
                    self.collect_references(v.expr(), out);
                }
            }
            Expression::StringTemplate(template) => {
                for element in template.iter() {
                    self.collect_element_references(element, out);
                }
            }
            Expression::HeredocTemplate(heredoc) => {
                for element in heredoc.template.iter() {
                    self.collect_element_references(element, out);
                }
            }
            Expression::Parenthesis(inner) => self.collect_references(inner.inner(), out),
            Expression::Conditional(cond) => {
                self.collect_references(&cond.cond_expr, out);
                self.collect_references(&cond.true_expr, out);
                self.collect_references(&cond.false_expr, out);
            }
            Expression::FuncCall(call) => {
                for arg in call.args.iter() {
                    self.collect_references(arg, out);
                }
            }
            Expression::UnaryOp(op) => self.collect_references(&op.expr, out),
            Expression::BinaryOp(op) => {
                self.collect_references(&op.lhs_expr, out);
                self.collect_references(&op.rhs_expr, out);
            }
            Expression::ForExpr(for_expr) => {
                self.collect_references(&for_expr.intro.collection_expr, out);
                let bound = usize::from(for_expr.intro.key_var.is_some()) + 1;
                if let Some(key_var) = &for_expr.intro.key_var {
                    self.scope.push(key_var.as_str().to_string());
                }
                self.scope
                    .push(for_expr.intro.value_var.as_str().to_string());
                if let Some(key_expr) = &for_expr.key_expr {
                    self.collect_references(key_expr, out);
                }
                self.collect_references(&for_expr.value_expr, out);
                if let Some(cond) = &for_expr.cond {
                    self.collect_references(&cond.expr, out);
                }
                self.scope.truncate(self.scope.len() - bound);
            }
        }
    }

    fn collect_element_references(&mut self, element: &Element, out: &mut Vec<Reference>) {
        match element {
            Element::Literal(_) => {}
            Element::Interpolation(interp) => self.collect_references(&interp.expr, out),
            Element::Directive(directive) => self.collect_directive_references(directive, out),
        }
    }

    fn collect_directive_references(&mut self, directive: &Directive, out: &mut Vec<Reference>) {
        match directive {
            Directive::If(if_directive) => {
                self.collect_references(&if_directive.if_expr.cond_expr, out);
                self.collect_template_references(&if_directive.if_expr.template, out);
                if let Some(else_expr) = &if_directive.else_expr {
                    self.collect_template_references(&else_expr.template, out);
                }
            }
            Directive::For(for_directive) => {
                let for_expr = &for_directive.for_expr;
                self.collect_references(&for_expr.collection_expr, out);
                let bound = usize::from(for_expr.key_var.is_some()) + 1;
                if let Some(key_var) = &for_expr.key_var {
                    self.scope.push(key_var.as_str().to_string());
                }
                self.scope.push(for_expr.value_var.as_str().to_string());
                self.collect_template_references(&for_expr.template, out);
                self.scope.truncate(self.scope.len() - bound);
            }
        }
    }

    fn collect_template_references(&mut self, template: &Template, out: &mut Vec<Reference>) {
        for element in template.iter() {
            self.collect_element_references(element, out);
        }
    }
}

fn static_segment(op: &TraversalOperator) -> Option<String> {
    match op {
        TraversalOperator::GetAttr(ident) => Some(ident.as_str().to_string()),
        TraversalOperator::LegacyIndex(index) => Some(index.value().to_string()),
        TraversalOperator::Index(Expression::Number(n)) => n.value().as_u64().map(|i| i.to_string()),
        TraversalOperator::Index(Expression::String(s)) => Some(s.value().to_string()),
        _ => None,
    }
}

fn number_value(n: &hcl_edit::Number) -> Option<Value> {
    if let Some(u) = n.as_u64() {
        return Some(Value::Number(u.into()));
    }
    if let Some(i) = n.as_i64() {
        return Some(Value::Number(i.into()));
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn dedup(references: Vec<Reference>) -> Vec<Reference> {
    let mut out: Vec<Reference> = Vec::with_capacity(references.len());
    for reference in references {
        if !out.contains(&reference) {
            out.push(reference);
        }
    }
    out
}
