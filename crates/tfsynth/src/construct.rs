//! Construct kinds and their attribute synthesis
//!
//! A construct tree is made from a closed set of kinds. Each kind carries its own properties and knows how to turn
//! them into a raw attribute map ([Construct::synthesize_attributes]). The map is un-overridden and may still
//! contain [Reference](crate::reference::Reference) tokens.
use crate::value::{Map, Value};

/// Custom attribute synthesis for resources, data sources and modules
pub type AttributeFn = fn(&SynthContext<'_>) -> Map;

/// What a synthesizer knows about the construct it runs for
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct SynthContext<'a> {
    /// Logical id the construct is emitted under
    pub friendly_unique_id: &'a str,
    pub path: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    App,
    Stack,
    Group,
    Provider,
    Resource,
    DataSource,
    Module,
    Output,
    Variable,
    Backend,
}

impl ConstructKind {
    /// Whether this kind must live inside a stack
    pub fn is_stack_bound(&self) -> bool {
        !matches!(
            self,
            ConstructKind::App | ConstructKind::Stack | ConstructKind::Group
        )
    }

    /// Whether this kind contributes to the synthesized document
    pub fn is_emitted(&self) -> bool {
        self.is_stack_bound()
    }

    /// Whether overrides recorded on this kind reach a document
    pub fn is_overridable(&self) -> bool {
        self.is_emitted() || *self == ConstructKind::Stack
    }
}

impl std::fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstructKind::App => f.write_str("app"),
            ConstructKind::Stack => f.write_str("stack"),
            ConstructKind::Group => f.write_str("group"),
            ConstructKind::Provider => f.write_str("provider"),
            ConstructKind::Resource => f.write_str("resource"),
            ConstructKind::DataSource => f.write_str("data source"),
            ConstructKind::Module => f.write_str("module"),
            ConstructKind::Output => f.write_str("output"),
            ConstructKind::Variable => f.write_str("variable"),
            ConstructKind::Backend => f.write_str("backend"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Construct {
    /// Root of the tree
    App,
    Stack,
    /// Plain scope without output of its own
    Group,
    Provider(Provider),
    Resource(Resource),
    /// Data sources share the resource payload but are emitted into the `data` section
    DataSource(Resource),
    Module(Module),
    Output(Output),
    Variable(Variable),
    Backend(Backend),
}

impl Construct {
    pub fn kind(&self) -> ConstructKind {
        match self {
            Construct::App => ConstructKind::App,
            Construct::Stack => ConstructKind::Stack,
            Construct::Group => ConstructKind::Group,
            Construct::Provider(_) => ConstructKind::Provider,
            Construct::Resource(_) => ConstructKind::Resource,
            Construct::DataSource(_) => ConstructKind::DataSource,
            Construct::Module(_) => ConstructKind::Module,
            Construct::Output(_) => ConstructKind::Output,
            Construct::Variable(_) => ConstructKind::Variable,
            Construct::Backend(_) => ConstructKind::Backend,
        }
    }

    pub fn synthesize_attributes(&self, ctx: &SynthContext<'_>) -> Map {
        match self {
            Construct::App | Construct::Stack | Construct::Group => Map::new(),
            Construct::Provider(provider) => provider.synthesize_attributes(),
            Construct::Resource(resource) | Construct::DataSource(resource) => {
                resource.synthesize_attributes(ctx)
            }
            Construct::Module(module) => module.synthesize_attributes(ctx),
            Construct::Output(output) => output.synthesize_attributes(),
            Construct::Variable(variable) => variable.synthesize_attributes(),
            Construct::Backend(backend) => backend.attributes.clone(),
        }
    }
}

fn insert_some(map: &mut Map, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

fn insert_non_empty(map: &mut Map, key: &str, values: &[Value]) {
    if !values.is_empty() {
        map.insert(key.to_string(), Value::Array(values.to_vec()));
    }
}

/// A terraform provider configuration
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name as used in the document, e.g. `aws`
    pub provider_type: String,
    /// Registry source, e.g. `hashicorp/aws`. Adds a `required_providers` entry when set.
    pub source: Option<String>,
    pub version: Option<String>,
    pub alias: Option<String>,
    pub attributes: Map,
}

impl Provider {
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            source: None,
            version: None,
            alias: None,
            attributes: Map::new(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    fn synthesize_attributes(&self) -> Map {
        let mut map = self.attributes.clone();
        insert_some(&mut map, "alias", self.alias.clone());
        map
    }
}

/// Metadata attached by generated provider bindings
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorMetadata {
    /// Provider the resource type belongs to
    pub provider_name: String,
}

/// A managed resource or a data source
#[derive(Debug, Clone)]
pub struct Resource {
    pub resource_type: String,
    pub attributes: Map,
    /// Replaces `attributes` when set
    pub synthesizer: Option<AttributeFn>,
    pub generator: Option<GeneratorMetadata>,
    pub depends_on: Vec<Value>,
    pub count: Option<Value>,
    pub provider: Option<Value>,
    pub lifecycle: Option<Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: Map::new(),
            synthesizer: None,
            generator: None,
            depends_on: vec![],
            count: None,
            provider: None,
            lifecycle: None,
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn synthesizer(mut self, synthesizer: AttributeFn) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Declare which provider this resource type belongs to
    pub fn provider_name(mut self, provider_name: impl Into<String>) -> Self {
        self.generator = Some(GeneratorMetadata {
            provider_name: provider_name.into(),
        });
        self
    }

    pub fn depends_on(mut self, reference: impl Into<Value>) -> Self {
        self.depends_on.push(reference.into());
        self
    }

    pub fn count(mut self, count: impl Into<Value>) -> Self {
        self.count = Some(count.into());
        self
    }

    /// Explicit provider, usually [App::reference_node](crate::app::App::reference_node) of an aliased provider
    pub fn provider(mut self, provider: impl Into<Value>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn lifecycle(mut self, lifecycle: impl Into<Value>) -> Self {
        self.lifecycle = Some(lifecycle.into());
        self
    }

    fn synthesize_attributes(&self, ctx: &SynthContext<'_>) -> Map {
        let mut map = match self.synthesizer {
            Some(synthesizer) => synthesizer(ctx),
            None => self.attributes.clone(),
        };

        insert_non_empty(&mut map, "depends_on", &self.depends_on);
        insert_some(&mut map, "count", self.count.clone());
        insert_some(&mut map, "provider", self.provider.clone());
        insert_some(&mut map, "lifecycle", self.lifecycle.clone());
        map
    }
}

/// A terraform module call
#[derive(Debug, Clone)]
pub struct Module {
    pub source: String,
    pub version: Option<String>,
    /// Provider mapping, values are usually provider references
    pub providers: Map,
    pub depends_on: Vec<Value>,
    pub attributes: Map,
    /// Replaces `attributes` when set
    pub synthesizer: Option<AttributeFn>,
}

impl Module {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: None,
            providers: Map::new(),
            depends_on: vec![],
            attributes: Map::new(),
            synthesizer: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn provider(mut self, key: impl Into<String>, provider: impl Into<Value>) -> Self {
        self.providers.insert(key.into(), provider.into());
        self
    }

    pub fn depends_on(mut self, reference: impl Into<Value>) -> Self {
        self.depends_on.push(reference.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn synthesizer(mut self, synthesizer: AttributeFn) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    fn synthesize_attributes(&self, ctx: &SynthContext<'_>) -> Map {
        let mut map = Map::new();
        map.insert("source".into(), self.source.as_str().into());
        insert_some(&mut map, "version", self.version.clone());
        if !self.providers.is_empty() {
            map.insert("providers".into(), Value::Object(self.providers.clone()));
        }
        insert_non_empty(&mut map, "depends_on", &self.depends_on);

        let attributes = match self.synthesizer {
            Some(synthesizer) => synthesizer(ctx),
            None => self.attributes.clone(),
        };
        map.extend(attributes);
        map
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
    pub sensitive: Option<bool>,
    pub depends_on: Vec<Value>,
}

impl Output {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            description: None,
            sensitive: None,
            depends_on: vec![],
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = Some(sensitive);
        self
    }

    pub fn depends_on(mut self, reference: impl Into<Value>) -> Self {
        self.depends_on.push(reference.into());
        self
    }

    fn synthesize_attributes(&self) -> Map {
        let mut map = Map::new();
        map.insert("value".into(), self.value.clone());
        insert_some(&mut map, "description", self.description.clone());
        insert_some(&mut map, "sensitive", self.sensitive);
        insert_non_empty(&mut map, "depends_on", &self.depends_on);
        map
    }
}

/// An input variable of the stack
#[derive(Debug, Clone, Default)]
pub struct Variable {
    /// Type constraint, e.g. `string` or `list(number)`
    pub var_type: Option<String>,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub sensitive: Option<bool>,
    pub nullable: Option<bool>,
}

impl Variable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var_type(mut self, var_type: impl Into<String>) -> Self {
        self.var_type = Some(var_type.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = Some(sensitive);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    fn synthesize_attributes(&self) -> Map {
        let mut map = Map::new();
        insert_some(&mut map, "type", self.var_type.clone());
        insert_some(&mut map, "default", self.default.clone());
        insert_some(&mut map, "description", self.description.clone());
        insert_some(&mut map, "sensitive", self.sensitive);
        insert_some(&mut map, "nullable", self.nullable);
        map
    }
}

/// State backend of a stack
#[derive(Debug, Clone)]
pub struct Backend {
    /// Backend name, e.g. `local`, `remote` or `s3`
    pub backend_type: String,
    pub attributes: Map,
}

impl Backend {
    pub fn new(backend_type: impl Into<String>) -> Self {
        Self {
            backend_type: backend_type.into(),
            attributes: Map::new(),
        }
    }

    pub fn local() -> Self {
        Self::new("local")
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl From<Provider> for Construct {
    fn from(value: Provider) -> Self {
        Construct::Provider(value)
    }
}

impl From<Resource> for Construct {
    fn from(value: Resource) -> Self {
        Construct::Resource(value)
    }
}

impl From<Module> for Construct {
    fn from(value: Module) -> Self {
        Construct::Module(value)
    }
}

impl From<Output> for Construct {
    fn from(value: Output) -> Self {
        Construct::Output(value)
    }
}

impl From<Variable> for Construct {
    fn from(value: Variable) -> Self {
        Construct::Variable(value)
    }
}

impl From<Backend> for Construct {
    fn from(value: Backend) -> Self {
        Construct::Backend(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> SynthContext<'static> {
        SynthContext::new("Resource1", "MyStack/Resource1")
    }

    fn with_identity(ctx: &SynthContext<'_>) -> Map {
        let mut map = Map::new();
        map.insert("foo".into(), ctx.friendly_unique_id.into());
        map
    }

    #[test]
    fn custom_synthesizer_sees_friendly_unique_id() {
        let resource = Resource::new("aws_bucket")
            .attribute("ignored", true)
            .synthesizer(with_identity);

        let attributes = Construct::from(resource).synthesize_attributes(&ctx());
        let expected: Value = serde_json::json!({ "foo": "Resource1" }).into();
        assert_eq!(Value::Object(attributes), expected);
    }

    #[test]
    fn resource_meta_arguments_follow_attributes() {
        let resource = Resource::new("aws_bucket")
            .attribute("bucket", "logs")
            .count(2)
            .lifecycle(serde_json::json!({ "prevent_destroy": true }));

        let attributes = Construct::from(resource).synthesize_attributes(&ctx());
        assert_eq!(
            attributes.keys().collect::<Vec<_>>(),
            vec!["bucket", "count", "lifecycle"]
        );
    }

    #[test]
    fn module_attributes() {
        let module = Module::new("terraform-aws-modules/eks/aws")
            .version("7.0.1")
            .attribute("cluster_name", "my_cluster_name");

        let attributes = Construct::from(module).synthesize_attributes(&ctx());
        assert_eq!(
            Value::Object(attributes),
            serde_json::json!({
                "source": "terraform-aws-modules/eks/aws",
                "version": "7.0.1",
                "cluster_name": "my_cluster_name",
            })
            .into()
        );
    }

    #[test]
    fn scopes_have_no_attributes() {
        assert!(Construct::Stack.synthesize_attributes(&ctx()).is_empty());
        assert!(Construct::Group.synthesize_attributes(&ctx()).is_empty());
        assert!(!ConstructKind::Group.is_stack_bound());
        assert!(ConstructKind::Backend.is_stack_bound());
    }
}
