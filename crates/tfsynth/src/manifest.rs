//! stack manifests (HCL documents describing a construct tree)
//!
//! [Manifest] tracks
//! - the source path
//! - the root blocks
//! - the root attributes
//! and defines a numeric index for each. Once added those indices are stable (removal is not possible)
//!
//! [Manifest::build] turns the documents into an [App]:
//!
//! ```hcl
//! app {
//!   exclude_stack_id_from_logical_ids = true
//! }
//!
//! stack "MyStack" {
//!   provider "aws" "aws" {
//!     source = "hashicorp/aws"
//!     region = "eu-central-1"
//!   }
//!
//!   resource "aws_s3_bucket" "logs" {
//!     bucket        = "logs"
//!     provider_name = "aws"
//!
//!     override "tags.team" {
//!       value = "platform"
//!     }
//!   }
//!
//!   module "eks" {
//!     source  = "terraform-aws-modules/eks/aws"
//!     version = "7.0.1"
//!   }
//!
//!   output "eks_version" {
//!     value = module.eks.version
//!   }
//! }
//! ```
//!
//! Traversals like `module.eks.version` become [Reference]s to the construct with that local id in the same stack,
//! also when they are interpolated in a string (`"${var.prefix}-main"`). Other expressions that can not be evaluated up front are passed through as `${...}` interpolations.
use crate::app::{App, AppOptions};
use crate::construct::{Backend, Construct, Module, Output, Provider, Resource, Variable};
use crate::error::ConstructError;
use crate::reference::Reference;
use crate::tree::NodeId;
use crate::value::{Map, TemplatePart, Value};
use hcl::template::Element;
use hcl::{Expression, ObjectKey, Template, TemplateExpr, TraversalOperator};
use hcl_edit::structure::{Attribute, Block, Body, Structure};
use std::collections::HashMap;
use std::path::Path;

/// Files picked up by [Manifest::load_directory]
pub const MANIFEST_SUFFIX: &str = ".tf.hcl";

const OVERRIDE_BLOCK: &str = "override";

#[derive(Default, Debug)]
pub struct Manifest {
    sources: Vec<Source>,
    root_attributes: Vec<(usize, Attribute)>,
    root_blocks: Vec<(usize, Block)>,
}

impl Manifest {
    /// Inserts and indexes an hcl document
    pub fn insert(&mut self, document: Body, path: impl Into<Option<std::path::PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for structure in document.into_iter() {
            match structure {
                Structure::Block(block) => self.root_blocks.push((source_index, block)),
                Structure::Attribute(attribute) => {
                    self.root_attributes.push((source_index, attribute))
                }
            }
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = SourceAttribute> {
        self.root_attributes
            .iter()
            .enumerate()
            .map(|(index, (source_index, attribute))| {
                (index, &self.sources[*source_index], attribute)
            })
    }

    pub fn get_block(&self, index: usize) -> SourceBlock {
        let (source_index, block) = &self.root_blocks[index];
        (index, &self.sources[*source_index], block)
    }

    pub fn blocks(&self) -> impl Iterator<Item = SourceBlock> {
        self.root_blocks
            .iter()
            .enumerate()
            .map(|(index, (source_index, block))| (index, &self.sources[*source_index], block))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl Manifest {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let body = hcl_edit::parser::parse_body(&file_contents)?;

        self.insert(body, Some(file_path));
        Ok(())
    }

    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut any_files_loaded = false;

        let mut file_paths = vec![];
        for dir_entry in std::fs::read_dir(dir_path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_manifest = dir_entry
                .file_name()
                .to_string_lossy()
                .ends_with(MANIFEST_SUFFIX);
            if is_manifest {
                file_paths.push(dir_entry.path());
            }
        }

        // read_dir order is platform dependent
        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
            any_files_loaded = true;
        }

        if !any_files_loaded {
            return Err(LoadError::NoFilesFound);
        }

        Ok(())
    }

    /// Build the construct tree described by all loaded documents
    ///
    /// All issues are collected before giving up.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(&self) -> Result<App, ManifestErrors> {
        let mut e = ManifestErrors::new();

        for (index, _source, _attribute) in self.attributes() {
            e.log(Issue::RootAttribute(index))
        }

        let mut options: Option<(usize, AppOptions)> = None;
        for (index, _source, block) in self.blocks() {
            if block.ident.value().as_str() != "app" {
                continue;
            }

            if let Some((existing, _)) = options {
                e.log(Issue::DuplicateAppBlock {
                    existing,
                    new: index,
                });
                continue;
            }

            match app_options(block) {
                Ok(parsed) => options = Some((index, parsed)),
                Err(message) => e.log(Issue::InvalidOptions {
                    block: index,
                    message,
                }),
            }
        }

        let mut app = App::new(options.map(|(_, options)| options).unwrap_or_default());

        for (index, _source, block) in self.blocks() {
            match block.ident.value().as_str() {
                "app" => {}
                "stack" => {
                    let [label] = block.labels.as_slice() else {
                        e.log(Issue::LabelCount {
                            block: index,
                            ident: "stack".into(),
                            expected: 1,
                        });
                        continue;
                    };

                    let stack = match app.add_stack(app.root(), label_str(label)) {
                        Ok(stack) => stack,
                        Err(error) => {
                            e.log(Issue::Construct {
                                block: index,
                                error,
                            });
                            continue;
                        }
                    };

                    let mut builder = StackBuilder::new(&mut app, &mut e, index, stack);
                    builder.index_paths(stack, &block.body);
                    builder.build_scope(stack, &block.body);
                }
                ident => e.log(Issue::UnknownBlockType {
                    block: index,
                    ident: ident.to_string(),
                }),
            }
        }

        if !e.issues.is_empty() {
            return Err(e);
        }

        Ok(app)
    }
}

fn label_str(label: &hcl_edit::structure::BlockLabel) -> &str {
    label.as_str()
}

fn app_options(block: &Block) -> Result<AppOptions, String> {
    let mut map = Map::new();
    for attribute in block.body.attributes() {
        let value = literal(attribute.value.clone().into())?;
        map.insert(attribute.key.value().as_str().to_string(), value);
    }

    let json = serde_json::to_value(Value::Object(map)).map_err(|e| e.to_string())?;
    serde_json::from_value(json).map_err(|e| e.to_string())
}

/// Convert an expression that must not contain references
fn literal(expression: Expression) -> Result<Value, String> {
    let value = convert(expression, &|_| None)?;
    Ok(value)
}

/// Convert an hcl expression into a [Value]
///
/// `reference` decides which traversals become reference tokens.
fn convert(
    expression: Expression,
    reference: &dyn Fn(&hcl::Traversal) -> Option<Reference>,
) -> Result<Value, String> {
    Ok(match expression {
        Expression::Null => Value::Null,
        Expression::Bool(b) => b.into(),
        Expression::Number(n) => n.into(),
        Expression::String(s) => s.into(),
        Expression::Array(array) => Value::Array(
            array
                .into_iter()
                .map(|element| convert(element, reference))
                .collect::<Result<_, _>>()?,
        ),
        Expression::Object(object) => Value::Object(
            object
                .into_iter()
                .map(|(key, value)| -> Result<(String, Value), String> {
                    Ok((object_key(key)?, convert(value, reference)?))
                })
                .collect::<Result<_, _>>()?,
        ),
        Expression::TemplateExpr(template) => self::template(*template, reference)?,
        Expression::Traversal(traversal) => match reference(&traversal) {
            Some(token) => token.into(),
            None => interpolation(Expression::Traversal(traversal))?,
        },
        other => interpolation(other)?,
    })
}

/// Templates interpolating construct traversals (`"${var.prefix}-main"`) keep those as references, so they are
/// rendered with the logical id of the target
fn template(
    template_expr: TemplateExpr,
    reference: &dyn Fn(&hcl::Traversal) -> Option<Reference>,
) -> Result<Value, String> {
    let template = Template::from_expr(&template_expr).map_err(|e| e.to_string())?;

    let mut parts = vec![];
    for element in template.elements() {
        let part = match element {
            Element::Literal(literal) => {
                TemplatePart::Literal(literal.replace("${", "$${").replace("%{", "%%{"))
            }
            Element::Interpolation(interpolation) => {
                let token = match &interpolation.expr {
                    Expression::Traversal(traversal) => reference(traversal),
                    _ => None,
                };
                match token {
                    Some(token) => TemplatePart::Reference(token),
                    None => {
                        let formatted =
                            hcl::format::to_string(&interpolation.expr).map_err(|e| e.to_string())?;
                        TemplatePart::Literal(format!("${{{formatted}}}"))
                    }
                }
            }
            // directives keep the whole template as written
            Element::Directive(_) => {
                parts.clear();
                break;
            }
        };
        parts.push(part);
    }

    if parts.iter().any(|part| matches!(part, TemplatePart::Reference(_))) {
        return Ok(Value::Template(parts));
    }

    match template_expr {
        TemplateExpr::QuotedString(s) => Ok(s.into()),
        other => interpolation(Expression::TemplateExpr(Box::new(other))),
    }
}

fn object_key(key: ObjectKey) -> Result<String, String> {
    match key {
        ObjectKey::Identifier(ident) => Ok(ident.to_string()),
        ObjectKey::Expression(Expression::String(s)) => Ok(s),
        other => Err(format!("unsupported object key {other:?}")),
    }
}

fn interpolation(expression: Expression) -> Result<Value, String> {
    let formatted = hcl::format::to_string(&expression).map_err(|e| e.to_string())?;
    Ok(Value::String(format!("${{{formatted}}}")))
}

/// Traversal roots that never address a construct
const BUILTIN_ROOTS: [&str; 6] = ["local", "each", "count", "path", "self", "terraform"];

/// Builds the constructs of one `stack` block
struct StackBuilder<'a> {
    app: &'a mut App,
    e: &'a mut ManifestErrors,
    block: usize,
    stack_path: String,
    /// local id → path, for references
    paths: HashMap<String, String>,
}

impl<'a> StackBuilder<'a> {
    fn new(app: &'a mut App, e: &'a mut ManifestErrors, block: usize, stack: NodeId) -> Self {
        let stack_path = app.path(stack).unwrap_or_default().to_string();
        Self {
            app,
            e,
            block,
            stack_path,
            paths: HashMap::new(),
        }
    }

    fn log(&mut self, issue: Issue) {
        self.e.log(issue)
    }

    /// Record the path of every construct block so references can find them
    fn index_paths(&mut self, scope: NodeId, body: &Body) {
        let scope_path = self.app.path(scope).unwrap_or_default().to_string();
        self.index_body(&scope_path, body);
    }

    fn index_body(&mut self, scope_path: &str, body: &Body) {
        for block in body.blocks() {
            let Some(local_id) = local_id(block) else {
                continue;
            };

            let path = format!("{scope_path}/{local_id}");
            if block.ident.value().as_str() == "group" {
                self.index_body(&path, &block.body);
            }
            self.paths.entry(local_id.to_string()).or_insert(path);
        }
    }

    fn reference(&self, traversal: &hcl::Traversal) -> Option<Reference> {
        let Expression::Variable(root) = &traversal.expr else {
            return None;
        };

        let mut names = vec![root.as_str()];
        for operator in &traversal.operators {
            let TraversalOperator::GetAttr(ident) = operator else {
                return None;
            };
            names.push(ident.as_str());
        }

        let (local_id, rest) = match names.as_slice() {
            [root, ..] if BUILTIN_ROOTS.contains(root) => return None,
            ["module", id, rest @ ..] => (*id, rest),
            ["data", _, id, rest @ ..] => (*id, rest),
            ["var", id, rest @ ..] => (*id, rest),
            [_, id, rest @ ..] => (*id, rest),
            _ => return None,
        };

        let target = self
            .paths
            .get(local_id)
            .cloned()
            .unwrap_or_else(|| format!("{}/{local_id}", self.stack_path));

        Some(if rest.is_empty() {
            Reference::node(target)
        } else {
            Reference::new(target, rest.join("."))
        })
    }

    fn convert(&mut self, key: &str, expression: Expression) -> Option<Value> {
        let converted = convert(expression, &|traversal| self.reference(traversal));
        match converted {
            Ok(value) => Some(value),
            Err(message) => {
                self.log(Issue::InvalidAttribute {
                    block: self.block,
                    key: key.to_string(),
                    message,
                });
                None
            }
        }
    }

    /// Attributes and nested (non override) blocks of `body`
    fn attributes(&mut self, body: &Body) -> Map {
        let mut map = Map::new();
        for attribute in body.attributes() {
            let key = attribute.key.value().as_str();
            if let Some(value) = self.convert(key, attribute.value.clone().into()) {
                map.insert(key.to_string(), value);
            }
        }

        let mut nested: indexmap::IndexMap<String, Vec<Value>> = Default::default();
        for block in body.blocks() {
            let ident = block.ident.value().as_str();
            if ident == OVERRIDE_BLOCK {
                continue;
            }
            // labels nest: provisioner "local-exec" {} -> { "local-exec": {} }
            let mut value = Value::Object(self.attributes(&block.body));
            for label in block.labels.iter().rev() {
                let mut wrapper = Map::new();
                wrapper.insert(label_str(label).to_string(), value);
                value = Value::Object(wrapper);
            }
            nested.entry(ident.to_string()).or_default().push(value);
        }

        for (ident, mut values) in nested {
            let value = match values.len() {
                1 => values.remove(0),
                _ => Value::Array(values),
            };
            map.insert(ident, value);
        }

        map
    }

    fn build_scope(&mut self, scope: NodeId, body: &Body) {
        self.apply_overrides(scope, body);

        for block in body.blocks() {
            let ident = block.ident.value().as_str();
            if ident == OVERRIDE_BLOCK {
                continue;
            }

            let Some(local_id) = local_id(block) else {
                let expected = match ident {
                    "provider" | "resource" | "data" => 2,
                    "module" | "output" | "variable" | "backend" | "group" => 1,
                    _ => {
                        self.log(Issue::UnknownBlockType {
                            block: self.block,
                            ident: ident.to_string(),
                        });
                        continue;
                    }
                };
                self.log(Issue::LabelCount {
                    block: self.block,
                    ident: ident.to_string(),
                    expected,
                });
                continue;
            };

            let Some(construct) = self.construct(block) else {
                continue;
            };

            let node = match self.app.add(scope, local_id, construct) {
                Ok(node) => node,
                Err(error) => {
                    self.log(Issue::Construct {
                        block: self.block,
                        error,
                    });
                    continue;
                }
            };

            tracing::trace!(%ident, %local_id, "construct added");
            if ident == "group" {
                self.build_scope(node, &block.body);
            } else {
                self.apply_overrides(node, &block.body);
            }
        }
    }

    fn construct(&mut self, block: &Block) -> Option<Construct> {
        let ident = block.ident.value().as_str();
        let labels: Vec<&str> = block.labels.iter().map(label_str).collect();

        if ident == "group" {
            return Some(Construct::Group);
        }

        let mut map = self.attributes(&block.body);
        let construct = match ident {
            "provider" => {
                let mut provider = Provider::new(labels[0]);
                provider.source = self.take_string(&mut map, "source");
                provider.version = self.take_string(&mut map, "version");
                provider.alias = self.take_string(&mut map, "alias");
                provider.attributes = map;
                Construct::Provider(provider)
            }
            "resource" | "data" => {
                let mut resource = Resource::new(labels[0]);
                if let Some(provider_name) = self.take_string(&mut map, "provider_name") {
                    resource = resource.provider_name(provider_name);
                }
                resource.depends_on = self.take_list(&mut map, "depends_on");
                resource.count = map.shift_remove("count");
                resource.provider = map.shift_remove("provider");
                resource.lifecycle = map.shift_remove("lifecycle");
                resource.attributes = map;
                match ident {
                    "data" => Construct::DataSource(resource),
                    _ => Construct::Resource(resource),
                }
            }
            "module" => {
                let Some(source) = self.take_string(&mut map, "source") else {
                    return self.missing(ident, "source");
                };
                let mut module = Module::new(source);
                module.version = self.take_string(&mut map, "version");
                module.depends_on = self.take_list(&mut map, "depends_on");
                if let Some(Value::Object(providers)) = map.shift_remove("providers") {
                    module.providers = providers;
                }
                module.attributes = map;
                Construct::Module(module)
            }
            "output" => {
                let Some(value) = map.shift_remove("value") else {
                    return self.missing(ident, "value");
                };
                let mut output = Output::new(value);
                output.description = self.take_string(&mut map, "description");
                output.sensitive = map.shift_remove("sensitive").and_then(|v| v.as_bool());
                output.depends_on = self.take_list(&mut map, "depends_on");
                self.unknown_attributes(map);
                Construct::Output(output)
            }
            "variable" => {
                let mut variable = Variable::new();
                variable.var_type = self.variable_type(&block.body);
                map.shift_remove("type");
                variable.default = map.shift_remove("default");
                variable.description = self.take_string(&mut map, "description");
                variable.sensitive = map.shift_remove("sensitive").and_then(|v| v.as_bool());
                variable.nullable = map.shift_remove("nullable").and_then(|v| v.as_bool());
                self.unknown_attributes(map);
                Construct::Variable(variable)
            }
            "backend" => {
                let mut backend = Backend::new(labels[0]);
                backend.attributes = map;
                Construct::Backend(backend)
            }
            _ => {
                self.log(Issue::UnknownBlockType {
                    block: self.block,
                    ident: ident.to_string(),
                });
                return None;
            }
        };

        Some(construct)
    }

    /// Type constraints are bare expressions (`string`, `list(number)`), keep their source form
    fn variable_type(&mut self, body: &Body) -> Option<String> {
        let attribute = body
            .attributes()
            .find(|attribute| attribute.key.value().as_str() == "type")?;

        match hcl::Expression::from(attribute.value.clone()) {
            Expression::String(s) => Some(s),
            Expression::Variable(variable) => Some(variable.as_str().to_string()),
            other => hcl::format::to_string(&other).ok(),
        }
    }

    fn missing(&mut self, ident: &str, key: &str) -> Option<Construct> {
        self.log(Issue::MissingAttribute {
            block: self.block,
            ident: ident.to_string(),
            key: key.to_string(),
        });
        None
    }

    /// Outputs and variables have a fixed set of attributes, anything left over is a mistake
    fn unknown_attributes(&mut self, map: Map) {
        for (key, _) in map {
            self.log(Issue::InvalidAttribute {
                block: self.block,
                key,
                message: "unknown attribute".into(),
            });
        }
    }

    fn take_string(&mut self, map: &mut Map, key: &str) -> Option<String> {
        match map.shift_remove(key)? {
            Value::String(s) => Some(s),
            other => {
                self.log(Issue::InvalidAttribute {
                    block: self.block,
                    key: key.to_string(),
                    message: format!("expected a string, found {other:?}"),
                });
                None
            }
        }
    }

    fn take_list(&mut self, map: &mut Map, key: &str) -> Vec<Value> {
        match map.shift_remove(key) {
            None => vec![],
            Some(Value::Array(values)) => values,
            Some(other) => vec![other],
        }
    }

    /// `override "<path>" { value = ... }` blocks; without `value` the path is deleted
    fn apply_overrides(&mut self, node: NodeId, body: &Body) {
        for block in body.blocks() {
            if block.ident.value().as_str() != OVERRIDE_BLOCK {
                continue;
            }

            let [label] = block.labels.as_slice() else {
                self.log(Issue::LabelCount {
                    block: self.block,
                    ident: OVERRIDE_BLOCK.into(),
                    expected: 1,
                });
                continue;
            };
            let path = label_str(label);

            let value: Option<Expression> = block
                .body
                .attributes()
                .find(|attribute| attribute.key.value().as_str() == "value")
                .map(|attribute| attribute.value.clone().into());

            let result = match value {
                Some(expression) => match self.convert("value", expression) {
                    Some(value) => self.app.add_override(node, path, value),
                    None => continue,
                },
                None => self.app.add_delete_override(node, path),
            };

            if let Err(error) = result {
                self.log(Issue::Construct {
                    block: self.block,
                    error,
                });
            }
        }
    }
}

/// Local id of a construct block, `None` for unknown blocks or wrong label counts
fn local_id(block: &Block) -> Option<&str> {
    let labels = block.labels.as_slice();
    match (block.ident.value().as_str(), labels) {
        ("provider" | "resource" | "data", [_, id]) => Some(label_str(id)),
        ("module" | "output" | "variable" | "group", [id]) => Some(label_str(id)),
        ("backend", [_]) => Some(crate::app::BACKEND_ID),
        _ => None,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

#[derive(derive_new::new, Debug)]
pub struct ManifestErrors {
    #[new(default)]
    issues: Vec<Issue>,
}

impl ManifestErrors {
    pub fn log(&mut self, issue: Issue) {
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

impl std::error::Error for ManifestErrors {}

impl std::fmt::Display for ManifestErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Problems found while building a manifest, `block` is the index of the root block
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Issue {
    #[error("root attribute #{0} is not allowed, wrap it in a block")]
    RootAttribute(usize),
    #[error("block #{block}: unknown block type '{ident}'")]
    UnknownBlockType { block: usize, ident: String },
    #[error("block #{block}: '{ident}' expects {expected} label(s)")]
    LabelCount {
        block: usize,
        ident: String,
        expected: usize,
    },
    #[error("block #{new}: only one app block is allowed, see block #{existing}")]
    DuplicateAppBlock { existing: usize, new: usize },
    #[error("block #{block}: invalid app options: {message}")]
    InvalidOptions { block: usize, message: String },
    #[error("block #{block}: invalid attribute '{key}': {message}")]
    InvalidAttribute {
        block: usize,
        key: String,
        message: String,
    },
    #[error("block #{block}: '{ident}' requires attribute '{key}'")]
    MissingAttribute {
        block: usize,
        ident: String,
        key: String,
    },
    #[error("block #{block}: {error}")]
    Construct { block: usize, error: ConstructError },
}

impl From<Body> for Manifest {
    fn from(value: Body) -> Self {
        let mut manifest = Manifest::default();
        manifest.insert(value, None);
        manifest
    }
}

/// Utility macro to create a [Manifest]
///
/// Create from a single document
/// ```
/// # use tfsynth::manifest;
/// manifest!(r#"stack "MyStack" {}"#);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use tfsynth::manifest;
/// manifest! {
///   "one.tf.hcl" => r#"stack "One" {}"#,
///   "two.tf.hcl" => r#"stack "Two" {}"#
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use tfsynth::manifest;
/// manifest!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! manifest {
    // single document without source
    { $expr:expr } => {
        $crate::manifest::Manifest::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {
        {
            let mut manifest = $crate::manifest::Manifest::default();
            $(
                manifest.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some($source.into()));
            )+

            manifest
        }
    };
}

pub type Source = Option<std::path::PathBuf>;
pub type SourceAttribute<'a> = (usize, &'a Source, &'a Attribute);
pub type SourceBlock<'a> = (usize, &'a Source, &'a Block);
