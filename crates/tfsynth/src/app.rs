//! The root of a construct tree
//!
//! [App] owns the tree and everything needed to synthesize it. There is no global registry: every construction
//! call takes the app mutably, synthesis and validation take it immutably. That split also enforces the two phases
//! of a tree: overrides can not be recorded while a stack is being synthesized.
use crate::construct::{Backend, Construct, ConstructKind};
use crate::error::ConstructError;
use crate::logical_id::{LogicalIdPolicy, PathHashPolicy};
use crate::overrides::Override;
use crate::reference::Reference;
use crate::tree::{Node, NodeId, Tree, PATH_SEPARATOR};
use crate::value::Value;

/// Id every backend is registered under
pub const BACKEND_ID: &str = "backend";

const STUBBED_VERSION: &str = "stubbed";

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct AppOptions {
    /// Derive logical ids from the path below the stack instead of including the stack id
    pub exclude_stack_id_from_logical_ids: bool,
    /// Version recorded in the document metadata
    pub version: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            exclude_stack_id_from_logical_ids: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl AppOptions {
    /// Record a fixed version, handy for comparing documents in tests
    pub fn stub_version(mut self) -> Self {
        self.version = STUBBED_VERSION.to_string();
        self
    }

    /// Opt into all behavior changes that will become the default
    pub fn enable_future_flags(mut self) -> Self {
        self.exclude_stack_id_from_logical_ids = true;
        self
    }
}

/// Payload of every tree node
#[derive(Debug)]
pub struct ConstructNode {
    pub construct: Construct,
    /// Recorded overrides, applied in order during synthesis
    pub overrides: Vec<Override>,
    /// Replaces the logical id the policy would allocate
    pub logical_id: Option<String>,
}

impl ConstructNode {
    fn new(construct: Construct) -> Self {
        Self {
            construct,
            overrides: vec![],
            logical_id: None,
        }
    }
}

#[derive(Debug)]
pub struct App {
    tree: Tree<ConstructNode>,
    options: AppOptions,
    logical_ids: Box<dyn LogicalIdPolicy>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppOptions::default())
    }
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        Self {
            tree: Tree::new(ConstructNode::new(Construct::App)),
            options,
            logical_ids: Box::new(PathHashPolicy),
        }
    }

    pub fn with_logical_id_policy(mut self, policy: impl LogicalIdPolicy + 'static) -> Self {
        self.logical_ids = Box::new(policy);
        self
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    pub fn tree(&self) -> &Tree<ConstructNode> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.tree.find(path)
    }

    pub fn construct(&self, node: NodeId) -> Option<&Construct> {
        self.tree.get(node).map(|node| &node.data.construct)
    }

    pub fn path(&self, node: NodeId) -> Option<&str> {
        self.tree.get(node).map(|node| node.path())
    }

    /// All stacks in registration order
    pub fn stacks(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.tree[self.root()]
            .children()
            .filter(|child| matches!(self.tree[*child].data.construct, Construct::Stack))
    }

    /// Nearest stack containing `node` (or `node` itself when it is a stack)
    pub fn stack_of(&self, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find(|id| matches!(self.tree[*id].data.construct, Construct::Stack))
    }

    pub fn add_stack(&mut self, scope: NodeId, id: &str) -> Result<NodeId, ConstructError> {
        self.add(scope, id, Construct::Stack)
    }

    /// Register the backend of the stack `scope`
    pub fn add_backend(&mut self, scope: NodeId, backend: Backend) -> Result<NodeId, ConstructError> {
        self.add(scope, BACKEND_ID, backend)
    }

    /// Register a new construct below `scope`
    #[tracing::instrument(level = "trace", skip(self, construct), fields(kind))]
    pub fn add(
        &mut self,
        scope: NodeId,
        id: &str,
        construct: impl Into<Construct>,
    ) -> Result<NodeId, ConstructError> {
        let construct = construct.into();
        let kind = construct.kind();
        tracing::Span::current().record("kind", tracing::field::display(kind));

        if id.is_empty() || id.contains(PATH_SEPARATOR) {
            return Err(ConstructError::InvalidId(id.to_string()));
        }

        let Some(scope_node) = self.tree.get(scope) else {
            return Err(ConstructError::UnknownNode);
        };

        let scope_is_root = scope == self.root();
        let invalid_scope = match kind {
            ConstructKind::App => true,
            ConstructKind::Stack => !scope_is_root,
            _ => false,
        };
        if invalid_scope {
            return Err(ConstructError::InvalidScope {
                kind,
                scope: scope_node.path().to_string(),
            });
        }

        if kind.is_stack_bound() && self.stack_of(scope).is_none() {
            return Err(ConstructError::NoStackFound {
                path: self.tree.child_path(scope, id),
                backend: kind == ConstructKind::Backend && scope_is_root,
            });
        }

        Ok(self.tree.register(scope, id, ConstructNode::new(construct))?)
    }

    /// Record an override on `node`, applied at synthesis time
    ///
    /// On a stack the path addresses the whole document (e.g. `terraform.backend`), on every other construct it
    /// addresses the construct's own attributes. `//` attaches a comment instead.
    pub fn add_override(
        &mut self,
        node: NodeId,
        path: &str,
        value: impl Into<Value>,
    ) -> Result<(), ConstructError> {
        self.push_override(node, Override::set(path, value))
    }

    /// Record the removal of `path` from the attributes of `node`
    pub fn add_delete_override(&mut self, node: NodeId, path: &str) -> Result<(), ConstructError> {
        self.push_override(node, Override::delete(path))
    }

    fn push_override(&mut self, node: NodeId, item: Override) -> Result<(), ConstructError> {
        let node = self.overridable_mut(node, ConstructKind::is_overridable)?;
        tracing::trace!(path = %node.path(), ?item, "record override");
        node.data.overrides.push(item);
        Ok(())
    }

    /// Emit `node` under `logical_id` instead of the allocated one
    pub fn override_logical_id(
        &mut self,
        node: NodeId,
        logical_id: impl Into<String>,
    ) -> Result<(), ConstructError> {
        let node = self.overridable_mut(node, ConstructKind::is_emitted)?;
        node.data.logical_id = Some(logical_id.into());
        Ok(())
    }

    fn overridable_mut(
        &mut self,
        node: NodeId,
        accepts: fn(&ConstructKind) -> bool,
    ) -> Result<&mut Node<ConstructNode>, ConstructError> {
        let node = self.tree.get_mut(node).ok_or(ConstructError::UnknownNode)?;
        let kind = node.data.construct.kind();
        if !accepts(&kind) {
            return Err(ConstructError::NotOverridable {
                kind,
                path: node.path().to_string(),
            });
        }
        Ok(node)
    }

    /// Friendly unique id of `node`
    ///
    /// Derived from the local ids below the node's stack (including the stack id unless
    /// [AppOptions::exclude_stack_id_from_logical_ids] is set). `None` for nodes outside of any stack.
    pub fn logical_id(&self, node: NodeId) -> Option<String> {
        let data = &self.tree.get(node)?.data;
        if let Some(logical_id) = &data.logical_id {
            return Some(logical_id.clone());
        }

        let stack = self.stack_of(node)?;
        let mut components: Vec<&str> = std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .take_while(|id| *id != stack)
            .map(|id| self.tree[id].local_id())
            .collect();
        if !self.options.exclude_stack_id_from_logical_ids {
            components.push(self.tree[stack].local_id());
        }
        components.reverse();

        Some(self.logical_ids.allocate(&components))
    }

    /// Lazy reference to `attribute` of `node`, resolved when the stack is synthesized
    pub fn reference(&self, node: NodeId, attribute: &str) -> Result<Value, ConstructError> {
        let path = self.path(node).ok_or(ConstructError::UnknownNode)?;
        Ok(Reference::new(path, attribute).into())
    }

    /// Lazy reference to `node` itself, e.g. for `depends_on` or a resource's `provider`
    pub fn reference_node(&self, node: NodeId) -> Result<Value, ConstructError> {
        let path = self.path(node).ok_or(ConstructError::UnknownNode)?;
        Ok(Reference::node(path).into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::construct::{Provider, Resource};
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_on_root_app() {
        let mut app = App::new(AppOptions::default().stub_version());
        app.add_stack(app.root(), "MyStack").unwrap();

        let error = app.add_backend(app.root(), Backend::local()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "No stack could be identified for the construct at path 'backend'. You seem to have passed your root \
            App as scope to a TerraformBackend construct. Pass a stack as scope to your backend instead."
        );
    }

    #[test]
    fn resources_need_a_stack() {
        let mut app = App::default();
        let group = app.add(app.root(), "Group", Construct::Group).unwrap();

        let error = app.add(group, "Bucket", Resource::new("aws_bucket")).unwrap_err();
        assert_eq!(
            error,
            ConstructError::NoStackFound {
                path: "Group/Bucket".into(),
                backend: false
            }
        );
    }

    #[test]
    fn backend_below_a_stackless_group() {
        let mut app = App::default();
        let group = app.add(app.root(), "Group", Construct::Group).unwrap();

        let error = app.add_backend(group, Backend::local()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "No stack could be identified for the construct at path 'Group/backend'."
        );
    }

    #[test]
    fn overrides_need_a_synthesized_construct() {
        let mut app = App::default();
        let stack = app.add_stack(app.root(), "MyStack").unwrap();
        let group = app.add(stack, "Group", Construct::Group).unwrap();
        let bucket = app.add(group, "Bucket", Resource::new("aws_bucket")).unwrap();

        assert_eq!(
            app.add_override(group, "foo", "bar"),
            Err(ConstructError::NotOverridable {
                kind: ConstructKind::Group,
                path: "MyStack/Group".into()
            })
        );
        assert!(matches!(
            app.add_delete_override(app.root(), "foo"),
            Err(ConstructError::NotOverridable {
                kind: ConstructKind::App,
                ..
            })
        ));
        assert!(matches!(
            app.override_logical_id(stack, "other"),
            Err(ConstructError::NotOverridable { .. })
        ));

        assert_eq!(app.add_override(stack, "terraform.required_version", ">= 1.5"), Ok(()));
        assert_eq!(app.add_override(bucket, "foo", "bar"), Ok(()));
        assert_eq!(app.tree()[group].data.overrides, vec![]);
    }

    #[test]
    fn stacks_live_below_the_app() {
        let mut app = App::default();
        let stack = app.add_stack(app.root(), "One").unwrap();

        assert!(matches!(
            app.add_stack(stack, "Two"),
            Err(ConstructError::InvalidScope { .. })
        ));
        assert_eq!(app.stacks().collect::<Vec<_>>(), vec![stack]);
    }

    #[test]
    fn duplicate_ids_collide() {
        let mut app = App::default();
        let stack = app.add_stack(app.root(), "MyStack").unwrap();
        app.add(stack, "aws", Provider::new("aws")).unwrap();

        let error = app.add(stack, "aws", Provider::new("aws")).unwrap_err();
        assert_eq!(
            error.to_string(),
            "There is already a construct with id 'aws' in scope 'MyStack'"
        );
    }

    #[test]
    fn invalid_ids() {
        let mut app = App::default();
        let stack = app.add_stack(app.root(), "MyStack").unwrap();

        assert_eq!(
            app.add(stack, "a/b", Construct::Group),
            Err(ConstructError::InvalidId("a/b".into()))
        );
        assert_eq!(
            app.add(stack, "", Construct::Group),
            Err(ConstructError::InvalidId("".into()))
        );
    }

    #[test]
    fn logical_ids() {
        let mut app = App::default();
        let stack = app.add_stack(app.root(), "MyStack").unwrap();
        let bucket = app.add(stack, "Bucket", Resource::new("aws_bucket")).unwrap();

        let with_stack = app.logical_id(bucket).unwrap();
        assert!(with_stack.starts_with("MyStack_Bucket_"), "{with_stack}");
        assert_eq!(app.logical_id(app.root()), None);

        let mut future = App::new(AppOptions::default().enable_future_flags());
        let stack = future.add_stack(future.root(), "MyStack").unwrap();
        let group = future.add(stack, "Storage", Construct::Group).unwrap();
        let bucket = future.add(group, "Bucket", Resource::new("aws_bucket")).unwrap();
        let direct = future.add(stack, "Direct", Resource::new("aws_bucket")).unwrap();

        assert_eq!(future.logical_id(direct).as_deref(), Some("Direct"));
        let nested = future.logical_id(bucket).unwrap();
        assert!(nested.starts_with("Storage_Bucket_"), "{nested}");

        future.override_logical_id(bucket, "logs").unwrap();
        assert_eq!(future.logical_id(bucket).as_deref(), Some("logs"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: AppOptions =
            serde_json::from_value(serde_json::json!({ "exclude_stack_id_from_logical_ids": true }))
                .unwrap();

        assert!(options.exclude_stack_id_from_logical_ids);
        assert_eq!(options.version, AppOptions::default().version);
    }
}
