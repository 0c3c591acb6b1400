//! Generic tree of addressable nodes
//!
//! Nodes are stored in an arena and addressed by [NodeId]. Each node has a local id that is unique among its
//! siblings; its path is derived from the path of its parent and never changes. The root has an empty path, its
//! children are addressed by their local id and deeper nodes by `<parent path>/<local id>`.
//!
//! Nodes can not be removed. Indices handed out by [Tree::register] stay valid for the lifetime of the tree.

/// Index of a node within its [Tree]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

pub const PATH_SEPARATOR: char = '/';

#[derive(Debug)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

#[derive(Debug)]
pub struct Node<T> {
    local_id: String,
    path: String,
    parent: Option<NodeId>,
    children: indexmap::IndexMap<String, NodeId>,
    pub data: T,
}

impl<T> Node<T> {
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("There is already a construct with id '{id}' in scope '{scope}'")]
pub struct PathCollision {
    pub scope: String,
    pub id: String,
}

impl<T> Tree<T> {
    pub fn new(root: T) -> Self {
        Self {
            nodes: vec![Node {
                local_id: String::new(),
                path: String::new(),
                parent: None,
                children: Default::default(),
                data: root,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id.0)
    }

    /// Path a node with `local_id` would have when registered below `parent`
    pub fn child_path(&self, parent: NodeId, local_id: &str) -> String {
        let parent_path = &self[parent].path;
        if parent_path.is_empty() {
            local_id.to_string()
        } else {
            format!("{parent_path}{PATH_SEPARATOR}{local_id}")
        }
    }

    /// Add a new child node below `parent`
    ///
    /// # Panic
    /// Panics if `parent` does not belong to this tree
    pub fn register(
        &mut self,
        parent: NodeId,
        local_id: &str,
        data: T,
    ) -> Result<NodeId, PathCollision> {
        if self[parent].children.contains_key(local_id) {
            return Err(PathCollision {
                scope: self[parent].path.clone(),
                id: local_id.to_string(),
            });
        }

        let id = NodeId(self.nodes.len());
        let path = self.child_path(parent, local_id);
        tracing::trace!(%path, "register node");

        self.nodes.push(Node {
            local_id: local_id.to_string(),
            path,
            parent: Some(parent),
            children: Default::default(),
            data,
        });
        self.nodes[parent.0]
            .children
            .insert(local_id.to_string(), id);

        Ok(id)
    }

    /// Look up a node by its full path
    pub fn find(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return Some(self.root());
        }

        path.split(PATH_SEPARATOR)
            .try_fold(self.root(), |current, segment| {
                self[current].children.get(segment).copied()
            })
    }

    /// Parent chain of `id`, nearest first. Does not include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self[id].parent, |current| self[*current].parent)
    }

    /// Depth-first traversal of the subtree rooted at `from`
    ///
    /// Parents are visited before their children, siblings in insertion order.
    pub fn traverse(&self, from: NodeId) -> Traverse<'_, T> {
        Traverse {
            tree: self,
            pending: vec![from],
        }
    }

    /// Run `check` on every node of the subtree rooted at `from` and collect the results in traversal order
    pub fn validate<F>(&self, from: NodeId, mut check: F) -> Vec<String>
    where
        F: FnMut(NodeId, &Node<T>) -> Vec<String>,
    {
        self.traverse(from)
            .flat_map(|id| check(id, &self[id]))
            .collect()
    }
}

impl<T> std::ops::Index<NodeId> for Tree<T> {
    type Output = Node<T>;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl<T> std::ops::IndexMut<NodeId> for Tree<T> {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.nodes[index.0]
    }
}

/// Iterator returned by [Tree::traverse]
pub struct Traverse<'t, T> {
    tree: &'t Tree<T>,
    pending: Vec<NodeId>,
}

impl<'t, T> Iterator for Traverse<'t, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.pending.pop()?;
        let children = &self.tree[current].children;
        self.pending.extend(children.values().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Tree<&'static str>, [NodeId; 4]) {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let stack = tree.register(root, "Stack", "stack").unwrap();
        let one = tree.register(stack, "One", "one").unwrap();
        let nested = tree.register(one, "Nested", "nested").unwrap();
        let two = tree.register(stack, "Two", "two").unwrap();
        (tree, [stack, one, nested, two])
    }

    #[test]
    fn paths() {
        let (tree, [stack, one, nested, two]) = sample();

        assert_eq!(tree[tree.root()].path(), "");
        assert_eq!(tree[stack].path(), "Stack");
        assert_eq!(tree[one].path(), "Stack/One");
        assert_eq!(tree[nested].path(), "Stack/One/Nested");
        assert_eq!(tree.find("Stack/Two"), Some(two));
        assert_eq!(tree.find("Stack/Three"), None);
    }

    #[test]
    fn collision() {
        let (mut tree, [stack, ..]) = sample();

        let error = tree.register(stack, "One", "again").unwrap_err();
        assert_eq!(
            error,
            PathCollision {
                scope: "Stack".into(),
                id: "One".into()
            }
        );
        assert_eq!(tree.traverse(tree.root()).count(), 5);
    }

    #[test]
    fn traversal_is_depth_first_and_restartable() {
        let (tree, _) = sample();

        let order: Vec<_> = tree.traverse(tree.root()).map(|id| tree[id].data).collect();
        assert_eq!(order, vec!["app", "stack", "one", "nested", "two"]);

        let again: Vec<_> = tree.traverse(tree.root()).map(|id| tree[id].data).collect();
        assert_eq!(order, again);
    }

    #[test]
    fn ancestors_nearest_first() {
        let (tree, [stack, one, nested, _]) = sample();

        let ancestors: Vec<_> = tree.ancestors(nested).collect();
        assert_eq!(ancestors, vec![one, stack, tree.root()]);
    }

    #[test]
    fn validate_aggregates_in_traversal_order() {
        let (tree, [stack, ..]) = sample();

        let diagnostics = tree.validate(stack, |_, node| {
            if node.children().count() == 0 {
                vec![format!("{} is a leaf", node.path())]
            } else {
                vec![]
            }
        });

        assert_eq!(
            diagnostics,
            vec!["Stack/One/Nested is a leaf", "Stack/Two is a leaf"]
        );
    }
}
