//! Structural validation
//!
//! Findings are returned as plain strings so callers can report everything at once. Nothing in here fails.
use crate::app::{App, ConstructNode};
use crate::construct::Construct;
use crate::tree::{Node, NodeId};

const MISSING_PROVIDERS: &str = "Found resources without a matching provider. Please make sure to add the \
    following providers to your stack: ";

impl App {
    /// Validate `node` and everything below it
    ///
    /// Diagnostics are ordered by the traversal order of the nodes that produced them.
    #[tracing::instrument(level = "debug", skip_all, fields(node = self.path(node).unwrap_or_default()))]
    pub fn validate(&self, node: NodeId) -> Vec<String> {
        if !self.tree().contains(node) {
            return vec![];
        }

        self.tree().validate(node, |id, node| self.check(id, node))
    }

    fn check(&self, id: NodeId, node: &Node<ConstructNode>) -> Vec<String> {
        match node.data.construct {
            Construct::Stack => [self.missing_providers(id), self.backend_count(id)]
                .into_iter()
                .flatten()
                .collect(),
            _ => vec![],
        }
    }

    /// Resources that name their provider need a provider of that type in the stack
    fn missing_providers(&self, stack: NodeId) -> Option<String> {
        let tree = self.tree();
        let mut declared = vec![];
        let mut required = vec![];

        for id in tree.traverse(stack) {
            match &tree[id].data.construct {
                Construct::Provider(provider) => declared.push(provider.provider_type.as_str()),
                Construct::Resource(resource) | Construct::DataSource(resource) => {
                    if let Some(generator) = &resource.generator {
                        required.push(generator.provider_name.as_str());
                    }
                }
                _ => {}
            }
        }

        let mut missing: Vec<&str> = vec![];
        for name in required {
            if !declared.contains(&name) && !missing.contains(&name) {
                missing.push(name);
            }
        }

        if missing.is_empty() {
            return None;
        }

        tracing::debug!(?missing, "missing providers");
        Some(format!("{MISSING_PROVIDERS}{}", missing.join(", ")))
    }

    fn backend_count(&self, stack: NodeId) -> Option<String> {
        let tree = self.tree();
        let count = tree
            .traverse(stack)
            .filter(|id| matches!(tree[*id].data.construct, Construct::Backend(_)))
            .count();

        (count > 1).then(|| {
            format!(
                "Stack '{}' declares {count} backends. Only one backend per stack is supported.",
                tree[stack].path()
            )
        })
    }
}
