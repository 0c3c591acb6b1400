//! Stack assembly
//!
//! [App::synth] turns one stack into a [Document]:
//!
//! 1. walk the stack depth-first and allocate logical ids
//! 2. synthesize every construct and apply its overrides
//! 3. place the attributes into their section
//! 4. apply the overrides recorded on the stack itself, on top of the whole document
//! 5. resolve reference tokens
//!
//! Every step works on a local document, an error anywhere means no document at all.
use crate::app::App;
use crate::construct::{Construct, SynthContext};
use crate::document::{Address, Comment, Document, Metadata};
use crate::error::SynthError;
use crate::overrides;
use crate::reference::ReferenceResolver;
use crate::tree::NodeId;
use crate::value::{Map, Value};
use crate::visit::VisitReferencesMut;
use std::collections::HashMap;

const DEFAULT_BACKEND: &str = "local";

/// One synthesized construct, waiting to be placed
struct Synthesized {
    node: NodeId,
    attributes: Map,
    comment: Option<Value>,
}

impl App {
    /// Synthesize the stack `stack` into a document
    #[tracing::instrument(level = "debug", skip_all, fields(stack = self.path(stack).unwrap_or_default()))]
    pub fn synth(&self, stack: NodeId) -> Result<Document, SynthError> {
        let Some(stack_node) = self.tree().get(stack) else {
            return Err(SynthError::UnknownNode);
        };
        if !matches!(stack_node.data.construct, Construct::Stack) {
            return Err(SynthError::NotAStack(stack_node.path().to_string()));
        }

        let nodes: Vec<NodeId> = self
            .tree()
            .traverse(stack)
            .filter(|id| self.tree()[*id].data.construct.kind().is_emitted())
            .collect();

        let logical_ids: HashMap<NodeId, String> = nodes
            .iter()
            .filter_map(|id| self.logical_id(*id).map(|logical_id| (*id, logical_id)))
            .collect();

        let synthesized = nodes
            .iter()
            .map(|id| self.synthesize_node(*id, &logical_ids))
            .collect::<Vec<_>>();

        let mut document = Document::new(Metadata {
            version: self.options().version.clone(),
            stack_name: stack_node.local_id().to_string(),
            backend: self.backend_type(&nodes),
        });

        let mut placed_by: HashMap<String, NodeId> = HashMap::new();
        for item in synthesized {
            self.place(&mut document, item, &logical_ids, &mut placed_by)?;
        }

        let stack_comment = overrides::apply(document.data_mut(), &stack_node.data.overrides);
        if let Some(value) = stack_comment {
            document.comments_mut().push(Comment {
                address: vec![],
                value,
            });
        }

        let mut resolver = ReferenceResolver::new(self, stack, &logical_ids);
        document.data_mut().visit_references_mut(&mut resolver);
        for comment in document.comments_mut() {
            comment.value.visit_references_mut(&mut resolver);
        }
        resolver.finish()?;

        document.prune_empty_sections();
        tracing::debug!(sections = document.data().len(), "stack synthesized");
        Ok(document)
    }

    fn synthesize_node(&self, id: NodeId, logical_ids: &HashMap<NodeId, String>) -> Synthesized {
        let node = &self.tree()[id];
        let logical_id = logical_ids.get(&id).map(String::as_str).unwrap_or_default();
        let ctx = SynthContext::new(logical_id, node.path());

        let mut attributes = node.data.construct.synthesize_attributes(&ctx);
        let comment = overrides::apply(&mut attributes, &node.data.overrides);
        tracing::trace!(path = %node.path(), %logical_id, "synthesized");

        Synthesized {
            node: id,
            attributes,
            comment,
        }
    }

    fn backend_type(&self, nodes: &[NodeId]) -> String {
        nodes
            .iter()
            .find_map(|id| match &self.tree()[*id].data.construct {
                Construct::Backend(backend) => Some(backend.backend_type.clone()),
                _ => None,
            })
            .unwrap_or_else(|| DEFAULT_BACKEND.to_string())
    }

    fn place(
        &self,
        document: &mut Document,
        item: Synthesized,
        logical_ids: &HashMap<NodeId, String>,
        placed_by: &mut HashMap<String, NodeId>,
    ) -> Result<(), SynthError> {
        let node = &self.tree()[item.node];
        let logical_id = logical_ids
            .get(&item.node)
            .map(String::as_str)
            .unwrap_or_default();
        let attributes = Value::Object(item.attributes);

        let address: Vec<String> = match &node.data.construct {
            Construct::App | Construct::Stack | Construct::Group => return Ok(()),
            Construct::Provider(provider) => {
                if let Some(source) = &provider.source {
                    let mut requirement = Map::new();
                    requirement.insert("source".into(), source.as_str().into());
                    if let Some(version) = &provider.version {
                        requirement.insert("version".into(), version.as_str().into());
                    }
                    document.insert_default(
                        &["terraform", "required_providers", provider.provider_type.as_str()],
                        Value::Object(requirement),
                    );
                }

                let index = document.push(&["provider", provider.provider_type.as_str()], attributes);
                if let Some(value) = item.comment {
                    document.comments_mut().push(Comment {
                        address: vec![
                            Address::Key("provider".into()),
                            Address::Key(provider.provider_type.clone()),
                            Address::Index(index),
                        ],
                        value,
                    });
                }
                return Ok(());
            }
            Construct::Resource(resource) => {
                vec!["resource".into(), resource.resource_type.clone(), logical_id.into()]
            }
            Construct::DataSource(data) => {
                vec!["data".into(), data.resource_type.clone(), logical_id.into()]
            }
            Construct::Module(_) => vec!["module".into(), logical_id.into()],
            Construct::Output(_) => vec!["output".into(), logical_id.into()],
            Construct::Variable(_) => vec!["variable".into(), logical_id.into()],
            Construct::Backend(backend) => vec![
                "terraform".into(),
                "backend".into(),
                backend.backend_type.clone(),
            ],
        };

        let path: Vec<&str> = address.iter().map(String::as_str).collect();
        if let Err(key) = document.insert_unique(&path, attributes) {
            let existing = placed_by
                .get(&key)
                .and_then(|id| self.path(*id))
                .unwrap_or_default();
            return Err(SynthError::DuplicateLogicalId {
                id: logical_id.to_string(),
                path: node.path().to_string(),
                existing: existing.to_string(),
            });
        }
        placed_by.insert(path.join("."), item.node);

        if let Some(value) = item.comment {
            document.comments_mut().push(Comment {
                address: address.into_iter().map(Address::Key).collect(),
                value,
            });
        }

        Ok(())
    }
}
