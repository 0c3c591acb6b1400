//! Lazy references between constructs
//!
//! A [Reference] stands in for an expression that points at another construct, for example the `version` output
//! of a module. The expression depends on the logical id the target is emitted under, which is only known once the
//! whole stack went through synthesis (logical id overrides, hashing). References are therefore stored as tokens in
//! attribute trees and resolved in one pass by the stack assembler.
//!
//! | target      | with attribute `a`           | without attribute     |
//! |-------------|------------------------------|-----------------------|
//! | resource    | `${<type>.<id>.a}`           | `<type>.<id>`         |
//! | data source | `${data.<type>.<id>.a}`      | `data.<type>.<id>`    |
//! | module      | `${module.<id>.a}`           | `module.<id>`         |
//! | variable    | `${var.<id>.a}`              | `${var.<id>}`         |
//! | provider    | -                            | `<type>` or `<type>.<alias>` |
use crate::app::App;
use crate::construct::Construct;
use crate::error::SynthError;
use crate::tree::NodeId;
use crate::value::{TemplatePart, Value};
use crate::visit::VisitMut;
use std::collections::HashMap;

/// Token pointing at a construct by path, optionally at one of its attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    target: String,
    attribute: Option<String>,
}

impl Reference {
    /// Reference an attribute of the construct at `target`
    pub fn new(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            attribute: Some(attribute.into()),
        }
    }

    /// Reference the construct at `target` itself (e.g. for `depends_on` or `provider`)
    pub fn node(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            attribute: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "${{TfToken[{}#{}]}}", self.target, attribute),
            None => write!(f, "${{TfToken[{}]}}", self.target),
        }
    }
}

/// Replaces reference tokens with terraform expressions
///
/// Only the first failure is kept, see [ReferenceResolver::finish].
pub(crate) struct ReferenceResolver<'a> {
    app: &'a App,
    stack: NodeId,
    logical_ids: &'a HashMap<NodeId, String>,
    error: Option<SynthError>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(app: &'a App, stack: NodeId, logical_ids: &'a HashMap<NodeId, String>) -> Self {
        Self {
            app,
            stack,
            logical_ids,
            error: None,
        }
    }

    pub fn finish(self) -> Result<(), SynthError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Expression replacing a standalone reference token
    #[tracing::instrument(level = "trace", skip_all, fields(reference = %reference))]
    pub fn resolve(&self, reference: &Reference) -> Result<String, SynthError> {
        let (address, standalone) = self.address(reference)?;
        Ok(match standalone {
            true => address,
            false => format!("${{{address}}}"),
        })
    }

    /// Template text with every reference interpolated
    pub fn render(&self, parts: &[TemplatePart]) -> Result<String, SynthError> {
        let mut rendered = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(literal) => rendered.push_str(literal),
                TemplatePart::Reference(reference) => {
                    let (address, _) = self.address(reference)?;
                    rendered.push_str(&format!("${{{address}}}"));
                }
            }
        }
        Ok(rendered)
    }

    /// Terraform address of the reference target (attribute included) and whether it stands on its own outside of
    /// an interpolation
    fn address(&self, reference: &Reference) -> Result<(String, bool), SynthError> {
        let tree = self.app.tree();
        let Some(target) = tree.find(reference.target()) else {
            return Err(SynthError::UnresolvedReference {
                target: reference.target().to_string(),
            });
        };

        if self.app.stack_of(target) != Some(self.stack) {
            return Err(SynthError::CrossStackReference {
                target: reference.target().to_string(),
                stack: tree[self.stack].path().to_string(),
            });
        }

        let construct = &tree[target].data.construct;
        let not_referenceable = || SynthError::NotReferenceable {
            target: reference.target().to_string(),
            kind: construct.kind(),
        };

        let Some(logical_id) = self.logical_ids.get(&target) else {
            return Err(not_referenceable());
        };

        let address = match construct {
            Construct::Resource(resource) => format!("{}.{logical_id}", resource.resource_type),
            Construct::DataSource(data) => format!("data.{}.{logical_id}", data.resource_type),
            Construct::Module(_) => format!("module.{logical_id}"),
            Construct::Variable(_) => {
                return Ok((with_attribute(format!("var.{logical_id}"), reference), false));
            }
            Construct::Provider(provider) => {
                if reference.attribute().is_some() {
                    return Err(not_referenceable());
                }
                let address = match &provider.alias {
                    Some(alias) => format!("{}.{alias}", provider.provider_type),
                    None => provider.provider_type.clone(),
                };
                return Ok((address, true));
            }
            Construct::App
            | Construct::Stack
            | Construct::Group
            | Construct::Output(_)
            | Construct::Backend(_) => return Err(not_referenceable()),
        };

        let standalone = reference.attribute().is_none();
        Ok((with_attribute(address, reference), standalone))
    }

    fn record(&mut self, error: SynthError) {
        tracing::debug!(%error, "unresolvable reference");
        self.error.get_or_insert(error);
    }
}

fn with_attribute(address: String, reference: &Reference) -> String {
    match reference.attribute() {
        Some(attribute) => format!("{address}.{attribute}"),
        None => address,
    }
}

impl<'a> VisitMut<Value> for ReferenceResolver<'a> {
    fn visit_mut(&mut self, value: &mut Value) {
        let resolved = match value {
            Value::Reference(reference) => self.resolve(reference),
            Value::Template(parts) => self.render(parts),
            _ => return,
        };

        match resolved {
            Ok(expression) => *value = Value::String(expression),
            Err(error) => self.record(error),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_placeholder() {
        assert_eq!(
            Reference::new("MyStack/EksModule", "version").to_string(),
            "${TfToken[MyStack/EksModule#version]}"
        );
        assert_eq!(
            Reference::node("MyStack/aws").to_string(),
            "${TfToken[MyStack/aws]}"
        );
    }

    #[test]
    fn attribute_suffix() {
        assert_eq!(
            with_attribute("var.region".into(), &Reference::node("MyStack/region")),
            "var.region"
        );
        assert_eq!(
            with_attribute("module.eks".into(), &Reference::new("MyStack/eks", "version")),
            "module.eks.version"
        );
    }
}
