//! Friendly unique ids
//!
//! Every construct that ends up in a document is keyed by a logical id. The id is derived from the local ids of the
//! construct and its ancestors below (or including) its stack. Derivation is pluggable via [LogicalIdPolicy]; the
//! only contract is that it is deterministic for a given list of components and collision free for distinct lists.
use sha2::Digest;

pub trait LogicalIdPolicy: std::fmt::Debug + Send + Sync {
    /// Derive a logical id from path components, outermost first
    fn allocate(&self, components: &[&str]) -> String;
}

/// Default policy
///
/// - a single component that is already a valid identifier is used as is
/// - otherwise the sanitized components are joined with `_` and suffixed with a hash of the full path
///
/// Components named `Default` are skipped so wrapping constructs can stay invisible.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathHashPolicy;

const HIDDEN_COMPONENT: &str = "Default";
const HASH_LEN: usize = 8;

impl LogicalIdPolicy for PathHashPolicy {
    fn allocate(&self, components: &[&str]) -> String {
        let components: Vec<&str> = components
            .iter()
            .copied()
            .filter(|component| *component != HIDDEN_COMPONENT)
            .collect();

        if let [single] = components.as_slice() {
            if is_identifier(single) {
                return single.to_string();
            }
        }

        let hash = path_hash(&components);
        let human = components
            .iter()
            .map(|component| sanitize(component))
            .filter(|component| !component.is_empty())
            .collect::<Vec<_>>()
            .join("_");

        if human.is_empty() {
            hash
        } else {
            format!("{human}_{hash}")
        }
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_identifier(component: &str) -> bool {
    !component.is_empty() && component.chars().all(is_allowed)
}

fn sanitize(component: &str) -> String {
    component.chars().filter(|c| is_allowed(*c)).collect()
}

fn path_hash(components: &[&str]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(components.join("/").as_bytes());
    let mut hash = hex::encode_upper(hasher.finalize());
    hash.truncate(HASH_LEN);
    hash
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_clean_component_is_kept() {
        assert_eq!(PathHashPolicy.allocate(&["Resource1"]), "Resource1");
        assert_eq!(PathHashPolicy.allocate(&["eks_version"]), "eks_version");
    }

    #[test]
    fn nested_components_get_hashed() {
        let id = PathHashPolicy.allocate(&["MyStack", "Resource1"]);

        assert!(id.starts_with("MyStack_Resource1_"), "{id}");
        assert_eq!(id.len(), "MyStack_Resource1_".len() + HASH_LEN);
        assert_eq!(id, PathHashPolicy.allocate(&["MyStack", "Resource1"]));
    }

    #[test]
    fn sanitizing_does_not_collide() {
        let dirty = PathHashPolicy.allocate(&["my bucket"]);
        let clean = PathHashPolicy.allocate(&["mybucket"]);

        assert!(dirty.starts_with("mybucket_"), "{dirty}");
        assert_ne!(dirty, clean);
    }

    #[test]
    fn default_component_is_hidden() {
        assert_eq!(
            PathHashPolicy.allocate(&["Default", "Bucket"]),
            PathHashPolicy.allocate(&["Bucket"])
        );
    }
}
