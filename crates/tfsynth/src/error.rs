//! Errors raised while building or synthesizing a construct tree
//!
//! Structural problems are errors and abort the current call. Validation findings are not errors, see
//! [crate::validate].
use crate::construct::ConstructKind;
use crate::tree::PathCollision;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConstructError {
    #[error(transparent)]
    PathCollision(#[from] PathCollision),

    #[error("{}", no_stack_message(.path, .backend))]
    NoStackFound { path: String, backend: bool },

    #[error("Invalid construct id '{0}': ids must not be empty or contain '/'")]
    InvalidId(String),

    #[error("A {kind} can not be added to scope '{scope}'")]
    InvalidScope { kind: ConstructKind, scope: String },

    #[error("The {kind} at '{path}' is never synthesized and can not carry overrides")]
    NotOverridable { kind: ConstructKind, path: String },

    #[error("Unknown construct node")]
    UnknownNode,
}

fn no_stack_message(path: &str, backend: &bool) -> String {
    let mut message = format!("No stack could be identified for the construct at path '{path}'.");
    if *backend {
        message.push_str(
            " You seem to have passed your root App as scope to a TerraformBackend construct. \
            Pass a stack as scope to your backend instead.",
        );
    }
    message
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    #[error("Unable to resolve reference to '{target}': no construct exists at that path")]
    UnresolvedReference { target: String },

    #[error("Reference to '{target}' crosses from stack '{stack}' into another stack")]
    CrossStackReference { target: String, stack: String },

    #[error("The {kind} at '{target}' can not be referenced")]
    NotReferenceable { target: String, kind: ConstructKind },

    #[error("Logical id '{id}' of '{path}' is already used by '{existing}'")]
    DuplicateLogicalId {
        id: String,
        path: String,
        existing: String,
    },

    #[error("The construct at '{0}' is not a stack")]
    NotAStack(String),

    #[error("Unknown construct node")]
    UnknownNode,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_message() {
        let error = ConstructError::NoStackFound {
            path: "backend".into(),
            backend: true,
        };

        assert_eq!(
            error.to_string(),
            "No stack could be identified for the construct at path 'backend'. You seem to have passed your root \
            App as scope to a TerraformBackend construct. Pass a stack as scope to your backend instead."
        );
    }

    #[test]
    fn generic_message() {
        let error = ConstructError::NoStackFound {
            path: "Group/Bucket".into(),
            backend: false,
        };

        assert_eq!(
            error.to_string(),
            "No stack could be identified for the construct at path 'Group/Bucket'."
        );
    }
}
