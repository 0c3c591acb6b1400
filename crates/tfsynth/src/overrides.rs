//! Path based overrides
//!
//! Overrides are recorded on a construct and applied to its synthesized attributes in the order they were added.
//! A path addresses nested objects with `.` (`prop3.name`); `\.` is a literal dot inside a key.
//!
//! The path `//` is reserved: instead of changing data it attaches a comment to the construct's block.
use crate::value::{Map, Value};

pub const COMMENT_PATH: &str = "//";

#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    /// Replace whatever is at `path`, creating intermediate objects
    Set { path: Vec<String>, value: Value },
    /// Remove the key at `path` if present
    Delete { path: Vec<String> },
    /// Set (or clear, with `None`) the comment of the block
    Comment(Option<Value>),
}

impl Override {
    pub fn set(path: &str, value: impl Into<Value>) -> Self {
        if path == COMMENT_PATH {
            return Override::Comment(Some(value.into()));
        }

        Override::Set {
            path: split_path(path),
            value: value.into(),
        }
    }

    pub fn delete(path: &str) -> Self {
        if path == COMMENT_PATH {
            return Override::Comment(None);
        }

        Override::Delete {
            path: split_path(path),
        }
    }
}

/// Split an override path on unescaped dots
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = vec![];
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);

    segments
}

/// Apply `overrides` to `target` in order
///
/// Returns the comment left by the last comment override, if any.
#[tracing::instrument(level = "trace", skip_all, fields(count = overrides.len()))]
pub fn apply(target: &mut Map, overrides: &[Override]) -> Option<Value> {
    let mut comment = None;

    for item in overrides {
        match item {
            Override::Set { path, value } => set(target, path, value.clone()),
            Override::Delete { path } => delete(target, path),
            Override::Comment(value) => comment = value.clone(),
        }
    }

    comment
}

fn set(target: &mut Map, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        current = object_entry(current, segment);
    }

    tracing::trace!(?path, "set");
    current.insert(last.clone(), value);
}

fn delete(target: &mut Map, path: &[String]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    // deleting never creates data, a missing parent means there is nothing to delete
    let mut current = target;
    for segment in parents {
        match current.get_mut(segment) {
            Some(Value::Object(next)) => current = next,
            _ => return,
        }
    }

    tracing::trace!(?path, "delete");
    current.shift_remove(last);
}

/// Object stored at `key`, replacing anything that is not an object
fn object_entry<'m>(map: &'m mut Map, key: &str) -> &'m mut Map {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }

    match slot {
        Value::Object(object) => object,
        _ => unreachable!("slot was just replaced by an object"),
    }
}
