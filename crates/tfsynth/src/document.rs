//! Synthesized stack document
//!
//! A [Document] holds the merged data of one stack, grouped into sections:
//!
//! | section     | entry key                         |
//! |-------------|-----------------------------------|
//! | `terraform` | `backend.<type>`, `required_providers.<name>` |
//! | `provider`  | `<type>` (list of configurations) |
//! | `variable`  | `<id>`                            |
//! | `data`      | `<type>.<id>`                     |
//! | `resource`  | `<type>.<id>`                     |
//! | `module`    | `<id>`                            |
//! | `output`    | `<id>`                            |
//!
//! Comments and metadata are not part of the data. They only show up when the document is serialized, under the
//! `//` keys terraform ignores in JSON configuration.
use crate::overrides::COMMENT_PATH;
use crate::value::{Map, Value};

pub const SECTIONS: [&str; 7] = [
    "terraform",
    "provider",
    "variable",
    "data",
    "resource",
    "module",
    "output",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub version: String,
    pub stack_name: String,
    /// Type of the configured backend, `local` when there is none
    pub backend: String,
}

/// Step into the document data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Key(String),
    Index(usize),
}

/// Rendering annotation attached to a block
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Location of the annotated block, empty for the document itself
    pub address: Vec<Address>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    data: Map,
    metadata: Metadata,
    comments: Vec<Comment>,
}

impl Document {
    pub(crate) fn new(metadata: Metadata) -> Self {
        Self {
            data: SECTIONS
                .iter()
                .map(|section| (section.to_string(), Value::Object(Map::new())))
                .collect(),
            metadata,
            comments: vec![],
        }
    }

    /// All sections (empty ones included until the document is finished)
    pub fn data(&self) -> &Map {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Map {
        &mut self.data
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub(crate) fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }

    /// Look up a value by its path through the document data
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.data.get(*first)?.pointer(rest)
    }

    /// Insert an entry that must not exist yet
    ///
    /// `path` starts with the section. On collision the existing entry is kept and `Err` carries its key.
    pub(crate) fn insert_unique(&mut self, path: &[&str], value: Value) -> Result<(), String> {
        let (last, parents) = path.split_last().ok_or_else(String::new)?;
        let parent = self.object_at(parents);
        if parent.contains_key(*last) {
            return Err(path.join("."));
        }
        parent.insert(last.to_string(), value);
        Ok(())
    }

    /// Insert an entry unless one exists already
    pub(crate) fn insert_default(&mut self, path: &[&str], value: Value) {
        if let Some((last, parents)) = path.split_last() {
            self.object_at(parents)
                .entry(last.to_string())
                .or_insert(value);
        }
    }

    /// Append to the list at `path`, returning the index of the new element
    pub(crate) fn push(&mut self, path: &[&str], value: Value) -> usize {
        let Some((last, parents)) = path.split_last() else {
            return 0;
        };

        let slot = self
            .object_at(parents)
            .entry(last.to_string())
            .or_insert_with(|| Value::Array(vec![]));
        if !matches!(slot, Value::Array(_)) {
            *slot = Value::Array(vec![]);
        }

        match slot {
            Value::Array(list) => {
                list.push(value);
                list.len() - 1
            }
            _ => unreachable!("slot was just replaced by a list"),
        }
    }

    fn object_at(&mut self, path: &[&str]) -> &mut Map {
        let mut current = &mut self.data;
        for segment in path {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(object) => object,
                _ => unreachable!("slot was just replaced by an object"),
            };
        }
        current
    }

    /// Drop sections that did not receive any entry
    pub(crate) fn prune_empty_sections(&mut self) {
        self.data.retain(|_, section| match section {
            Value::Object(map) => !map.is_empty(),
            _ => true,
        });
    }

    /// Data with metadata and comments merged in under `//` keys
    pub fn rendered(&self) -> Value {
        let mut root = Map::new();
        let mut metadata = Map::new();
        metadata.insert("version".into(), self.metadata.version.as_str().into());
        metadata.insert("stackName".into(), self.metadata.stack_name.as_str().into());
        metadata.insert("backend".into(), self.metadata.backend.as_str().into());

        let mut document_meta = Map::new();
        document_meta.insert("metadata".into(), Value::Object(metadata));
        root.insert(COMMENT_PATH.into(), Value::Object(document_meta));
        root.extend(self.data.clone());

        let mut root = Value::Object(root);
        for comment in &self.comments {
            if comment.address.is_empty() {
                if let Some(meta) = root
                    .as_object_mut()
                    .and_then(|map| map.get_mut(COMMENT_PATH))
                    .and_then(Value::as_object_mut)
                {
                    meta.insert("comment".into(), comment.value.clone());
                }
                continue;
            }

            if let Some(block) = block_at(&mut root, &comment.address) {
                block.shift_insert(0, COMMENT_PATH.into(), comment.value.clone());
            }
        }

        root
    }
}

fn block_at<'v>(root: &'v mut Value, address: &[Address]) -> Option<&'v mut Map> {
    let mut current = root;
    for step in address {
        current = match (current, step) {
            (Value::Object(map), Address::Key(key)) => map.get_mut(key)?,
            (Value::Array(list), Address::Index(index)) => list.get_mut(*index)?,
            _ => return None,
        };
    }
    current.as_object_mut()
}

impl serde::Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.rendered().serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn metadata() -> Metadata {
        Metadata {
            version: "stubbed".into(),
            stack_name: "MyStack".into(),
            backend: "local".into(),
        }
    }

    #[test]
    fn sections_keep_their_order() {
        let mut document = Document::new(metadata());
        document
            .insert_unique(&["output", "a"], json!({ "value": 1 }).into())
            .unwrap();
        document
            .insert_unique(&["resource", "aws_bucket", "b"], json!({}).into())
            .unwrap();
        document.prune_empty_sections();

        assert_eq!(
            document.data().keys().collect::<Vec<_>>(),
            vec!["resource", "output"]
        );
    }

    #[test]
    fn unique_entries() {
        let mut document = Document::new(metadata());
        document
            .insert_unique(&["module", "eks"], json!({ "source": "a" }).into())
            .unwrap();

        let error = document
            .insert_unique(&["module", "eks"], json!({ "source": "b" }).into())
            .unwrap_err();
        assert_eq!(error, "module.eks");
        assert_eq!(
            document.get(&["module", "eks", "source"]),
            Some(&Value::from("a"))
        );
    }

    #[test]
    fn rendering_adds_comments_and_metadata() {
        let mut document = Document::new(metadata());
        let index = document.push(&["provider", "aws"], json!({ "region": "x" }).into());
        document.comments_mut().push(Comment {
            address: vec![
                Address::Key("provider".into()),
                Address::Key("aws".into()),
                Address::Index(index),
            ],
            value: "main provider".into(),
        });
        document.prune_empty_sections();

        let rendered = serde_json::to_value(&document).unwrap();
        assert_eq!(
            rendered,
            json!({
                "//": { "metadata": { "version": "stubbed", "stackName": "MyStack", "backend": "local" } },
                "provider": { "aws": [{ "//": "main provider", "region": "x" }] },
            })
        );
        assert_eq!(document.get(&["provider", "aws", "0", "//"]), None);
    }
}
