//! # tfsynth - terraform JSON from a construct tree
//!
//! ## Introduction for developers
//!
//! Read this to understand how `tfsynth` works internally.
//!
//! ### The construct tree
//!
//! Everything starts with an [App]. It owns a [tree::Tree] of [construct::Construct]s:
//! - the app is the root
//! - stacks are direct children of the app, each one becomes a separate document
//! - groups only add a level of nesting
//! - everything else (providers, resources, data sources, modules, outputs, variables, backends) ends up in the
//!   document of its stack
//!
//! Every node has a local id, unique among its siblings, and a path made of the local ids from the app down to the
//! node, joined by `/`. The app itself has the empty path.
//!
//! ```
//! use tfsynth::construct::{Output, Provider, Resource};
//! use tfsynth::{App, AppOptions};
//!
//! let mut app = App::new(AppOptions::default().stub_version());
//! let stack = app.add_stack(app.root(), "MyStack").unwrap();
//!
//! app.add(stack, "aws", Provider::new("aws").source("hashicorp/aws")).unwrap();
//! let bucket = app
//!     .add(stack, "Logs", Resource::new("aws_s3_bucket").attribute("bucket", "logs"))
//!     .unwrap();
//! let arn = app.reference(bucket, "arn").unwrap();
//! app.add(stack, "arn", Output::new(arn)).unwrap();
//!
//! let document = app.synth(stack).unwrap();
//! assert!(document.get(&["resource", "aws_s3_bucket"]).is_some());
//! ```
//!
//! ### Logical ids
//!
//! Documents address their blocks by logical id, not by path. [logical_id::PathHashPolicy] derives one from the
//! path below the app (or below the stack with [AppOptions::exclude_stack_id_from_logical_ids]). A single local id is
//! used as is, longer paths get a short hash suffix so two paths never end up with the same id.
//!
//! ### Synthesis
//!
//! see [App::synth]
//!
//! - every construct turns its configuration into a [value::Map]
//! - recorded [overrides::Override]s are applied on top, in the order they were recorded
//! - the result is placed into its document section, a second block at the same address is an error
//! - the stack's own overrides are applied to the whole document
//! - [reference::Reference]s are replaced with terraform expressions (`${aws_s3_bucket.<logical id>.arn}`)
//!
//! References are lazy: they only store the target path and are resolved once the logical ids of the stack are known.
//!
//! ### Manifests
//!
//! Besides the rust API a tree can be described in HCL, see [manifest::Manifest]. This is what the `tfsynth` binary
//! reads.
//!
//! ### Output
//!
//! [document::Document] serializes via [serde], metadata and comments are rendered under `//` keys.
//!
pub mod app;
pub mod construct;
pub mod document;
pub mod error;
pub mod logical_id;
pub mod manifest;
pub mod overrides;
pub mod reference;
mod synth;
pub mod tree;
mod validate;
pub mod value;
mod visit;

pub use app::{App, AppOptions};
pub use document::Document;
