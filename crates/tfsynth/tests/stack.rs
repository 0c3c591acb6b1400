//! End to end tests for building and synthesizing stacks through the rust API

use pretty_assertions::assert_eq;
use serde_json::json;
use tfsynth::construct::{Backend, Construct, Module, Output, Provider, Resource};
use tfsynth::error::ConstructError;
use tfsynth::tree::NodeId;
use tfsynth::value::Value;
use tfsynth::{App, AppOptions};

fn app() -> (App, NodeId) {
    let mut app = App::new(AppOptions::default().stub_version().enable_future_flags());
    let stack = app.add_stack(app.root(), "MyStack").unwrap();
    (app, stack)
}

fn bucket() -> Resource {
    Resource::new("aws_bucket")
        .attribute("prop1", "bar")
        .attribute("prop2", 42)
        .attribute("prop3", json!({ "name": "foo", "size": 1 }))
}

#[test]
fn full_stack() {
    let (mut app, stack) = app();

    app.add(
        stack,
        "aws",
        Provider::new("aws")
            .source("hashicorp/aws")
            .attribute("region", "us-east-1"),
    )
    .unwrap();

    let resource = app.add(stack, "Resource1", bucket()).unwrap();
    app.add_delete_override(resource, "prop2").unwrap();
    app.add_override(resource, "prop3.name", "test").unwrap();
    app.add_override(
        resource,
        "provisioner",
        json!([{ "local-exec": { "command": "echo hello" } }]),
    )
    .unwrap();
    app.add_override(resource, "//", "my comment").unwrap();

    let module = app
        .add(
            stack,
            "EksModule",
            Module::new("terraform-aws-modules/eks/aws").version("7.0.1"),
        )
        .unwrap();
    let version = app.reference(module, "version").unwrap();
    app.add(stack, "eks_version", Output::new(version)).unwrap();

    app.add_override(
        stack,
        "terraform.backend",
        json!({ "remote": { "organization": "test", "workspaces": { "name": "test" } } }),
    )
    .unwrap();

    assert!(app.validate(stack).is_empty());

    let document = app.synth(stack).unwrap();
    insta::assert_json_snapshot!(document, @r###"
    {
      "//": {
        "metadata": {
          "version": "stubbed",
          "stackName": "MyStack",
          "backend": "local"
        }
      },
      "terraform": {
        "required_providers": {
          "aws": {
            "source": "hashicorp/aws"
          }
        },
        "backend": {
          "remote": {
            "organization": "test",
            "workspaces": {
              "name": "test"
            }
          }
        }
      },
      "provider": {
        "aws": [
          {
            "region": "us-east-1"
          }
        ]
      },
      "resource": {
        "aws_bucket": {
          "Resource1": {
            "//": "my comment",
            "prop1": "bar",
            "prop3": {
              "name": "test",
              "size": 1
            },
            "provisioner": [
              {
                "local-exec": {
                  "command": "echo hello"
                }
              }
            ]
          }
        }
      },
      "module": {
        "EksModule": {
          "source": "terraform-aws-modules/eks/aws",
          "version": "7.0.1"
        }
      },
      "output": {
        "eks_version": {
          "value": "${module.EksModule.version}"
        }
      }
    }
    "###);
}

#[test]
fn deleted_keys_are_absent() {
    let (mut app, stack) = app();
    let resource = app.add(stack, "Resource1", bucket()).unwrap();
    app.add_delete_override(resource, "prop2").unwrap();
    app.add_delete_override(resource, "does.not.exist").unwrap();

    let document = app.synth(stack).unwrap();
    let synthesized = document
        .get(&["resource", "aws_bucket", "Resource1"])
        .and_then(Value::as_object)
        .unwrap();

    assert!(!synthesized.contains_key("prop2"));
    assert!(!synthesized.contains_key("does"));
    assert_eq!(synthesized.get("prop1"), Some(&Value::from("bar")));
}

#[test]
fn comments_are_annotations_only() {
    let (mut app, stack) = app();
    let resource = app.add(stack, "Resource1", bucket()).unwrap();
    app.add_override(resource, "//", "first").unwrap();
    app.add_override(resource, "//", "second").unwrap();

    let document = app.synth(stack).unwrap();
    assert_eq!(
        document.get(&["resource", "aws_bucket", "Resource1", "//"]),
        None
    );
    assert_eq!(document.comments().len(), 1);
    assert_eq!(document.comments()[0].value, Value::from("second"));

    let rendered = serde_json::to_value(&document).unwrap();
    assert_eq!(rendered["resource"]["aws_bucket"]["Resource1"]["//"], "second");
}

#[test]
fn last_write_wins_per_path() {
    let (mut app, stack) = app();
    let resource = app.add(stack, "Resource1", bucket()).unwrap();
    app.add_override(resource, "prop3.name", "one").unwrap();
    app.add_override(resource, "prop3", json!({ "other": true })).unwrap();
    app.add_override(resource, "prop3.name", "two").unwrap();
    app.add_override(resource, "prop1", "first").unwrap();
    app.add_override(resource, "prop1", "second").unwrap();

    let document = app.synth(stack).unwrap();
    let expected: Value = json!({ "prop1": "second", "prop2": 42, "prop3": { "other": true, "name": "two" } }).into();
    assert_eq!(
        document.get(&["resource", "aws_bucket", "Resource1"]),
        Some(&expected)
    );
}

#[test]
fn validate_without_hint() {
    let (mut app, stack) = app();
    app.add(stack, "provider", Provider::new("test-provider")).unwrap();
    app.add(stack, "Resource1", Resource::new("aws_bucket")).unwrap();

    assert_eq!(app.validate(stack), Vec::<String>::new());
}

#[test]
fn validate_missing_provider() {
    let (mut app, stack) = app();
    app.add(
        stack,
        "Resource1",
        Resource::new("aws_bucket").provider_name("test-provider"),
    )
    .unwrap();

    assert_eq!(
        app.validate(stack),
        vec![
            "Found resources without a matching provider. Please make sure to add the following providers to your \
            stack: test-provider"
        ]
    );
}

#[test]
fn backend_needs_a_stack() {
    let mut app = App::default();

    let error = app.add_backend(app.root(), Backend::local()).unwrap_err();
    assert!(matches!(error, ConstructError::NoStackFound { .. }));
    assert_eq!(
        error.to_string(),
        "No stack could be identified for the construct at path 'backend'. You seem to have passed your root App as \
        scope to a TerraformBackend construct. Pass a stack as scope to your backend instead."
    );
}

#[test]
fn backend_in_metadata() {
    let (mut app, stack) = app();
    app.add_backend(stack, Backend::new("s3").attribute("bucket", "state"))
        .unwrap();

    let document = app.synth(stack).unwrap();
    assert_eq!(document.metadata().backend, "s3");
    let expected: Value = json!({ "bucket": "state" }).into();
    assert_eq!(document.get(&["terraform", "backend", "s3"]), Some(&expected));
}

#[test]
fn logical_id_overrides_follow_references() {
    let (mut app, stack) = app();
    let group = app.add(stack, "Storage", Construct::Group).unwrap();
    let resource = app.add(group, "Bucket", bucket()).unwrap();
    app.override_logical_id(resource, "logs").unwrap();
    let arn = app.reference(resource, "arn").unwrap();
    app.add(stack, "arn", Output::new(arn)).unwrap();

    let document = app.synth(stack).unwrap();
    assert!(document.get(&["resource", "aws_bucket", "logs"]).is_some());
    assert_eq!(
        document.get(&["output", "arn", "value"]),
        Some(&Value::from("${aws_bucket.logs.arn}"))
    );
}

#[test]
fn stacks_are_separate_documents() {
    let (mut app, first) = app();
    let second = app.add_stack(app.root(), "Second").unwrap();
    app.add(first, "Resource1", bucket()).unwrap();
    app.add(second, "Resource1", bucket()).unwrap();

    let first = app.synth(first).unwrap();
    let second = app.synth(second).unwrap();

    assert_eq!(first.data(), second.data());
    assert_eq!(second.metadata().stack_name, "Second");
}
