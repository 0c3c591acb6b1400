use super::VisitMut;
use crate::value::{Map, Value};

/// Recursively visit all [Value::Reference]s and [Value::Template]s mutably
///
/// The visitor receives the whole [Value] so it can replace the token in place.
pub trait VisitReferencesMut {
    fn visit_references_mut(&mut self, visitor: &mut dyn VisitMut<Value>);
}

impl VisitReferencesMut for Value {
    fn visit_references_mut(&mut self, visitor: &mut dyn VisitMut<Value>) {
        match self {
            Value::Reference(_) | Value::Template(_) => visitor.visit_mut(self),
            Value::Array(array) => {
                for value in array {
                    value.visit_references_mut(visitor);
                }
            }
            Value::Object(object) => object.visit_references_mut(visitor),
            Value::Null
            | Value::Boolean(_)
            | Value::Integer(_)
            | Value::Decimal(_)
            | Value::String(_) => {}
        }
    }
}

impl VisitReferencesMut for Map {
    fn visit_references_mut(&mut self, visitor: &mut dyn VisitMut<Value>) {
        for value in self.values_mut() {
            value.visit_references_mut(visitor);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reference::Reference;
    use pretty_assertions::assert_eq;

    #[test]
    fn visits_nested_references() {
        let mut value: Value = serde_json::json!({ "a": [null, {}], "b": "plain" }).into();
        let map = value.as_object_mut().unwrap();
        map.insert("c".into(), Reference::new("Stack/Module", "version").into());
        if let Value::Array(array) = &mut map["a"] {
            array[1] = Reference::node("Stack/Other").into();
        }

        let mut seen = vec![];
        value.visit_references_mut(&mut |value: &mut Value| {
            if let Value::Reference(reference) = value {
                seen.push(reference.target().to_string());
            }
            *value = Value::String("resolved".into());
        });

        let expected: Value =
            serde_json::json!({ "a": [null, "resolved"], "b": "plain", "c": "resolved" }).into();
        assert_eq!(seen, vec!["Stack/Other", "Stack/Module"]);
        assert_eq!(value, expected);
    }
}
