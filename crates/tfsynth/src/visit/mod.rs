//! Walking [Value](crate::value::Value) trees
mod visit_references;
pub use visit_references::VisitReferencesMut;

/// Receives each visited subject mutably
pub trait VisitMut<T> {
    fn visit_mut(&mut self, value: &mut T);
}

// closures are visitors too
impl<T, F> VisitMut<T> for F
where
    F: FnMut(&mut T),
{
    fn visit_mut(&mut self, value: &mut T) {
        self(value)
    }
}
