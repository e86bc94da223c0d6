//! Template types for typed variable injection.

use std::marker::PhantomData;

/// A set of placeholder substitutions for one template.
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Embedded text paired with the variables it expects.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _vars: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _vars: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}
