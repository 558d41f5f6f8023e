//! Templates with typed placeholder substitution.

use std::marker::PhantomData;

/// A set of values substituted into one template.
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Placeholders that take no values.
impl TemplateVars for () {
    fn apply(&self, content: &str) -> String {
        content.to_string()
    }
}

/// Embedded text whose placeholders are filled by `V`.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}
