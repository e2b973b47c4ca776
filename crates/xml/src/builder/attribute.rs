use std::borrow::Cow;

use super::Namespace;

#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    pub(crate) name: Cow<'a, str>,
    pub(crate) value: Cow<'a, str>,
    pub(crate) namespace: Option<Namespace<'a>>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace: None,
        }
    }

    pub fn new_with_namespace(
        name: impl Into<Cow<'a, str>>,
        value: impl Into<Cow<'a, str>>,
        namespace: Option<Namespace<'a>>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace,
        }
    }

    pub fn set_namespace(mut self, namespace: Namespace<'a>) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}
