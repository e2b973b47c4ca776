//! A lightweight XML document builder. Assembles a tree of [`Element`]s and
//! renders it to a UTF-8 string; this is the only place in the workspace
//! that emits raw XML.

mod attribute;
mod declaration;
mod element;
mod namespace;

pub use attribute::Attribute;
pub use declaration::Declaration;
pub use element::Element;
pub use namespace::Namespace;

use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum XmlBuilderError {
    #[error("io error: {0}")]
    Io(#[from] std::fmt::Error),
}

/// Pairs an optional XML declaration with a root element and renders both to
/// a string.
pub struct Builder<'a> {
    declaration: Option<Declaration<'a>>,
    root: Element<'a>,
}

impl<'a> Builder<'a> {
    pub fn new(declaration: Option<Declaration<'a>>, root: Element<'a>) -> Self {
        Self { declaration, root }
    }

    pub fn to_xml_string(&self) -> Result<String, XmlBuilderError> {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str(&decl.to_string());
            out.push(' ');
        }
        element::render(&self.root, &HashMap::new(), &mut out);
        Ok(out)
    }
}
