use std::borrow::Cow;

use super::{Attribute, Namespace};

#[derive(Debug, Clone)]
enum Content<'a> {
    None,
    Text(Cow<'a, str>),
    Elements(Vec<Element<'a>>),
}

/// A builder-pattern XML element. Every mutator consumes and returns `self`
/// so a tree can be assembled with a single chained expression, matching the
/// shape the protocol engine constructs its SOAP bodies with.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    name: Cow<'a, str>,
    namespace: Option<Namespace<'a>>,
    namespace_declarations: Vec<(Cow<'a, str>, Option<Cow<'a, str>>)>,
    attributes: Vec<Attribute<'a>>,
    content: Content<'a>,
}

impl<'a> Element<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            namespace_declarations: Vec::new(),
            attributes: Vec::new(),
            content: Content::None,
        }
    }

    pub fn set_namespace(mut self, namespace: Namespace<'a>) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn set_namespace_optional(mut self, namespace: Option<Namespace<'a>>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Declares `xmlns:{alias}="{uri}"` (or the default namespace if `alias`
    /// is `None`) on this element; visible to this element and all of its
    /// descendants.
    pub fn add_namespace_declaration(
        mut self,
        uri: impl Into<Cow<'a, str>>,
        alias: Option<&'a str>,
    ) -> Self {
        self.namespace_declarations
            .push((uri.into(), alias.map(Cow::Borrowed)));
        self
    }

    pub fn add_attribute(mut self, attribute: Attribute<'a>) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn add_child(mut self, child: Element<'a>) -> Self {
        match &mut self.content {
            Content::Elements(children) => children.push(child),
            _ => self.content = Content::Elements(vec![child]),
        }
        self
    }

    pub fn add_children(mut self, children: impl IntoIterator<Item = Element<'a>>) -> Self {
        for child in children {
            self = self.add_child(child);
        }
        self
    }

    pub fn set_text(mut self, text: impl Into<Cow<'a, str>>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    pub fn with_text(&mut self, text: impl Into<Cow<'a, str>>) -> &mut Self {
        self.content = Content::Text(text.into());
        self
    }

    pub fn is_empty_tag(&self) -> bool {
        matches!(self.content, Content::None)
    }
}

/// Escapes the five XML-significant characters. The teacher's own builder
/// skips this (it is a demo-grade library); a client that serializes
/// caller-supplied command lines and script text cannot.
pub(crate) fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'&' | b'<' | b'>')) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

pub(crate) fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s
        .bytes()
        .any(|b| matches!(b, b'&' | b'<' | b'>' | b'"'))
    {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

pub(super) fn render(
    element: &Element<'_>,
    scope: &std::collections::HashMap<&str, Option<String>>,
    out: &mut String,
) {
    use std::fmt::Write as _;

    let mut scope = scope.clone();
    for (uri, alias) in &element.namespace_declarations {
        scope.insert(uri.as_ref(), alias.as_ref().map(|a| a.to_string()));
    }

    let qualified_name = match &element.namespace {
        Some(ns) => match scope.get(ns.uri) {
            Some(Some(alias)) => format!("{alias}:{}", element.name),
            Some(None) | None => element.name.to_string(),
        },
        None => element.name.to_string(),
    };

    let _ = write!(out, "<{qualified_name}");

    for (uri, alias) in &element.namespace_declarations {
        match alias {
            Some(alias) => {
                let _ = write!(out, r#" xmlns:{alias}="{uri}""#);
            }
            None => {
                let _ = write!(out, r#" xmlns="{uri}""#);
            }
        }
    }

    for attr in &element.attributes {
        let name = match &attr.namespace {
            Some(ns) => match scope.get(ns.uri) {
                Some(Some(alias)) => format!("{alias}:{}", attr.name),
                _ => attr.name.to_string(),
            },
            None => attr.name.to_string(),
        };
        let _ = write!(out, r#" {name}="{}""#, escape_attr(&attr.value));
    }

    match &element.content {
        Content::None => {
            let _ = write!(out, "/>");
        }
        Content::Text(text) => {
            let _ = write!(out, ">{}</{qualified_name}>", escape_text(text));
        }
        Content::Elements(children) => {
            let _ = write!(out, ">");
            for child in children {
                render(child, &scope, out);
            }
            let _ = write!(out, "</{qualified_name}>");
        }
    }
}
