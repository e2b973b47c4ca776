//! The WS-Addressing + WS-Management header block every request carries.
//!
//! Headers are modeled as an explicit tree (`HeaderElement`) rather than a
//! parallel attribute side-channel. `merge_headers` is then ordinary tree
//! composition: two header sets that name the same element union their
//! attributes rather than one clobbering the other, which is what keeps
//! every `mustUnderstand=true` flag alive through a merge.

use uuid::Uuid;

use crate::duration::to_operation_timeout;
use crate::namespaces::{Namespace, ANONYMOUS_ROLE};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAttribute {
    pub name: &'static str,
    pub namespace: Option<Namespace>,
    pub value: String,
}

impl HeaderAttribute {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            namespace: None,
            value: value.into(),
        }
    }

    pub fn must_understand(value: bool) -> Self {
        Self {
            name: "mustUnderstand",
            namespace: Some(Namespace::Soap12),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeaderElement {
    pub namespace: Namespace,
    pub name: &'static str,
    pub attributes: Vec<HeaderAttribute>,
    pub text: Option<String>,
    pub children: Vec<HeaderElement>,
}

impl HeaderElement {
    pub fn new(namespace: Namespace, name: &'static str) -> Self {
        Self {
            namespace,
            name,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: HeaderAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: HeaderElement) -> Self {
        self.children.push(child);
        self
    }

    fn key(&self) -> (Namespace, &'static str) {
        (self.namespace, self.name)
    }

    fn merge_with(&mut self, other: HeaderElement) {
        for attr in other.attributes {
            match self
                .attributes
                .iter_mut()
                .find(|existing| existing.name == attr.name && existing.namespace == attr.namespace)
            {
                // `true` always wins so a merge can never silently drop a
                // mustUnderstand flag either side set.
                Some(existing) if attr.value == "true" => existing.value = "true".to_string(),
                Some(_) => {}
                None => self.attributes.push(attr),
            }
        }
        if self.text.is_none() {
            self.text = other.text;
        }
        for child in other.children {
            merge_into(&mut self.children, child);
        }
    }

    pub fn into_element(self) -> xml::builder::Element<'static> {
        let mut element = xml::builder::Element::new(self.name).set_namespace(self.namespace.xml_namespace());
        for attr in self.attributes {
            let mut attribute = xml::builder::Attribute::new(attr.name, attr.value);
            if let Some(ns) = attr.namespace {
                attribute = attribute.set_namespace(ns.xml_namespace());
            }
            element = element.add_attribute(attribute);
        }
        if let Some(text) = self.text {
            element = element.set_text(text);
        } else if !self.children.is_empty() {
            element = element.add_children(self.children.into_iter().map(HeaderElement::into_element));
        }
        element
    }
}

fn merge_into(set: &mut Vec<HeaderElement>, element: HeaderElement) {
    match set.iter_mut().find(|existing| existing.key() == element.key()) {
        Some(existing) => existing.merge_with(element),
        None => set.push(element),
    }
}

/// Unions any number of header sets. Two elements that share a
/// `(namespace, name)` key have their attributes unioned rather than one
/// replacing the other (see module docs).
pub fn merge_headers(sets: impl IntoIterator<Item = Vec<HeaderElement>>) -> Vec<HeaderElement> {
    let mut merged = Vec::new();
    for set in sets {
        for element in set {
            merge_into(&mut merged, element);
        }
    }
    merged
}

/// Snapshot of the per-operation-mutable session settings needed to build a
/// header block.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    pub operation_timeout: Duration,
    pub max_envelope_size: u32,
    pub locale: String,
}

/// The header block every operation sends: `a:To`, `a:ReplyTo`,
/// `w:MaxEnvelopeSize`, `a:MessageID` (a fresh UUID, invariant 1),
/// `w:Locale`, `p:DataLocale`, `w:OperationTimeout`.
pub fn standard_headers(to: &str, message_id: Uuid, config: &HeaderConfig) -> Vec<HeaderElement> {
    let reply_to = HeaderElement::new(Namespace::Addressing, "ReplyTo")
        .with_attribute(HeaderAttribute::must_understand(true))
        .with_child(
            HeaderElement::new(Namespace::Addressing, "Address").with_text(ANONYMOUS_ROLE),
        );

    let message_id = format!("uuid:{}", message_id.to_string().to_uppercase());

    vec![
        HeaderElement::new(Namespace::Addressing, "To").with_text(to.to_string()),
        reply_to,
        HeaderElement::new(Namespace::DmtfWsman, "MaxEnvelopeSize")
            .with_attribute(HeaderAttribute::must_understand(true))
            .with_text(config.max_envelope_size.to_string()),
        HeaderElement::new(Namespace::Addressing, "MessageID").with_text(message_id),
        HeaderElement::new(Namespace::DmtfWsman, "Locale")
            .with_attribute(HeaderAttribute::must_understand(false))
            .with_attribute(HeaderAttribute::new("xml:lang", config.locale.clone())),
        HeaderElement::new(Namespace::MsWsman, "DataLocale")
            .with_attribute(HeaderAttribute::must_understand(false))
            .with_attribute(HeaderAttribute::new("xml:lang", config.locale.clone())),
        HeaderElement::new(Namespace::DmtfWsman, "OperationTimeout")
            .with_text(to_operation_timeout(config.operation_timeout)),
    ]
}

/// `w:ResourceURI` and `a:Action`, both `mustUnderstand=true`.
pub fn resource_and_action_headers(resource_uri: &str, action: &str) -> Vec<HeaderElement> {
    vec![
        HeaderElement::new(Namespace::DmtfWsman, "ResourceURI")
            .with_attribute(HeaderAttribute::must_understand(true))
            .with_text(resource_uri.to_string()),
        HeaderElement::new(Namespace::Addressing, "Action")
            .with_attribute(HeaderAttribute::must_understand(true))
            .with_text(action.to_string()),
    ]
}

/// `w:SelectorSet/w:Selector` with a `Name` attribute per selector (used for
/// `ShellId`, among others). Both the set and each individual selector carry
/// `mustUnderstand=true`.
pub fn selector_set_header(selectors: &[(&str, &str)]) -> Vec<HeaderElement> {
    let mut set = HeaderElement::new(Namespace::DmtfWsman, "SelectorSet")
        .with_attribute(HeaderAttribute::must_understand(true));
    for (name, value) in selectors {
        set = set.with_child(
            HeaderElement::new(Namespace::DmtfWsman, "Selector")
                .with_attribute(HeaderAttribute::must_understand(true))
                .with_attribute(HeaderAttribute::new("Name", name.to_string()))
                .with_text(value.to_string()),
        );
    }
    vec![set]
}

/// `w:OptionSet/w:Option` pairs (the `WINRS_*` shell/command options).
pub fn option_set_header(options: &[(&str, &str)]) -> Vec<HeaderElement> {
    let mut set = HeaderElement::new(Namespace::DmtfWsman, "OptionSet");
    for (name, value) in options {
        set = set.with_child(
            HeaderElement::new(Namespace::DmtfWsman, "Option")
                .with_attribute(HeaderAttribute::new("Name", name.to_string()))
                .with_text(value.to_string()),
        );
    }
    vec![set]
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn config() -> HeaderConfig {
        HeaderConfig {
            operation_timeout: Duration::from_secs(60),
            max_envelope_size: 153_600,
            locale: "en-US".to_string(),
        }
    }

    #[test]
    fn message_ids_are_fresh_and_well_formed() {
        let pattern = Regex::new(r"^uuid:[0-9A-F-]{36}$").unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let headers = standard_headers("http://x", Uuid::new_v4(), &config());
            let message_id = headers
                .iter()
                .find(|h| h.name == "MessageID")
                .unwrap()
                .text
                .clone()
                .unwrap();
            assert!(pattern.is_match(&message_id), "{message_id}");
            assert!(seen.insert(message_id));
        }
    }

    #[test]
    fn merge_preserves_must_understand_from_either_side() {
        let a = vec![
            HeaderElement::new(Namespace::DmtfWsman, "OptionSet")
                .with_attribute(HeaderAttribute::must_understand(true)),
        ];
        let b = vec![HeaderElement::new(Namespace::DmtfWsman, "OptionSet")];

        let merged = merge_headers([a, b]);
        let option_set = merged.iter().find(|h| h.name == "OptionSet").unwrap();
        let must_understand = option_set
            .attributes
            .iter()
            .find(|attr| attr.name == "mustUnderstand")
            .unwrap();
        assert_eq!(must_understand.value, "true");
    }

    #[test]
    fn merge_is_commutative_for_must_understand() {
        let a = vec![HeaderElement::new(Namespace::DmtfWsman, "OptionSet")];
        let b = vec![
            HeaderElement::new(Namespace::DmtfWsman, "OptionSet")
                .with_attribute(HeaderAttribute::must_understand(true)),
        ];

        let merged = merge_headers([a, b]);
        let option_set = merged.iter().find(|h| h.name == "OptionSet").unwrap();
        assert!(
            option_set
                .attributes
                .iter()
                .any(|attr| attr.name == "mustUnderstand" && attr.value == "true")
        );
    }
}
