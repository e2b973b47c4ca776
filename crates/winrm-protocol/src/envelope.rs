//! Assembles a full `env:Envelope` (header block + body) into a rendered XML
//! string, and declares the fixed namespace/alias table on the root element.

use xml::builder::{Builder, Element};

use crate::header::HeaderElement;
use crate::namespaces::Namespace;

/// Builds `<env:Envelope>...<env:Header>...</env:Header><env:Body>...</env:Body></env:Envelope>`.
///
/// `body` is `None` for operations with an empty body (e.g. `Delete`).
pub fn build_envelope(headers: Vec<HeaderElement>, body: Option<Element<'static>>) -> String {
    let mut header_element = Element::new("Header").set_namespace(Namespace::Soap12.xml_namespace());
    header_element = header_element.add_children(headers.into_iter().map(HeaderElement::into_element));

    let mut body_element = Element::new("Body").set_namespace(Namespace::Soap12.xml_namespace());
    if let Some(body) = body {
        body_element = body_element.add_child(body);
    }

    let mut envelope = Element::new("Envelope").set_namespace(Namespace::Soap12.xml_namespace());
    for namespace in Namespace::all() {
        envelope = envelope.add_namespace_declaration(namespace.uri(), Some(namespace.alias()));
    }
    envelope = envelope.add_child(header_element).add_child(body_element);

    Builder::new(None, envelope)
        .to_xml_string()
        .expect("rendering a Vec<char>-backed String buffer never fails")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::to_operation_timeout;
    use crate::header::{standard_headers, HeaderConfig};
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn empty_body_renders_self_closing_body_element() {
        let config = HeaderConfig {
            operation_timeout: Duration::from_secs(60),
            max_envelope_size: 153_600,
            locale: "en-US".to_string(),
        };
        let headers = standard_headers("http://target", Uuid::new_v4(), &config);
        let xml = build_envelope(headers, None);
        assert!(xml.contains("<env:Body/>"));
        assert!(xml.contains(&to_operation_timeout(Duration::from_secs(60))));
    }

    #[test]
    fn declares_every_fixed_namespace_alias_on_the_root() {
        let xml = build_envelope(Vec::new(), None);
        for namespace in Namespace::all() {
            assert!(xml.contains(&format!(r#"xmlns:{}="{}""#, namespace.alias(), namespace.uri())));
        }
    }
}
