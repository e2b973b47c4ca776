//! Read-side helpers over [`roxmltree`]. This is the "DOM with XPath 1.0
//! evaluation, namespace-aware, plus a to-hash utility" contract the protocol
//! engine is written against: a handful of descendant/attribute lookups, not
//! a general query language, because the engine only ever needs to find a
//! small fixed set of well-known elements in a WS-Management response.

use std::collections::BTreeMap;

use roxmltree::Node;

/// Returns the first descendant (in document order, `node` itself included)
/// whose local name matches `name`, regardless of namespace prefix.
pub fn find_descendant<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Returns every descendant whose local name matches `name`, in document
/// order.
pub fn find_descendants<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Returns the first descendant whose local name matches `name` and which
/// carries an attribute `attr_name=attr_value`.
pub fn find_descendant_with_attribute<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &str,
    attr_name: &str,
    attr_value: &str,
) -> Option<Node<'a, 'input>> {
    find_descendants(node, name).find(|n| n.attribute(attr_name) == Some(attr_value))
}

/// The trimmed direct text content of a node, or `""` if it has none.
pub fn text(node: Node<'_, '_>) -> &str {
    node.text().unwrap_or("").trim()
}

/// Turns an element's attributes plus its direct-child elements' text content
/// into a flat string map, used to normalize WQL/Enumerate result items into
/// caller-friendly records.
pub fn to_record(node: Node<'_, '_>) -> BTreeMap<String, String> {
    let mut record = BTreeMap::new();
    for attr in node.attributes() {
        record.insert(attr.name().to_string(), attr.value().to_string());
    }
    for child in node.children().filter(|c| c.is_element()) {
        record.insert(child.tag_name().name().to_string(), text(child).to_string());
    }
    record
}
