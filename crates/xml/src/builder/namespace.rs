/// A namespace URI. Two namespaces are equal iff their URIs are equal; the
/// alias used on the wire is decided by the element/attribute that declares
/// it, not by the namespace value itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace<'a> {
    pub uri: &'a str,
}

impl<'a> Namespace<'a> {
    pub fn new(uri: &'a str) -> Self {
        Self { uri }
    }
}

impl<'a> From<&'a str> for Namespace<'a> {
    fn from(uri: &'a str) -> Self {
        Namespace::new(uri)
    }
}

impl std::fmt::Display for Namespace<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}
