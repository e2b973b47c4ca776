//! A small, self-contained XML document builder plus a thin read-side wrapper
//! around [`roxmltree`]. The winrm crates treat this as an external DOM/XPath
//! dependency: construction goes through [`builder::Element`], parsing goes
//! through [`query`] helpers over a `roxmltree::Document`.

pub mod builder;
pub mod query;

pub use roxmltree;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("missing expected element: {0}")]
    MissingElement(String),

    #[error("missing expected attribute '{attr}' on <{tag}>")]
    MissingAttribute { tag: String, attr: String },

    #[error("invalid xml: {0}")]
    Invalid(String),
}
