//! The WS-Management protocol engine: SOAP envelope construction and
//! response extraction, with no I/O of its own. A caller (the `winrm` crate)
//! owns the transport and drives these functions with whatever response
//! documents it gets back.

pub mod duration;
pub mod envelope;
pub mod fault;
pub mod header;
pub mod namespaces;
pub mod operations;

pub use header::merge_headers;
pub use namespaces::Namespace;
