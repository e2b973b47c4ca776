//! The transport capability and its three variants: a capability/interface
//! with three implementations injected into the session, rather than the
//! source's tagged runtime dispatch — this makes each variant independently
//! testable against the envelope builder via a fake.

pub mod kerberos;
pub mod plaintext;
pub mod tls;

use crate::error::WinRmError;

/// `send_request(envelope_xml) -> response_document`. Implementations own
/// authentication, `Content-Type`, and TLS verification; they return the raw
/// response body, which the caller parses into a document itself (the
/// engine that owns the parser also owns the document's borrow).
///
/// HTTP-level failure (connection refused, timeout, non-2xx without a SOAP
/// body) surfaces as `WinRmError::Transport`, distinct from a SOAP Fault
/// (which is a successful HTTP exchange carrying a fault body, handled by
/// the protocol engine's fault parser).
pub trait Transport: Send {
    fn send_request(&mut self, envelope_xml: &str) -> Result<String, WinRmError>;
}

pub(crate) const CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// A WS-Man SOAP Fault rides back on an HTTP 500, which `ureq` surfaces as
/// `Err(ureq::Error::Status(..))` by default. The fault parser needs that
/// body, so a non-2xx status is only a transport error here if it carries no
/// body at all; otherwise the body is handed upstream for the fault parser
/// to look at — HTTP failure proper, not a successful exchange carrying a
/// fault.
pub(crate) fn read_body_even_on_soap_fault_status(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<String, WinRmError> {
    match result {
        Ok(response) => response.into_string().map_err(WinRmError::transport),
        Err(ureq::Error::Status(_, response)) => {
            response.into_string().map_err(WinRmError::transport)
        }
        Err(err @ ureq::Error::Transport(_)) => Err(WinRmError::transport(err)),
    }
}
