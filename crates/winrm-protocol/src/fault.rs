//! SOAP Fault recognition.
//!
//! A response is a fault iff `env:Body/env:Fault` is non-empty; in that case
//! the WS-Management-specific detail carries a `WSManFault` element with a
//! `Code` attribute and a human-readable message in its nested `Message`
//! text, which is what callers actually want surfaced.

use tracing::warn;
use xml::query;
use xml::roxmltree::Document;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("WS-Management fault {code}: {message}")]
pub struct WsManFault {
    pub code: String,
    pub message: String,
}

/// Inspects a parsed response document for `env:Fault`. Returns `Ok(())` if
/// there is none, `Err(WsManFault)` if there is.
pub fn check_fault(document: &Document<'_>) -> Result<(), WsManFault> {
    let Some(fault) = query::find_descendant(document.root_element(), "Fault") else {
        return Ok(());
    };

    let code = query::find_descendant(fault, "WSManFault")
        .and_then(|node| node.attribute("Code"))
        .map(str::to_string)
        .or_else(|| query::find_descendant(fault, "Value").map(|n| query::text(n).to_string()))
        .unwrap_or_else(|| {
            warn!("env:Fault had no WSManFault/@Code or Value element; using \"unknown\"");
            "unknown".to_string()
        });

    let message = query::find_descendant(fault, "Message")
        .map(|n| query::text(n).to_string())
        .or_else(|| query::find_descendant(fault, "Text").map(|n| query::text(n).to_string()))
        .unwrap_or_else(|| query::text(fault).to_string());

    Err(WsManFault { code, message })
}
