//! Basic auth over TLS (`TransportCreds::Tls`). Verification is against the
//! configured CA trust path when given, or the platform trust store
//! otherwise — `native-tls`, same as the teacher's sync client.

use std::fs;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::instrument;

use super::{Transport, CONTENT_TYPE};
use crate::error::WinRmError;

pub struct TlsTransport {
    endpoint: String,
    agent: ureq::Agent,
    authorization: String,
}

impl TlsTransport {
    pub fn new(
        endpoint: impl Into<String>,
        username: &str,
        password: &str,
        ca_trust_path: Option<&std::path::Path>,
    ) -> Result<Self, WinRmError> {
        let mut builder = native_tls::TlsConnector::builder();
        if let Some(path) = ca_trust_path {
            let pem = fs::read(path).map_err(WinRmError::transport)?;
            let cert = native_tls::Certificate::from_pem(&pem).map_err(WinRmError::transport)?;
            builder.add_root_certificate(cert);
        }
        let connector = builder.build().map_err(WinRmError::transport)?;

        let credentials = BASE64.encode(format!("{username}:{password}"));
        Ok(Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new()
                .tls_connector(Arc::new(connector))
                .build(),
            authorization: format!("Basic {credentials}"),
        })
    }
}

impl Transport for TlsTransport {
    #[instrument(skip(self, envelope_xml), fields(endpoint = %self.endpoint))]
    fn send_request(&mut self, envelope_xml: &str) -> Result<String, WinRmError> {
        super::read_body_even_on_soap_fault_status(
            self.agent
                .post(&self.endpoint)
                .set("Content-Type", CONTENT_TYPE)
                .set("Authorization", &self.authorization)
                .send_string(envelope_xml),
        )
    }
}
