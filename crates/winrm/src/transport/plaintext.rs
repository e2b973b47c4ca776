//! NTLM-like plaintext Basic auth over plain HTTP (`TransportCreds::Plaintext`).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::instrument;

use super::{Transport, CONTENT_TYPE};
use crate::error::WinRmError;

pub struct PlaintextTransport {
    endpoint: String,
    agent: ureq::Agent,
    authorization: String,
}

impl PlaintextTransport {
    pub fn new(endpoint: impl Into<String>, username: &str, password: &str) -> Self {
        let credentials = BASE64.encode(format!("{username}:{password}"));
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().build(),
            authorization: format!("Basic {credentials}"),
        }
    }
}

impl Transport for PlaintextTransport {
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
