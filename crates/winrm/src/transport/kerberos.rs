//! Kerberos/SPNEGO (Negotiate) over plain HTTP (`TransportCreds::Kerberos`).
//!
//! Grounded on the teacher's `ironposh-client-core::connector::authenticator`
//! SSPI driving (the `SspiContext`/`SspiAuthenticator`/`Generator` machinery)
//! and `ironposh-client-sync::kerberos` (the raw length-prefixed TCP exchange
//! with the KDC). The teacher's version suspends the generator across an
//! async/hyper request loop; this transport is synchronous end to end, so
//! the generator is driven to completion in a plain loop instead of being
//! handed back to a caller between HTTP round trips.

use std::io::{Read, Write};
use std::net::TcpStream;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteorder::{BigEndian, ReadBytesExt};
use sspi::builders::{
    InitializeSecurityContext, WithContextRequirements, WithCredentialsHandle, WithOutput,
    WithTargetDataRepresentation,
};
use sspi::generator::GeneratorState;
use sspi::{
    AuthIdentity, BufferType, ClientRequestFlags, CredentialUse, Credentials, DataRepresentation,
    Error as SspiError, InitializeSecurityContextResult, Negotiate, NegotiateConfig, NetworkProtocol,
    NetworkRequest, SecurityBuffer, SecurityStatus, Sspi, SspiImpl, Username,
};
use tracing::instrument;

use super::{Transport, CONTENT_TYPE};
use crate::error::WinRmError;

type SecurityContextBuilder<'a> = InitializeSecurityContext<
    'a,
    <Negotiate as SspiImpl>::CredentialsHandle,
    WithCredentialsHandle,
    WithContextRequirements,
    WithTargetDataRepresentation,
    WithOutput,
>;

pub struct KerberosTransport {
    endpoint: String,
    agent: ureq::Agent,
    provider: Negotiate,
    cred: Box<<Negotiate as SspiImpl>::CredentialsHandle>,
    target_name: String,
    last_token: Vec<u8>,
}

impl KerberosTransport {
    pub fn new(
        endpoint: impl Into<String>,
        realm: &str,
        service_principal: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, WinRmError> {
        let mut provider = Negotiate::new_client(NegotiateConfig::default()).map_err(WinRmError::transport)?;
        let identity = AuthIdentity {
            username: Username::new(username, Some(realm)).map_err(WinRmError::transport)?,
            password: password.to_string().into(),
        };
        let credentials = Credentials::AuthIdentity(identity);
        let cred = provider
            .acquire_credentials_handle()
            .with_credential_use(CredentialUse::Outbound)
            .with_auth_data(&credentials)
            .execute(&mut provider)
            .map_err(WinRmError::transport)?
            .credentials_handle;

        let target_name = if service_principal.starts_with("HTTP/") {
            service_principal.to_string()
        } else {
            format!("HTTP/{service_principal}")
        };

        Ok(Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().build(),
            provider,
            cred: Box::new(cred),
            target_name,
            last_token: Vec::new(),
        })
    }

    /// Runs one `InitializeSecurityContext` round, driving any KDC network
    /// requests the generator suspends on to completion synchronously.
    fn init_sec_context_round(
        &mut self,
        input_token: Option<Vec<u8>>,
    ) -> Result<InitializeSecurityContextResult, WinRmError> {
        let mut out = [SecurityBuffer::new(Vec::new(), BufferType::Token)];
        let mut inbuf = input_token.map(|token| [SecurityBuffer::new(token, BufferType::Token)]);

        let mut builder: SecurityContextBuilder = self
            .provider
            .initialize_security_context()
            .with_credentials_handle(&mut *self.cred)
            .with_context_requirements(ClientRequestFlags::ALLOCATE_MEMORY | ClientRequestFlags::MUTUAL_AUTH)
            .with_target_data_representation(DataRepresentation::Native)
            .with_target_name(&self.target_name)
            .with_output(&mut out);

        if let Some(input_buffer) = &mut inbuf {
            builder = builder.with_input(input_buffer);
        }

        let mut generator = self
            .provider
            .initialize_security_context_impl(&mut builder)
            .map_err(WinRmError::transport)?;

        let mut state = generator.start();
        let result = loop {
            match state {
                GeneratorState::Completed(result) => break result.map_err(WinRmError::transport)?,
                GeneratorState::Suspended(request) => {
                    let response = send_kdc_packet(request)?;
                    state = generator.resume(Ok(response));
                }
            }
        };

        self.last_token = std::mem::take(&mut out[0].buffer);
        Ok(result)
    }
}

/// Sends one Negotiate packet to the KDC over TCP and returns its raw
/// response bytes, length-prefix included (matching what `sspi`'s generator
/// expects back).
#[instrument(skip(request), fields(protocol = ?request.protocol, url = %request.url))]
fn send_kdc_packet(request: NetworkRequest) -> Result<Vec<u8>, WinRmError> {
    match request.protocol {
        NetworkProtocol::Tcp => send_tcp_packet(request),
        other => Err(WinRmError::transport(SspiError::new(
            sspi::ErrorKind::UnsupportedFunction,
            format!("unsupported KDC transport protocol: {other:?}"),
        ))),
    }
}

fn send_tcp_packet(request: NetworkRequest) -> Result<Vec<u8>, WinRmError> {
    let host = request
        .url
        .host_str()
        .ok_or_else(|| WinRmError::BadArgument("KDC URL has no host".to_string()))?;
    let port = request
        .url
        .port()
        .ok_or_else(|| WinRmError::BadArgument("KDC URL has no port".to_string()))?;

    let mut stream = TcpStream::connect((host, port)).map_err(WinRmError::transport)?;
    stream.write_all(&request.data).map_err(WinRmError::transport)?;
    stream.flush().map_err(WinRmError::transport)?;

    let response_len = stream.read_u32::<BigEndian>().map_err(WinRmError::transport)?;
    let mut response = vec![0u8; response_len as usize + 4];
    response[..4].copy_from_slice(&response_len.to_be_bytes());
    stream
        .read_exact(&mut response[4..])
        .map_err(WinRmError::transport)?;
    Ok(response)
}

fn token_header_from(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        None
    } else {
        Some(format!("Negotiate {}", BASE64.encode(bytes)))
    }
}

/// Parses `WWW-Authenticate: Negotiate <b64>` case-insensitively.
fn parse_negotiate_token(response: &ureq::Response) -> Option<Vec<u8>> {
    response
        .headers_names()
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case("www-authenticate"))
        .and_then(|name| response.header(&name))
        .and_then(|value| {
            value
                .strip_prefix("Negotiate ")
                .or_else(|| value.strip_prefix("negotiate "))
        })
        .and_then(|token| BASE64.decode(token.trim()).ok())
}

impl Transport for KerberosTransport {
    #[instrument(skip(self, envelope_xml), fields(endpoint = %self.endpoint))]
    fn send_request(&mut self, envelope_xml: &str) -> Result<String, WinRmError> {
        let mut input_token = None;
        loop {
            let result = self.init_sec_context_round(input_token.take())?;
            let token = token_header_from(&self.last_token);

            match result.status {
                SecurityStatus::ContinueNeeded => {
                    let token = token.ok_or_else(|| {
                        WinRmError::transport(SspiError::new(
                            sspi::ErrorKind::InternalError,
                            "SSPI ContinueNeeded but no token produced",
                        ))
                    })?;
                    let response = self
                        .agent
                        .post(&self.endpoint)
                        .set("Content-Type", CONTENT_TYPE)
                        .set("Authorization", &token)
                        .send_string("")
                        .map_err(WinRmError::transport)?;
                    input_token = parse_negotiate_token(&response);
                }
                SecurityStatus::Ok => {
                    let mut request = self
                        .agent
                        .post(&self.endpoint)
                        .set("Content-Type", CONTENT_TYPE);
                    if let Some(token) = &token {
                        request = request.set("Authorization", token);
                    }
                    return super::read_body_even_on_soap_fault_status(
                        request.send_string(envelope_xml),
                    );
                }
                other => {
                    return Err(WinRmError::transport(SspiError::new(
                        sspi::ErrorKind::InternalError,
                        format!("unexpected SSPI status: {other:?}"),
                    )))
                }
            }
        }
    }
}
