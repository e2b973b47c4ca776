//! `TransportCreds`: which of the three transport variants a session
//! authenticates with, and the material each one needs.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum TransportCreds {
    /// Kerberos/SPNEGO over plain HTTP (port 5985 by default).
    ///
    /// `keytab_path` is accepted so callers can name a keytab on disk, but
    /// credential acquisition currently goes through `username`/`password`
    /// only — `sspi`'s pure-Rust Kerberos provider does not yet expose a
    /// keytab-based acquisition path the way MIT krb5 does.
    Kerberos {
        realm: String,
        service_principal: String,
        username: String,
        password: String,
        keytab_path: Option<PathBuf>,
    },
    /// NTLM-like plaintext Basic auth over plain HTTP. Only sensible on a
    /// trusted network — the password goes over the wire unencrypted.
    Plaintext { username: String, password: String },
    /// Basic auth over TLS (port 5986 by default).
    Tls {
        username: String,
        password: String,
        ca_trust_path: Option<PathBuf>,
    },
}
