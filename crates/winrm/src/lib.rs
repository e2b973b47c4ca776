//! A WS-Management (WinRM) client: open a remote Windows shell over
//! HTTP(S), run commands or PowerShell, stream output back, and query WMI
//! over WQL.
//!
//! The protocol engine proper (envelope/header assembly, fault parsing,
//! response decoding) lives in `winrm-protocol`, kept free of I/O; this
//! crate wires it to a [`transport`] and a [`Session`] facade. See
//! [`composite::run_cmd`] and [`composite::run_powershell`] for the common
//! case, or drive [`Session`]'s operation methods directly for finer
//! control.

pub mod composite;
pub mod config;
pub mod creds;
pub mod error;
pub mod ids;
pub mod pump;
pub mod session;
pub mod transport;

pub use composite::{encode_powershell_command, run_cmd, run_powershell};
pub use config::SessionConfig;
pub use creds::TransportCreds;
pub use error::WinRmError;
pub use ids::{CommandId, ShellId};
pub use pump::{pump_command_output, CancelHandle, CommandOutput, StreamChunk, StreamKind};
pub use session::Session;
pub use transport::kerberos::KerberosTransport;
pub use transport::plaintext::PlaintextTransport;
pub use transport::tls::TlsTransport;
pub use transport::Transport;
