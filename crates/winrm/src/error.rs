//! The crate's error kinds, each with its own propagation rule: `Transport`
//! and `SoapFault` carry their cause/fault through unmodified, `Protocol`
//! and `BadArgument` are fatal/pre-send checks, and `Cancelled` is what
//! `pump::pump_command_output` returns when a caller-supplied
//! `CancelHandle` fires mid-drain.

use winrm_protocol::fault::WsManFault;
use winrm_protocol::operations::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum WinRmError {
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error(transparent)]
    SoapFault(#[from] WsManFault),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid argument: {0}")]
    BadArgument(String),

    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl WinRmError {
    pub fn transport(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(source))
    }
}
