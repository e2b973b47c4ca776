//! The command-output pump: loops Receive calls, decodes base64 streams,
//! detects `CommandState=Done`, aggregates the exit code.
//!
//! Rewritten as an explicit loop rather than the source's recursive
//! `get_command_output` (unbounded recursion risk, clearer iterative
//! aggregation), and the source's block/yield callback is an injected sink
//! closure instead (same "one invocation per non-empty chunk, in arrival
//! order" semantics).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winrm_protocol::operations::StreamName;

use crate::error::WinRmError;
use crate::ids::{CommandId, ShellId};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl From<StreamName> for StreamKind {
    fn from(name: StreamName) -> Self {
        match name {
            StreamName::Stdout => StreamKind::Stdout,
            StreamName::Stderr => StreamKind::Stderr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub stream: StreamKind,
    pub bytes: Vec<u8>,
}

/// Every chunk a pump produced, in arrival order, plus the exit code once the
/// command reaches `Done`.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub data: Vec<StreamChunk>,
    pub exit_code: Option<i32>,
}

/// A cheaply-cloned flag a caller can share with a running [`pump_command_output`]
/// to ask it to stop. Checked between Receive rounds, not mid-flight — the pump
/// never abandons a Receive it has already sent.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drains a running command's output. `sink`, when given, is called once per
/// non-empty chunk in arrival order — the same chunks also land in the
/// returned aggregate's `data`.
///
/// Tolerates a Receive response with zero new chunks and no Done: the server
/// may legitimately answer empty during a long-running command; the pump
/// simply issues another Receive rather than treating that as an error or
/// busy-spinning (it relies on the server's own blocking semantics to pace
/// the loop).
///
/// If `cancel` is given and becomes set while the pump is between Receive
/// rounds, the pump stops issuing further Receives, makes a best-effort
/// `signal_terminate` call (its result is discarded — the cancellation is
/// what the caller asked for, not the cleanup's success), and returns
/// `WinRmError::Cancelled`.
pub fn pump_command_output(
    session: &mut Session,
    shell_id: &ShellId,
    command_id: &CommandId,
    cancel: Option<&CancelHandle>,
    mut sink: Option<&mut dyn FnMut(&StreamChunk)>,
) -> Result<CommandOutput, WinRmError> {
    let mut output = CommandOutput::default();

    loop {
        if cancel.is_some_and(CancelHandle::is_cancelled) {
            let _ = session.signal_terminate(shell_id, command_id);
            return Err(WinRmError::Cancelled(
                "cancelled while draining command output".to_string(),
            ));
        }

        let result = session.receive(shell_id, command_id)?;

        for chunk in result.chunks {
            let chunk = StreamChunk {
                stream: chunk.stream.into(),
                bytes: chunk.bytes,
            };
            if let Some(sink) = sink.as_deref_mut() {
                sink(&chunk);
            }
            output.data.push(chunk);
        }

        if result.done {
            output.exit_code = result.exit_code;
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;

    fn receive_response(body: &str) -> String {
        format!(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                              xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
                 <env:Body><rsp:ReceiveResponse>{body}</rsp:ReceiveResponse></env:Body>
               </env:Envelope>"#
        )
    }

    #[test]
    fn pump_aggregates_chunks_in_order_and_stops_at_done() {
        let first = receive_response(&format!(
            r#"<rsp:Stream Name="stdout">{}</rsp:Stream>"#,
            BASE64.encode("hello\n")
        ));
        let second = receive_response(&format!(
            r#"<rsp:Stream Name="stderr">{}</rsp:Stream>
               <rsp:CommandState State="http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done">
                 <rsp:ExitCode>2</rsp:ExitCode>
               </rsp:CommandState>"#,
            BASE64.encode("oops\n")
        ));

        let transport = FakeTransport::new([first, second]);
        let mut session = Session::new("http://target:5985/wsman", Box::new(transport));

        let mut observed = Vec::new();
        let mut sink = |chunk: &StreamChunk| observed.push(chunk.clone());
        let output = pump_command_output(
            &mut session,
            &ShellId::new("ABC-123"),
            &CommandId::new("CMD-1"),
            None,
            Some(&mut sink),
        )
        .unwrap();

        assert_eq!(output.data.len(), 2);
        assert_eq!(output.data[0].stream, StreamKind::Stdout);
        assert_eq!(output.data[0].bytes, b"hello\n");
        assert_eq!(output.data[1].stream, StreamKind::Stderr);
        assert_eq!(output.data[1].bytes, b"oops\n");
        assert_eq!(output.exit_code, Some(2));
        assert_eq!(observed.len(), 2);
    }

    #[test]
    fn an_empty_receive_with_no_done_loops_instead_of_erroring() {
        let empty = receive_response("");
        let done = receive_response(
            r#"<rsp:CommandState State="http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done">
                 <rsp:ExitCode>0</rsp:ExitCode>
               </rsp:CommandState>"#,
        );
        let transport = FakeTransport::new([empty, done]);
        let mut session = Session::new("http://target:5985/wsman", Box::new(transport));

        let output = pump_command_output(&mut session, &ShellId::new("S"), &CommandId::new("C"), None, None).unwrap();
        assert!(output.data.is_empty());
        assert_eq!(output.exit_code, Some(0));
    }

    #[test]
    fn a_cancel_handle_set_before_the_next_round_stops_the_pump_and_signals_terminate() {
        let first = receive_response(&format!(
            r#"<rsp:Stream Name="stdout">{}</rsp:Stream>"#,
            BASE64.encode("still running\n")
        ));
        let signal_ack =
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body/></env:Envelope>"#
                .to_string();
        let transport = FakeTransport::new([first, signal_ack]);
        let mut session = Session::new("http://target:5985/wsman", Box::new(transport));

        let cancel = CancelHandle::new();
        let mut rounds = 0;
        let mut sink = |_chunk: &StreamChunk| {
            rounds += 1;
            cancel.cancel();
        };
        let err = pump_command_output(
            &mut session,
            &ShellId::new("ABC-123"),
            &CommandId::new("CMD-1"),
            Some(&cancel),
            Some(&mut sink),
        )
        .unwrap_err();

        assert_eq!(rounds, 1);
        assert!(matches!(err, WinRmError::Cancelled(_)));
    }
}
