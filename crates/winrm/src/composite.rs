//! Composite flows: `run_cmd` and `run_powershell` compose
//! open→run→drain→signal-terminate→delete, with cleanup running on every
//! exit path (a scoped-acquisition pattern rather than Drop-based RAII,
//! since the cleanup calls are themselves fallible I/O and `Drop` cannot
//! propagate a `Result`).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::WinRmError;
use crate::ids::{CommandId, ShellId};
use crate::pump::{pump_command_output, CancelHandle, CommandOutput, StreamChunk};
use crate::session::Session;

/// Opens a shell, runs `body`, and closes the shell on every exit path.
/// `body`'s error takes precedence over a cleanup failure; if `body`
/// succeeds, a cleanup failure is what's surfaced, since there is nothing
/// else to report.
pub fn with_shell<T>(
    session: &mut Session,
    input_streams: &str,
    output_streams: &str,
    body: impl FnOnce(&mut Session, &ShellId) -> Result<T, WinRmError>,
) -> Result<T, WinRmError> {
    let shell_id = session.open_shell(input_streams, output_streams)?;
    let result = body(session, &shell_id);
    let cleanup = session.close_shell(&shell_id);
    match result {
        Ok(value) => cleanup.map(|()| value),
        Err(err) => Err(err),
    }
}

/// Runs `command`, runs `body` with its `CommandId`, and signals termination
/// on every exit path. Same precedence rule as [`with_shell`].
pub fn with_command<T>(
    session: &mut Session,
    shell_id: &ShellId,
    command: &str,
    args: &[String],
    body: impl FnOnce(&mut Session, &ShellId, &CommandId) -> Result<T, WinRmError>,
) -> Result<T, WinRmError> {
    let command_id = session.run_command(shell_id, command, args)?;
    let result = body(session, shell_id, &command_id);
    let cleanup = session.signal_terminate(shell_id, &command_id);
    match result {
        Ok(value) => cleanup.map(|()| value),
        Err(err) => Err(err),
    }
}

/// `open_shell → run_command → pump → signal_terminate → close_shell`.
/// `cancel`, if given, is forwarded to the pump (see
/// [`crate::pump::pump_command_output`]); the shell and command cleanup
/// calls still run even when the pump comes back `Cancelled`.
pub fn run_cmd(
    session: &mut Session,
    command: &str,
    args: &[String],
    cancel: Option<&CancelHandle>,
    sink: Option<&mut dyn FnMut(&StreamChunk)>,
) -> Result<CommandOutput, WinRmError> {
    with_shell(session, "stdin", "stdout stderr", move |session, shell_id| {
        with_command(session, shell_id, command, args, move |session, shell_id, command_id| {
            pump_command_output(session, shell_id, command_id, cancel, sink)
        })
    })
}

/// Encodes `script` as PowerShell's `-encodedCommand` expects: UTF-16LE, then
/// base64. There is exactly one encoding path — no branching on the input,
/// unlike the source's capability-sniffing encoder.
pub fn encode_powershell_command(script: &str) -> String {
    let mut bytes = Vec::with_capacity(script.len() * 2);
    for unit in script.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    BASE64.encode(bytes)
}

/// `run_powershell(script)` = encode as `-encodedCommand`, then `run_cmd`.
pub fn run_powershell(
    session: &mut Session,
    script: &str,
    cancel: Option<&CancelHandle>,
    sink: Option<&mut dyn FnMut(&StreamChunk)>,
) -> Result<CommandOutput, WinRmError> {
    let encoded = encode_powershell_command(script);
    run_cmd(
        session,
        &format!("powershell -encodedCommand {encoded}"),
        &[],
        cancel,
        sink,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use winrm_protocol::namespaces::action;

    use super::*;
    use crate::transport::fake::FakeTransport;
    use crate::transport::Transport;

    /// Wraps a `FakeTransport` so the test can inspect `sent` after the
    /// `Session` (which owns the `Box<dyn Transport>`) is done with it.
    struct SharedTransport(Arc<Mutex<FakeTransport>>);

    impl Transport for SharedTransport {
        fn send_request(&mut self, envelope_xml: &str) -> Result<String, WinRmError> {
            self.0.lock().unwrap().send_request(envelope_xml)
        }
    }

    fn created_response(shell_id: &str) -> String {
        format!(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                              xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd">
                 <env:Body>
                   <x:ResourceCreated xmlns:x="urn:x">
                     <x:ReferenceParameters>
                       <w:SelectorSet><w:Selector Name="ShellId">{shell_id}</w:Selector></w:SelectorSet>
                     </x:ReferenceParameters>
                   </x:ResourceCreated>
                 </env:Body>
               </env:Envelope>"#
        )
    }

    fn command_response(command_id: &str) -> String {
        format!(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                              xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
                 <env:Body><rsp:CommandResponse><rsp:CommandId>{command_id}</rsp:CommandId></rsp:CommandResponse></env:Body>
               </env:Envelope>"#
        )
    }

    fn done_response(exit_code: i32) -> String {
        format!(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                              xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
                 <env:Body>
                   <rsp:ReceiveResponse>
                     <rsp:CommandState State="http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done">
                       <rsp:ExitCode>{exit_code}</rsp:ExitCode>
                     </rsp:CommandState>
                   </rsp:ReceiveResponse>
                 </env:Body>
               </env:Envelope>"#
        )
    }

    fn ignored_ok_response() -> String {
        r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body/></env:Envelope>"#
            .to_string()
    }

    fn action_of(envelope_xml: &str) -> String {
        let document = xml::roxmltree::Document::parse(envelope_xml).unwrap();
        xml::query::find_descendant(document.root_element(), "Action")
            .map(|node| xml::query::text(node).to_string())
            .expect("every envelope carries an Action header")
    }

    #[test]
    fn run_cmd_sends_exactly_five_envelopes_in_order() {
        let inner = Arc::new(Mutex::new(FakeTransport::new([
            created_response("ABC-123"),
            command_response("CMD-1"),
            done_response(0),
            ignored_ok_response(),
            ignored_ok_response(),
        ])));
        let mut session = Session::new("http://target:5985/wsman", Box::new(SharedTransport(inner.clone())));

        let output = run_cmd(&mut session, "exit 0", &[], None, None).unwrap();
        assert_eq!(output.exit_code, Some(0));

        let sent = inner.lock().unwrap().sent.clone();
        assert_eq!(sent.len(), 5);
        let actions: Vec<String> = sent.iter().map(|xml| action_of(xml)).collect();
        assert_eq!(
            actions,
            vec![
                action::CREATE,
                action::COMMAND,
                action::RECEIVE,
                action::SIGNAL,
                action::DELETE,
            ]
        );
    }

    #[test]
    fn cleanup_runs_and_the_original_error_wins_when_the_pump_faults() {
        let fault = r#"
            <env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                          xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd">
              <env:Body>
                <env:Fault>
                  <env:Detail>
                    <w:WSManFault Code="2150858778"><w:Message>boom</w:Message></w:WSManFault>
                  </env:Detail>
                </env:Fault>
              </env:Body>
            </env:Envelope>
        "#;
        let inner = Arc::new(Mutex::new(FakeTransport::new([
            created_response("ABC-123"),
            command_response("CMD-1"),
            fault.to_string(),
            ignored_ok_response(),
            ignored_ok_response(),
        ])));
        let mut session = Session::new("http://target:5985/wsman", Box::new(SharedTransport(inner.clone())));

        let err = run_cmd(&mut session, "exit 1", &[], None, None).unwrap_err();
        match err {
            WinRmError::SoapFault(f) => assert_eq!(f.code, "2150858778"),
            other => panic!("expected the pump's SoapFault, got {other:?}"),
        }

        let sent = inner.lock().unwrap().sent.clone();
        assert_eq!(sent.len(), 5, "cleanup must still send Signal and Delete after the pump faults");
        let actions: Vec<String> = sent.iter().map(|xml| action_of(xml)).collect();
        assert_eq!(
            actions,
            vec![
                action::CREATE,
                action::COMMAND,
                action::RECEIVE,
                action::SIGNAL,
                action::DELETE,
            ]
        );
    }

    #[test]
    fn powershell_encoding_matches_the_documented_vector() {
        assert_eq!(
            encode_powershell_command("Get-Process"),
            "RwBlAHQALQBQAHIAbwBjAGUAcwBzAA=="
        );
    }
}
