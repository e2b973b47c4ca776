//! Request bodies and response extraction for the six operations this engine
//! speaks: Create/Delete/Command/Receive/Signal (on the `cmd` resource) and
//! Enumerate (on a WMI resource).

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use uuid::Uuid;
use xml::builder::{Attribute, Element};
use xml::query;
use xml::roxmltree::Document;

use crate::header::{
    option_set_header, resource_and_action_headers, selector_set_header, standard_headers,
    HeaderConfig,
};
use crate::namespaces::{action, resource_uri, Namespace, COMMAND_STATE_DONE_SUFFIX, WQL_DIALECT};
use crate::{envelope, merge_headers};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("response is missing expected element or attribute: {0}")]
    Missing(String),
    #[error("malformed response content: {0}")]
    Malformed(String),
}

/// The per-request constants a session carries: the endpoint and the
/// caller-mutable `SessionConfig` snapshot.
pub struct Context<'a> {
    pub to: &'a str,
    pub header_config: &'a HeaderConfig,
}

fn rsp(name: &'static str) -> Element<'static> {
    Element::new(name).set_namespace(Namespace::Shell.xml_namespace())
}

fn shell_id_header(shell_id: &str) -> Vec<crate::header::HeaderElement> {
    selector_set_header(&[("ShellId", shell_id)])
}

/// `open_shell`: `rsp:Shell` with `WINRS_NOPROFILE=FALSE` and
/// `WINRS_CODEPAGE=437` options.
pub fn build_open_shell(ctx: &Context<'_>, input_streams: &str, output_streams: &str) -> String {
    let headers = merge_headers([
        standard_headers(ctx.to, Uuid::new_v4(), ctx.header_config),
        resource_and_action_headers(resource_uri::CMD, action::CREATE),
        option_set_header(&[("WINRS_NOPROFILE", "FALSE"), ("WINRS_CODEPAGE", "437")]),
    ]);

    let body = rsp("Shell")
        .add_child(rsp("InputStreams").set_text(input_streams.to_string()))
        .add_child(rsp("OutputStreams").set_text(output_streams.to_string()));

    envelope::build_envelope(headers, Some(body))
}

/// `run_command`: `rsp:CommandLine` with the command double-quoted verbatim
/// and one `rsp:Arguments` per argument.
pub fn build_run_command(ctx: &Context<'_>, shell_id: &str, command: &str, args: &[String]) -> String {
    let headers = merge_headers([
        standard_headers(ctx.to, Uuid::new_v4(), ctx.header_config),
        resource_and_action_headers(resource_uri::CMD, action::COMMAND),
        shell_id_header(shell_id),
        option_set_header(&[
            ("WINRS_CONSOLEMODE_STDIN", "TRUE"),
            ("WINRS_SKIP_CMD_SHELL", "FALSE"),
        ]),
    ]);

    let mut body = rsp("CommandLine").add_child(rsp("Command").set_text(format!("\"{command}\"")));
    for arg in args {
        body = body.add_child(rsp("Arguments").set_text(arg.clone()));
    }

    envelope::build_envelope(headers, Some(body))
}

/// A single Receive request: `rsp:DesiredStream='stdout stderr'` carrying
/// the `CommandId` attribute.
pub fn build_receive(ctx: &Context<'_>, shell_id: &str, command_id: &str) -> String {
    let headers = merge_headers([
        standard_headers(ctx.to, Uuid::new_v4(), ctx.header_config),
        resource_and_action_headers(resource_uri::CMD, action::RECEIVE),
        shell_id_header(shell_id),
    ]);

    let body = rsp("Receive").add_child(
        rsp("DesiredStream")
            .add_attribute(Attribute::new("CommandId", command_id.to_string()))
            .set_text("stdout stderr"),
    );

    envelope::build_envelope(headers, Some(body))
}

/// `signal_terminate`: `rsp:Signal` with a `CommandId` attribute and
/// `rsp:Code` = the terminate signal code.
pub fn build_signal_terminate(ctx: &Context<'_>, shell_id: &str, command_id: &str) -> String {
    let headers = merge_headers([
        standard_headers(ctx.to, Uuid::new_v4(), ctx.header_config),
        resource_and_action_headers(resource_uri::CMD, action::SIGNAL),
        shell_id_header(shell_id),
    ]);

    let body = rsp("Signal")
        .add_attribute(Attribute::new("CommandId", command_id.to_string()))
        .add_child(rsp("Code").set_text(crate::namespaces::SIGNAL_TERMINATE_CODE));

    envelope::build_envelope(headers, Some(body))
}

/// `close_shell`: a Delete with no input element, empty Body.
pub fn build_close_shell(ctx: &Context<'_>, shell_id: &str) -> String {
    let headers = merge_headers([
        standard_headers(ctx.to, Uuid::new_v4(), ctx.header_config),
        resource_and_action_headers(resource_uri::CMD, action::DELETE),
        shell_id_header(shell_id),
    ]);

    envelope::build_envelope(headers, None)
}

/// `run_wql`: an Enumerate against the WMI resource URI for `namespace`,
/// carrying the WQL filter text and dialect.
pub fn build_run_wql(ctx: &Context<'_>, wql: &str, namespace: &str) -> String {
    let headers = merge_headers([
        standard_headers(ctx.to, Uuid::new_v4(), ctx.header_config),
        resource_and_action_headers(&resource_uri::wmi(namespace), action::ENUMERATE),
    ]);

    let w = Namespace::DmtfWsman.xml_namespace();
    let body = Element::new("Enumerate")
        .set_namespace(Namespace::Enumeration.xml_namespace())
        .add_child(Element::new("OptimizeEnumeration").set_namespace(w.clone()))
        .add_child(Element::new("MaxElements").set_namespace(w.clone()).set_text("32000"))
        .add_child(
            Element::new("Filter")
                .set_namespace(w)
                .add_attribute(Attribute::new("Dialect", WQL_DIALECT))
                .set_text(wql.to_string()),
        );

    envelope::build_envelope(headers, Some(body))
}

/// Extracts `ShellId` from an `open_shell` response.
pub fn parse_shell_id(document: &Document<'_>) -> Result<String, ProtocolError> {
    query::find_descendant_with_attribute(document.root_element(), "Selector", "Name", "ShellId")
        .map(|node| query::text(node).to_string())
        .ok_or_else(|| ProtocolError::Missing("Selector[@Name='ShellId']".to_string()))
}

/// Extracts `CommandId` from a `run_command` response.
pub fn parse_command_id(document: &Document<'_>) -> Result<String, ProtocolError> {
    query::find_descendant(document.root_element(), "CommandId")
        .map(|node| query::text(node).to_string())
        .ok_or_else(|| ProtocolError::Missing("CommandId".to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamName {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct ReceiveChunk {
    pub stream: StreamName,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ReceiveResult {
    pub chunks: Vec<ReceiveChunk>,
    pub done: bool,
    pub exit_code: Option<i32>,
}

/// Extracts the streamed chunks, done-ness, and (when done) exit code from a
/// single Receive response.
pub fn parse_receive(document: &Document<'_>) -> Result<ReceiveResult, ProtocolError> {
    let root = document.root_element();
    let mut chunks = Vec::new();
    for stream_node in query::find_descendants(root, "Stream") {
        let text = query::text(stream_node);
        if text.is_empty() {
            continue;
        }
        let stream = match stream_node.attribute("Name") {
            Some("stdout") => StreamName::Stdout,
            Some("stderr") => StreamName::Stderr,
            other => return Err(ProtocolError::Malformed(format!("Stream/@Name={other:?}"))),
        };
        let bytes = BASE64
            .decode(text)
            .map_err(|e| ProtocolError::Malformed(format!("Stream base64: {e}")))?;
        chunks.push(ReceiveChunk { stream, bytes });
    }

    let done = query::find_descendant(root, "CommandState")
        .and_then(|node| node.attribute("State"))
        .is_some_and(|state| state.ends_with(COMMAND_STATE_DONE_SUFFIX));

    let exit_code = if done {
        let text = query::find_descendant(root, "ExitCode")
            .map(query::text)
            .ok_or_else(|| ProtocolError::Missing("ExitCode".to_string()))?;
        Some(
            text.trim()
                .parse::<i32>()
                .map_err(|_| ProtocolError::Malformed(format!("ExitCode={text:?}")))?,
        )
    } else {
        None
    };

    Ok(ReceiveResult {
        chunks,
        done,
        exit_code,
    })
}

/// Normalizes an Enumerate response's `Items` element into
/// `{ element-name: [record, ...] }`, always wrapping single occurrences into
/// a one-element list.
pub fn parse_wql_response(document: &Document<'_>) -> BTreeMap<String, Vec<BTreeMap<String, String>>> {
    let mut result: BTreeMap<String, Vec<BTreeMap<String, String>>> = BTreeMap::new();
    let Some(items) = query::find_descendant(document.root_element(), "Items") else {
        return result;
    };
    for child in items.children().filter(|n| n.is_element()) {
        let key = child.tag_name().name().to_string();
        result.entry(key).or_default().push(query::to_record(child));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context(config: &HeaderConfig) -> Context<'_> {
        Context {
            to: "http://target:5985/wsman",
            header_config: config,
        }
    }

    fn config() -> HeaderConfig {
        HeaderConfig {
            operation_timeout: Duration::from_secs(60),
            max_envelope_size: 153_600,
            locale: "en-US".to_string(),
        }
    }

    #[test]
    fn run_command_quotes_the_command_and_leaves_arguments_bare() {
        let config = config();
        let xml = build_run_command(&context(&config), "ABC-123", "ipconfig", &["/all".to_string()]);
        assert!(xml.contains(r#"<rsp:Command>"ipconfig"</rsp:Command>"#));
        assert!(xml.contains("<rsp:Arguments>/all</rsp:Arguments>"));
    }

    #[test]
    fn run_wql_carries_the_dialect_and_filter_text() {
        let config = config();
        let xml = build_run_wql(&context(&config), "SELECT * FROM Win32_Service", "root/cimv2");
        assert!(xml.contains(
            r#"<w:Filter Dialect="http://schemas.microsoft.com/wbem/wsman/1/WQL">SELECT * FROM Win32_Service</w:Filter>"#
        ));
    }

    #[test]
    fn parses_shell_id_from_selector_set() {
        let xml = r#"
            <env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                          xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd">
              <env:Body>
                <x:ResourceCreated xmlns:x="urn:x">
                  <x:ReferenceParameters>
                    <w:SelectorSet>
                      <w:Selector Name="ShellId">ABC-123</w:Selector>
                    </w:SelectorSet>
                  </x:ReferenceParameters>
                </x:ResourceCreated>
              </env:Body>
            </env:Envelope>
        "#;
        let document = Document::parse(xml).unwrap();
        assert_eq!(parse_shell_id(&document).unwrap(), "ABC-123");
    }

    #[test]
    fn parses_command_state_done_and_exit_code() {
        let xml = r#"
            <env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                          xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
              <env:Body>
                <rsp:ReceiveResponse>
                  <rsp:Stream Name="stdout">aGVsbG8K</rsp:Stream>
                  <rsp:CommandState State="http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done">
                    <rsp:ExitCode>2</rsp:ExitCode>
                  </rsp:CommandState>
                </rsp:ReceiveResponse>
              </env:Body>
            </env:Envelope>
        "#;
        let document = Document::parse(xml).unwrap();
        let result = parse_receive(&document).unwrap();
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].bytes, b"hello\n");
        assert!(result.done);
        assert_eq!(result.exit_code, Some(2));
    }

    #[test]
    fn wraps_a_single_item_into_a_singleton_list() {
        let xml = r#"
            <env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
              <env:Body>
                <n:EnumerateResponse xmlns:n="urn:n">
                  <n:Items>
                    <p:Win32_Service xmlns:p="urn:p" Name="Spooler">
                      <p:State>Running</p:State>
                    </p:Win32_Service>
                  </n:Items>
                </n:EnumerateResponse>
              </env:Body>
            </env:Envelope>
        "#;
        let document = Document::parse(xml).unwrap();
        let result = parse_wql_response(&document);
        let services = result.get("Win32_Service").unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].get("State").unwrap(), "Running");
    }
}
