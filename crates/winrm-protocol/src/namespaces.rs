//! The fixed namespace/prefix table every WS-Management envelope is built
//! from. Grounded on the teacher's `define_namespaces!` macro
//! (`protocol-winrm/src/cores/namespace.rs`), trimmed to the prefixes this
//! spec actually emits (no PowerShell Remoting Protocol serialization
//! namespaces — those belong to the fragment/pipeline layer, out of scope
//! here).

use xml::builder::Namespace as XmlNamespace;

macro_rules! define_namespaces {
    ($( $variant:ident => { alias: $alias:expr, uri: $uri:expr } ),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Namespace {
            $( $variant, )+
        }

        impl Namespace {
            pub const fn uri(self) -> &'static str {
                match self {
                    $( Self::$variant => $uri, )+
                }
            }

            pub const fn alias(self) -> &'static str {
                match self {
                    $( Self::$variant => $alias, )+
                }
            }
        }
    };
}

define_namespaces! {
    Soap12      => { alias: "env", uri: "http://www.w3.org/2003/05/soap-envelope" },
    Addressing  => { alias: "a",   uri: "http://schemas.xmlsoap.org/ws/2004/08/addressing" },
    CimBinding  => { alias: "b",   uri: "http://schemas.dmtf.org/wbem/wsman/1/cimbinding.xsd" },
    Enumeration => { alias: "n",   uri: "http://schemas.xmlsoap.org/ws/2004/09/enumeration" },
    Transfer    => { alias: "x",   uri: "http://schemas.xmlsoap.org/ws/2004/09/transfer" },
    DmtfWsman   => { alias: "w",   uri: "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd" },
    MsWsman     => { alias: "p",   uri: "http://schemas.microsoft.com/wbem/wsman/1/wsman.xsd" },
    Shell       => { alias: "rsp", uri: "http://schemas.microsoft.com/wbem/wsman/1/windows/shell" },
}

impl Namespace {
    pub fn all() -> &'static [Namespace] {
        use Namespace::*;
        &[
            Soap12,
            Addressing,
            CimBinding,
            Enumeration,
            Transfer,
            DmtfWsman,
            MsWsman,
            Shell,
        ]
    }

    pub fn xml_namespace(self) -> XmlNamespace<'static> {
        XmlNamespace::new(self.uri())
    }
}

/// Resource URIs for the two resource kinds this engine operates against.
pub mod resource_uri {
    pub const CMD: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/cmd";

    /// The WMI resource URI is parameterized by CIM namespace (default
    /// `root/cimv2/*`).
    pub fn wmi(namespace: &str) -> String {
        format!("http://schemas.microsoft.com/wbem/wsman/1/wmi/{namespace}")
    }
}

/// WS-Transfer / WS-Management / Microsoft Shell action URIs. Every one of
/// these carries `mustUnderstand=true` on the wire.
pub mod action {
    pub const CREATE: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer/Create";
    pub const DELETE: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer/Delete";
    pub const COMMAND: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Command";
    pub const RECEIVE: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Receive";
    pub const SIGNAL: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Signal";
    pub const ENUMERATE: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration/Enumerate";
}

pub const ANONYMOUS_ROLE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";
pub const SIGNAL_TERMINATE_CODE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/signal/terminate";
pub const WQL_DIALECT: &str = "http://schemas.microsoft.com/wbem/wsman/1/WQL";
pub const COMMAND_STATE_DONE_SUFFIX: &str = "/Done";
