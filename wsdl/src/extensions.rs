//! Protocol-specific binding extensions.
//!
//! Extensions are an open set: the SOAP 1.1, HTTP and MIME elements the
//! binding engine understands are parsed into typed variants, everything else
//! is kept as an opaque [`XmlElement`]. Each extension carries the
//! `wsdl:required` flag from the document and a per-run `handled` flag that
//! importers set when they consume it.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

use crate::types::NamespacedName;

pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP_ENCODING_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const SOAP_HTTP_TRANSPORT: &str = "http://schemas.xmlsoap.org/soap/http";
pub const HTTP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/http/";
pub const MIME_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/mime/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoapBindingStyle {
    Document,
    Rpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoapBindingUse {
    Default,
    Literal,
    Encoded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapBinding {
    pub transport: Option<String>,
    pub style: Option<SoapBindingStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapOperationBinding {
    pub soap_action: Option<String>,
    pub style: Option<SoapBindingStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapBody {
    pub use_: SoapBindingUse,
    pub namespace: Option<String>,
    pub encoding: Option<String>,
    /// Explicit subset of message parts carried in the body.
    pub parts: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapHeader {
    pub message: NamespacedName,
    pub part: Option<String>,
    pub use_: SoapBindingUse,
    pub namespace: Option<String>,
    pub encoding: Option<String>,
    pub faults: Vec<SoapHeaderFault>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapHeaderFault {
    pub message: NamespacedName,
    pub part: Option<String>,
    pub use_: SoapBindingUse,
    pub namespace: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    pub name: Option<String>,
    pub use_: SoapBindingUse,
    pub namespace: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBinding {
    pub verb: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOperationBinding {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeContent {
    pub part: Option<String>,
    pub ty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeXml {
    pub part: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: NamespacedName,
    pub value: String,
}

/// An extension element nobody registered a typed variant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: NamespacedName,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionKind {
    SoapBinding(SoapBinding),
    SoapOperation(SoapOperationBinding),
    SoapBody(SoapBody),
    SoapHeader(SoapHeader),
    SoapFault(SoapFault),
    SoapAddress(Address),
    HttpBinding(HttpBinding),
    HttpOperation(HttpOperationBinding),
    HttpAddress(Address),
    HttpUrlEncoded,
    HttpUrlReplacement,
    MimeContent(MimeContent),
    MimeXml(MimeXml),
    Element(XmlElement),
}

#[derive(Debug, Clone)]
pub struct Extension {
    pub kind: ExtensionKind,
    pub required: bool,
    handled: Cell<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions(Vec<Extension>);

impl Default for SoapBindingUse {
    fn default() -> Self {
        SoapBindingUse::Default
    }
}

impl SoapBindingStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            SoapBindingStyle::Document => "document",
            SoapBindingStyle::Rpc => "rpc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(SoapBindingStyle::Document),
            "rpc" => Some(SoapBindingStyle::Rpc),
            _ => None,
        }
    }
}

impl Default for SoapBindingStyle {
    fn default() -> Self {
        SoapBindingStyle::Document
    }
}

impl fmt::Display for SoapBindingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SoapBindingUse {
    pub fn as_str(self) -> &'static str {
        match self {
            SoapBindingUse::Default => "default",
            SoapBindingUse::Literal => "literal",
            SoapBindingUse::Encoded => "encoded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "literal" => Some(SoapBindingUse::Literal),
            "encoded" => Some(SoapBindingUse::Encoded),
            _ => None,
        }
    }

    /// `Default` is read as `Literal`.
    pub fn normalized(self) -> Self {
        match self {
            SoapBindingUse::Default => SoapBindingUse::Literal,
            other => other,
        }
    }
}

impl fmt::Display for SoapBindingUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SoapBody {
    pub fn literal() -> Self {
        Self {
            use_: SoapBindingUse::Literal,
            namespace: None,
            encoding: None,
            parts: None,
        }
    }
}

macro_rules! accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> Option<&$ty> {
            match self {
                ExtensionKind::$variant(value) => Some(value),
                _ => None,
            }
        }
    };
}

impl ExtensionKind {
    accessor!(as_soap_binding, SoapBinding, SoapBinding);
    accessor!(as_soap_operation, SoapOperation, SoapOperationBinding);
    accessor!(as_soap_body, SoapBody, SoapBody);
    accessor!(as_soap_header, SoapHeader, SoapHeader);
    accessor!(as_soap_fault, SoapFault, SoapFault);
    accessor!(as_soap_address, SoapAddress, Address);
    accessor!(as_http_binding, HttpBinding, HttpBinding);
    accessor!(as_http_operation, HttpOperation, HttpOperationBinding);
    accessor!(as_http_address, HttpAddress, Address);
    accessor!(as_mime_content, MimeContent, MimeContent);
    accessor!(as_mime_xml, MimeXml, MimeXml);
    accessor!(as_element, Element, XmlElement);

    pub fn is_http_url_encoded(&self) -> bool {
        matches!(self, ExtensionKind::HttpUrlEncoded)
    }

    pub fn is_http_url_replacement(&self) -> bool {
        matches!(self, ExtensionKind::HttpUrlReplacement)
    }

    /// Qualified element name of the extension.
    pub fn element_name(&self) -> NamespacedName {
        let (namespace, name) = match self {
            ExtensionKind::SoapBinding(_) => (SOAP_NAMESPACE, "binding"),
            ExtensionKind::SoapOperation(_) => (SOAP_NAMESPACE, "operation"),
            ExtensionKind::SoapBody(_) => (SOAP_NAMESPACE, "body"),
            ExtensionKind::SoapHeader(_) => (SOAP_NAMESPACE, "header"),
            ExtensionKind::SoapFault(_) => (SOAP_NAMESPACE, "fault"),
            ExtensionKind::SoapAddress(_) => (SOAP_NAMESPACE, "address"),
            ExtensionKind::HttpBinding(_) => (HTTP_NAMESPACE, "binding"),
            ExtensionKind::HttpOperation(_) => (HTTP_NAMESPACE, "operation"),
            ExtensionKind::HttpAddress(_) => (HTTP_NAMESPACE, "address"),
            ExtensionKind::HttpUrlEncoded => (HTTP_NAMESPACE, "urlEncoded"),
            ExtensionKind::HttpUrlReplacement => (HTTP_NAMESPACE, "urlReplacement"),
            ExtensionKind::MimeContent(_) => (MIME_NAMESPACE, "content"),
            ExtensionKind::MimeXml(_) => (MIME_NAMESPACE, "mimeXml"),
            ExtensionKind::Element(element) => return element.name.clone(),
        };

        NamespacedName::new(namespace, name)
    }
}

impl Extension {
    pub fn new(kind: ExtensionKind) -> Self {
        Self {
            kind,
            required: false,
            handled: Cell::new(false),
        }
    }

    pub fn required(kind: ExtensionKind) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    pub fn is_handled(&self) -> bool {
        self.handled.get()
    }

    pub fn mark_handled(&self) {
        self.handled.set(true);
    }

    pub fn reset_handled(&self) {
        self.handled.set(false);
    }
}

// The handled flag is run state, not document content.
impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.required == other.required
    }
}

impl From<ExtensionKind> for Extension {
    fn from(kind: ExtensionKind) -> Self {
        Extension::new(kind)
    }
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, extension: impl Into<Extension>) {
        self.0.push(extension.into());
    }

    pub fn with(mut self, extension: impl Into<Extension>) -> Self {
        self.push(extension);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First extension accepted by `select`, without marking it handled.
    pub fn find<'a, T: 'a, F>(&'a self, select: F) -> Option<&'a T>
    where
        F: Fn(&'a ExtensionKind) -> Option<&'a T>,
    {
        self.0.iter().find_map(|extension| select(&extension.kind))
    }

    /// Like [`Extensions::find`], and marks the match handled.
    pub fn handle<'a, T: 'a, F>(&'a self, select: F) -> Option<&'a T>
    where
        F: Fn(&'a ExtensionKind) -> Option<&'a T>,
    {
        self.0.iter().find_map(|extension| {
            let value = select(&extension.kind)?;
            extension.mark_handled();
            Some(value)
        })
    }

    /// Every extension accepted by `select`, marking each handled.
    pub fn handle_all<'a, T: 'a, F>(&'a self, select: F) -> Vec<&'a T>
    where
        F: Fn(&'a ExtensionKind) -> Option<&'a T>,
    {
        self.0
            .iter()
            .filter_map(|extension| {
                let value = select(&extension.kind)?;
                extension.mark_handled();
                Some(value)
            })
            .collect()
    }

    /// Marks every extension matching `predicate` handled; returns whether
    /// any matched.
    pub fn handle_matching(&self, predicate: impl Fn(&ExtensionKind) -> bool) -> bool {
        let mut found = false;
        for extension in self.0.iter().filter(|extension| predicate(&extension.kind)) {
            extension.mark_handled();
            found = true;
        }
        found
    }

    pub fn unhandled(&self) -> impl Iterator<Item = &Extension> {
        self.0.iter().filter(|extension| !extension.is_handled())
    }

    pub fn required(&self) -> impl Iterator<Item = &Extension> {
        self.0.iter().filter(|extension| extension.required)
    }

    pub fn reset_handled(&self) {
        for extension in &self.0 {
            extension.reset_handled();
        }
    }
}

impl FromIterator<Extension> for Extensions {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = &'a Extension;
    type IntoIter = std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_marks_only_the_match() {
        let extensions = Extensions::new()
            .with(ExtensionKind::SoapBody(SoapBody::literal()))
            .with(Extension::required(ExtensionKind::HttpUrlEncoded));

        assert!(extensions.handle(ExtensionKind::as_soap_body).is_some());

        let unhandled: Vec<_> = extensions.unhandled().collect();
        assert_eq!(unhandled.len(), 1);
        assert!(unhandled[0].required);

        extensions.reset_handled();
        assert_eq!(extensions.unhandled().count(), 2);
    }

    #[test]
    fn default_use_normalizes_to_literal() {
        assert_eq!(SoapBindingUse::Default.normalized(), SoapBindingUse::Literal);
        assert_eq!(SoapBindingUse::Encoded.normalized(), SoapBindingUse::Encoded);
    }
}
