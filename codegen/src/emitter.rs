use serde::Serialize;
use std::fmt;
use wsbind_wsdl::{
    extensions::{SoapBindingStyle, SoapBindingUse},
    types::NamespacedName,
};

use crate::{headers::HeaderDirection, options::GenerationStyle, parameters::ParameterDirection};

/// Sink for generated declarations.
///
/// Drivers only ever talk to this interface; turning declarations into
/// source text is the implementor's business.
pub trait CodeEmitter {
    fn begin_namespace(&mut self, name: &str);
    fn end_namespace(&mut self);

    fn begin_class(&mut self, class: &ClassDecl);
    fn end_class(&mut self);

    fn add_method(&mut self, method: &MethodDecl);
    fn add_field(&mut self, field: &FieldDecl);
    fn add_event(&mut self, event: &EventDecl);
    fn add_delegate(&mut self, delegate: &DelegateDecl);

    /// Attaches a comment to the innermost open scope.
    fn add_comment(&mut self, comment: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDecl {
    pub name: String,
    pub style: GenerationStyle,
    pub docs: Option<String>,
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: String,
    pub direction: ParameterDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub parameters: Vec<ParamDecl>,
    pub return_type: Option<String>,
    pub docs: Option<String>,
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDecl {
    pub name: String,
    pub delegate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegateDecl {
    pub name: String,
    pub parameters: Vec<ParamDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoapMethodInfo {
    pub style: SoapBindingStyle,
    pub action: Option<String>,
    pub request: Option<NamespacedName>,
    pub response: Option<NamespacedName>,
    #[serde(rename = "use")]
    pub use_: SoapBindingUse,
    pub wrapped: bool,
    pub one_way: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpMethodInfo {
    pub verb: String,
    pub location: String,
    pub input: String,
    pub output: String,
}

/// Serialization attributes attached to generated declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Metadata {
    Binding {
        name: NamespacedName,
        protocol: String,
        location: Option<String>,
    },
    SoapMethod(SoapMethodInfo),
    SoapHeader {
        field: String,
        direction: HeaderDirection,
    },
    HttpMethod(HttpMethodInfo),
    XmlElement {
        name: NamespacedName,
        nillable: bool,
    },
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metadata::Binding {
                name,
                protocol,
                location,
            } => {
                write!(f, "binding(name = \"{}\", protocol = \"{}\"", name, protocol)?;
                if let Some(location) = location {
                    write!(f, ", location = \"{}\"", location)?;
                }
                f.write_str(")")
            }

            Metadata::SoapMethod(info) => {
                write!(f, "soap_{}_method(", info.style)?;
                if let Some(action) = &info.action {
                    write!(f, "action = \"{}\", ", action)?;
                }
                if let Some(request) = &info.request {
                    write!(f, "request = \"{}\", ", request)?;
                }
                if let Some(response) = &info.response {
                    write!(f, "response = \"{}\", ", response)?;
                }
                write!(
                    f,
                    "use = \"{}\", wrapped = {}, one_way = {})",
                    info.use_.normalized(),
                    info.wrapped,
                    info.one_way
                )
            }

            Metadata::SoapHeader { field, direction } => {
                write!(f, "soap_header(field = \"{}\", direction = \"{}\")", field, direction)
            }

            Metadata::HttpMethod(info) => write!(
                f,
                "http_method(verb = \"{}\", location = \"{}\", input = \"{}\", output = \"{}\")",
                info.verb, info.location, info.input, info.output
            ),

            Metadata::XmlElement { name, nillable } => {
                write!(f, "xml_element(name = \"{}\", nillable = {})", name, nillable)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EmitterEvent {
    BeginNamespace(String),
    EndNamespace,
    BeginClass(ClassDecl),
    EndClass,
    Method(MethodDecl),
    Field(FieldDecl),
    Event(EventDecl),
    Delegate(DelegateDecl),
    Comment(String),
}

/// Keeps every call in memory, in order.
///
/// The import driver records one binding at a time into a fresh recorder
/// and only replays it into the real emitter once the binding imported
/// cleanly.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingEmitter {
    events: Vec<EmitterEvent>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[EmitterEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn replay(&self, target: &mut dyn CodeEmitter) {
        for event in &self.events {
            match event {
                EmitterEvent::BeginNamespace(name) => target.begin_namespace(name),
                EmitterEvent::EndNamespace => target.end_namespace(),
                EmitterEvent::BeginClass(class) => target.begin_class(class),
                EmitterEvent::EndClass => target.end_class(),
                EmitterEvent::Method(method) => target.add_method(method),
                EmitterEvent::Field(field) => target.add_field(field),
                EmitterEvent::Event(event) => target.add_event(event),
                EmitterEvent::Delegate(delegate) => target.add_delegate(delegate),
                EmitterEvent::Comment(comment) => target.add_comment(comment),
            }
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.events.iter().filter_map(|event| match event {
            EmitterEvent::BeginClass(class) => Some(class),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.events.iter().filter_map(|event| match event {
            EmitterEvent::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.events.iter().filter_map(|event| match event {
            EmitterEvent::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            EmitterEvent::Comment(comment) => Some(comment.as_str()),
            _ => None,
        })
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods().find(|method| method.name == name)
    }
}

impl CodeEmitter for RecordingEmitter {
    fn begin_namespace(&mut self, name: &str) {
        self.events.push(EmitterEvent::BeginNamespace(name.to_owned()));
    }

    fn end_namespace(&mut self) {
        self.events.push(EmitterEvent::EndNamespace);
    }

    fn begin_class(&mut self, class: &ClassDecl) {
        self.events.push(EmitterEvent::BeginClass(class.clone()));
    }

    fn end_class(&mut self) {
        self.events.push(EmitterEvent::EndClass);
    }

    fn add_method(&mut self, method: &MethodDecl) {
        self.events.push(EmitterEvent::Method(method.clone()));
    }

    fn add_field(&mut self, field: &FieldDecl) {
        self.events.push(EmitterEvent::Field(field.clone()));
    }

    fn add_event(&mut self, event: &EventDecl) {
        self.events.push(EmitterEvent::Event(event.clone()));
    }

    fn add_delegate(&mut self, delegate: &DelegateDecl) {
        self.events.push(EmitterEvent::Delegate(delegate.clone()));
    }

    fn add_comment(&mut self, comment: &str) {
        self.events.push(EmitterEvent::Comment(comment.to_owned()));
    }
}
