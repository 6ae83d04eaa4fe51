use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extensions::Extensions;

pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
pub const WSI_CLAIM_NAMESPACE: &str = "http://ws-i.org/schemas/conformanceClaim/";
pub const BASIC_PROFILE_1_1: &str = "http://ws-i.org/profiles/basic/1.1";

/// Namespace table used to hand out stable `ns{N}` prefixes.
#[derive(Default, Debug, Clone)]
pub struct Namespaces(Vec<String>);

#[derive(
    Default, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NamespacedName {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Struct(Vec<Field>),
    Simple(NamespacedName),
    Alias(NamespacedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub name: NamespacedName,
    pub kind: TypeKind,
}

/// A global schema element. `ty` of `None` is the "any" element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: NamespacedName,
    pub ty: Option<FieldKind>,
    pub nillable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Type(NamespacedName),
    Inner(TypeKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: NamespacedName,
    pub ty: FieldKind,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub nillable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Types {
    pub elements: Vec<Element>,
    pub types: Vec<Type>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Documentation {
    pub text: Option<String>,
    /// `conformsTo` URIs of the WS-I claims attached to the item.
    pub claims: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub namespace: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub name: String,
    pub element: Option<NamespacedName>,
    pub ty: Option<NamespacedName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub docs: Documentation,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationFlow {
    None,
    OneWay,
    Notification,
    RequestResponse,
    SolicitResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationMessage {
    pub kind: MessageKind,
    pub name: Option<String>,
    pub message: NamespacedName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFault {
    pub name: String,
    pub message: NamespacedName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub docs: Documentation,
    pub parameter_order: Option<Vec<String>>,
    pub messages: Vec<OperationMessage>,
    pub faults: Vec<OperationFault>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortType {
    pub name: String,
    pub docs: Documentation,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBinding {
    pub name: Option<String>,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationBinding {
    pub name: String,
    pub docs: Documentation,
    pub extensions: Extensions,
    pub input: Option<MessageBinding>,
    pub output: Option<MessageBinding>,
    pub faults: Vec<MessageBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub ty: NamespacedName,
    pub docs: Documentation,
    pub extensions: Extensions,
    pub operations: Vec<OperationBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: String,
    pub binding: NamespacedName,
    pub docs: Documentation,
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub docs: Documentation,
    pub extensions: Extensions,
    pub ports: Vec<Port>,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: Option<String>,
    pub target_namespace: String,
    pub retrieval_url: Option<String>,
    pub docs: Documentation,
    pub imports: Vec<Import>,
    pub types: Types,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
    pub extensions: Extensions,
}

impl Namespaces {
    pub fn namespaces(&self) -> &[String] {
        &self.0
    }

    pub fn add_or_get(&mut self, namespace: &str) -> usize {
        if let Some(index) = self.index_of(namespace) {
            index
        } else {
            let index = self.0.len();
            self.0.push(namespace.to_owned());
            index
        }
    }

    pub fn index_of(&self, namespace: &str) -> Option<usize> {
        self.0.iter().position(|value| value == namespace)
    }
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace, self.name)
        }
    }
}

impl Field {
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }

    pub fn is_repeated(&self) -> bool {
        match self.max_occurs {
            MaxOccurs::Bounded(max) => max > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl Types {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.types.is_empty()
    }

    pub fn find_element(&self, name: &NamespacedName) -> Option<&Element> {
        self.elements.iter().find(|element| element.name == *name)
    }

    pub fn find_type(&self, name: &NamespacedName) -> Option<&Type> {
        self.types.iter().find(|ty| ty.name == *name)
    }
}

impl Documentation {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.claims.is_empty()
    }

    pub fn claims(&self, profile: &str) -> bool {
        self.claims.iter().any(|claim| claim == profile)
    }
}

impl MessagePart {
    pub fn element(name: impl Into<String>, element: NamespacedName) -> Self {
        Self {
            name: name.into(),
            element: Some(element),
            ty: None,
        }
    }

    pub fn typed(name: impl Into<String>, ty: NamespacedName) -> Self {
        Self {
            name: name.into(),
            element: None,
            ty: Some(ty),
        }
    }
}

impl Message {
    pub fn find_part(&self, name: &str) -> Option<&MessagePart> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Parts named by `names`, in the order given; `None` if any is missing.
    pub fn find_parts(&self, names: &[String]) -> Option<Vec<&MessagePart>> {
        names.iter().map(|name| self.find_part(name)).collect()
    }
}

impl OperationFlow {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationFlow::None => "none",
            OperationFlow::OneWay => "one-way",
            OperationFlow::Notification => "notification",
            OperationFlow::RequestResponse => "request-response",
            OperationFlow::SolicitResponse => "solicit-response",
        }
    }
}

impl fmt::Display for OperationFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Documentation::default(),
            parameter_order: None,
            messages: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn input(&self) -> Option<&OperationMessage> {
        self.messages
            .iter()
            .find(|message| message.kind == MessageKind::Input)
    }

    pub fn output(&self) -> Option<&OperationMessage> {
        self.messages
            .iter()
            .find(|message| message.kind == MessageKind::Output)
    }

    /// Flow derived from the order of the input and output messages.
    pub fn flow(&self) -> OperationFlow {
        match self.messages.as_slice() {
            [] => OperationFlow::None,
            [only] => match only.kind {
                MessageKind::Input => OperationFlow::OneWay,
                MessageKind::Output => OperationFlow::Notification,
            },
            [first, ..] => match first.kind {
                MessageKind::Input => OperationFlow::RequestResponse,
                MessageKind::Output => OperationFlow::SolicitResponse,
            },
        }
    }

    /// Effective name of one of the messages: the explicit name, or the
    /// name WSDL 1.1 derives from the operation name and flow.
    pub fn message_name(&self, explicit: Option<&str>, kind: MessageKind) -> Option<String> {
        if let Some(name) = explicit.filter(|name| !name.is_empty()) {
            return Some(name.to_owned());
        }

        match (self.flow(), kind) {
            (OperationFlow::RequestResponse, MessageKind::Input) => {
                Some(format!("{}Request", self.name))
            }
            (OperationFlow::RequestResponse, MessageKind::Output) => {
                Some(format!("{}Response", self.name))
            }
            (OperationFlow::OneWay, MessageKind::Input) => Some(self.name.clone()),
            _ => None,
        }
    }

    pub fn is_bound_by(&self, binding: &OperationBinding) -> bool {
        if binding.name != self.name {
            return false;
        }

        self.message_matches(MessageKind::Input, binding.input.as_ref())
            && self.message_matches(MessageKind::Output, binding.output.as_ref())
    }

    fn message_matches(&self, kind: MessageKind, bound: Option<&MessageBinding>) -> bool {
        let declared = match kind {
            MessageKind::Input => self.input(),
            MessageKind::Output => self.output(),
        };

        match (declared, bound) {
            (None, None) => true,
            (Some(declared), Some(bound)) => {
                self.message_name(declared.name.as_deref(), kind)
                    == self.message_name(bound.name.as_deref(), kind)
            }
            _ => false,
        }
    }
}

impl OperationMessage {
    pub fn new(kind: MessageKind, message: NamespacedName) -> Self {
        Self {
            kind,
            name: None,
            message,
        }
    }
}

impl MessageBinding {
    pub fn new(extensions: Extensions) -> Self {
        Self {
            name: None,
            extensions,
        }
    }
}

impl OperationBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Documentation::default(),
            extensions: Extensions::default(),
            input: None,
            output: None,
            faults: Vec::new(),
        }
    }

    pub fn message_bindings(&self) -> impl Iterator<Item = &MessageBinding> {
        self.input
            .iter()
            .chain(self.output.iter())
            .chain(self.faults.iter())
    }
}

impl PortType {
    pub fn find_operations<'a>(
        &'a self,
        binding: &'a OperationBinding,
    ) -> impl Iterator<Item = &'a Operation> + 'a {
        self.operations
            .iter()
            .filter(move |operation| operation.is_bound_by(binding))
    }
}

impl Binding {
    pub fn find_operation(&self, name: &str) -> Option<&OperationBinding> {
        self.operations.iter().find(|operation| operation.name == name)
    }
}

impl Definition {
    pub fn new(target_namespace: impl Into<String>) -> Self {
        Self {
            target_namespace: target_namespace.into(),
            ..Default::default()
        }
    }

    pub fn qualify(&self, name: impl Into<String>) -> NamespacedName {
        NamespacedName::new(self.target_namespace.clone(), name)
    }

    pub fn find_message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.name == name)
    }

    pub fn find_port_type(&self, name: &str) -> Option<&PortType> {
        self.port_types.iter().find(|port_type| port_type.name == name)
    }

    pub fn find_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }

    pub fn find_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.name == name)
    }

    /// Clears the per-run `handled` flag on every extension in the document.
    pub fn reset_handled(&self) {
        self.extensions.reset_handled();

        for binding in &self.bindings {
            binding.extensions.reset_handled();

            for operation in &binding.operations {
                operation.extensions.reset_handled();
                for message in operation.message_bindings() {
                    message.extensions.reset_handled();
                }
            }
        }

        for service in &self.services {
            service.extensions.reset_handled();
            for port in &service.ports {
                port.extensions.reset_handled();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: MessageKind, name: &str) -> OperationMessage {
        OperationMessage::new(kind, NamespacedName::new("urn:test", name))
    }

    #[test]
    fn flow_follows_message_order() {
        let mut operation = Operation::new("Op");
        assert_eq!(operation.flow(), OperationFlow::None);

        operation.messages.push(message(MessageKind::Output, "Out"));
        assert_eq!(operation.flow(), OperationFlow::Notification);

        operation.messages.push(message(MessageKind::Input, "In"));
        assert_eq!(operation.flow(), OperationFlow::SolicitResponse);

        operation.messages.reverse();
        assert_eq!(operation.flow(), OperationFlow::RequestResponse);
    }

    #[test]
    fn derived_message_names() {
        let mut operation = Operation::new("Add");
        operation.messages.push(message(MessageKind::Input, "AddIn"));
        assert_eq!(
            operation.message_name(None, MessageKind::Input).as_deref(),
            Some("Add")
        );

        operation.messages.push(message(MessageKind::Output, "AddOut"));
        assert_eq!(
            operation.message_name(None, MessageKind::Input).as_deref(),
            Some("AddRequest")
        );
        assert_eq!(
            operation.message_name(Some(""), MessageKind::Output).as_deref(),
            Some("AddResponse")
        );
        assert_eq!(
            operation.message_name(Some("Custom"), MessageKind::Output).as_deref(),
            Some("Custom")
        );
    }

    #[test]
    fn bound_by_requires_matching_messages() {
        let mut operation = Operation::new("Add");
        operation.messages.push(message(MessageKind::Input, "AddIn"));
        operation.messages.push(message(MessageKind::Output, "AddOut"));

        let mut binding = OperationBinding::new("Add");
        binding.input = Some(MessageBinding::default());
        assert!(!operation.is_bound_by(&binding));

        binding.output = Some(MessageBinding::default());
        assert!(operation.is_bound_by(&binding));

        binding.output.as_mut().unwrap().name = Some("Other".into());
        assert!(!operation.is_bound_by(&binding));
    }
}
