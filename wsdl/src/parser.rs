use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::HashSet,
    io::{BufRead, BufReader},
};
use tracing::{debug, trace};
use url::Url;

use super::{
    descriptions::Descriptions,
    error,
    extensions::{
        Address, Extension, ExtensionKind, Extensions, HttpBinding, HttpOperationBinding,
        MimeContent, MimeXml, SoapBinding, SoapBindingStyle, SoapBindingUse, SoapBody, SoapFault,
        SoapHeader, SoapHeaderFault, SoapOperationBinding, XmlAttribute, XmlElement,
        HTTP_NAMESPACE, MIME_NAMESPACE, SOAP_NAMESPACE,
    },
    types::{
        Binding, Definition, Documentation, Element, Field, FieldKind, Import, MaxOccurs,
        Message, MessageBinding, MessageKind, MessagePart, NamespacedName, Operation,
        OperationBinding, OperationFault, OperationMessage, Port, PortType, Service, Type,
        TypeKind, WSDL_NAMESPACE, WSI_CLAIM_NAMESPACE, XSD_NAMESPACE,
    },
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], error::Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(reader.decode(&attribute.unescaped_value()?)?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, prefixed_name),
    }
}

fn required(element: &str, attribute: &'static str, value: Option<String>) -> Result<String, error::Error> {
    value.ok_or_else(|| error::Error::MissingAttribute {
        element: element.to_owned(),
        attribute,
    })
}

fn parse_style(value: Option<String>) -> Result<Option<SoapBindingStyle>, error::Error> {
    value
        .map(|value| {
            SoapBindingStyle::parse(&value).ok_or(error::Error::InvalidAttribute {
                attribute: "style".into(),
                value,
            })
        })
        .transpose()
}

fn parse_use(value: Option<String>) -> Result<SoapBindingUse, error::Error> {
    match value {
        None => Ok(SoapBindingUse::Default),
        Some(value) => SoapBindingUse::parse(&value).ok_or(error::Error::InvalidAttribute {
            attribute: "use".into(),
            value,
        }),
    }
}

fn parse_occurs(attribute: &str, value: Option<String>) -> Result<Option<u32>, error::Error> {
    value
        .map(|value| {
            value.trim().parse().map_err(|_| error::Error::InvalidAttribute {
                attribute: attribute.into(),
                value,
            })
        })
        .transpose()
}

fn parse_bool(value: Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some("true" | "1"))
}

fn split_list(value: Option<String>) -> Option<Vec<String>> {
    value.map(|value| value.split_whitespace().map(ToOwned::to_owned).collect())
}

#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    qualified: Vec<bool>,
    scopes: Vec<Vec<(Option<String>, String)>>,
}

#[derive(Debug, Clone, Copy)]
enum BindingMessageKind {
    Input,
    Output,
    Fault,
}

#[derive(Debug)]
enum ParseState {
    Definitions,
    Documentation(Documentation),
    Import(Import),

    Types,
    Schema,
    Element(Element),
    ComplexType {
        name: Option<String>,
        kind: Option<TypeKind>,
    },
    ComplexContent {
        fields: Vec<Field>,
    },
    ComplexExtension {
        base: NamespacedName,
        fields: Vec<Field>,
    },
    SimpleContent {
        ty: Option<NamespacedName>,
    },
    SimpleExtension {
        ty: NamespacedName,
    },
    Sequence(Vec<Field>),
    SequenceElement {
        field: Field,
        inner: Option<TypeKind>,
    },
    SimpleType {
        name: Option<String>,
        ty: Option<NamespacedName>,
    },
    Restriction {
        ty: NamespacedName,
    },

    Message(Message),
    Part(MessagePart),

    PortType(PortType),
    Operation(Operation),
    OperationMessage(OperationMessage),
    OperationFault(OperationFault),

    Binding(Binding),
    OperationBinding(OperationBinding),
    MessageBinding {
        kind: BindingMessageKind,
        binding: MessageBinding,
    },
    Extension(Extension),
    HeaderFault(SoapHeaderFault),
    Unknown {
        element: XmlElement,
        required: bool,
    },

    Service(Service),
    Port(Port),

    Other(String),
}

impl CurrentNamespaces {
    fn push_target_namespace(&mut self, namespace: String, qualified: bool) {
        self.target.push(namespace);
        self.qualified.push(qualified);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
        self.qualified.pop();
    }

    fn push_scope(&mut self, declarations: Vec<(Option<String>, String)>) {
        self.scopes.push(declarations);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn target(&self) -> &str {
        self.target.last().map(String::as_str).unwrap_or_default()
    }

    fn target_namespaced(&self, name: String) -> NamespacedName {
        NamespacedName::new(self.target(), name)
    }

    /// Namespace of a local schema particle, honoring `elementFormDefault`.
    fn member_namespaced(&self, name: String) -> NamespacedName {
        if self.qualified.last().copied().unwrap_or(false) {
            self.target_namespaced(name)
        } else {
            NamespacedName::new("", name)
        }
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }

        for scope in self.scopes.iter().rev() {
            for (declared, namespace) in scope.iter().rev() {
                if declared.as_deref() == prefix {
                    return Some(namespace);
                }
            }
        }

        // An undeclared default namespace is "no namespace".
        prefix.is_none().then(|| "")
    }

    fn resolve_qname(&self, prefixed_name: &str) -> Result<NamespacedName, error::Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name.trim());

        match self.resolve(prefix) {
            Some(namespace) => Ok(NamespacedName::new(namespace, local_name)),
            None => Err(error::Error::UnresolvedPrefix(
                prefix.unwrap_or_default().to_owned(),
            )),
        }
    }
}

impl ParseState {
    fn docs_mut(&mut self) -> Option<&mut Documentation> {
        match self {
            ParseState::Message(message) => Some(&mut message.docs),
            ParseState::PortType(port_type) => Some(&mut port_type.docs),
            ParseState::Operation(operation) => Some(&mut operation.docs),
            ParseState::Binding(binding) => Some(&mut binding.docs),
            ParseState::OperationBinding(operation) => Some(&mut operation.docs),
            ParseState::Service(service) => Some(&mut service.docs),
            ParseState::Port(port) => Some(&mut port.docs),
            _ => None,
        }
    }

    fn extensions_mut(&mut self) -> Option<&mut Extensions> {
        match self {
            ParseState::Binding(binding) => Some(&mut binding.extensions),
            ParseState::OperationBinding(operation) => Some(&mut operation.extensions),
            ParseState::MessageBinding { binding, .. } => Some(&mut binding.extensions),
            ParseState::Service(service) => Some(&mut service.extensions),
            ParseState::Port(port) => Some(&mut port.extensions),
            _ => None,
        }
    }

    fn accepts_extensions(&self) -> bool {
        matches!(
            self,
            ParseState::Definitions
                | ParseState::Binding(_)
                | ParseState::OperationBinding(_)
                | ParseState::MessageBinding { .. }
                | ParseState::Service(_)
                | ParseState::Port(_)
        )
    }
}

/// One XML document being read into a [`Definition`].
struct Document {
    url: Option<Url>,
    definition: Definition,
    current_namespaces: CurrentNamespaces,
    has_root: bool,
    imports: Vec<Url>,
    schema_imports: Vec<Url>,
}

impl Document {
    fn new(url: Option<Url>) -> Self {
        let definition = Definition {
            retrieval_url: url.as_ref().map(ToString::to_string),
            ..Default::default()
        };

        Self {
            url,
            definition,
            current_namespaces: Default::default(),
            has_root: false,
            imports: Vec::new(),
            schema_imports: Vec::new(),
        }
    }

    fn target_namespaced(&self, name: String) -> NamespacedName {
        self.current_namespaces.target_namespaced(name)
    }

    fn resolve_namespace(&self, prefixed_name: &str) -> Result<NamespacedName, error::Error> {
        self.current_namespaces.resolve_qname(prefixed_name)
    }

    fn resolve_location(&self, location: &str) -> Result<Option<Url>, error::Error> {
        match &self.url {
            Some(url) => Ok(Some(url.join(location)?)),
            None => {
                debug!(location, "not following import of an in-memory document");
                Ok(None)
            }
        }
    }

    fn parse_xml<B: BufRead>(mut self, mut reader: Reader<B>) -> Result<Self, error::Error> {
        reader.trim_text(true);

        let mut stack = Vec::new();
        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) => self.handle_start(&mut stack, &reader, &start)?,
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, &start)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, &text)?,
                Event::CData(text) => {
                    let text = reader.decode(&*text)?.to_owned();
                    self.push_text(&mut stack, text);
                }

                Event::Eof => break,

                event => trace!(?event, "skipping XML event"),
            }

            buffer.clear();
        }

        if !self.has_root {
            return Err(error::Error::MissingRoot);
        }

        Ok(self)
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<(), error::Error> {
        let qualified_name = reader.decode(start.name())?;
        let (prefix, local_name) = split_namespaced_name(qualified_name);

        let mut declarations = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let value = reader.decode(&attribute.unescaped_value()?)?.to_owned();

            if key == "xmlns" {
                declarations.push((None, value));
            } else if let Some(declared) = key.strip_prefix("xmlns:") {
                declarations.push((Some(declared.to_owned()), value));
            }
        }
        self.current_namespaces.push_scope(declarations);

        let namespace = self
            .current_namespaces
            .resolve(prefix)
            .ok_or_else(|| error::Error::UnresolvedPrefix(prefix.unwrap_or_default().to_owned()))?
            .to_owned();
        let is_wsdl = namespace == WSDL_NAMESPACE;
        let is_xsd = namespace == XSD_NAMESPACE;

        let mut state = stack.pop();

        let new_state = match state.as_mut() {
            None => match local_name {
                "definitions" if is_wsdl => {
                    let [target, name] =
                        get_attributes(reader, start.attributes(), ["targetNamespace", "name"])?;

                    let target = target.unwrap_or_default();
                    self.current_namespaces.push_target_namespace(target.clone(), false);
                    self.definition.target_namespace = target;
                    self.definition.name = name;
                    self.has_root = true;

                    ParseState::Definitions
                }

                "schema" if is_xsd => {
                    self.start_schema(reader, start)?;
                    if !self.has_root {
                        self.definition.target_namespace = self.current_namespaces.target().to_owned();
                        self.has_root = true;
                    }

                    ParseState::Schema
                }

                _ => ParseState::Other(local_name.to_owned()),
            },

            Some(ParseState::Definitions) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "import" => {
                    let [location, namespace] =
                        get_attributes(reader, start.attributes(), ["location", "namespace"])?;

                    if let Some(location) = &location {
                        let resolved = self.resolve_location(location)?;
                        self.imports.extend(resolved);
                    }

                    ParseState::Import(Import {
                        namespace: namespace.unwrap_or_default(),
                        location,
                    })
                }

                "types" => ParseState::Types,

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    ParseState::Message(Message {
                        name: required("message", "name", name)?,
                        docs: Documentation::default(),
                        parts: Vec::new(),
                    })
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    ParseState::PortType(PortType {
                        name: required("portType", "name", name)?,
                        docs: Documentation::default(),
                        operations: Vec::new(),
                    })
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                    ParseState::Binding(Binding {
                        name: required("binding", "name", name)?,
                        ty: self.resolve_namespace(&required("binding", "type", ty)?)?,
                        docs: Documentation::default(),
                        extensions: Extensions::default(),
                        operations: Vec::new(),
                    })
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    ParseState::Service(Service {
                        name: required("service", "name", name)?,
                        docs: Documentation::default(),
                        extensions: Extensions::default(),
                        ports: Vec::new(),
                    })
                }

                _ => {
                    trace!("FOUND {} INSIDE DEFINITION BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Documentation(docs)) => {
                if namespace == WSI_CLAIM_NAMESPACE && local_name == "Claim" {
                    let [conforms_to] = get_attributes(reader, start.attributes(), ["conformsTo"])?;
                    docs.claims.push(required("Claim", "conformsTo", conforms_to)?);
                }

                ParseState::Other(local_name.to_owned())
            }

            Some(ParseState::Types) => match local_name {
                "schema" if is_xsd => {
                    self.start_schema(reader, start)?;
                    ParseState::Schema
                }

                _ => {
                    trace!("FOUND {} INSIDE TYPES BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Schema) if is_xsd => match local_name {
                "element" => {
                    let [name, ty, nillable] =
                        get_attributes(reader, start.attributes(), ["name", "type", "nillable"])?;

                    let ty = ty
                        .map(|ty| self.resolve_namespace(&ty).map(FieldKind::Type))
                        .transpose()?;

                    ParseState::Element(Element {
                        name: self.target_namespaced(required("element", "name", name)?),
                        ty,
                        nillable: parse_bool(nillable),
                    })
                }

                "complexType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    ParseState::ComplexType {
                        name: Some(required("complexType", "name", name)?),
                        kind: None,
                    }
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    ParseState::SimpleType {
                        name: Some(required("simpleType", "name", name)?),
                        ty: None,
                    }
                }

                "include" | "import" => {
                    let [location] = get_attributes(reader, start.attributes(), ["schemaLocation"])?;

                    if let Some(location) = location {
                        let resolved = self.resolve_location(&location)?;
                        self.schema_imports.extend(resolved);
                    }

                    ParseState::Other(local_name.to_owned())
                }

                _ => {
                    trace!("FOUND {} INSIDE SCHEMA BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Element(_) | ParseState::SequenceElement { .. }) if is_xsd => {
                match local_name {
                    "complexType" => ParseState::ComplexType {
                        name: None,
                        kind: None,
                    },

                    "simpleType" => ParseState::SimpleType { name: None, ty: None },

                    _ => {
                        trace!("FOUND {} INSIDE ELEMENT BLOCK", local_name);
                        ParseState::Other(local_name.to_owned())
                    }
                }
            }

            Some(ParseState::ComplexType { .. }) if is_xsd => match local_name {
                "sequence" | "all" | "choice" => ParseState::Sequence(Vec::new()),

                "simpleContent" => ParseState::SimpleContent { ty: None },

                "complexContent" => ParseState::ComplexContent { fields: Vec::new() },

                _ => {
                    trace!("FOUND {} INSIDE COMPLEX TYPE BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::ComplexContent { .. }) if is_xsd => match local_name {
                "extension" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                    ParseState::ComplexExtension {
                        base: self.resolve_namespace(&required("extension", "base", base)?)?,
                        fields: Vec::new(),
                    }
                }

                _ => {
                    trace!("FOUND {} INSIDE COMPLEX CONTENT BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::ComplexExtension { .. }) if is_xsd => match local_name {
                "sequence" | "all" | "choice" => ParseState::Sequence(Vec::new()),

                _ => {
                    trace!("FOUND {} INSIDE COMPLEX EXTENSION BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::SimpleContent { .. }) if is_xsd => match local_name {
                "extension" | "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                    ParseState::SimpleExtension {
                        ty: self.resolve_namespace(&required("extension", "base", base)?)?,
                    }
                }

                _ => {
                    trace!("FOUND {} INSIDE SIMPLE CONTENT BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::SimpleType { .. }) if is_xsd => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                    ParseState::Restriction {
                        ty: self.resolve_namespace(&required("restriction", "base", base)?)?,
                    }
                }

                _ => {
                    trace!("FOUND {} INSIDE SIMPLE TYPE BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Sequence(_)) if is_xsd => match local_name {
                "element" => self.start_sequence_element(reader, start)?,

                "sequence" | "all" | "choice" => ParseState::Sequence(Vec::new()),

                _ => {
                    trace!("FOUND {} INSIDE SEQUENCE BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Message(_)) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "part" => {
                    let [name, element, ty] =
                        get_attributes(reader, start.attributes(), ["name", "element", "type"])?;

                    ParseState::Part(MessagePart {
                        name: required("part", "name", name)?,
                        element: element.map(|element| self.resolve_namespace(&element)).transpose()?,
                        ty: ty.map(|ty| self.resolve_namespace(&ty)).transpose()?,
                    })
                }

                _ => {
                    trace!("FOUND {} INSIDE MESSAGE BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::PortType(_)) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "operation" => {
                    let [name, parameter_order] =
                        get_attributes(reader, start.attributes(), ["name", "parameterOrder"])?;

                    let mut operation = Operation::new(required("operation", "name", name)?);
                    operation.parameter_order = split_list(parameter_order);

                    ParseState::Operation(operation)
                }

                _ => {
                    trace!("FOUND {} INSIDE PORT TYPE BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Operation(_)) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "input" | "output" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;

                    let kind = if local_name == "input" {
                        MessageKind::Input
                    } else {
                        MessageKind::Output
                    };

                    ParseState::OperationMessage(OperationMessage {
                        kind,
                        name,
                        message: self.resolve_namespace(&required(local_name, "message", message)?)?,
                    })
                }

                "fault" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;

                    ParseState::OperationFault(OperationFault {
                        name: required("fault", "name", name)?,
                        message: self.resolve_namespace(&required("fault", "message", message)?)?,
                    })
                }

                _ => {
                    trace!("FOUND {} INSIDE OPERATION BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Binding(_)) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    ParseState::OperationBinding(OperationBinding::new(required(
                        "operation", "name", name,
                    )?))
                }

                _ => {
                    trace!("FOUND {} INSIDE BINDING BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::OperationBinding(_)) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "input" | "output" | "fault" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    let kind = match local_name {
                        "input" => BindingMessageKind::Input,
                        "output" => BindingMessageKind::Output,
                        _ => BindingMessageKind::Fault,
                    };

                    ParseState::MessageBinding {
                        kind,
                        binding: MessageBinding {
                            name,
                            extensions: Extensions::default(),
                        },
                    }
                }

                _ => {
                    trace!("FOUND {} INSIDE BINDING OPERATION BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Service(_)) if is_wsdl => match local_name {
                "documentation" => ParseState::Documentation(Documentation::default()),

                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;

                    ParseState::Port(Port {
                        name: required("port", "name", name)?,
                        binding: self.resolve_namespace(&required("port", "binding", binding)?)?,
                        docs: Documentation::default(),
                        extensions: Extensions::default(),
                    })
                }

                _ => {
                    trace!("FOUND {} INSIDE SERVICE BLOCK", local_name);
                    ParseState::Other(local_name.to_owned())
                }
            },

            Some(ParseState::Port(_)) if is_wsdl && local_name == "documentation" => {
                ParseState::Documentation(Documentation::default())
            }

            Some(parent) if parent.accepts_extensions() && !is_wsdl => {
                self.start_extension(reader, start, namespace, local_name)?
            }

            Some(ParseState::Extension(Extension {
                kind: ExtensionKind::SoapHeader(_),
                ..
            })) if namespace == SOAP_NAMESPACE && local_name == "headerfault" => {
                let [message, part, use_, namespace, encoding] = get_attributes(
                    reader,
                    start.attributes(),
                    ["message", "part", "use", "namespace", "encodingStyle"],
                )?;

                ParseState::HeaderFault(SoapHeaderFault {
                    message: self.resolve_namespace(&required("headerfault", "message", message)?)?,
                    part,
                    use_: parse_use(use_)?,
                    namespace,
                    encoding,
                })
            }

            Some(ParseState::Unknown { .. }) => {
                let (element, _) = self.unknown_element(reader, start, namespace, local_name)?;
                ParseState::Unknown {
                    element,
                    required: false,
                }
            }

            Some(ParseState::Other(name)) => {
                trace!("FOUND {} INSIDE {} BLOCK", local_name, name);
                ParseState::Other(local_name.to_owned())
            }

            Some(other) => {
                trace!(state = ?other, "FOUND {} IN UNEXPECTED PLACE", local_name);
                ParseState::Other(local_name.to_owned())
            }
        };

        stack.extend(state);
        stack.push(new_state);

        Ok(())
    }

    fn start_schema<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<(), error::Error> {
        let [namespace, form] = get_attributes(
            reader,
            start.attributes(),
            ["targetNamespace", "elementFormDefault"],
        )?;

        self.current_namespaces.push_target_namespace(
            namespace.unwrap_or_default(),
            form.as_deref() == Some("qualified"),
        );

        Ok(())
    }

    fn start_sequence_element<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<ParseState, error::Error> {
        let [name, reference, ty, min_occurs, max_occurs, nillable] = get_attributes(
            reader,
            start.attributes(),
            ["name", "ref", "type", "minOccurs", "maxOccurs", "nillable"],
        )?;

        let (name, ty) = match (name, reference) {
            (Some(name), _) => (
                self.current_namespaces.member_namespaced(name),
                ty.map(|ty| self.resolve_namespace(&ty)).transpose()?,
            ),
            // A reference takes the referenced element's qualified name.
            (None, Some(reference)) => {
                let reference = self.resolve_namespace(&reference)?;
                (reference.clone(), Some(reference))
            }
            (None, None) => return Err(error::Error::MissingAttribute {
                element: "element".into(),
                attribute: "name",
            }),
        };

        let max_occurs = match max_occurs.as_deref().map(str::trim) {
            Some("unbounded") => MaxOccurs::Unbounded,
            _ => MaxOccurs::Bounded(parse_occurs("maxOccurs", max_occurs)?.unwrap_or(1)),
        };

        Ok(ParseState::SequenceElement {
            field: Field {
                name,
                ty: FieldKind::Type(
                    ty.unwrap_or_else(|| NamespacedName::new(XSD_NAMESPACE, "anyType")),
                ),
                min_occurs: parse_occurs("minOccurs", min_occurs)?.unwrap_or(1),
                max_occurs,
                nillable: parse_bool(nillable),
            },
            inner: None,
        })
    }

    fn is_required<B: BufRead>(
        &self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<bool, error::Error> {
        for attribute in start.attributes() {
            let attribute = attribute?;
            let (prefix, local_name) = split_namespaced_name(reader.decode(attribute.key)?);

            if local_name == "required"
                && prefix.and_then(|prefix| self.current_namespaces.resolve(Some(prefix)))
                    == Some(WSDL_NAMESPACE)
            {
                return Ok(parse_bool(Some(
                    reader.decode(&attribute.unescaped_value()?)?.to_owned(),
                )));
            }
        }

        Ok(false)
    }

    fn unknown_element<B: BufRead>(
        &self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
        namespace: String,
        local_name: &str,
    ) -> Result<(XmlElement, bool), error::Error> {
        let mut attributes = Vec::new();
        let mut is_required = false;

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }

            let value = reader.decode(&attribute.unescaped_value()?)?.to_owned();
            let name = match split_namespaced_name(key) {
                (None, local_name) => NamespacedName::new("", local_name),
                (Some(_), _) => self.resolve_namespace(key)?,
            };

            if name.namespace == WSDL_NAMESPACE && name.name == "required" {
                is_required = parse_bool(Some(value));
                continue;
            }

            attributes.push(XmlAttribute { name, value });
        }

        let element = XmlElement {
            name: NamespacedName::new(namespace, local_name),
            attributes,
            children: Vec::new(),
            text: None,
        };

        Ok((element, is_required))
    }

    fn start_extension<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
        namespace: String,
        local_name: &str,
    ) -> Result<ParseState, error::Error> {
        let attributes = || start.attributes();

        let kind = match (namespace.as_str(), local_name) {
            (SOAP_NAMESPACE, "binding") => {
                let [transport, style] = get_attributes(reader, attributes(), ["transport", "style"])?;
                ExtensionKind::SoapBinding(SoapBinding {
                    transport,
                    style: parse_style(style)?,
                })
            }

            (SOAP_NAMESPACE, "operation") => {
                let [soap_action, style] =
                    get_attributes(reader, attributes(), ["soapAction", "style"])?;
                ExtensionKind::SoapOperation(SoapOperationBinding {
                    soap_action,
                    style: parse_style(style)?,
                })
            }

            (SOAP_NAMESPACE, "body") => {
                let [use_, namespace, encoding, parts] = get_attributes(
                    reader,
                    attributes(),
                    ["use", "namespace", "encodingStyle", "parts"],
                )?;
                ExtensionKind::SoapBody(SoapBody {
                    use_: parse_use(use_)?,
                    namespace,
                    encoding,
                    parts: split_list(parts),
                })
            }

            (SOAP_NAMESPACE, "header") => {
                let [message, part, use_, namespace, encoding] = get_attributes(
                    reader,
                    attributes(),
                    ["message", "part", "use", "namespace", "encodingStyle"],
                )?;
                ExtensionKind::SoapHeader(SoapHeader {
                    message: self.resolve_namespace(&required("header", "message", message)?)?,
                    part,
                    use_: parse_use(use_)?,
                    namespace,
                    encoding,
                    faults: Vec::new(),
                })
            }

            (SOAP_NAMESPACE, "fault") => {
                let [name, use_, namespace, encoding] = get_attributes(
                    reader,
                    attributes(),
                    ["name", "use", "namespace", "encodingStyle"],
                )?;
                ExtensionKind::SoapFault(SoapFault {
                    name,
                    use_: parse_use(use_)?,
                    namespace,
                    encoding,
                })
            }

            (SOAP_NAMESPACE, "address") => {
                let [location] = get_attributes(reader, attributes(), ["location"])?;
                ExtensionKind::SoapAddress(Address {
                    location: required("address", "location", location)?,
                })
            }

            (HTTP_NAMESPACE, "binding") => {
                let [verb] = get_attributes(reader, attributes(), ["verb"])?;
                ExtensionKind::HttpBinding(HttpBinding {
                    verb: required("binding", "verb", verb)?,
                })
            }

            (HTTP_NAMESPACE, "operation") => {
                let [location] = get_attributes(reader, attributes(), ["location"])?;
                ExtensionKind::HttpOperation(HttpOperationBinding {
                    location: required("operation", "location", location)?,
                })
            }

            (HTTP_NAMESPACE, "address") => {
                let [location] = get_attributes(reader, attributes(), ["location"])?;
                ExtensionKind::HttpAddress(Address {
                    location: required("address", "location", location)?,
                })
            }

            (HTTP_NAMESPACE, "urlEncoded") => ExtensionKind::HttpUrlEncoded,
            (HTTP_NAMESPACE, "urlReplacement") => ExtensionKind::HttpUrlReplacement,

            (MIME_NAMESPACE, "content") => {
                let [part, ty] = get_attributes(reader, attributes(), ["part", "type"])?;
                ExtensionKind::MimeContent(MimeContent { part, ty })
            }

            (MIME_NAMESPACE, "mimeXml") => {
                let [part] = get_attributes(reader, attributes(), ["part"])?;
                ExtensionKind::MimeXml(MimeXml { part })
            }

            _ => {
                let (element, required) = self.unknown_element(reader, start, namespace, local_name)?;
                return Ok(ParseState::Unknown { element, required });
            }
        };

        let mut extension = Extension::new(kind);
        extension.required = self.is_required(reader, start)?;

        Ok(ParseState::Extension(extension))
    }

    fn add_extension(&mut self, parent: Option<&mut ParseState>, extension: Extension) {
        match parent {
            Some(ParseState::Definitions) => self.definition.extensions.push(extension),
            Some(parent) => match parent.extensions_mut() {
                Some(extensions) => extensions.push(extension),
                None => trace!(?extension, "dropping extension without an owner"),
            },
            None => trace!(?extension, "dropping extension at document root"),
        }
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), error::Error> {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions | ParseState::Schema) => {
                self.current_namespaces.pop_target_namespace()
            }

            Some(ParseState::Documentation(docs)) => match next_state {
                Some(ParseState::Definitions) => self.definition.docs = docs,
                Some(ref mut parent) => {
                    if let Some(target) = parent.docs_mut() {
                        *target = docs;
                    }
                }
                None => (),
            },

            Some(ParseState::Import(import)) => self.definition.imports.push(import),

            Some(ParseState::Element(element)) => self.definition.types.elements.push(element),

            Some(ParseState::ComplexType { name, kind }) => {
                let kind = kind.unwrap_or_else(|| TypeKind::Struct(Vec::new()));

                match next_state {
                    Some(ParseState::SequenceElement { ref mut inner, .. }) => *inner = Some(kind),

                    Some(ParseState::Element(ref mut element)) => {
                        element.ty = Some(FieldKind::Inner(kind))
                    }

                    _ => match name {
                        Some(name) => {
                            let name = self.target_namespaced(name);
                            self.definition.types.types.push(Type { name, kind })
                        }
                        None => trace!("dropping anonymous complex type"),
                    },
                }
            }

            Some(ParseState::ComplexContent { fields }) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) if kind.is_none() => {
                    *kind = Some(TypeKind::Struct(fields))
                }

                _ => trace!("dropping complex content outside a complex type"),
            },

            Some(ParseState::ComplexExtension { base, fields }) => match next_state {
                Some(ParseState::ComplexContent {
                    fields: ref mut content,
                }) => {
                    match self.definition.types.find_type(&base) {
                        Some(Type {
                            kind: TypeKind::Struct(inherited),
                            ..
                        }) => content.extend(inherited.iter().cloned()),
                        _ => content.push(Field {
                            name: self.current_namespaces.member_namespaced("base".into()),
                            ty: FieldKind::Type(base),
                            min_occurs: 1,
                            max_occurs: MaxOccurs::default(),
                            nillable: false,
                        }),
                    }

                    content.extend(fields)
                }

                _ => trace!("dropping complex extension outside complex content"),
            },

            Some(ParseState::SimpleContent { ty }) => match (next_state.as_mut(), ty) {
                (Some(ParseState::ComplexType { kind, .. }), Some(ty)) if kind.is_none() => {
                    *kind = Some(TypeKind::Alias(ty))
                }

                _ => trace!("dropping simple content without a base"),
            },

            Some(ParseState::SimpleExtension { ty: base }) => match next_state {
                Some(ParseState::SimpleContent { ref mut ty }) => *ty = Some(base),

                _ => trace!("dropping simple extension outside simple content"),
            },

            Some(ParseState::SimpleType { name, ty }) => {
                let kind = TypeKind::Simple(
                    ty.unwrap_or_else(|| NamespacedName::new(XSD_NAMESPACE, "string")),
                );

                match next_state {
                    Some(ParseState::SequenceElement { ref mut inner, .. }) => *inner = Some(kind),

                    Some(ParseState::Element(ref mut element)) => {
                        element.ty = Some(FieldKind::Inner(kind))
                    }

                    _ => match name {
                        Some(name) => {
                            let name = self.target_namespaced(name);
                            self.definition.types.types.push(Type { name, kind })
                        }
                        None => trace!("dropping anonymous simple type"),
                    },
                }
            }

            Some(ParseState::Restriction { ty: base }) => match next_state {
                Some(ParseState::SimpleType { ref mut ty, .. }) => *ty = Some(base),
                _ => trace!("dropping restriction outside a simple type"),
            },

            Some(ParseState::Sequence(fields)) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) => match kind {
                    Some(TypeKind::Struct(existing)) => existing.extend(fields),
                    _ => *kind = Some(TypeKind::Struct(fields)),
                },

                Some(ParseState::ComplexExtension {
                    fields: ref mut extension_fields,
                    ..
                }) => extension_fields.extend(fields),

                Some(ParseState::Sequence(ref mut outer)) => outer.extend(fields),

                _ => trace!("dropping sequence outside a complex type"),
            },

            Some(ParseState::SequenceElement { mut field, inner }) => match next_state {
                Some(ParseState::Sequence(ref mut fields)) => {
                    if let Some(kind) = inner {
                        field.ty = FieldKind::Inner(kind);
                    }
                    fields.push(field)
                }
                _ => trace!("dropping element outside a sequence"),
            },

            Some(ParseState::Message(message)) => self.definition.messages.push(message),

            Some(ParseState::Part(part)) => match next_state {
                Some(ParseState::Message(ref mut message)) => message.parts.push(part),
                _ => trace!("dropping part outside a message"),
            },

            Some(ParseState::PortType(port_type)) => self.definition.port_types.push(port_type),

            Some(ParseState::Operation(operation)) => match next_state {
                Some(ParseState::PortType(ref mut port_type)) => {
                    port_type.operations.push(operation)
                }
                _ => trace!("dropping operation outside a port type"),
            },

            Some(ParseState::OperationMessage(message)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) => operation.messages.push(message),
                _ => trace!("dropping operation message outside an operation"),
            },

            Some(ParseState::OperationFault(fault)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) => operation.faults.push(fault),
                _ => trace!("dropping operation fault outside an operation"),
            },

            Some(ParseState::Binding(binding)) => self.definition.bindings.push(binding),

            Some(ParseState::OperationBinding(operation)) => match next_state {
                Some(ParseState::Binding(ref mut binding)) => binding.operations.push(operation),
                _ => trace!("dropping operation binding outside a binding"),
            },

            Some(ParseState::MessageBinding { kind, binding }) => match next_state {
                Some(ParseState::OperationBinding(ref mut operation)) => match kind {
                    BindingMessageKind::Input => operation.input = Some(binding),
                    BindingMessageKind::Output => operation.output = Some(binding),
                    BindingMessageKind::Fault => operation.faults.push(binding),
                },
                _ => trace!("dropping message binding outside an operation binding"),
            },

            Some(ParseState::Extension(extension)) => {
                self.add_extension(next_state.as_mut(), extension)
            }

            Some(ParseState::HeaderFault(fault)) => match next_state {
                Some(ParseState::Extension(Extension {
                    kind: ExtensionKind::SoapHeader(ref mut header),
                    ..
                })) => header.faults.push(fault),
                _ => trace!("dropping header fault outside a header"),
            },

            Some(ParseState::Unknown { element, required }) => match next_state {
                Some(ParseState::Unknown {
                    element: ref mut parent,
                    ..
                }) => parent.children.push(element),

                _ => {
                    let mut extension = Extension::new(ExtensionKind::Element(element));
                    extension.required = required;
                    self.add_extension(next_state.as_mut(), extension)
                }
            },

            Some(ParseState::Service(service)) => self.definition.services.push(service),

            Some(ParseState::Port(port)) => match next_state {
                Some(ParseState::Service(ref mut service)) => service.ports.push(port),
                _ => trace!("dropping port outside a service"),
            },

            _ => (),
        }

        self.current_namespaces.pop_scope();

        stack.extend(next_state);
        Ok(())
    }

    fn handle_text<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        text: &BytesText<'_>,
    ) -> Result<(), error::Error> {
        let unescaped = text.unescaped()?;
        let text = reader.decode(unescaped.as_ref())?.to_owned();
        self.push_text(stack, text);
        Ok(())
    }

    fn push_text(&mut self, stack: &mut Vec<ParseState>, text: String) {
        let mut state = stack.pop();

        match state {
            Some(ParseState::Documentation(ref mut docs)) => match docs.text {
                Some(ref mut existing) => existing.push_str(&text),
                None => docs.text = Some(text),
            },
            Some(ParseState::Unknown {
                ref mut element, ..
            }) => element.text = Some(text),
            _ => (),
        }

        stack.extend(state);
    }
}

struct Parser {
    root: Url,

    descriptions: Descriptions,
    visited: HashSet<Url>,
}

impl Parser {
    fn new(url: Url) -> Self {
        Self {
            root: url,

            descriptions: Default::default(),
            visited: Default::default(),
        }
    }

    fn parse(mut self) -> Result<Descriptions, error::Error> {
        self.parse_url(self.root.clone())?;
        Ok(self.descriptions)
    }

    fn load(&self, url: Url) -> Result<Document, error::Error> {
        debug!(%url, "parsing description");

        let document = Document::new(Some(url.clone()));

        match url.scheme() {
            "file" => document.parse_xml(
                Reader::from_file(
                    url.to_file_path()
                        .map_err(|()| error::Error::PathConversionError(None))?,
                )
                .map_err(error::Error::FileOpenError)?,
            ),

            "http" | "https" => document.parse_xml(Reader::from_reader(BufReader::new(
                reqwest::blocking::get(url)?,
            ))),

            other => Err(error::Error::UnsupportedScheme(other.into())),
        }
    }

    fn parse_url(&mut self, url: Url) -> Result<(), error::Error> {
        if !self.visited.insert(url.clone()) {
            trace!(%url, "already parsed");
            return Ok(());
        }

        let Document {
            definition,
            imports,
            schema_imports,
            ..
        } = self.load(url)?;

        let index = self.descriptions.push(definition);

        for location in schema_imports {
            if !self.visited.insert(location.clone()) {
                continue;
            }

            let schema = self.load(location)?;
            if let Some(definition) = self.descriptions.get_mut(index) {
                let types = schema.definition.types;
                definition.types.elements.extend(types.elements);
                definition.types.types.extend(types.types);
            }
        }

        for location in imports {
            self.parse_url(location)?;
        }

        Ok(())
    }
}

pub fn parse(url: Url) -> Result<Descriptions, error::Error> {
    Parser::new(url).parse()
}

pub fn parse_str(xml: &str) -> Result<Definition, error::Error> {
    Ok(Document::new(None).parse_xml(Reader::from_str(xml))?.definition)
}
