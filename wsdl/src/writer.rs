use quick_xml::{
    events::{BytesDecl, BytesStart, BytesText, Event},
    Writer,
};
use std::{collections::BTreeMap, io::Cursor};

use super::{
    error,
    extensions::{
        Extension, ExtensionKind, Extensions, SoapBindingUse, XmlElement, HTTP_NAMESPACE,
        MIME_NAMESPACE, SOAP_NAMESPACE,
    },
    types::{
        Definition, Documentation, Element, Field, FieldKind, MaxOccurs, MessageBinding,
        MessageKind, NamespacedName, Namespaces, Operation, OperationBinding, TypeKind,
        WSDL_NAMESPACE, WSI_CLAIM_NAMESPACE, XSD_NAMESPACE,
    },
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const WELL_KNOWN_PREFIXES: [(&str, &str); 7] = [
    (WSDL_NAMESPACE, "wsdl"),
    (SOAP_NAMESPACE, "soap"),
    (HTTP_NAMESPACE, "http"),
    (MIME_NAMESPACE, "mime"),
    (XSD_NAMESPACE, "s"),
    (WSI_CLAIM_NAMESPACE, "wsi"),
    (XML_NAMESPACE, "xml"),
];

fn use_attribute(use_: SoapBindingUse) -> Option<&'static str> {
    match use_ {
        SoapBindingUse::Default => None,
        other => Some(other.as_str()),
    }
}

fn push_optional(start: &mut BytesStart<'_>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        start.push_attribute((key, value));
    }
}

struct DefinitionWriter {
    writer: Writer<Cursor<Vec<u8>>>,
    prefixes: BTreeMap<String, String>,
}

impl DefinitionWriter {
    fn new(definition: &Definition) -> Self {
        let mut namespaces = Namespaces::default();
        namespaces.add_or_get(WSDL_NAMESPACE);
        collect_definition(&mut namespaces, definition);

        let mut prefixes = BTreeMap::new();
        let mut counter = 0;

        for namespace in namespaces.namespaces() {
            if namespace.is_empty() {
                continue;
            }

            let prefix = match WELL_KNOWN_PREFIXES
                .iter()
                .find(|(known, _)| *known == namespace.as_str())
            {
                Some((_, prefix)) => prefix.to_string(),
                None if *namespace == definition.target_namespace => "tns".to_owned(),
                None => {
                    counter += 1;
                    format!("ns{}", counter)
                }
            };

            prefixes.insert(namespace.clone(), prefix);
        }

        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
            prefixes,
        }
    }

    fn qname(&self, name: &NamespacedName) -> String {
        match self.prefixes.get(&name.namespace) {
            Some(prefix) => format!("{}:{}", prefix, name.name),
            None => name.name.clone(),
        }
    }

    fn wsdl(&self, local_name: &str) -> BytesStart<'static> {
        BytesStart::owned_name(self.qname(&NamespacedName::new(WSDL_NAMESPACE, local_name)))
    }

    fn xsd(&self, local_name: &str) -> BytesStart<'static> {
        BytesStart::owned_name(self.qname(&NamespacedName::new(XSD_NAMESPACE, local_name)))
    }

    fn write_empty(&mut self, start: BytesStart<'_>) -> Result<(), error::Error> {
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn write_start(&mut self, start: &BytesStart<'_>) -> Result<(), error::Error> {
        self.writer.write_event(Event::Start(start.to_borrowed()))?;
        Ok(())
    }

    fn write_end(&mut self, start: &BytesStart<'_>) -> Result<(), error::Error> {
        self.writer.write_event(Event::End(start.to_end()))?;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), error::Error> {
        self.writer
            .write_event(Event::Text(BytesText::from_plain_str(text)))?;
        Ok(())
    }

    fn write_definition(&mut self, definition: &Definition) -> Result<(), error::Error> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new(b"1.0", Some(b"utf-8".as_ref()), None)))?;

        let mut root = self.wsdl("definitions");
        let declarations = self
            .prefixes
            .iter()
            .filter(|(namespace, _)| namespace.as_str() != XML_NAMESPACE)
            .map(|(namespace, prefix)| (format!("xmlns:{}", prefix), namespace.clone()))
            .collect::<Vec<_>>();
        for (key, namespace) in &declarations {
            root.push_attribute((key.as_str(), namespace.as_str()));
        }
        push_optional(&mut root, "name", definition.name.as_deref());
        root.push_attribute(("targetNamespace", definition.target_namespace.as_str()));

        self.write_start(&root)?;

        self.write_documentation(&definition.docs)?;
        self.write_extensions(&definition.extensions)?;

        for import in &definition.imports {
            let mut start = self.wsdl("import");
            start.push_attribute(("namespace", import.namespace.as_str()));
            push_optional(&mut start, "location", import.location.as_deref());
            self.write_empty(start)?;
        }

        if !definition.types.is_empty() {
            let types = self.wsdl("types");
            self.write_start(&types)?;
            self.write_schemas(definition)?;
            self.write_end(&types)?;
        }

        for message in &definition.messages {
            let mut start = self.wsdl("message");
            start.push_attribute(("name", message.name.as_str()));
            self.write_start(&start)?;
            self.write_documentation(&message.docs)?;

            for part in &message.parts {
                let mut part_start = self.wsdl("part");
                part_start.push_attribute(("name", part.name.as_str()));
                let element = part.element.as_ref().map(|element| self.qname(element));
                push_optional(&mut part_start, "element", element.as_deref());
                let ty = part.ty.as_ref().map(|ty| self.qname(ty));
                push_optional(&mut part_start, "type", ty.as_deref());
                self.write_empty(part_start)?;
            }

            self.write_end(&start)?;
        }

        for port_type in &definition.port_types {
            let mut start = self.wsdl("portType");
            start.push_attribute(("name", port_type.name.as_str()));
            self.write_start(&start)?;
            self.write_documentation(&port_type.docs)?;

            for operation in &port_type.operations {
                self.write_operation(operation)?;
            }

            self.write_end(&start)?;
        }

        for binding in &definition.bindings {
            let mut start = self.wsdl("binding");
            start.push_attribute(("name", binding.name.as_str()));
            start.push_attribute(("type", self.qname(&binding.ty).as_str()));
            self.write_start(&start)?;
            self.write_documentation(&binding.docs)?;
            self.write_extensions(&binding.extensions)?;

            for operation in &binding.operations {
                self.write_operation_binding(operation)?;
            }

            self.write_end(&start)?;
        }

        for service in &definition.services {
            let mut start = self.wsdl("service");
            start.push_attribute(("name", service.name.as_str()));
            self.write_start(&start)?;
            self.write_documentation(&service.docs)?;
            self.write_extensions(&service.extensions)?;

            for port in &service.ports {
                let mut port_start = self.wsdl("port");
                port_start.push_attribute(("name", port.name.as_str()));
                port_start.push_attribute(("binding", self.qname(&port.binding).as_str()));
                self.write_start(&port_start)?;
                self.write_documentation(&port.docs)?;
                self.write_extensions(&port.extensions)?;
                self.write_end(&port_start)?;
            }

            self.write_end(&start)?;
        }

        self.write_end(&root)
    }

    fn write_documentation(&mut self, docs: &Documentation) -> Result<(), error::Error> {
        if docs.is_empty() {
            return Ok(());
        }

        let start = self.wsdl("documentation");
        self.write_start(&start)?;

        if let Some(text) = &docs.text {
            self.write_text(text)?;
        }

        for claim in &docs.claims {
            let mut claim_start = BytesStart::owned_name(
                self.qname(&NamespacedName::new(WSI_CLAIM_NAMESPACE, "Claim")),
            );
            claim_start.push_attribute(("conformsTo", claim.as_str()));
            self.write_empty(claim_start)?;
        }

        self.write_end(&start)
    }

    fn write_operation(&mut self, operation: &Operation) -> Result<(), error::Error> {
        let mut start = self.wsdl("operation");
        start.push_attribute(("name", operation.name.as_str()));
        let order = operation.parameter_order.as_ref().map(|order| order.join(" "));
        push_optional(&mut start, "parameterOrder", order.as_deref());
        self.write_start(&start)?;
        self.write_documentation(&operation.docs)?;

        for message in &operation.messages {
            let mut message_start = self.wsdl(match message.kind {
                MessageKind::Input => "input",
                MessageKind::Output => "output",
            });
            push_optional(&mut message_start, "name", message.name.as_deref());
            message_start.push_attribute(("message", self.qname(&message.message).as_str()));
            self.write_empty(message_start)?;
        }

        for fault in &operation.faults {
            let mut fault_start = self.wsdl("fault");
            fault_start.push_attribute(("name", fault.name.as_str()));
            fault_start.push_attribute(("message", self.qname(&fault.message).as_str()));
            self.write_empty(fault_start)?;
        }

        self.write_end(&start)
    }

    fn write_operation_binding(&mut self, operation: &OperationBinding) -> Result<(), error::Error> {
        let mut start = self.wsdl("operation");
        start.push_attribute(("name", operation.name.as_str()));
        self.write_start(&start)?;
        self.write_documentation(&operation.docs)?;
        self.write_extensions(&operation.extensions)?;

        let messages = operation
            .input
            .iter()
            .map(|binding| ("input", binding))
            .chain(operation.output.iter().map(|binding| ("output", binding)))
            .chain(operation.faults.iter().map(|binding| ("fault", binding)));

        for (local_name, binding) in messages {
            self.write_message_binding(local_name, binding)?;
        }

        self.write_end(&start)
    }

    fn write_message_binding(
        &mut self,
        local_name: &str,
        binding: &MessageBinding,
    ) -> Result<(), error::Error> {
        let mut start = self.wsdl(local_name);
        push_optional(&mut start, "name", binding.name.as_deref());

        if binding.extensions.is_empty() {
            return self.write_empty(start);
        }

        self.write_start(&start)?;
        self.write_extensions(&binding.extensions)?;
        self.write_end(&start)
    }

    fn write_extensions(&mut self, extensions: &Extensions) -> Result<(), error::Error> {
        for extension in extensions.iter() {
            self.write_extension(extension)?;
        }

        Ok(())
    }

    fn write_extension(&mut self, extension: &Extension) -> Result<(), error::Error> {
        let mut start = BytesStart::owned_name(self.qname(&extension.kind.element_name()));
        let required = self.qname(&NamespacedName::new(WSDL_NAMESPACE, "required"));

        match &extension.kind {
            ExtensionKind::SoapBinding(binding) => {
                push_optional(&mut start, "transport", binding.transport.as_deref());
                push_optional(&mut start, "style", binding.style.map(|style| style.as_str()));
            }

            ExtensionKind::SoapOperation(operation) => {
                push_optional(&mut start, "soapAction", operation.soap_action.as_deref());
                push_optional(&mut start, "style", operation.style.map(|style| style.as_str()));
            }

            ExtensionKind::SoapBody(body) => {
                let parts = body.parts.as_ref().map(|parts| parts.join(" "));
                push_optional(&mut start, "parts", parts.as_deref());
                push_optional(&mut start, "use", use_attribute(body.use_));
                push_optional(&mut start, "namespace", body.namespace.as_deref());
                push_optional(&mut start, "encodingStyle", body.encoding.as_deref());
            }

            ExtensionKind::SoapHeader(header) => {
                start.push_attribute(("message", self.qname(&header.message).as_str()));
                push_optional(&mut start, "part", header.part.as_deref());
                push_optional(&mut start, "use", use_attribute(header.use_));
                push_optional(&mut start, "namespace", header.namespace.as_deref());
                push_optional(&mut start, "encodingStyle", header.encoding.as_deref());
                if extension.required {
                    start.push_attribute((required.as_str(), "true"));
                }

                if header.faults.is_empty() {
                    return self.write_empty(start);
                }

                self.write_start(&start)?;
                for fault in &header.faults {
                    let mut fault_start = BytesStart::owned_name(
                        self.qname(&NamespacedName::new(SOAP_NAMESPACE, "headerfault")),
                    );
                    fault_start.push_attribute(("message", self.qname(&fault.message).as_str()));
                    push_optional(&mut fault_start, "part", fault.part.as_deref());
                    push_optional(&mut fault_start, "use", use_attribute(fault.use_));
                    push_optional(&mut fault_start, "namespace", fault.namespace.as_deref());
                    push_optional(&mut fault_start, "encodingStyle", fault.encoding.as_deref());
                    self.write_empty(fault_start)?;
                }
                return self.write_end(&start);
            }

            ExtensionKind::SoapFault(fault) => {
                push_optional(&mut start, "name", fault.name.as_deref());
                push_optional(&mut start, "use", use_attribute(fault.use_));
                push_optional(&mut start, "namespace", fault.namespace.as_deref());
                push_optional(&mut start, "encodingStyle", fault.encoding.as_deref());
            }

            ExtensionKind::SoapAddress(address) | ExtensionKind::HttpAddress(address) => {
                start.push_attribute(("location", address.location.as_str()));
            }

            ExtensionKind::HttpBinding(binding) => {
                start.push_attribute(("verb", binding.verb.as_str()));
            }

            ExtensionKind::HttpOperation(operation) => {
                start.push_attribute(("location", operation.location.as_str()));
            }

            ExtensionKind::HttpUrlEncoded | ExtensionKind::HttpUrlReplacement => (),

            ExtensionKind::MimeContent(content) => {
                push_optional(&mut start, "part", content.part.as_deref());
                push_optional(&mut start, "type", content.ty.as_deref());
            }

            ExtensionKind::MimeXml(xml) => {
                push_optional(&mut start, "part", xml.part.as_deref());
            }

            ExtensionKind::Element(element) => {
                return self.write_xml_element(element, extension.required.then(|| required));
            }
        }

        if extension.required {
            start.push_attribute((required.as_str(), "true"));
        }

        self.write_empty(start)
    }

    fn write_xml_element(
        &mut self,
        element: &XmlElement,
        required: Option<String>,
    ) -> Result<(), error::Error> {
        let mut start = BytesStart::owned_name(self.qname(&element.name));
        for attribute in &element.attributes {
            start.push_attribute((self.qname(&attribute.name).as_str(), attribute.value.as_str()));
        }
        if let Some(required) = &required {
            start.push_attribute((required.as_str(), "true"));
        }

        if element.children.is_empty() && element.text.is_none() {
            return self.write_empty(start);
        }

        self.write_start(&start)?;
        if let Some(text) = &element.text {
            self.write_text(text)?;
        }
        for child in &element.children {
            self.write_xml_element(child, None)?;
        }
        self.write_end(&start)
    }

    fn write_schemas(&mut self, definition: &Definition) -> Result<(), error::Error> {
        let mut schemas = Namespaces::default();
        for element in &definition.types.elements {
            schemas.add_or_get(&element.name.namespace);
        }
        for ty in &definition.types.types {
            schemas.add_or_get(&ty.name.namespace);
        }

        for namespace in schemas.namespaces() {
            let elements = definition
                .types
                .elements
                .iter()
                .filter(|element| element.name.namespace == *namespace)
                .collect::<Vec<_>>();
            let types = definition
                .types
                .types
                .iter()
                .filter(|ty| ty.name.namespace == *namespace)
                .collect::<Vec<_>>();

            let qualified = elements
                .iter()
                .filter_map(|element| match &element.ty {
                    Some(FieldKind::Inner(kind)) => Some(kind),
                    _ => None,
                })
                .chain(types.iter().map(|ty| &ty.kind))
                .any(|kind| match kind {
                    TypeKind::Struct(fields) => fields.iter().any(is_qualified_field),
                    _ => false,
                });

            let mut start = self.xsd("schema");
            if !namespace.is_empty() {
                start.push_attribute(("targetNamespace", namespace.as_str()));
            }
            if qualified {
                start.push_attribute(("elementFormDefault", "qualified"));
            }
            self.write_start(&start)?;

            for element in elements {
                self.write_element(element)?;
            }

            for ty in types {
                self.write_type_kind(Some(&ty.name.name), &ty.kind)?;
            }

            self.write_end(&start)?;
        }

        Ok(())
    }

    fn write_element(&mut self, element: &Element) -> Result<(), error::Error> {
        let mut start = self.xsd("element");
        start.push_attribute(("name", element.name.name.as_str()));
        if element.nillable {
            start.push_attribute(("nillable", "true"));
        }

        match &element.ty {
            None => self.write_empty(start),
            Some(FieldKind::Type(ty)) => {
                start.push_attribute(("type", self.qname(ty).as_str()));
                self.write_empty(start)
            }
            Some(FieldKind::Inner(kind)) => {
                self.write_start(&start)?;
                self.write_type_kind(None, kind)?;
                self.write_end(&start)
            }
        }
    }

    fn write_type_kind(&mut self, name: Option<&str>, kind: &TypeKind) -> Result<(), error::Error> {
        match kind {
            TypeKind::Struct(fields) => {
                let mut start = self.xsd("complexType");
                push_optional(&mut start, "name", name);

                if fields.is_empty() {
                    return self.write_empty(start);
                }

                self.write_start(&start)?;
                let sequence = self.xsd("sequence");
                self.write_start(&sequence)?;
                for field in fields {
                    self.write_field(field)?;
                }
                self.write_end(&sequence)?;
                self.write_end(&start)
            }

            TypeKind::Simple(base) => {
                let mut start = self.xsd("simpleType");
                push_optional(&mut start, "name", name);
                self.write_start(&start)?;
                let mut restriction = self.xsd("restriction");
                restriction.push_attribute(("base", self.qname(base).as_str()));
                self.write_empty(restriction)?;
                self.write_end(&start)
            }

            TypeKind::Alias(base) => {
                let mut start = self.xsd("complexType");
                push_optional(&mut start, "name", name);
                self.write_start(&start)?;
                let content = self.xsd("simpleContent");
                self.write_start(&content)?;
                let mut extension = self.xsd("extension");
                extension.push_attribute(("base", self.qname(base).as_str()));
                self.write_empty(extension)?;
                self.write_end(&content)?;
                self.write_end(&start)
            }
        }
    }

    fn write_field(&mut self, field: &Field) -> Result<(), error::Error> {
        let mut start = self.xsd("element");
        start.push_attribute(("name", field.name.name.as_str()));

        if field.min_occurs != 1 {
            start.push_attribute(("minOccurs", field.min_occurs.to_string().as_str()));
        }
        match field.max_occurs {
            MaxOccurs::Bounded(1) => (),
            MaxOccurs::Bounded(max) => start.push_attribute(("maxOccurs", max.to_string().as_str())),
            MaxOccurs::Unbounded => start.push_attribute(("maxOccurs", "unbounded")),
        }
        if field.nillable {
            start.push_attribute(("nillable", "true"));
        }

        match &field.ty {
            FieldKind::Type(ty) => {
                start.push_attribute(("type", self.qname(ty).as_str()));
                self.write_empty(start)
            }
            FieldKind::Inner(kind) => {
                self.write_start(&start)?;
                self.write_type_kind(None, kind)?;
                self.write_end(&start)
            }
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.writer.into_inner().into_inner()).into_owned()
    }
}

fn is_qualified_field(field: &Field) -> bool {
    !field.name.namespace.is_empty()
}

fn collect_kind(namespaces: &mut Namespaces, kind: &TypeKind) {
    match kind {
        TypeKind::Struct(fields) => {
            for field in fields {
                namespaces.add_or_get(&field.name.namespace);
                match &field.ty {
                    FieldKind::Type(ty) => {
                        namespaces.add_or_get(&ty.namespace);
                    }
                    FieldKind::Inner(kind) => collect_kind(namespaces, kind),
                }
            }
        }
        TypeKind::Simple(base) | TypeKind::Alias(base) => {
            namespaces.add_or_get(&base.namespace);
        }
    }
}

fn collect_xml_element(namespaces: &mut Namespaces, element: &XmlElement) {
    namespaces.add_or_get(&element.name.namespace);
    for attribute in &element.attributes {
        namespaces.add_or_get(&attribute.name.namespace);
    }
    for child in &element.children {
        collect_xml_element(namespaces, child);
    }
}

fn collect_extensions(namespaces: &mut Namespaces, extensions: &Extensions) {
    for extension in extensions.iter() {
        namespaces.add_or_get(&extension.kind.element_name().namespace);

        match &extension.kind {
            ExtensionKind::SoapHeader(header) => {
                namespaces.add_or_get(&header.message.namespace);
                for fault in &header.faults {
                    namespaces.add_or_get(&fault.message.namespace);
                }
            }
            ExtensionKind::Element(element) => collect_xml_element(namespaces, element),
            _ => (),
        }
    }
}

fn collect_documentation(namespaces: &mut Namespaces, docs: &Documentation) {
    if !docs.claims.is_empty() {
        namespaces.add_or_get(WSI_CLAIM_NAMESPACE);
    }
}

fn collect_definition(namespaces: &mut Namespaces, definition: &Definition) {
    namespaces.add_or_get(&definition.target_namespace);
    collect_documentation(namespaces, &definition.docs);
    collect_extensions(namespaces, &definition.extensions);

    if !definition.types.is_empty() {
        namespaces.add_or_get(XSD_NAMESPACE);
    }
    for element in &definition.types.elements {
        namespaces.add_or_get(&element.name.namespace);
        match &element.ty {
            Some(FieldKind::Type(ty)) => {
                namespaces.add_or_get(&ty.namespace);
            }
            Some(FieldKind::Inner(kind)) => collect_kind(namespaces, kind),
            None => (),
        }
    }
    for ty in &definition.types.types {
        namespaces.add_or_get(&ty.name.namespace);
        collect_kind(namespaces, &ty.kind);
    }

    for message in &definition.messages {
        collect_documentation(namespaces, &message.docs);
        for part in &message.parts {
            for name in part.element.iter().chain(part.ty.iter()) {
                namespaces.add_or_get(&name.namespace);
            }
        }
    }

    for port_type in &definition.port_types {
        collect_documentation(namespaces, &port_type.docs);
        for operation in &port_type.operations {
            collect_documentation(namespaces, &operation.docs);
            for message in &operation.messages {
                namespaces.add_or_get(&message.message.namespace);
            }
            for fault in &operation.faults {
                namespaces.add_or_get(&fault.message.namespace);
            }
        }
    }

    for binding in &definition.bindings {
        namespaces.add_or_get(&binding.ty.namespace);
        collect_documentation(namespaces, &binding.docs);
        collect_extensions(namespaces, &binding.extensions);

        for operation in &binding.operations {
            collect_documentation(namespaces, &operation.docs);
            collect_extensions(namespaces, &operation.extensions);
            for message in operation.message_bindings() {
                collect_extensions(namespaces, &message.extensions);
            }
        }
    }

    for service in &definition.services {
        collect_documentation(namespaces, &service.docs);
        collect_extensions(namespaces, &service.extensions);
        for port in &service.ports {
            namespaces.add_or_get(&port.binding.namespace);
            collect_documentation(namespaces, &port.docs);
            collect_extensions(namespaces, &port.extensions);
        }
    }
}

pub fn write(definition: &Definition) -> Result<String, error::Error> {
    let mut writer = DefinitionWriter::new(definition);
    writer.write_definition(definition)?;
    Ok(writer.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessagePart};

    #[test]
    fn well_known_namespaces_get_fixed_prefixes() {
        let mut definition = Definition::new("urn:example");
        definition.messages.push(Message {
            name: "Ping".into(),
            docs: Default::default(),
            parts: vec![
                MessagePart::typed("count", NamespacedName::new(XSD_NAMESPACE, "int")),
                MessagePart::element("body", NamespacedName::new("urn:other", "Body")),
            ],
        });

        let xml = write(&definition).expect("write");

        assert!(xml.contains("xmlns:wsdl=\"http://schemas.xmlsoap.org/wsdl/\""));
        assert!(xml.contains("xmlns:tns=\"urn:example\""));
        assert!(xml.contains("xmlns:ns1=\"urn:other\""));
        assert!(xml.contains("type=\"s:int\""));
        assert!(xml.contains("element=\"ns1:Body\""));
    }
}
