use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};
use wsbind_wsdl::{
    descriptions::Descriptions,
    extensions::{
        Extension, Extensions, SoapBindingStyle, SoapBindingUse, SoapBody, SoapFault, SoapHeader,
        SoapHeaderFault, SOAP_HTTP_TRANSPORT,
    },
    types::{
        Binding, Definition, Documentation, Message, MessageBinding, MessageKind, NamespacedName,
        Operation, OperationBinding, OperationFlow, PortType, BASIC_PROFILE_1_1,
    },
};

use crate::rules::{RuleCode, Violations};

fn binding_path(binding: &Binding) -> String {
    format!("wsdl:binding[@name='{}']", binding.name)
}

fn operation_binding_path(binding: &Binding, operation: &OperationBinding) -> String {
    format!("{}/wsdl:operation[@name='{}']", binding_path(binding), operation.name)
}

fn port_type_path(port_type: &PortType) -> String {
    format!("wsdl:portType[@name='{}']", port_type.name)
}

fn operation_path(port_type: &PortType, operation: &Operation) -> String {
    format!("{}/wsdl:operation[@name='{}']", port_type_path(port_type), operation.name)
}

fn part_path(message: &Message, part: &str) -> String {
    format!("wsdl:message[@name='{}']/wsdl:part[@name='{}']", message.name, part)
}

fn extension_path(owner: &str, extension: &Extension) -> String {
    let name = extension.kind.element_name();
    format!("{}/{{{}}}{}", owner, name.namespace, name.name)
}

/// Whether `value` looks like an absolute URI: a scheme followed by ':'.
fn is_absolute_uri(value: &str) -> bool {
    match value.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().map_or(false, |first| first.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn soap_bodies(message: &MessageBinding) -> impl Iterator<Item = &SoapBody> {
    message.extensions.iter().filter_map(|extension| extension.kind.as_soap_body())
}

fn soap_headers(message: &MessageBinding) -> impl Iterator<Item = &SoapHeader> {
    message.extensions.iter().filter_map(|extension| extension.kind.as_soap_header())
}

fn soap_faults(message: &MessageBinding) -> impl Iterator<Item = &SoapFault> {
    message.extensions.iter().filter_map(|extension| extension.kind.as_soap_fault())
}

/// Namespace and root name an operation's request is recognized by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WireSignature {
    namespace: String,
    name: String,
}

struct BindingChecker<'a> {
    descriptions: &'a Descriptions,
    binding: &'a Binding,
    binding_style: SoapBindingStyle,
    violations: &'a mut Violations,
}

impl<'a> BindingChecker<'a> {
    fn style_of(&self, operation: &OperationBinding) -> SoapBindingStyle {
        operation
            .extensions
            .iter()
            .find_map(|extension| extension.kind.as_soap_operation())
            .and_then(|operation| operation.style)
            .unwrap_or(self.binding_style)
    }

    fn check_binding(&mut self) {
        let descriptions = self.descriptions;
        let binding = self.binding;
        let path = binding_path(binding);

        match binding
            .extensions
            .iter()
            .find_map(|extension| extension.kind.as_soap_binding())
            .and_then(|soap| soap.transport.as_deref())
        {
            None => self.violations.add(RuleCode::R2701, &path),
            Some(transport) if transport != SOAP_HTTP_TRANSPORT => self.violations.add(RuleCode::R2702, &path),
            Some(_) => (),
        }

        let styles = binding
            .operations
            .iter()
            .map(|operation| self.style_of(operation))
            .collect::<HashSet<_>>();
        if styles.len() > 1 {
            self.violations.add(RuleCode::R2705, &path);
        }

        let port_type = match descriptions.find_port_type(&binding.ty) {
            Some(port_type) => port_type,
            None => {
                debug!(binding = %binding.name, port_type = %binding.ty, "port type not found, skipping operation checks");
                return;
            }
        };

        self.check_operation_sets(port_type);

        let mut signatures: HashMap<WireSignature, String> = HashMap::new();

        for operation_binding in &binding.operations {
            let operation = port_type
                .operations
                .iter()
                .find(|operation| operation.is_bound_by(operation_binding));

            let operation = match operation {
                Some(operation) => operation,
                None => continue,
            };

            let style = self.style_of(operation_binding);
            let op_path = operation_binding_path(binding, operation_binding);

            if let Some(input) = &operation_binding.input {
                let message = operation.input().and_then(|input| descriptions.find_message(&input.message));
                self.check_message_binding(style, &op_path, input, message);

                if let Some(signature) = self.signature(style, operation, input, message) {
                    match signatures.get(&signature) {
                        Some(first) => {
                            let first = first.clone();
                            self.violations.add(RuleCode::R2710, first);
                            self.violations.add(RuleCode::R2710, &op_path);
                        }
                        None => {
                            signatures.insert(signature, op_path.clone());
                        }
                    }
                }
            }

            if let Some(output) = &operation_binding.output {
                let message = operation.output().and_then(|output| descriptions.find_message(&output.message));
                self.check_message_binding(style, &op_path, output, message);
            }

            for fault in &operation_binding.faults {
                self.check_fault(style, &op_path, operation, fault);
            }
        }
    }

    /// Both directions of the one-to-one mapping between port type
    /// operations and operation bindings.
    fn check_operation_sets(&mut self, port_type: &PortType) {
        let binding = self.binding;

        for operation_binding in &binding.operations {
            let matches = port_type
                .operations
                .iter()
                .filter(|operation| operation.is_bound_by(operation_binding))
                .count();
            if matches != 1 {
                self.violations
                    .add(RuleCode::R2718, operation_binding_path(binding, operation_binding));
            }
        }

        for operation in &port_type.operations {
            let bound = binding
                .operations
                .iter()
                .filter(|operation_binding| operation.is_bound_by(operation_binding))
                .count();
            if bound != 1 {
                self.violations.add(RuleCode::R2718, operation_path(port_type, operation));
            }
        }
    }

    fn signature(
        &self,
        style: SoapBindingStyle,
        operation: &Operation,
        input: &MessageBinding,
        message: Option<&Message>,
    ) -> Option<WireSignature> {
        let body = soap_bodies(input).next()?;

        match style {
            SoapBindingStyle::Rpc => Some(WireSignature {
                namespace: body.namespace.clone().unwrap_or_default(),
                name: operation.name.clone(),
            }),

            SoapBindingStyle::Document => {
                let message = message?;
                let first = match &body.parts {
                    Some(parts) => parts.first().and_then(|name| message.find_part(name)),
                    None => message.parts.first(),
                };

                let element = first.and_then(|part| part.element.clone());
                let NamespacedName { namespace, name } = element.unwrap_or_else(|| NamespacedName::new("", ""));
                Some(WireSignature { namespace, name })
            }
        }
    }

    fn check_message_binding(
        &mut self,
        style: SoapBindingStyle,
        path: &str,
        binding: &MessageBinding,
        message: Option<&Message>,
    ) {
        let mut bound_parts = HashSet::new();

        for body in soap_bodies(binding) {
            if body.use_ == SoapBindingUse::Encoded {
                self.violations.add(RuleCode::R2706, path);
            }

            let message = match message {
                Some(message) => message,
                None => continue,
            };

            let parts = match &body.parts {
                Some(names) => names.iter().filter_map(|name| message.find_part(name)).collect::<Vec<_>>(),
                None => message.parts.iter().collect(),
            };
            bound_parts.extend(parts.iter().map(|part| part.name.clone()));

            match style {
                SoapBindingStyle::Document => {
                    if body.namespace.is_some() {
                        self.violations.add(RuleCode::R2716, path);
                    }

                    match &body.parts {
                        Some(names) if names.len() > 1 => self.violations.add(RuleCode::R2201, path),
                        None if message.parts.len() > 1 => self.violations.add(RuleCode::R2210, path),
                        _ => (),
                    }

                    for part in parts.iter().filter(|part| part.element.is_none()) {
                        self.violations.add(RuleCode::R2204, part_path(message, &part.name));
                    }
                }

                SoapBindingStyle::Rpc => {
                    if !body.namespace.as_deref().map_or(false, is_absolute_uri) {
                        self.violations.add(RuleCode::R2717, path);
                    }

                    for part in parts.iter().filter(|part| part.ty.is_none()) {
                        self.violations.add(RuleCode::R2203, part_path(message, &part.name));
                    }
                }
            }
        }

        for header in soap_headers(binding) {
            self.check_header_reference(style, path, &header.message, header.part.as_deref(), header.use_, header.namespace.is_some());

            if message.map_or(false, |message| header.message.name == message.name) {
                if let Some(part) = &header.part {
                    bound_parts.insert(part.clone());
                }
            }

            for fault in &header.faults {
                let SoapHeaderFault {
                    message,
                    part,
                    use_,
                    namespace,
                    ..
                } = fault;
                self.check_header_reference(style, path, message, part.as_deref(), *use_, namespace.is_some());
            }
        }

        if let Some(message) = message {
            for part in message.parts.iter().filter(|part| !bound_parts.contains(&part.name)) {
                self.violations.add(RuleCode::R2209, part_path(message, &part.name));
            }
        }
    }

    fn check_header_reference(
        &mut self,
        style: SoapBindingStyle,
        path: &str,
        message: &NamespacedName,
        part: Option<&str>,
        use_: SoapBindingUse,
        has_namespace: bool,
    ) {
        if use_ == SoapBindingUse::Encoded {
            self.violations.add(RuleCode::R2706, path);
        }

        if has_namespace {
            let rule = match style {
                SoapBindingStyle::Document => RuleCode::R2716,
                SoapBindingStyle::Rpc => RuleCode::R2726,
            };
            self.violations.add(rule, path);
        }

        let part = match part {
            Some(part) => part,
            None => {
                self.violations.add(RuleCode::R2720, path);
                return;
            }
        };

        if let Some(message) = self.descriptions.find_message(message) {
            if let Some(found) = message.find_part(part) {
                if found.element.is_none() {
                    self.violations.add(RuleCode::R2205, part_path(message, part));
                }
            }
        }
    }

    fn check_fault(&mut self, style: SoapBindingStyle, path: &str, operation: &Operation, fault: &MessageBinding) {
        let declared = fault
            .name
            .as_deref()
            .and_then(|name| operation.faults.iter().find(|declared| declared.name == name));

        for soap_fault in soap_faults(fault) {
            if soap_fault.use_ == SoapBindingUse::Encoded {
                self.violations.add(RuleCode::R2706, path);
            }

            if soap_fault.namespace.is_some() {
                let rule = match style {
                    SoapBindingStyle::Document => RuleCode::R2716,
                    SoapBindingStyle::Rpc => RuleCode::R2726,
                };
                self.violations.add(rule, path);
            }

            match &soap_fault.name {
                None => self.violations.add(RuleCode::R2721, path),
                Some(name) if Some(name) != fault.name.as_ref() => self.violations.add(RuleCode::R2754, path),
                Some(_) => (),
            }
        }

        let message = declared.and_then(|declared| self.descriptions.find_message(&declared.message));
        if let Some(message) = message {
            for part in message.parts.iter().filter(|part| part.element.is_none()) {
                self.violations.add(RuleCode::R2205, part_path(message, &part.name));
            }
        }
    }
}

fn check_messages(definition: &Definition, violations: &mut Violations) {
    for message in &definition.messages {
        for part in &message.parts {
            if part.element.is_some() && part.ty.is_some() {
                violations.add(RuleCode::R2306, part_path(message, &part.name));
            }
        }
    }
}

fn check_port_types(definition: &Definition, descriptions: &Descriptions, violations: &mut Violations) {
    for port_type in &definition.port_types {
        let mut names = HashSet::new();

        for operation in &port_type.operations {
            let path = operation_path(port_type, operation);

            if !names.insert(operation.name.as_str()) {
                violations.add(RuleCode::R2304, port_type_path(port_type));
            }

            if matches!(operation.flow(), OperationFlow::Notification | OperationFlow::SolicitResponse) {
                violations.add(RuleCode::R2303, &path);
            }

            let order = match &operation.parameter_order {
                Some(order) => order,
                None => continue,
            };
            let output = operation
                .messages
                .iter()
                .find(|message| message.kind == MessageKind::Output)
                .and_then(|output| descriptions.find_message(&output.message));

            if let Some(output) = output {
                let omitted = output
                    .parts
                    .iter()
                    .filter(|part| !order.contains(&part.name))
                    .count();
                if omitted > 1 {
                    violations.add(RuleCode::R2305, &path);
                }
            }
        }
    }
}

/// Runs every rule over every definition in `descriptions`.
///
/// Binding-level rules only look at SOAP bindings.
pub fn check(descriptions: &Descriptions) -> Vec<crate::Violation> {
    let mut violations = Violations::new();

    for definition in descriptions.iter() {
        trace!(namespace = %definition.target_namespace, "checking definition");

        check_messages(definition, &mut violations);
        check_port_types(definition, descriptions, &mut violations);

        for binding in &definition.bindings {
            let soap = match binding.extensions.iter().find_map(|extension| extension.kind.as_soap_binding()) {
                Some(soap) => soap,
                None => {
                    trace!(binding = %binding.name, "not a SOAP binding");
                    continue;
                }
            };

            BindingChecker {
                descriptions,
                binding,
                binding_style: soap.style.unwrap_or_default(),
                violations: &mut violations,
            }
            .check_binding();
        }
    }

    violations.extend(claims(descriptions));
    violations.into_vec()
}

fn required_extensions(owner: &str, extensions: &Extensions, violations: &mut Violations) {
    for extension in extensions.required() {
        violations.add(RuleCode::R2026, extension_path(owner, extension));
    }
}

fn binding_claims(binding: &Binding, violations: &mut Violations) {
    let path = binding_path(binding);
    required_extensions(&path, &binding.extensions, violations);

    for operation in &binding.operations {
        let op_path = operation_binding_path(binding, operation);
        required_extensions(&op_path, &operation.extensions, violations);

        for message in operation.message_bindings() {
            required_extensions(&op_path, &message.extensions, violations);
        }
    }
}

fn claims_profile(docs: &Documentation) -> bool {
    docs.claims(BASIC_PROFILE_1_1)
}

fn claims(descriptions: &Descriptions) -> Violations {
    let mut violations = Violations::new();

    for definition in descriptions.iter() {
        let whole = claims_profile(&definition.docs);
        if whole {
            required_extensions("wsdl:definitions", &definition.extensions, &mut violations);
        }

        for binding in &definition.bindings {
            if whole || claims_profile(&binding.docs) {
                binding_claims(binding, &mut violations);
            }
        }

        for service in &definition.services {
            let service_claims = whole || claims_profile(&service.docs);
            let service_path = format!("wsdl:service[@name='{}']", service.name);
            if service_claims {
                required_extensions(&service_path, &service.extensions, &mut violations);
            }

            for port in &service.ports {
                if service_claims || claims_profile(&port.docs) {
                    let path = format!("{}/wsdl:port[@name='{}']", service_path, port.name);
                    required_extensions(&path, &port.extensions, &mut violations);
                }
            }
        }
    }

    violations
}

/// Required extensions anywhere below an element that claims Basic
/// Profile conformance.
pub fn check_claims(descriptions: &Descriptions) -> Vec<crate::Violation> {
    claims(descriptions).into_vec()
}
