use tracing::debug;
use wsbind_wsdl::{
    extensions::{
        ExtensionKind, SoapBindingStyle, SoapBody, SOAP_HTTP_TRANSPORT,
    },
    types::{Binding, Definition, MessageBinding, NamespacedName, OperationFlow, Port},
};

use crate::{
    diagnostics::Unsupported,
    emitter::{MethodDecl, Metadata, ParamDecl, SoapMethodInfo},
    error::ImportError,
    headers::{plan_headers, HeaderDirection, HeaderReference},
    identifiers::{to_snake_case, Identifiers},
    mapping::{MemberMapping, TypeMapper},
    parameters::plan_parameters,
    protocol::{
        BoundOperation, ImportContext, ImportedMethod, MethodImport, MethodOutcome, ProtocolImporter,
    },
    resolver::{self, ResolvedMessage},
};

/// SOAP 1.1 over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoapImporter;

fn soap_body<'a>(message: &'a MessageBinding, operation: &str, kind: &str) -> Result<&'a SoapBody, Unsupported> {
    message.extensions.handle(ExtensionKind::as_soap_body).ok_or_else(|| {
        Unsupported::new(format!(
            "the {} of operation '{}' has no soap:body binding",
            kind, operation
        ))
    })
}

fn header_references(message: &MessageBinding, direction: HeaderDirection) -> Vec<HeaderReference<'_>> {
    let mut references = Vec::new();

    for header in message.extensions.handle_all(ExtensionKind::as_soap_header) {
        references.push(HeaderReference::header(header, direction));
        references.extend(header.faults.iter().map(HeaderReference::fault));
    }

    references
}

fn members(
    mapper: &dyn TypeMapper,
    style: SoapBindingStyle,
    message: &ResolvedMessage<'_>,
) -> Result<Vec<MemberMapping>, Unsupported> {
    if style == SoapBindingStyle::Document && message.wrapped {
        let element = message.parts.first().and_then(|part| part.element.as_ref()).ok_or_else(|| {
            Unsupported::new(format!("wrapper part of message '{}' has no element", message.message.name))
        })?;

        return mapper.element_members(element).ok_or_else(|| {
            Unsupported::new(format!("wrapper element '{}' is not a sequence", element))
        });
    }

    message
        .parts
        .iter()
        .map(|part| {
            mapper.part_mapping(part).ok_or_else(|| {
                Unsupported::new(format!(
                    "part '{}' of message '{}' cannot be mapped",
                    part.name, message.message.name
                ))
            })
        })
        .collect()
}

/// Qualified name of the body's root element, when there is a single one.
fn wire_name(
    style: SoapBindingStyle,
    message: &ResolvedMessage<'_>,
    operation: &str,
    suffix: &str,
) -> Option<NamespacedName> {
    match style {
        SoapBindingStyle::Rpc => Some(NamespacedName::new(
            message.namespace.clone().unwrap_or_default(),
            format!("{}{}", operation, suffix),
        )),
        SoapBindingStyle::Document if message.wrapped => {
            message.parts.first().and_then(|part| part.element.clone())
        }
        SoapBindingStyle::Document => None,
    }
}

impl SoapImporter {
    fn import_soap(
        &self,
        context: &mut ImportContext<'_>,
        bound: &BoundOperation<'_>,
    ) -> Result<Result<MethodImport, Unsupported>, ImportError> {
        let operation = bound.operation;
        let operation_binding = bound.binding;
        let flow = operation.flow();

        let soap_operation = operation_binding.extensions.handle(ExtensionKind::as_soap_operation);
        let binding_style = context
            .binding
            .extensions
            .find(ExtensionKind::as_soap_binding)
            .and_then(|binding| binding.style);

        let input_binding = operation_binding.input.as_ref().ok_or_else(|| {
            ImportError::MissingMessageBinding {
                operation: operation.name.clone(),
                kind: "input",
            }
        })?;
        let input = match operation.input() {
            Some(input) => context.descriptions.message(&input.message)?,
            None => return Ok(Err(Unsupported::new(format!("operation '{}' has no input", operation.name)))),
        };

        let request_body = match soap_body(input_binding, &operation.name, "input") {
            Ok(body) => body,
            Err(reason) => return Ok(Err(reason)),
        };

        let output = match flow {
            OperationFlow::RequestResponse => {
                let output_binding = operation_binding.output.as_ref().ok_or_else(|| {
                    ImportError::MissingMessageBinding {
                        operation: operation.name.clone(),
                        kind: "output",
                    }
                })?;
                let message = match operation.output() {
                    Some(output) => context.descriptions.message(&output.message)?,
                    None => return Ok(Err(Unsupported::new(format!("operation '{}' has no output", operation.name)))),
                };
                let body = match soap_body(output_binding, &operation.name, "output") {
                    Ok(body) => body,
                    Err(reason) => return Ok(Err(reason)),
                };
                Some((output_binding, message, body))
            }
            _ => None,
        };

        let resolved = match resolver::resolve(
            binding_style,
            soap_operation.and_then(|operation| operation.style),
            Some((input, request_body)),
            output.map(|(_, message, body)| (message, body)),
        ) {
            Ok(resolved) => resolved,
            Err(reason) => return Ok(Err(reason)),
        };

        let request = match resolved.request.as_ref() {
            Some(request) => request,
            None => return Ok(Err(Unsupported::new("no request message"))),
        };

        let request_members = match members(context.mapper, resolved.style, request) {
            Ok(members) => members,
            Err(reason) => return Ok(Err(reason)),
        };
        let response_members = match resolved.response.as_ref().map(|response| members(context.mapper, resolved.style, response)) {
            Some(Ok(members)) => members,
            Some(Err(reason)) => return Ok(Err(reason)),
            None => Vec::new(),
        };

        // parameterOrder names parts, so it cannot apply to the members of a
        // document wrapper.
        let parameter_order = match (resolved.style, resolved.wrapped) {
            (SoapBindingStyle::Document, true) => None,
            _ => operation.parameter_order.as_deref(),
        };

        let mut scope = Identifiers::new();
        let plan = plan_parameters(
            &operation.name,
            &request_members,
            &response_members,
            parameter_order,
            &mut scope,
        )?;

        let mut references = header_references(input_binding, HeaderDirection::IN);
        if let Some((output_binding, _, _)) = output {
            references.extend(header_references(output_binding, HeaderDirection::OUT));
        }

        let headers = match plan_headers(
            &references,
            context.descriptions,
            context.mapper,
            &mut context.class.headers,
            &mut context.class.members,
        ) {
            Ok(headers) => headers,
            Err(reason) => return Ok(Err(reason)),
        };

        for fault in &operation_binding.faults {
            fault.extensions.handle_all(ExtensionKind::as_soap_fault);
        }

        let method_name = context
            .class
            .members
            .add_unique(&to_snake_case(&operation.name), ());

        let mut metadata = vec![Metadata::SoapMethod(SoapMethodInfo {
            style: resolved.style,
            action: soap_operation.and_then(|operation| operation.soap_action.clone()),
            request: wire_name(resolved.style, request, &operation.name, ""),
            response: resolved
                .response
                .as_ref()
                .and_then(|response| wire_name(resolved.style, response, &operation.name, "Response")),
            use_: request.use_,
            wrapped: resolved.wrapped,
            one_way: flow == OperationFlow::OneWay,
        })];
        metadata.extend(headers.usages.iter().map(|usage| usage.metadata()));

        debug!(
            operation = %operation.name,
            method = %method_name,
            style = %resolved.style,
            wrapped = resolved.wrapped,
            "imported soap operation"
        );

        let method = MethodDecl {
            name: method_name.clone(),
            parameters: plan
                .parameters
                .iter()
                .map(|parameter| ParamDecl {
                    name: parameter.name.clone(),
                    ty: parameter.native_type.clone(),
                    direction: parameter.direction,
                })
                .collect(),
            return_type: plan.return_value.as_ref().map(|value| value.native_type.clone()),
            docs: operation.docs.text.clone(),
            metadata,
        };

        Ok(Ok(MethodImport {
            method,
            fields: headers.new_fields,
            record: ImportedMethod {
                method_name,
                plan,
                wrapped: resolved.wrapped,
                style: Some(resolved.style),
                headers: headers.usages,
            },
        }))
    }
}

impl ProtocolImporter for SoapImporter {
    fn protocol_name(&self) -> &'static str {
        "Soap"
    }

    fn is_binding_supported(&self, binding: &Binding) -> bool {
        let supported = binding
            .extensions
            .find(ExtensionKind::as_soap_binding)
            .map_or(false, |soap| soap.transport.as_deref() == Some(SOAP_HTTP_TRANSPORT));

        if supported {
            binding.extensions.handle(ExtensionKind::as_soap_binding);
        }

        supported
    }

    fn supports_flow(&self, flow: OperationFlow) -> bool {
        matches!(flow, OperationFlow::OneWay | OperationFlow::RequestResponse)
    }

    fn class_metadata(&self, definition: &Definition, binding: &Binding, port: Option<&Port>) -> Vec<Metadata> {
        let location = port
            .and_then(|port| port.extensions.handle(ExtensionKind::as_soap_address))
            .map(|address| address.location.clone());

        vec![Metadata::Binding {
            name: definition.qualify(binding.name.clone()),
            protocol: self.protocol_name().into(),
            location,
        }]
    }

    fn import_method(
        &self,
        context: &mut ImportContext<'_>,
        bound: &BoundOperation<'_>,
    ) -> Result<MethodOutcome, ImportError> {
        Ok(match self.import_soap(context, bound)? {
            Ok(method) => MethodOutcome::Imported(method),
            Err(reason) => MethodOutcome::Unsupported(reason),
        })
    }
}
