use tracing::debug;
use wsbind_wsdl::{
    extensions::ExtensionKind,
    types::{Binding, Definition, Message, MessageBinding, OperationFlow, Port},
};

use crate::{
    diagnostics::Unsupported,
    emitter::{HttpMethodInfo, MethodDecl, Metadata, ParamDecl},
    error::ImportError,
    identifiers::{to_snake_case, Identifiers},
    mapping::MemberMapping,
    parameters::plan_parameters,
    protocol::{
        BoundOperation, ImportContext, ImportedMethod, MethodImport, MethodOutcome, ProtocolImporter,
    },
};

pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP GET or POST binding with form-encoded input and XML output.
#[derive(Debug, Clone, Copy)]
pub struct HttpImporter {
    name: &'static str,
    verb: &'static str,
}

impl HttpImporter {
    pub fn get() -> Self {
        Self {
            name: "HttpGet",
            verb: "GET",
        }
    }

    pub fn post() -> Self {
        Self {
            name: "HttpPost",
            verb: "POST",
        }
    }

    pub fn verb(&self) -> &'static str {
        self.verb
    }

    fn input_format(&self, input: &MessageBinding) -> Option<&'static str> {
        let extensions = &input.extensions;

        if self.verb == "GET" {
            if extensions.handle_matching(ExtensionKind::is_http_url_encoded) {
                return Some("urlEncoded");
            }
            if extensions.handle_matching(ExtensionKind::is_http_url_replacement) {
                return Some("urlReplacement");
            }
        }

        extensions
            .handle(|kind| {
                kind.as_mime_content()
                    .filter(|content| content.ty.as_deref() == Some(FORM_URL_ENCODED))
            })
            .map(|_| "formEncoded")
    }

    fn request_members(&self, context: &ImportContext<'_>, message: &Message) -> Result<Vec<MemberMapping>, Unsupported> {
        message
            .parts
            .iter()
            .map(|part| {
                let ty = part.ty.as_ref().ok_or_else(|| {
                    Unsupported::new(format!(
                        "{} input part '{}' must reference a type",
                        self.name, part.name
                    ))
                })?;

                let simple = context.mapper.map_type(ty).map_or(false, |native| native.is_simple);
                if !simple {
                    return Err(Unsupported::new(format!(
                        "{} input part '{}' is not of a simple type",
                        self.name, part.name
                    )));
                }

                context.mapper.part_mapping(part).ok_or_else(|| {
                    Unsupported::new(format!("part '{}' cannot be mapped", part.name))
                })
            })
            .collect()
    }

    fn response_member(
        &self,
        context: &ImportContext<'_>,
        output: &MessageBinding,
        message: &Message,
    ) -> Result<MemberMapping, Unsupported> {
        let mime = output.extensions.handle(ExtensionKind::as_mime_xml).ok_or_else(|| {
            Unsupported::new(format!("{} output of message '{}' is not mime:mimeXml", self.name, message.name))
        })?;

        let part = match &mime.part {
            Some(name) => message.find_part(name),
            None if message.parts.len() == 1 => message.parts.first(),
            None => None,
        }
        .ok_or_else(|| Unsupported::new(format!("mime:mimeXml part not found in message '{}'", message.name)))?;

        context
            .mapper
            .part_mapping(part)
            .ok_or_else(|| Unsupported::new(format!("part '{}' cannot be mapped", part.name)))
    }

    fn import_http(
        &self,
        context: &mut ImportContext<'_>,
        bound: &BoundOperation<'_>,
    ) -> Result<Result<MethodImport, Unsupported>, ImportError> {
        let operation = bound.operation;
        let operation_binding = bound.binding;

        let location = match operation_binding.extensions.handle(ExtensionKind::as_http_operation) {
            Some(http) => http.location.clone(),
            None => {
                return Ok(Err(Unsupported::new(format!(
                    "operation '{}' has no http:operation binding",
                    operation.name
                ))))
            }
        };

        let input_binding = operation_binding.input.as_ref().ok_or_else(|| ImportError::MissingMessageBinding {
            operation: operation.name.clone(),
            kind: "input",
        })?;
        let output_binding = operation_binding.output.as_ref().ok_or_else(|| ImportError::MissingMessageBinding {
            operation: operation.name.clone(),
            kind: "output",
        })?;

        let (input, output) = match (operation.input(), operation.output()) {
            (Some(input), Some(output)) => (
                context.descriptions.message(&input.message)?,
                context.descriptions.message(&output.message)?,
            ),
            _ => return Ok(Err(Unsupported::new(format!("operation '{}' is not request/response", operation.name)))),
        };

        let input_format = match self.input_format(input_binding) {
            Some(format) => format,
            None => {
                return Ok(Err(Unsupported::new(format!(
                    "no supported {} input format for operation '{}'",
                    self.name, operation.name
                ))))
            }
        };

        let request = match self.request_members(context, input) {
            Ok(members) => members,
            Err(reason) => return Ok(Err(reason)),
        };
        let response = match self.response_member(context, output_binding, output) {
            Ok(member) => member,
            Err(reason) => return Ok(Err(reason)),
        };

        let plan = plan_parameters(
            &operation.name,
            &request,
            std::slice::from_ref(&response),
            None,
            &mut Identifiers::new(),
        )?;

        let method_name = context
            .class
            .members
            .add_unique(&to_snake_case(&operation.name), ());

        debug!(operation = %operation.name, method = %method_name, verb = self.verb, "imported http operation");

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
            metadata: vec![Metadata::HttpMethod(HttpMethodInfo {
                verb: self.verb.into(),
                location,
                input: input_format.into(),
                output: "mimeXml".into(),
            })],
        };

        Ok(Ok(MethodImport {
            method,
            fields: Vec::new(),
            record: ImportedMethod {
                method_name,
                plan,
                wrapped: false,
                style: None,
                headers: Vec::new(),
            },
        }))
    }
}

impl ProtocolImporter for HttpImporter {
    fn protocol_name(&self) -> &'static str {
        self.name
    }

    fn is_binding_supported(&self, binding: &Binding) -> bool {
        let supported = binding
            .extensions
            .find(ExtensionKind::as_http_binding)
            .map_or(false, |http| http.verb.eq_ignore_ascii_case(self.verb));

        if supported {
            binding.extensions.handle(ExtensionKind::as_http_binding);
        }

        supported
    }

    fn supports_flow(&self, flow: OperationFlow) -> bool {
        flow == OperationFlow::RequestResponse
    }

    fn class_metadata(&self, definition: &Definition, binding: &Binding, port: Option<&Port>) -> Vec<Metadata> {
        let location = port
            .and_then(|port| port.extensions.handle(ExtensionKind::as_http_address))
            .map(|address| address.location.clone());

        vec![Metadata::Binding {
            name: definition.qualify(binding.name.clone()),
            protocol: self.name.into(),
            location,
        }]
    }

    fn import_method(
        &self,
        context: &mut ImportContext<'_>,
        bound: &BoundOperation<'_>,
    ) -> Result<MethodOutcome, ImportError> {
        Ok(match self.import_http(context, bound)? {
            Ok(method) => MethodOutcome::Imported(method),
            Err(reason) => MethodOutcome::Unsupported(reason),
        })
    }
}
