use tracing::warn;
use wsbind_wsdl::{
    extensions::{
        Address, ExtensionKind, Extensions, HttpBinding, HttpOperationBinding, MimeContent, MimeXml,
    },
    types::{
        Binding, Documentation, MessageBinding, MessageKind, MessagePart, Operation, OperationBinding,
        OperationMessage, Port, PortType,
    },
};

use super::{contract::MethodContract, ProtocolReflector, ReflectContext};
use crate::{error::ReflectError, http::FORM_URL_ENCODED, mapping::is_builtin, parameters::ParameterDirection};

#[derive(Debug, Clone, Copy)]
pub struct HttpReflector {
    name: &'static str,
    verb: &'static str,
}

impl HttpReflector {
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

    /// Only plain in-parameters of built-in types fit in a query string or
    /// a form body.
    fn is_reflectable(method: &MethodContract) -> bool {
        method.return_type.is_some()
            && !method.one_way
            && method.parameters.iter().all(|parameter| {
                parameter.direction == ParameterDirection::In
                    && !parameter.repeated
                    && is_builtin(&parameter.ty)
            })
    }

    fn input_extensions(&self) -> Extensions {
        if self.verb == "GET" {
            Extensions::new().with(ExtensionKind::HttpUrlEncoded)
        } else {
            Extensions::new().with(ExtensionKind::MimeContent(MimeContent {
                part: None,
                ty: Some(FORM_URL_ENCODED.into()),
            }))
        }
    }

    fn reflect_method(
        &self,
        context: &mut ReflectContext<'_>,
        method: &MethodContract,
        return_type: &str,
    ) -> Result<(Operation, OperationBinding), ReflectError> {
        let parts = method
            .parameters
            .iter()
            .map(|parameter| {
                Ok(MessagePart::typed(
                    parameter.name.clone(),
                    context.schema_type(&method.name, &parameter.ty)?,
                ))
            })
            .collect::<Result<Vec<_>, ReflectError>>()?;

        let ty = context.schema_type(&method.name, return_type)?;
        let element = context.typed_element(return_type, ty);

        let input = context.add_message(&format!("{}{}In", method.name, self.name), parts);
        let output = context.add_message(
            &format!("{}{}Out", method.name, self.name),
            vec![MessagePart::element("Body", element)],
        );

        let mut operation = Operation::new(method.name.clone());
        operation.docs.text = method.docs.clone();
        operation
            .messages
            .push(OperationMessage::new(MessageKind::Input, input));
        operation
            .messages
            .push(OperationMessage::new(MessageKind::Output, output));

        let mut operation_binding = OperationBinding::new(method.name.clone());
        operation_binding
            .extensions
            .push(ExtensionKind::HttpOperation(HttpOperationBinding {
                location: format!("/{}", method.name),
            }));
        operation_binding.input = Some(MessageBinding::new(self.input_extensions()));
        operation_binding.output = Some(MessageBinding::new(Extensions::new().with(
            ExtensionKind::MimeXml(MimeXml {
                part: Some("Body".into()),
            }),
        )));

        Ok((operation, operation_binding))
    }
}

impl ProtocolReflector for HttpReflector {
    fn protocol_name(&self) -> &'static str {
        self.name
    }

    fn reflect(&self, context: &mut ReflectContext<'_>) -> Result<Option<Port>, ReflectError> {
        let contract = context.contract;
        let name = format!("{}{}", contract.name, self.name);

        let mut port_type = PortType {
            name: name.clone(),
            docs: Documentation::default(),
            operations: Vec::new(),
        };
        let mut binding = Binding {
            name: name.clone(),
            ty: context.qualify(&name),
            docs: Documentation::default(),
            extensions: Extensions::new().with(ExtensionKind::HttpBinding(HttpBinding {
                verb: self.verb.into(),
            })),
            operations: Vec::new(),
        };

        for method in &contract.methods {
            let return_type = match &method.return_type {
                Some(return_type) if Self::is_reflectable(method) => return_type,
                _ => {
                    warn!(method = %method.name, protocol = self.name, "method skipped, only simple in-parameters are supported");
                    continue;
                }
            };

            let (operation, operation_binding) = self.reflect_method(context, method, return_type)?;
            port_type.operations.push(operation);
            binding.operations.push(operation_binding);
        }

        if binding.operations.is_empty() {
            warn!(service = %contract.name, protocol = self.name, "no methods to reflect");
            return Ok(None);
        }

        let port = Port {
            name: name.clone(),
            binding: context.qualify(&name),
            docs: Documentation::default(),
            extensions: Extensions::new().with(ExtensionKind::HttpAddress(Address {
                location: contract.location.clone(),
            })),
        };

        context.definition.port_types.push(port_type);
        context.definition.bindings.push(binding);

        Ok(Some(port))
    }
}
