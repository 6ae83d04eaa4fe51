use tracing::{debug, warn};
use wsbind_wsdl::{
    extensions::{
        Address, ExtensionKind, Extensions, SoapBinding, SoapBindingStyle, SoapBindingUse, SoapBody,
        SoapHeader, SoapOperationBinding, SOAP_ENCODING_NAMESPACE, SOAP_HTTP_TRANSPORT,
    },
    types::{
        Binding, Documentation, MessageBinding, MessageKind, MessagePart, Operation, OperationBinding,
        OperationMessage, Port, PortType,
    },
};

use super::{
    contract::{MethodContract, ParameterContract, ParameterStyle},
    ProtocolReflector, ReflectContext,
};
use crate::{error::ReflectError, headers::HeaderDirection};

#[derive(Debug, Clone, Copy, Default)]
pub struct SoapReflector;

const SUFFIX: &str = "Soap";

struct MessageShape {
    request: Vec<MessagePart>,
    response: Vec<MessagePart>,
    parameter_order: Option<Vec<String>>,
}

fn result_name(method: &MethodContract) -> String {
    format!("{}Result", method.name)
}

fn reject_repeated(method: &MethodContract, parameter: &ParameterContract) -> Result<(), ReflectError> {
    if parameter.repeated {
        return Err(ReflectError::UnsupportedParameter {
            method: method.name.clone(),
            parameter: parameter.name.clone(),
            reason: "repeated parameters need a wrapper element",
        });
    }
    Ok(())
}

fn rpc_shape(context: &ReflectContext<'_>, method: &MethodContract) -> Result<MessageShape, ReflectError> {
    let mut request = Vec::new();
    for parameter in method.inputs() {
        reject_repeated(method, parameter)?;
        request.push(MessagePart::typed(
            parameter.name.clone(),
            context.schema_type(&method.name, &parameter.ty)?,
        ));
    }

    let mut response = Vec::new();
    if let Some(ty) = &method.return_type {
        response.push(MessagePart::typed(result_name(method), context.schema_type(&method.name, ty)?));
    }
    for parameter in method.outputs() {
        reject_repeated(method, parameter)?;
        response.push(MessagePart::typed(
            parameter.name.clone(),
            context.schema_type(&method.name, &parameter.ty)?,
        ));
    }

    let order = method
        .parameters
        .iter()
        .map(|parameter| parameter.name.clone())
        .collect::<Vec<_>>();

    Ok(MessageShape {
        request,
        response,
        parameter_order: if order.is_empty() { None } else { Some(order) },
    })
}

fn wrapped_shape(context: &mut ReflectContext<'_>, method: &MethodContract) -> Result<MessageShape, ReflectError> {
    let fields = method
        .inputs()
        .map(|parameter| {
            context.field(&method.name, &parameter.name, &parameter.ty, parameter.optional, parameter.repeated)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let request = context.add_wrapper_element(&method.name, fields);

    let mut response = Vec::new();
    if !method.one_way {
        let mut fields = Vec::new();
        if let Some(ty) = &method.return_type {
            fields.push(context.field(&method.name, &result_name(method), ty, false, false)?);
        }
        for parameter in method.outputs() {
            fields.push(context.field(
                &method.name,
                &parameter.name,
                &parameter.ty,
                parameter.optional,
                parameter.repeated,
            )?);
        }

        let element = context.add_wrapper_element(&format!("{}Response", method.name), fields);
        response.push(MessagePart::element("parameters", element));
    }

    Ok(MessageShape {
        request: vec![MessagePart::element("parameters", request)],
        response,
        parameter_order: None,
    })
}

fn bare_shape(context: &mut ReflectContext<'_>, method: &MethodContract) -> Result<MessageShape, ReflectError> {
    let mut request = Vec::new();
    for parameter in method.inputs() {
        reject_repeated(method, parameter)?;
        let ty = context.schema_type(&method.name, &parameter.ty)?;
        let element = context.typed_element(&parameter.name, ty);
        request.push(MessagePart::element(parameter.name.clone(), element));
    }

    let mut response = Vec::new();
    if let Some(ty) = &method.return_type {
        let ty = context.schema_type(&method.name, ty)?;
        let element = context.typed_element(&result_name(method), ty);
        response.push(MessagePart::element(result_name(method), element));
    }
    for parameter in method.outputs() {
        reject_repeated(method, parameter)?;
        let ty = context.schema_type(&method.name, &parameter.ty)?;
        let element = context.typed_element(&parameter.name, ty);
        response.push(MessagePart::element(parameter.name.clone(), element));
    }

    Ok(MessageShape {
        request,
        response,
        parameter_order: None,
    })
}

fn reflect_method(
    context: &mut ReflectContext<'_>,
    method: &MethodContract,
) -> Result<(Operation, OperationBinding), ReflectError> {
    let contract = context.contract;
    let style = contract.style_of(method);
    let use_ = contract.use_of(method);

    if style == SoapBindingStyle::Document && use_ == SoapBindingUse::Encoded {
        return Err(ReflectError::DocumentEncoded(method.name.clone()));
    }

    if method.one_way && (method.return_type.is_some() || method.outputs().next().is_some()) {
        return Err(ReflectError::OneWayWithOutput(method.name.clone()));
    }

    let shape = match (style, contract.parameter_style_of(method)) {
        (SoapBindingStyle::Rpc, _) => rpc_shape(context, method)?,
        (SoapBindingStyle::Document, ParameterStyle::Wrapped) => wrapped_shape(context, method)?,
        (SoapBindingStyle::Document, ParameterStyle::Bare) => bare_shape(context, method)?,
    };

    let input = context.add_message(&format!("{}{}In", method.name, SUFFIX), shape.request);
    let output = if method.one_way {
        None
    } else {
        Some(context.add_message(&format!("{}{}Out", method.name, SUFFIX), shape.response))
    };

    let mut operation = Operation::new(method.name.clone());
    operation.docs.text = method.docs.clone();
    operation.parameter_order = shape.parameter_order;
    operation
        .messages
        .push(OperationMessage::new(MessageKind::Input, input));
    if let Some(output) = output {
        operation
            .messages
            .push(OperationMessage::new(MessageKind::Output, output));
    }

    let encoded = use_ == SoapBindingUse::Encoded;
    let body = SoapBody {
        use_,
        namespace: match style {
            SoapBindingStyle::Rpc => Some(contract.namespace.clone()),
            SoapBindingStyle::Document => None,
        },
        encoding: encoded.then(|| SOAP_ENCODING_NAMESPACE.to_owned()),
        parts: None,
    };

    let mut input_extensions = Extensions::new().with(ExtensionKind::SoapBody(body.clone()));
    let mut output_extensions = Extensions::new().with(ExtensionKind::SoapBody(body));

    for header in &method.headers {
        let (message, part) = context.header_message(&method.name, header, use_)?;
        let direction = HeaderDirection::from(header.direction);

        let soap_header = SoapHeader {
            message,
            part: Some(part),
            use_,
            namespace: encoded.then(|| contract.namespace.clone()),
            encoding: encoded.then(|| SOAP_ENCODING_NAMESPACE.to_owned()),
            faults: Vec::new(),
        };

        if direction.contains(HeaderDirection::IN) {
            input_extensions.push(ExtensionKind::SoapHeader(soap_header.clone()));
        }

        if direction.contains(HeaderDirection::OUT) {
            if method.one_way {
                debug!(method = %method.name, header = %header.name, "one-way method drops its out header");
            } else {
                output_extensions.push(ExtensionKind::SoapHeader(soap_header));
            }
        }
    }

    let action = method.action.clone().unwrap_or_else(|| {
        format!("{}/{}", contract.namespace.trim_end_matches('/'), method.name)
    });

    let mut operation_binding = OperationBinding::new(method.name.clone());
    operation_binding.extensions.push(ExtensionKind::SoapOperation(SoapOperationBinding {
        soap_action: Some(action),
        style: Some(style),
    }));
    operation_binding.input = Some(MessageBinding::new(input_extensions));
    if !method.one_way {
        operation_binding.output = Some(MessageBinding::new(output_extensions));
    }

    Ok((operation, operation_binding))
}

impl ProtocolReflector for SoapReflector {
    fn protocol_name(&self) -> &'static str {
        "Soap"
    }

    fn reflect(&self, context: &mut ReflectContext<'_>) -> Result<Option<Port>, ReflectError> {
        let contract = context.contract;
        let name = format!("{}{}", contract.name, SUFFIX);

        let mut port_type = PortType {
            name: name.clone(),
            docs: Documentation::default(),
            operations: Vec::new(),
        };
        let mut binding = Binding {
            name: name.clone(),
            ty: context.qualify(&name),
            docs: Documentation::default(),
            extensions: Extensions::new().with(ExtensionKind::SoapBinding(SoapBinding {
                transport: Some(SOAP_HTTP_TRANSPORT.into()),
                style: Some(contract.style),
            })),
            operations: Vec::new(),
        };

        for method in &contract.methods {
            let (operation, operation_binding) = reflect_method(context, method)?;
            port_type.operations.push(operation);
            binding.operations.push(operation_binding);
        }

        if binding.operations.is_empty() {
            warn!(service = %contract.name, "no methods to reflect for SOAP");
            return Ok(None);
        }

        let port = Port {
            name: name.clone(),
            binding: context.qualify(&name),
            docs: Documentation::default(),
            extensions: Extensions::new().with(ExtensionKind::SoapAddress(Address {
                location: contract.location.clone(),
            })),
        };

        context.definition.port_types.push(port_type);
        context.definition.bindings.push(binding);

        Ok(Some(port))
    }
}
