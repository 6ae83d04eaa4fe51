//! Style, use, wire parts and the wrapper heuristic for one bound operation.

use tracing::debug;
use wsbind_wsdl::{
    extensions::{SoapBindingStyle, SoapBindingUse, SoapBody, SOAP_ENCODING_NAMESPACE},
    types::{Message, MessagePart},
};

use crate::diagnostics::Unsupported;

/// One direction of a bound operation, as seen on the wire.
#[derive(Debug, Clone)]
pub struct ResolvedMessage<'a> {
    pub message: &'a Message,
    pub use_: SoapBindingUse,
    pub namespace: Option<String>,
    pub parts: Vec<&'a MessagePart>,
    pub wrapped: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedOperation<'a> {
    pub style: SoapBindingStyle,
    pub request: Option<ResolvedMessage<'a>>,
    pub response: Option<ResolvedMessage<'a>>,
    pub wrapped: bool,
}

pub fn effective_style(
    binding: Option<SoapBindingStyle>,
    operation: Option<SoapBindingStyle>,
) -> SoapBindingStyle {
    operation.or(binding).unwrap_or_default()
}

pub fn effective_use(body: &SoapBody) -> SoapBindingUse {
    body.use_.normalized()
}

/// Parts named by `soap:body parts`, in that order, or every part.
pub fn wire_parts<'a>(message: &'a Message, body: &SoapBody) -> Result<Vec<&'a MessagePart>, Unsupported> {
    match &body.parts {
        None => Ok(message.parts.iter().collect()),
        Some(names) => message.find_parts(names).ok_or_else(|| {
            Unsupported::new(format!(
                "soap:body names a part that message '{}' does not have",
                message.name
            ))
        }),
    }
}

fn is_soap_encoding(encoding: Option<&str>) -> bool {
    encoding.map_or(false, |encoding| {
        encoding
            .split_whitespace()
            .any(|uri| uri == SOAP_ENCODING_NAMESPACE)
    })
}

pub fn validate_parts(
    style: SoapBindingStyle,
    use_: SoapBindingUse,
    encoding: Option<&str>,
    message: &Message,
    parts: &[&MessagePart],
) -> Result<(), Unsupported> {
    for part in parts {
        match (&part.element, &part.ty) {
            (Some(_), Some(_)) => {
                return Err(Unsupported::new(format!(
                    "part '{}' of message '{}' has both an element and a type",
                    part.name, message.name
                )))
            }
            (None, None) => {
                return Err(Unsupported::new(format!(
                    "part '{}' of message '{}' has neither an element nor a type",
                    part.name, message.name
                )))
            }
            _ => (),
        }
    }

    match (style, use_.normalized()) {
        (SoapBindingStyle::Rpc, use_) => {
            if let Some(part) = parts.iter().find(|part| part.ty.is_none()) {
                return Err(Unsupported::new(format!(
                    "rpc part '{}' of message '{}' must reference a type",
                    part.name, message.name
                )));
            }

            if use_ == SoapBindingUse::Encoded && !is_soap_encoding(encoding) {
                return Err(Unsupported::new(format!(
                    "message '{}' uses an unrecognized encoding '{}'",
                    message.name,
                    encoding.unwrap_or_default()
                )));
            }

            Ok(())
        }

        (SoapBindingStyle::Document, SoapBindingUse::Encoded) => Err(Unsupported::new(format!(
            "message '{}' is document/encoded",
            message.name
        ))),

        (SoapBindingStyle::Document, _) => {
            let single_typed = parts.len() == 1 && parts[0].ty.is_some();

            match parts.iter().find(|part| part.element.is_none()) {
                Some(part) if !single_typed => Err(Unsupported::new(format!(
                    "document part '{}' of message '{}' must reference an element",
                    part.name, message.name
                ))),
                _ => Ok(()),
            }
        }
    }
}

/// Whether the parts look like a single synthetic wrapper.
pub fn is_wrapped(style: SoapBindingStyle, parts: &[&MessagePart]) -> bool {
    match style {
        SoapBindingStyle::Rpc => true,
        SoapBindingStyle::Document => parts.len() == 1 && parts[0].name == "parameters",
    }
}

fn resolve_message<'a>(
    style: SoapBindingStyle,
    message: &'a Message,
    body: &SoapBody,
) -> Result<ResolvedMessage<'a>, Unsupported> {
    let use_ = effective_use(body);
    let parts = wire_parts(message, body)?;
    validate_parts(style, use_, body.encoding.as_deref(), message, &parts)?;

    Ok(ResolvedMessage {
        message,
        use_,
        namespace: body.namespace.clone(),
        wrapped: is_wrapped(style, &parts),
        parts,
    })
}

pub fn resolve<'a>(
    binding_style: Option<SoapBindingStyle>,
    operation_style: Option<SoapBindingStyle>,
    request: Option<(&'a Message, &SoapBody)>,
    response: Option<(&'a Message, &SoapBody)>,
) -> Result<ResolvedOperation<'a>, Unsupported> {
    let style = effective_style(binding_style, operation_style);

    let mut request = request
        .map(|(message, body)| resolve_message(style, message, body))
        .transpose()?;
    let mut response = response
        .map(|(message, body)| resolve_message(style, message, body))
        .transpose()?;

    // The description cannot say whether a document message is a wrapper,
    // so both sides must agree before either is treated as one.
    let wrapped = match (&request, &response) {
        (Some(request), Some(response)) => request.wrapped && response.wrapped,
        (Some(message), None) | (None, Some(message)) => message.wrapped,
        (None, None) => false,
    };

    for message in request.iter_mut().chain(response.iter_mut()) {
        message.wrapped = wrapped;
    }

    debug!(%style, wrapped, "resolved operation");

    Ok(ResolvedOperation {
        style,
        request,
        response,
        wrapped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsbind_wsdl::types::{NamespacedName, XSD_NAMESPACE};

    fn message(name: &str, parts: Vec<MessagePart>) -> Message {
        Message {
            name: name.into(),
            docs: Default::default(),
            parts,
        }
    }

    fn element(name: &str) -> NamespacedName {
        NamespacedName::new("urn:t", name)
    }

    fn xsd(name: &str) -> NamespacedName {
        NamespacedName::new(XSD_NAMESPACE, name)
    }

    #[test]
    fn operation_style_overrides_binding_style() {
        assert_eq!(effective_style(None, None), SoapBindingStyle::Document);
        assert_eq!(
            effective_style(Some(SoapBindingStyle::Rpc), None),
            SoapBindingStyle::Rpc
        );
        assert_eq!(
            effective_style(Some(SoapBindingStyle::Rpc), Some(SoapBindingStyle::Document)),
            SoapBindingStyle::Document
        );
    }

    #[test]
    fn explicit_parts_keep_their_order() {
        let message = message(
            "In",
            vec![
                MessagePart::element("a", element("A")),
                MessagePart::element("b", element("B")),
                MessagePart::element("c", element("C")),
            ],
        );
        let body = SoapBody {
            parts: Some(vec!["c".into(), "a".into()]),
            ..SoapBody::literal()
        };

        let parts = wire_parts(&message, &body).expect("parts");
        assert_eq!(
            parts.iter().map(|part| part.name.as_str()).collect::<Vec<_>>(),
            ["c", "a"]
        );

        let body = SoapBody {
            parts: Some(vec!["missing".into()]),
            ..SoapBody::literal()
        };
        assert!(wire_parts(&message, &body).is_err());
    }

    #[test]
    fn rejects_part_with_type_and_element() {
        let message = message(
            "In",
            vec![MessagePart {
                name: "x".into(),
                element: Some(element("X")),
                ty: Some(xsd("int")),
            }],
        );
        let body = SoapBody {
            use_: SoapBindingUse::Encoded,
            encoding: Some(SOAP_ENCODING_NAMESPACE.into()),
            ..SoapBody::literal()
        };

        let result = resolve(Some(SoapBindingStyle::Rpc), None, Some((&message, &body)), None);
        assert!(result.is_err());
    }

    #[test]
    fn rpc_encoded_requires_soap_encoding() {
        let message = message("In", vec![MessagePart::typed("x", xsd("int"))]);
        let parts = message.parts.iter().collect::<Vec<_>>();

        let listed = format!("urn:other {}", SOAP_ENCODING_NAMESPACE);
        assert!(validate_parts(
            SoapBindingStyle::Rpc,
            SoapBindingUse::Encoded,
            Some(&listed),
            &message,
            &parts
        )
        .is_ok());
        assert!(validate_parts(
            SoapBindingStyle::Rpc,
            SoapBindingUse::Encoded,
            Some("urn:other"),
            &message,
            &parts
        )
        .is_err());
        assert!(validate_parts(
            SoapBindingStyle::Rpc,
            SoapBindingUse::Encoded,
            None,
            &message,
            &parts
        )
        .is_err());
    }

    #[test]
    fn document_literal_needs_elements_except_single_typed_part() {
        let single = message("In", vec![MessagePart::typed("any", xsd("anyType"))]);
        let parts = single.parts.iter().collect::<Vec<_>>();
        assert!(validate_parts(
            SoapBindingStyle::Document,
            SoapBindingUse::Literal,
            None,
            &single,
            &parts
        )
        .is_ok());

        let mixed = message(
            "In",
            vec![
                MessagePart::typed("a", xsd("int")),
                MessagePart::element("b", element("B")),
            ],
        );
        let parts = mixed.parts.iter().collect::<Vec<_>>();
        assert!(validate_parts(
            SoapBindingStyle::Document,
            SoapBindingUse::Default,
            None,
            &mixed,
            &parts
        )
        .is_err());

        let encoded = message("In", vec![MessagePart::element("b", element("B"))]);
        let parts = encoded.parts.iter().collect::<Vec<_>>();
        assert!(validate_parts(
            SoapBindingStyle::Document,
            SoapBindingUse::Encoded,
            None,
            &encoded,
            &parts
        )
        .is_err());
    }

    #[test]
    fn document_literal_parameters_part_is_wrapped() {
        let request = message("In", vec![MessagePart::element("parameters", element("Op"))]);
        let response = message(
            "Out",
            vec![MessagePart::element("parameters", element("OpResponse"))],
        );
        let body = SoapBody::literal();

        let resolved = resolve(
            None,
            None,
            Some((&request, &body)),
            Some((&response, &body)),
        )
        .expect("resolved");

        assert_eq!(resolved.style, SoapBindingStyle::Document);
        assert!(resolved.wrapped);
        assert!(resolved.request.map_or(false, |request| request.wrapped));
    }

    #[test]
    fn disagreeing_wrapper_heuristics_unwrap_both() {
        let request = message("In", vec![MessagePart::element("parameters", element("Op"))]);
        let response = message("Out", vec![MessagePart::element("result", element("OpResult"))]);
        let body = SoapBody::literal();

        let resolved = resolve(
            None,
            None,
            Some((&request, &body)),
            Some((&response, &body)),
        )
        .expect("resolved");

        assert!(!resolved.wrapped);
        assert!(!resolved.request.map_or(true, |request| request.wrapped));
        assert!(!resolved.response.map_or(true, |response| response.wrapped));
    }
}
