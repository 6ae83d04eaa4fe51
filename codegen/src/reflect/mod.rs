//! Reflection: manufacturing a description from method signatures.

mod contract;
mod http;
mod soap;

pub use contract::{
    FieldContract, HeaderContract, HeaderSide, MethodContract, ParameterContract, ParameterStyle,
    ServiceContract, TypeContract,
};
pub use http::HttpReflector;
pub use soap::SoapReflector;

use std::collections::HashMap;

use tracing::{debug, trace};
use wsbind_wsdl::{
    extensions::SoapBindingUse,
    types::{
        Definition, Documentation, Element, Field, FieldKind, MaxOccurs, Message, MessagePart,
        NamespacedName, Port, Service, Type, TypeKind, XSD_NAMESPACE,
    },
};

use crate::{
    error::ReflectError,
    headers::header_key,
    identifiers::Identifiers,
    mapping::is_builtin,
    options::ReflectOptions,
};

/// The description under construction plus the names already handed out.
pub struct ReflectContext<'c> {
    pub contract: &'c ServiceContract,
    pub definition: Definition,
    messages: Identifiers,
    elements: Identifiers,
    header_messages: HashMap<String, (NamespacedName, String)>,
}

impl<'c> ReflectContext<'c> {
    pub fn new(contract: &'c ServiceContract) -> Result<Self, ReflectError> {
        let mut definition = Definition::new(contract.namespace.clone());
        definition.name = Some(contract.name.clone());
        definition.docs.text = contract.docs.clone();

        let mut context = Self {
            contract,
            definition,
            messages: Identifiers::new(),
            elements: Identifiers::new(),
            header_messages: HashMap::new(),
        };

        for ty in &contract.types {
            let fields = ty
                .fields
                .iter()
                .map(|field| context.field(&ty.name, &field.name, &field.ty, field.optional, field.repeated))
                .collect::<Result<Vec<_>, _>>()?;

            let name = context.qualify(&ty.name);
            context.definition.types.types.push(Type {
                name,
                kind: TypeKind::Struct(fields),
            });
        }

        Ok(context)
    }

    pub fn qualify(&self, name: &str) -> NamespacedName {
        self.definition.qualify(name)
    }

    /// Schema type named by a contract type string.
    pub fn schema_type(&self, method: &str, ty: &str) -> Result<NamespacedName, ReflectError> {
        if is_builtin(ty) {
            Ok(NamespacedName::new(XSD_NAMESPACE, ty))
        } else if self.contract.find_type(ty).is_some() {
            Ok(self.qualify(ty))
        } else {
            Err(ReflectError::UnknownType {
                method: method.to_owned(),
                ty: ty.to_owned(),
            })
        }
    }

    pub fn field(
        &self,
        owner: &str,
        name: &str,
        ty: &str,
        optional: bool,
        repeated: bool,
    ) -> Result<Field, ReflectError> {
        Ok(Field {
            name: self.qualify(name),
            ty: FieldKind::Type(self.schema_type(owner, ty)?),
            min_occurs: if optional { 0 } else { 1 },
            max_occurs: if repeated {
                MaxOccurs::Unbounded
            } else {
                MaxOccurs::default()
            },
            nillable: false,
        })
    }

    pub fn add_message(&mut self, candidate: &str, parts: Vec<MessagePart>) -> NamespacedName {
        let name = self.messages.add_unique(candidate, ());
        self.definition.messages.push(Message {
            name: name.clone(),
            docs: Documentation::default(),
            parts,
        });
        self.qualify(&name)
    }

    /// Adds a global element with an anonymous sequence type.
    pub fn add_wrapper_element(&mut self, candidate: &str, fields: Vec<Field>) -> NamespacedName {
        let local = self.elements.add_unique(candidate, ());
        let name = self.qualify(&local);
        self.definition.types.elements.push(Element {
            name: name.clone(),
            ty: Some(FieldKind::Inner(TypeKind::Struct(fields))),
            nillable: false,
        });
        name
    }

    /// A global element of type `ty`, reusing one that already has that
    /// name and type.
    pub fn typed_element(&mut self, candidate: &str, ty: NamespacedName) -> NamespacedName {
        let existing = self.qualify(candidate);
        let kind = FieldKind::Type(ty);

        if let Some(element) = self.definition.types.find_element(&existing) {
            if element.ty.as_ref() == Some(&kind) {
                return existing;
            }
        }

        let local = self.elements.add_unique(candidate, ());
        let name = self.qualify(&local);
        self.definition.types.elements.push(Element {
            name: name.clone(),
            ty: Some(kind),
            nillable: false,
        });
        name
    }

    /// Message and part carrying `header`, shared by every method whose
    /// header has the same structural key.
    pub fn header_message(
        &mut self,
        method: &str,
        header: &HeaderContract,
        use_: SoapBindingUse,
    ) -> Result<(NamespacedName, String), ReflectError> {
        let ty = self.schema_type(method, &header.ty)?;

        let part = match use_.normalized() {
            SoapBindingUse::Encoded => MessagePart::typed(header.name.clone(), ty),
            _ => {
                let element = self.typed_element(&header.name, ty);
                MessagePart::element(header.name.clone(), element)
            }
        };

        let key = header_key(use_, &part).map_err(|_| ReflectError::UnknownType {
            method: method.to_owned(),
            ty: header.ty.clone(),
        })?;

        if let Some(existing) = self.header_messages.get(&key) {
            debug!(%key, message = %existing.0, "reusing header message");
            return Ok(existing.clone());
        }

        let part_name = part.name.clone();
        let message = self.add_message(&header.name, vec![part]);
        self.header_messages.insert(key, (message.clone(), part_name.clone()));

        Ok((message, part_name))
    }
}

/// Adds one protocol's messages, port type and binding to a description.
pub trait ProtocolReflector {
    fn protocol_name(&self) -> &'static str;

    /// The port to publish, or `None` when no method could be reflected.
    fn reflect(&self, context: &mut ReflectContext<'_>) -> Result<Option<Port>, ReflectError>;
}

type ReflectorFactory = fn() -> Box<dyn ProtocolReflector>;

fn soap() -> Box<dyn ProtocolReflector> {
    Box::new(SoapReflector)
}

fn http_get() -> Box<dyn ProtocolReflector> {
    Box::new(HttpReflector::get())
}

fn http_post() -> Box<dyn ProtocolReflector> {
    Box::new(HttpReflector::post())
}

const REFLECTORS: [(&str, ReflectorFactory); 3] =
    [("Soap", soap), ("HttpGet", http_get), ("HttpPost", http_post)];

pub fn reflector(name: &str) -> Result<Box<dyn ProtocolReflector>, ReflectError> {
    REFLECTORS
        .iter()
        .find(|(registered, _)| registered.eq_ignore_ascii_case(name))
        .map(|(_, factory)| factory())
        .ok_or_else(|| ReflectError::UnknownProtocol(name.to_owned()))
}

/// Builds a description of `contract` with one binding per protocol.
pub fn reflect(contract: &ServiceContract, options: &ReflectOptions) -> Result<Definition, ReflectError> {
    let reflectors = options
        .protocols
        .iter()
        .map(|name| reflector(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut context = ReflectContext::new(contract)?;
    let mut ports = Vec::new();

    for reflector in &reflectors {
        trace!(protocol = reflector.protocol_name(), service = %contract.name, "reflecting");

        if let Some(port) = reflector.reflect(&mut context)? {
            ports.push(port);
        }
    }

    let mut definition = context.definition;
    definition.services.push(Service {
        name: contract.name.clone(),
        docs: Documentation::default(),
        extensions: Default::default(),
        ports,
    });

    Ok(definition)
}
