use serde::Serialize;
use std::{
    collections::HashMap,
    fmt,
    ops::{BitOr, BitOrAssign},
};
use tracing::debug;
use wsbind_wsdl::{
    descriptions::Descriptions,
    extensions::{SoapBindingUse, SoapHeader, SoapHeaderFault},
    types::{MessagePart, NamespacedName},
};

use crate::{
    diagnostics::Unsupported,
    emitter::{FieldDecl, Metadata},
    identifiers::{to_snake_case, Identifiers},
    mapping::TypeMapper,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HeaderDirection(u8);

impl HeaderDirection {
    pub const IN: HeaderDirection = HeaderDirection(1);
    pub const OUT: HeaderDirection = HeaderDirection(1 << 1);
    pub const FAULT: HeaderDirection = HeaderDirection(1 << 2);
    pub const IN_OUT: HeaderDirection = HeaderDirection(1 | 1 << 1);

    pub fn contains(self, other: HeaderDirection) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn merge(self, other: HeaderDirection) -> HeaderDirection {
        HeaderDirection(self.0 | other.0)
    }
}

impl BitOr for HeaderDirection {
    type Output = HeaderDirection;

    fn bitor(self, rhs: HeaderDirection) -> HeaderDirection {
        self.merge(rhs)
    }
}

impl BitOrAssign for HeaderDirection {
    fn bitor_assign(&mut self, rhs: HeaderDirection) {
        *self = self.merge(rhs);
    }
}

impl fmt::Display for HeaderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();

        if self.contains(HeaderDirection::IN_OUT) {
            names.push("InOut");
        } else if self.contains(HeaderDirection::IN) {
            names.push("In");
        } else if self.contains(HeaderDirection::OUT) {
            names.push("Out");
        }

        if self.contains(HeaderDirection::FAULT) {
            names.push("Fault");
        }

        f.write_str(&names.join("|"))
    }
}

/// Structural identity of a header: `element=` or `type=` plus the
/// qualified name, depending on use.
pub fn header_key(use_: SoapBindingUse, part: &MessagePart) -> Result<String, Unsupported> {
    match use_.normalized() {
        SoapBindingUse::Encoded => part
            .ty
            .as_ref()
            .map(|ty| format!("type={}", ty))
            .ok_or_else(|| Unsupported::new(format!("encoded header part '{}' has no type", part.name))),

        _ => part
            .element
            .as_ref()
            .map(|element| format!("element={}", element))
            .ok_or_else(|| {
                Unsupported::new(format!("literal header part '{}' has no element", part.name))
            }),
    }
}

/// A `soap:header` or `soap:headerfault` reference with its direction.
#[derive(Debug, Clone, Copy)]
pub struct HeaderReference<'a> {
    pub message: &'a NamespacedName,
    pub part: Option<&'a str>,
    pub use_: SoapBindingUse,
    pub direction: HeaderDirection,
}

impl<'a> HeaderReference<'a> {
    pub fn header(header: &'a SoapHeader, direction: HeaderDirection) -> Self {
        Self {
            message: &header.message,
            part: header.part.as_deref(),
            use_: header.use_,
            direction,
        }
    }

    pub fn fault(fault: &'a SoapHeaderFault) -> Self {
        Self {
            message: &fault.message,
            part: fault.part.as_deref(),
            use_: fault.use_,
            direction: HeaderDirection::FAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderField {
    pub key: String,
    pub name: String,
    pub native_type: String,
    pub direction: HeaderDirection,
}

/// Header fields of the class being generated.
///
/// Cleared whenever a new class begins so headers never leak between
/// bindings.
#[derive(Debug, Clone, Default)]
pub struct HeaderRegistry {
    fields: Vec<HeaderField>,
    index: HashMap<String, usize>,
}

impl HeaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.index.clear();
    }

    pub fn find(&self, key: &str) -> Option<&HeaderField> {
        self.index.get(key).map(|&index| &self.fields[index])
    }

    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How one method uses one header field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderUsage {
    pub key: String,
    pub field: String,
    pub direction: HeaderDirection,
}

impl HeaderUsage {
    pub fn metadata(&self) -> Metadata {
        Metadata::SoapHeader {
            field: self.field.clone(),
            direction: self.direction,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderPlan {
    pub usages: Vec<HeaderUsage>,
    /// Fields seen for the first time in this class.
    pub new_fields: Vec<FieldDecl>,
}

fn header_part<'a>(
    descriptions: &'a Descriptions,
    reference: &HeaderReference<'_>,
) -> Result<&'a MessagePart, Unsupported> {
    let message = descriptions.find_message(reference.message).ok_or_else(|| {
        Unsupported::new(format!("header message '{}' not found", reference.message))
    })?;

    let part = match reference.part {
        Some(name) => message.find_part(name),
        None if message.parts.len() == 1 => message.parts.first(),
        None => None,
    };

    part.ok_or_else(|| {
        Unsupported::new(format!(
            "header part '{}' not found in message '{}'",
            reference.part.unwrap_or_default(),
            message.name
        ))
    })
}

/// Plans the header fields of one operation.
///
/// The registry and scope are only updated when every reference of the
/// operation can be planned.
pub fn plan_headers(
    references: &[HeaderReference<'_>],
    descriptions: &Descriptions,
    mapper: &dyn TypeMapper,
    registry: &mut HeaderRegistry,
    scope: &mut Identifiers,
) -> Result<HeaderPlan, Unsupported> {
    let mut pending_registry = registry.clone();
    let mut pending_scope = scope.clone();

    let plan = plan_into(
        references,
        descriptions,
        mapper,
        &mut pending_registry,
        &mut pending_scope,
    )?;

    *registry = pending_registry;
    *scope = pending_scope;
    Ok(plan)
}

fn plan_into(
    references: &[HeaderReference<'_>],
    descriptions: &Descriptions,
    mapper: &dyn TypeMapper,
    registry: &mut HeaderRegistry,
    scope: &mut Identifiers,
) -> Result<HeaderPlan, Unsupported> {
    let mut plan = HeaderPlan::default();

    for reference in references {
        let part = header_part(descriptions, reference)?;
        let key = header_key(reference.use_, part)?;

        let field = match registry.index.get(&key) {
            Some(&index) => {
                let field = &mut registry.fields[index];
                field.direction |= reference.direction;
                field.name.clone()
            }

            None => {
                let mapped = match reference.use_.normalized() {
                    SoapBindingUse::Encoded => part
                        .ty
                        .as_ref()
                        .and_then(|ty| Some((ty, mapper.map_type(ty)?))),
                    _ => part
                        .element
                        .as_ref()
                        .and_then(|element| Some((element, mapper.map_element(element)?.1))),
                };

                let (xml_name, native) = mapped.ok_or_else(|| {
                    Unsupported::new(format!("header part '{}' cannot be mapped", part.name))
                })?;

                let mut candidate = to_snake_case(&xml_name.name);
                if candidate.replace('_', "").eq_ignore_ascii_case(&native.name) {
                    candidate.push_str("_value");
                }
                let name = scope.add_unique(&candidate, ());

                debug!(%key, field = %name, "new header field");

                plan.new_fields.push(FieldDecl {
                    name: name.clone(),
                    ty: format!("Option<{}>", native.name),
                    metadata: vec![Metadata::XmlElement {
                        name: xml_name.clone(),
                        nillable: false,
                    }],
                });

                registry.index.insert(key.clone(), registry.fields.len());
                registry.fields.push(HeaderField {
                    key: key.clone(),
                    name: name.clone(),
                    native_type: native.name,
                    direction: reference.direction,
                });

                name
            }
        };

        match plan.usages.iter_mut().find(|usage| usage.key == key) {
            Some(usage) => usage.direction |= reference.direction,
            None => plan.usages.push(HeaderUsage {
                key,
                field,
                direction: reference.direction,
            }),
        }
    }

    Ok(plan)
}
