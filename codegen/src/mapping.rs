use wsbind_wsdl::{
    descriptions::Descriptions,
    extensions::SOAP_ENCODING_NAMESPACE,
    types::{Field, FieldKind, MessagePart, NamespacedName, TypeKind, XSD_NAMESPACE},
};

use crate::identifiers::{to_pascal_case, to_snake_case};

/// A native rendering of one schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub name: String,
    /// Value types cannot express absence on their own, so optional
    /// members of these types get a "specified" companion.
    pub is_value_type: bool,
    pub is_simple: bool,
}

/// One member on the wire: a message part, or a member of a wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMapping {
    /// Part or particle name as written in the description.
    pub name: String,
    pub member_name: String,
    pub xml_name: NamespacedName,
    pub type_name: NamespacedName,
    pub native_type: String,
    pub check_specified: bool,
}

impl MemberMapping {
    /// Same schema type, same wire name and same member name.
    pub fn is_same_as(&self, other: &MemberMapping) -> bool {
        self.type_name == other.type_name
            && self.xml_name == other.xml_name
            && self.member_name == other.member_name
    }
}

/// Schema-to-native type mapping consumed by the importers.
pub trait TypeMapper {
    fn map_type(&self, name: &NamespacedName) -> Option<NativeType>;

    /// Schema type of a global element with its native rendering.
    fn map_element(&self, name: &NamespacedName) -> Option<(NamespacedName, NativeType)>;

    /// Members of a global element whose type is a sequence.
    fn element_members(&self, name: &NamespacedName) -> Option<Vec<MemberMapping>>;

    /// Names of every generated schema type, reserved in the class scope.
    fn type_names(&self) -> Vec<String>;

    fn part_mapping(&self, part: &MessagePart) -> Option<MemberMapping> {
        match (&part.element, &part.ty) {
            (Some(element), None) => {
                let (type_name, native) = self.map_element(element)?;
                Some(MemberMapping {
                    name: part.name.clone(),
                    member_name: to_snake_case(&part.name),
                    xml_name: element.clone(),
                    type_name,
                    native_type: native.name,
                    check_specified: false,
                })
            }

            (None, Some(ty)) => {
                let native = self.map_type(ty)?;
                Some(MemberMapping {
                    name: part.name.clone(),
                    member_name: to_snake_case(&part.name),
                    xml_name: NamespacedName::new("", part.name.clone()),
                    type_name: ty.clone(),
                    native_type: native.name,
                    check_specified: false,
                })
            }

            _ => None,
        }
    }
}

fn builtin(name: &str) -> Option<(&'static str, bool)> {
    let mapped = match name {
        "boolean" => ("bool", true),
        "byte" => ("i8", true),
        "short" => ("i16", true),
        "int" => ("i32", true),
        "long" | "integer" | "negativeInteger" | "nonPositiveInteger" => ("i64", true),
        "unsignedByte" => ("u8", true),
        "unsignedShort" => ("u16", true),
        "unsignedInt" => ("u32", true),
        "unsignedLong" | "positiveInteger" | "nonNegativeInteger" => ("u64", true),
        "float" => ("f32", true),
        "double" | "decimal" => ("f64", true),
        "base64Binary" | "hexBinary" => ("Vec<u8>", false),
        "string" | "normalizedString" | "token" | "anyURI" | "QName" | "NOTATION" | "language"
        | "Name" | "NCName" | "ID" | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" | "NMTOKEN"
        | "NMTOKENS" | "dateTime" | "date" | "time" | "duration" | "gYear" | "gYearMonth"
        | "gMonth" | "gMonthDay" | "gDay" | "anySimpleType" => ("String", false),
        "anyType" => ("String", false),
        _ => return None,
    };

    Some(mapped)
}

/// Whether `name` is an XML Schema built-in the mapper knows.
pub fn is_builtin(name: &str) -> bool {
    builtin(name).is_some()
}

/// Maps the schema subset kept by the reader onto Rust types.
pub struct SchemaTypeMapper<'a> {
    descriptions: &'a Descriptions,
}

impl<'a> SchemaTypeMapper<'a> {
    pub fn new(descriptions: &'a Descriptions) -> Self {
        Self { descriptions }
    }

    fn map_kind(&self, owner: &NamespacedName, kind: &TypeKind) -> Option<NativeType> {
        match kind {
            TypeKind::Struct(_) | TypeKind::Alias(_) => Some(NativeType {
                name: to_pascal_case(&owner.name),
                is_value_type: false,
                is_simple: false,
            }),
            TypeKind::Simple(base) => self.map_type(base),
        }
    }

    fn field_mapping(&self, owner: &NamespacedName, field: &Field) -> Option<MemberMapping> {
        let (type_name, native) = match &field.ty {
            FieldKind::Type(ty) => (ty.clone(), self.map_type(ty)?),
            FieldKind::Inner(kind) => {
                let type_name = NamespacedName::new(
                    owner.namespace.clone(),
                    format!("{}{}", owner.name, to_pascal_case(&field.name.name)),
                );
                let native = self.map_kind(&type_name, kind)?;
                (type_name, native)
            }
        };

        let repeated = field.is_repeated();
        let native_type = if repeated {
            format!("Vec<{}>", native.name)
        } else if field.nillable {
            format!("Option<{}>", native.name)
        } else {
            native.name.clone()
        };

        Some(MemberMapping {
            name: field.name.name.clone(),
            member_name: to_snake_case(&field.name.name),
            xml_name: field.name.clone(),
            type_name,
            native_type,
            check_specified: field.is_optional()
                && native.is_value_type
                && !repeated
                && !field.nillable,
        })
    }

    /// Members of a sequence owned by `owner`; fields of unknown types are
    /// left out.
    pub fn struct_members(&self, owner: &NamespacedName, fields: &[Field]) -> Vec<MemberMapping> {
        fields
            .iter()
            .filter_map(|field| self.field_mapping(owner, field))
            .collect()
    }

    fn struct_fields(&self, ty: &NamespacedName) -> Option<&'a [Field]> {
        match &self.descriptions.find_type(ty)?.kind {
            TypeKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl<'a> TypeMapper for SchemaTypeMapper<'a> {
    fn map_type(&self, name: &NamespacedName) -> Option<NativeType> {
        if name.namespace == XSD_NAMESPACE || name.namespace == SOAP_ENCODING_NAMESPACE {
            if let Some((native, is_value_type)) = builtin(&name.name) {
                return Some(NativeType {
                    name: native.to_owned(),
                    is_value_type,
                    is_simple: true,
                });
            }
        }

        let ty = self.descriptions.find_type(name)?;
        self.map_kind(&ty.name, &ty.kind)
    }

    fn map_element(&self, name: &NamespacedName) -> Option<(NamespacedName, NativeType)> {
        let element = self.descriptions.find_element(name)?;

        match &element.ty {
            Some(FieldKind::Type(ty)) => Some((ty.clone(), self.map_type(ty)?)),
            Some(FieldKind::Inner(kind)) => Some((name.clone(), self.map_kind(name, kind)?)),
            None => {
                let any = NamespacedName::new(XSD_NAMESPACE, "anyType");
                let native = self.map_type(&any)?;
                Some((any, native))
            }
        }
    }

    fn element_members(&self, name: &NamespacedName) -> Option<Vec<MemberMapping>> {
        let element = self.descriptions.find_element(name)?;

        let fields = match &element.ty {
            Some(FieldKind::Inner(TypeKind::Struct(fields))) => fields.as_slice(),
            Some(FieldKind::Type(ty)) => self.struct_fields(ty)?,
            _ => return None,
        };

        fields
            .iter()
            .map(|field| self.field_mapping(name, field))
            .collect()
    }

    fn type_names(&self) -> Vec<String> {
        let mut names = Vec::new();

        for definition in self.descriptions.iter() {
            for element in &definition.types.elements {
                if let Some(FieldKind::Inner(TypeKind::Struct(_))) = element.ty {
                    names.push(to_pascal_case(&element.name.name));
                }
            }

            for ty in &definition.types.types {
                if !matches!(ty.kind, TypeKind::Simple(_)) {
                    names.push(to_pascal_case(&ty.name.name));
                }
            }
        }

        names
    }
}
