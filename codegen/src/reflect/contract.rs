//! Method signatures a description is reflected from.

use serde::{Deserialize, Serialize};
use wsbind_wsdl::extensions::{SoapBindingStyle, SoapBindingUse};

use crate::{headers::HeaderDirection, parameters::ParameterDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStyle {
    Wrapped,
    Bare,
}

impl Default for ParameterStyle {
    fn default() -> Self {
        ParameterStyle::Wrapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderSide {
    In,
    Out,
    InOut,
}

impl Default for HeaderSide {
    fn default() -> Self {
        HeaderSide::In
    }
}

impl From<HeaderSide> for HeaderDirection {
    fn from(side: HeaderSide) -> Self {
        match side {
            HeaderSide::In => HeaderDirection::IN,
            HeaderSide::Out => HeaderDirection::OUT,
            HeaderSide::InOut => HeaderDirection::IN_OUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldContract {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub repeated: bool,
}

/// A named complex type the methods may refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeContract {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldContract>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterContract {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub direction: ParameterDirection,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub repeated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderContract {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub direction: HeaderSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodContract {
    pub name: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterContract>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub one_way: bool,
    #[serde(default)]
    pub style: Option<SoapBindingStyle>,
    #[serde(default, rename = "use")]
    pub use_: Option<SoapBindingUse>,
    #[serde(default)]
    pub parameter_style: Option<ParameterStyle>,
    #[serde(default)]
    pub headers: Vec<HeaderContract>,
}

impl MethodContract {
    pub fn inputs(&self) -> impl Iterator<Item = &ParameterContract> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction != ParameterDirection::Out)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ParameterContract> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction != ParameterDirection::In)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceContract {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub style: SoapBindingStyle,
    #[serde(default, rename = "use")]
    pub use_: SoapBindingUse,
    #[serde(default)]
    pub parameter_style: ParameterStyle,
    #[serde(default)]
    pub types: Vec<TypeContract>,
    #[serde(default)]
    pub methods: Vec<MethodContract>,
}

impl ServiceContract {
    pub fn find_type(&self, name: &str) -> Option<&TypeContract> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn style_of(&self, method: &MethodContract) -> SoapBindingStyle {
        method.style.unwrap_or(self.style)
    }

    pub fn use_of(&self, method: &MethodContract) -> SoapBindingUse {
        method.use_.unwrap_or(self.use_).normalized()
    }

    pub fn parameter_style_of(&self, method: &MethodContract) -> ParameterStyle {
        method.parameter_style.unwrap_or(self.parameter_style)
    }
}
