use thiserror::Error;

use crate::types::NamespacedName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(quick_xml::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error reading or writing XML")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Error writing XML output")]
    XmlWriteError(#[from] std::io::Error),

    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("Namespace prefix '{0}' is not declared")]
    UnresolvedPrefix(String),

    #[error("Attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute { attribute: String, value: String },

    #[error("Document does not start with <definitions> or <schema>")]
    MissingRoot,

    #[error("Unable to find {kind} '{name}'")]
    Unresolved {
        kind: &'static str,
        name: NamespacedName,
    },
}
