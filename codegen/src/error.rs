use thiserror::Error;
use wsbind_wsdl::{error as wsdl, types::NamespacedName};

/// Structural problems that abort the import of one binding.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Operation binding '{operation}' matches more than one operation of port type '{port_type}'")]
    DuplicateOperationBinding {
        operation: String,
        port_type: NamespacedName,
    },

    #[error("Operation '{operation}' of port type '{port_type}' is bound more than once")]
    OperationBoundTwice {
        operation: String,
        port_type: NamespacedName,
    },

    #[error("Operation binding '{operation}' has no counterpart in port type '{port_type}'")]
    MissingPortTypeOperation {
        operation: String,
        port_type: NamespacedName,
    },

    #[error("Operation binding '{operation}' is missing its {kind} binding")]
    MissingMessageBinding {
        operation: String,
        kind: &'static str,
    },

    #[error("parameterOrder token '{token}' of operation '{operation}' names no request or response part")]
    UnresolvedParameterOrder { operation: String, token: String },

    #[error("Unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("Unresolved reference in description")]
    Unresolved(#[from] wsdl::Error),
}

#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("Unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("Method '{method}' uses unknown type '{ty}'")]
    UnknownType { method: String, ty: String },

    #[error("One-way method '{0}' cannot return a value or have out parameters")]
    OneWayWithOutput(String),

    #[error("Encoded use requires rpc style (method '{0}')")]
    DocumentEncoded(String),

    #[error("Parameter '{parameter}' of method '{method}' cannot be reflected: {reason}")]
    UnsupportedParameter {
        method: String,
        parameter: String,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Invalid type '{ty}' in generated code")]
    InvalidType { ty: String, source: syn::Error },

    #[error("Generated code does not parse")]
    InvalidSource(#[from] syn::Error),
}

/// Any failure of the convenience entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error reading WSDL")]
    Wsdl(#[from] wsdl::Error),

    #[error("Error importing description")]
    Import(#[from] ImportError),

    #[error("Error reflecting contract")]
    Reflect(#[from] ReflectError),

    #[error("Error emitting code")]
    Emit(#[from] EmitError),
}
