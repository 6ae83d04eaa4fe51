//! Protocol importers and the compiled-in registry that selects them.

use serde::Serialize;
use wsbind_wsdl::{
    descriptions::Descriptions,
    extensions::SoapBindingStyle,
    types::{Binding, Definition, NamespacedName, Operation, OperationBinding, OperationFlow, Port},
};

use crate::{
    diagnostics::{Diagnostics, Unsupported},
    emitter::{FieldDecl, MethodDecl, Metadata},
    error::ImportError,
    headers::{HeaderRegistry, HeaderUsage},
    http::HttpImporter,
    identifiers::Identifiers,
    mapping::TypeMapper,
    options::ImportOptions,
    parameters::ParameterPlan,
    soap::SoapImporter,
};

/// Naming and header state of the class being generated.
#[derive(Debug, Default)]
pub struct ClassState {
    pub members: Identifiers,
    pub headers: HeaderRegistry,
}

pub struct ImportContext<'a> {
    pub descriptions: &'a Descriptions,
    pub mapper: &'a dyn TypeMapper,
    pub options: &'a ImportOptions,
    pub definition: &'a Definition,
    pub binding: &'a Binding,
    pub class: &'a mut ClassState,
    pub diagnostics: &'a mut Diagnostics,
}

/// An operation together with the binding node that matched it.
#[derive(Debug, Clone, Copy)]
pub struct BoundOperation<'a> {
    pub operation: &'a Operation,
    pub binding: &'a OperationBinding,
    pub port_type: &'a NamespacedName,
}

/// What the import report keeps about each generated method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedMethod {
    pub method_name: String,
    #[serde(skip)]
    pub plan: ParameterPlan,
    pub wrapped: bool,
    pub style: Option<SoapBindingStyle>,
    pub headers: Vec<HeaderUsage>,
}

#[derive(Debug, Clone)]
pub struct MethodImport {
    pub method: MethodDecl,
    /// Class fields first seen while importing this method.
    pub fields: Vec<FieldDecl>,
    pub record: ImportedMethod,
}

#[derive(Debug, Clone)]
pub enum MethodOutcome {
    Imported(MethodImport),
    Unsupported(Unsupported),
}

impl From<Unsupported> for MethodOutcome {
    fn from(reason: Unsupported) -> Self {
        MethodOutcome::Unsupported(reason)
    }
}

/// Turns the bound operations of one protocol into method declarations.
///
/// Importers mark every extension they consume as handled; whatever is left
/// unhandled after a class is reported by the driver.
pub trait ProtocolImporter {
    fn protocol_name(&self) -> &'static str;

    fn is_binding_supported(&self, binding: &Binding) -> bool;

    fn supports_flow(&self, flow: OperationFlow) -> bool;

    fn class_metadata(&self, definition: &Definition, binding: &Binding, port: Option<&Port>) -> Vec<Metadata>;

    fn import_method(
        &self,
        context: &mut ImportContext<'_>,
        bound: &BoundOperation<'_>,
    ) -> Result<MethodOutcome, ImportError>;
}

type ImporterFactory = fn() -> Box<dyn ProtocolImporter>;

fn soap() -> Box<dyn ProtocolImporter> {
    Box::new(SoapImporter)
}

fn http_get() -> Box<dyn ProtocolImporter> {
    Box::new(HttpImporter::get())
}

fn http_post() -> Box<dyn ProtocolImporter> {
    Box::new(HttpImporter::post())
}

const IMPORTERS: [(&str, ImporterFactory); 3] =
    [("Soap", soap), ("HttpGet", http_get), ("HttpPost", http_post)];

pub fn importer_names() -> impl Iterator<Item = &'static str> {
    IMPORTERS.iter().map(|(name, _)| *name)
}

/// Looks a protocol up by name, ignoring case.
pub fn importer(name: &str) -> Result<Box<dyn ProtocolImporter>, ImportError> {
    IMPORTERS
        .iter()
        .find(|(registered, _)| registered.eq_ignore_ascii_case(name))
        .map(|(_, factory)| factory())
        .ok_or_else(|| ImportError::UnknownProtocol(name.to_owned()))
}

/// Every registered importer, in registration order.
pub fn importers() -> Vec<Box<dyn ProtocolImporter>> {
    IMPORTERS.iter().map(|(_, factory)| factory()).collect()
}
