use wsbind_wsdl::{self as wsdl, descriptions::Descriptions, types::Definition};

pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod headers;
pub mod http;
pub mod identifiers;
pub mod import;
pub mod mapping;
pub mod options;
pub mod parameters;
pub mod protocol;
pub mod reflect;
pub mod resolver;
pub mod rust;
pub mod soap;

use import::ImportReport;
use mapping::SchemaTypeMapper;
use options::{ImportOptions, ReflectOptions};
use reflect::ServiceContract;
use rust::RustEmitter;

/// Imports `descriptions` and renders the result, schema types included, as
/// Rust source.
pub fn from_descriptions(
    descriptions: &Descriptions,
    options: &ImportOptions,
) -> Result<(String, ImportReport), error::Error> {
    let mapper = SchemaTypeMapper::new(descriptions);
    let mut emitter = RustEmitter::new();
    emitter.add_schema_types(descriptions);

    let report = import::import(descriptions, &mapper, options, &mut emitter)?;
    Ok((emitter.to_source()?, report))
}

pub fn from_url<S: AsRef<str>>(
    url: S,
    options: &ImportOptions,
) -> Result<(String, ImportReport), error::Error> {
    let descriptions = wsdl::parse(url)?;
    from_descriptions(&descriptions, options)
}

/// Reflects `contract` and serializes the description to WSDL.
pub fn to_wsdl(contract: &ServiceContract, options: &ReflectOptions) -> Result<(Definition, String), error::Error> {
    let definition = reflect::reflect(contract, options)?;
    let xml = wsdl::write(&definition)?;
    Ok((definition, xml))
}
