use std::path::Path;
use url::Url;

mod parser;
mod writer;

pub mod descriptions;
pub mod error;
pub mod extensions;
pub mod types;

pub use descriptions::Descriptions;

/// Reads the description at `url` (or a local path) and everything it
/// imports, each document once.
pub fn parse<S: AsRef<str>>(url: S) -> Result<Descriptions, error::Error> {
    let url = {
        match Url::parse(url.as_ref()) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
                &Path::new(url.as_ref())
                    .canonicalize()
                    .map_err(|err| error::Error::PathConversionError(Some(err)))?,
            )
            .map_err(|()| error::Error::PathConversionError(None))?,
            Err(err) => return Err(err.into()),
        }
    };

    parser::parse(url)
}

/// Reads a single in-memory description. Imports are recorded but not
/// followed.
pub fn parse_str(xml: &str) -> Result<types::Definition, error::Error> {
    parser::parse_str(xml)
}

/// Serializes a description back to WSDL 1.1 XML.
pub fn write(definition: &types::Definition) -> Result<String, error::Error> {
    writer::write(definition)
}
