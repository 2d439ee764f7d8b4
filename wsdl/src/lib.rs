mod parser;

pub mod error;
pub mod loader;
pub mod schema;
pub mod types;

pub use error::Error;
pub use loader::{Document, DocumentKind, LoadOptions, Loader, SchemaRegistry};

/// Package holding the types declared inline in a WSDL document.
pub const BASE_PACKAGE: &str = "basetypes";

pub fn load<S: AsRef<str>>(
    location: S,
    kind: DocumentKind,
    options: LoadOptions,
) -> Result<Document, error::Error> {
    Loader::new(options)?.load(location.as_ref(), kind)
}
