use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to load document: {0}")]
    Load(#[from] wsdlgen_wsdl::Error),

    #[error("Generated code for module `{module}` is not valid: {message}")]
    Tokens { module: String, message: String },

    #[error("The {0} generation task panicked")]
    Worker(&'static str),
}
