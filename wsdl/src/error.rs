use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to read file {path}")]
    FileReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Document is not valid UTF-8")]
    EncodingError(#[from] std::str::Utf8Error),

    #[error("Element <{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unable to resolve location {location} referenced from {referrer}")]
    UnresolvedReference { location: String, referrer: String },

    #[error("Reached maximum include depth of {depth} while loading {location}")]
    RecursionLimit { location: String, depth: usize },
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParseError(err.into())
    }
}
