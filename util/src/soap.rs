use std::time::Duration;

use quick_xml::{
    de::DeError,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use reqwest::{
    blocking::{Client as Reqwest, RequestBuilder},
    header::CONTENT_TYPE,
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::xml;

pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(StatusCode),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to map message: {0}")]
    Serde(#[from] DeError),

    #[error("Message is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("SOAP fault {0}")]
    Fault(Fault),

    #[error("Invalid SOAP envelope: {0}")]
    InvalidEnvelope(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{faultcode}: {faultstring}")]
pub struct Fault {
    pub faultcode: String,
    pub faultstring: String,
    pub faultactor: Option<String>,
    pub detail: Option<String>,
}

impl Fault {
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let mut fault = Fault::default();

        for (name, text) in xml::child_texts(xml)? {
            match name.as_str() {
                "faultcode" => fault.faultcode = text,
                "faultstring" => fault.faultstring = text,
                "faultactor" => fault.faultactor = Some(text),
                "detail" => fault.detail = Some(text),
                _ => (),
            }
        }

        Ok(fault)
    }
}

/// Stand-in for an absent request or response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// A request body, serialized under the root name of its message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    xml: String,
}

impl Request {
    pub fn new<T: Serialize>(root: &str, namespace: &str, body: &T) -> Result<Self, Error> {
        let xml = quick_xml::se::to_string_with_root(root, body)?;

        let xml = if namespace.is_empty() {
            xml
        } else {
            xml::with_namespace(&xml, namespace)?
        };

        Ok(Self { xml })
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

/// Pre-serialized content of `soap:Header`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    xml: String,
}

impl Header {
    pub fn new<T: Serialize>(value: &T) -> Result<Self, Error> {
        Ok(Self {
            xml: quick_xml::se::to_string(value)?,
        })
    }

    pub fn from_xml<S: Into<String>>(xml: S) -> Self {
        Self { xml: xml.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

/// Last chance to adjust an outgoing request, e.g. to add credentials.
pub type Configure<'a> = &'a dyn Fn(RequestBuilder) -> RequestBuilder;

pub fn envelope(request: Option<&Request>, header: Option<&Header>) -> Result<String, Error> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("soap:Envelope").with_attributes([("xmlns:soap", ENVELOPE_NAMESPACE)]),
    ))?;

    if let Some(header) = header {
        writer.write_event(Event::Start(BytesStart::new("soap:Header")))?;
        writer.write_event(Event::Text(BytesText::from_escaped(header.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new("soap:Header")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("soap:Body")))?;
    if let Some(request) = request {
        writer.write_event(Event::Text(BytesText::from_escaped(request.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new("soap:Body")))?;

    writer.write_event(Event::End(BytesEnd::new("soap:Envelope")))?;

    String::from_utf8(writer.into_inner()).map_err(|error| error.utf8_error().into())
}

/// Extracts the payload of a response envelope.
pub fn parse_response<R: DeserializeOwned>(text: &str) -> Result<Option<R>, Error> {
    if text.trim().is_empty() {
        warn!("Empty SOAP response");
        return Ok(None);
    }

    match xml::body_child(text)? {
        None => {
            warn!("SOAP response has an empty body");
            Ok(None)
        }

        Some(child) if child.name == "Fault" => Err(Error::Fault(Fault::parse(child.xml)?)),

        Some(child) => Ok(Some(quick_xml::de::from_str(child.xml)?)),
    }
}

pub struct Client {
    client: Reqwest,
    url: String,
}

impl Client {
    pub fn new(url: &str, ignore_tls: bool) -> Result<Self, Error> {
        let client = Reqwest::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .danger_accept_invalid_certs(ignore_tls)
            .build()?;

        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn call<R: DeserializeOwned>(
        &self,
        action: &str,
        request: Option<Request>,
        header: Option<&Header>,
        configure: Option<Configure<'_>>,
    ) -> Result<Option<R>, Error> {
        let body = envelope(request.as_ref(), header)?;

        let mut builder = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, r#"text/xml; charset="utf-8""#);

        if !action.is_empty() {
            builder = builder.header("SOAPAction", action);
        }

        if let Some(configure) = configure {
            builder = configure(builder);
        }

        debug!(url = %self.url, action, "Sending SOAP request");
        let response = builder.body(body).send()?;
        let status = response.status();
        let text = response.text()?;

        // faults usually arrive with a 500, so the envelope is inspected first
        match parse_response(&text) {
            Ok(None) if !status.is_success() => Err(Error::Status(status)),
            Err(Error::InvalidEnvelope(_) | Error::Xml(_)) if !status.is_success() => {
                Err(Error::Status(status))
            }
            result => result,
        }
    }
}
