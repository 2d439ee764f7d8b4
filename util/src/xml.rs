use quick_xml::{
    events::{BytesStart, Event},
    Reader, Writer,
};

use super::soap::Error;

/// An element sliced out of a larger document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child<'a> {
    pub name: String,
    pub xml: &'a str,
}

fn local_name(start: &BytesStart) -> Result<String, Error> {
    Ok(std::str::from_utf8(start.local_name().as_ref())?.to_owned())
}

/// Adds a default `xmlns` to the root element unless it already declares one.
pub fn with_namespace(xml: &str, namespace: &str) -> Result<String, Error> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut root = true;

    loop {
        match reader.read_event()? {
            Event::Eof => break,

            Event::Start(start) if root => {
                root = false;
                writer.write_event(Event::Start(namespaced(start, namespace)))?;
            }

            Event::Empty(start) if root => {
                root = false;
                writer.write_event(Event::Empty(namespaced(start, namespace)))?;
            }

            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|error| error.utf8_error().into())
}

fn namespaced<'a>(mut start: BytesStart<'a>, namespace: &str) -> BytesStart<'a> {
    let declared = start
        .attributes()
        .flatten()
        .any(|attribute| attribute.key.as_ref() == b"xmlns");

    if !declared {
        start.push_attribute(("xmlns", namespace));
    }

    start
}

/// First element inside `Envelope/Body`, or `None` for an empty body.
pub fn body_child(envelope: &str) -> Result<Option<Child<'_>>, Error> {
    let mut reader = Reader::from_str(envelope);
    reader.trim_text(true);
    reader.expand_empty_elements(true);

    let mut depth = 0;
    let mut in_body = false;

    loop {
        let position = reader.buffer_position();

        match reader.read_event()? {
            Event::Start(start) => {
                let name = local_name(&start)?;
                depth += 1;

                match depth {
                    1 if name != "Envelope" => {
                        return Err(Error::InvalidEnvelope(format!(
                            "unexpected root element <{}>",
                            name
                        )))
                    }

                    2 if name == "Body" => in_body = true,

                    3 if in_body => {
                        reader.read_to_end(start.to_end().name())?;

                        return Ok(Some(Child {
                            name,
                            xml: envelope[position..reader.buffer_position()].trim(),
                        }));
                    }

                    _ => (),
                }
            }

            Event::End(_) => {
                if in_body && depth == 2 {
                    return Ok(None);
                }

                depth -= 1;
            }

            Event::Eof => {
                return Err(Error::InvalidEnvelope("missing <Body> element".into()));
            }

            _ => (),
        }
    }
}

/// Unescaped text of every direct child element, in document order.
pub fn child_texts(xml: &str) -> Result<Vec<(String, String)>, Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.expand_empty_elements(true);

    let mut depth = 0;
    let mut texts = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                depth += 1;

                if depth == 2 {
                    let name = local_name(&start)?;
                    let text = reader.read_text(start.to_end().name())?;
                    let text = quick_xml::escape::unescape(text.trim()).map_err(quick_xml::Error::from)?;

                    texts.push((name, text.into_owned()));
                    depth -= 1;
                }
            }

            Event::End(_) => depth -= 1,
            Event::Eof => break,
            _ => (),
        }
    }

    Ok(texts)
}
