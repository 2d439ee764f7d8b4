use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tracing::trace;

use super::{
    error,
    schema::{
        Any, Attribute, AttributeGroup, ComplexType, CompositorKind, Derivation, DerivationKind,
        Element, Enumeration, Facet, Group, Import, Include, Restriction, Schema, SimpleType,
        Union,
    },
    types::{
        Binding, BindingOperation, Definitions, Fault, Import as WsdlImport, Message, Operation,
        Part, Port, PortType, Service,
    },
};

/// Root of a parsed document.
#[derive(Debug)]
pub enum Parsed {
    Definitions(Definitions),
    Schema(Schema),
}

fn get_attributes<const N: usize>(
    start: &BytesStart<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], error::Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in start.attributes() {
        let attribute = attribute?;

        let raw = attribute.key.as_ref();
        if raw == b"xmlns" || raw.starts_with(b"xmlns:") {
            continue;
        }

        let key = attribute.key.local_name();
        let key = std::str::from_utf8(key.as_ref())?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(attribute.unescape_value()?.into_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn required(
    element: &str,
    attribute: &'static str,
    value: Option<String>,
) -> Result<String, error::Error> {
    value.ok_or_else(|| error::Error::MissingAttribute {
        element: element.to_owned(),
        attribute,
    })
}

fn is_true(value: Option<String>) -> bool {
    matches!(value.as_deref(), Some("true" | "1"))
}

fn append_documentation(documentation: &mut Option<String>, text: String) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    match documentation {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *documentation = Some(text.to_owned()),
    }
}

#[derive(Debug)]
enum ParseState {
    Definitions,
    Types,

    Schema(Schema),
    Element(Element),
    ComplexType(ComplexType),
    Compositor {
        kind: CompositorKind,
        elements: Vec<Element>,
        groups: Vec<String>,
        any: Vec<Any>,
    },
    ComplexContent(Option<Derivation>),
    SimpleContent(Option<Derivation>),
    Derivation(Derivation),
    SimpleType(SimpleType),
    Restriction(Restriction),
    Enumeration(Enumeration),
    Union(Union),
    Attribute(Attribute),
    AttributeGroup(AttributeGroup),
    Group(Group),

    Annotation(Option<String>),
    Documentation(String),

    Message(Message),
    PortType(PortType),
    Operation(Operation),
    Binding(Binding),
    BindingOperation(BindingOperation),
    Service(Service),
    Port(Port),

    Other(String),
}

impl ParseState {
    fn documentation_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            ParseState::Element(Element { documentation, .. })
            | ParseState::ComplexType(ComplexType { documentation, .. })
            | ParseState::SimpleType(SimpleType { documentation, .. })
            | ParseState::Enumeration(Enumeration { documentation, .. })
            | ParseState::Attribute(Attribute { documentation, .. })
            | ParseState::AttributeGroup(AttributeGroup { documentation, .. })
            | ParseState::Group(Group { documentation, .. })
            | ParseState::PortType(PortType { documentation, .. })
            | ParseState::Operation(Operation { documentation, .. })
            | ParseState::Service(Service { documentation, .. }) => Some(documentation),

            _ => None,
        }
    }
}

#[derive(Default)]
struct Parser {
    definitions: Option<Definitions>,
    schema: Option<Schema>,
}

impl Parser {
    fn definitions_mut(&mut self) -> Result<&mut Definitions, error::Error> {
        self.definitions
            .as_mut()
            .ok_or_else(|| error::Error::InvalidDocument("expected <definitions> root".into()))
    }

    fn parse(mut self, bytes: &[u8]) -> Result<Parsed, error::Error> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut stack = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => self.handle_start(&mut stack, &start)?,
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &start)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &text.unescape()?),
                Event::CData(data) => {
                    let data = data.into_inner();
                    self.handle_text(&mut stack, std::str::from_utf8(&data)?)
                }

                Event::Eof => break,
                _ => (),
            }
        }

        match (self.definitions, self.schema) {
            (Some(definitions), _) => Ok(Parsed::Definitions(definitions)),
            (None, Some(schema)) => Ok(Parsed::Schema(schema)),
            (None, None) => Err(error::Error::InvalidDocument(
                "document contains neither <definitions> nor <schema>".into(),
            )),
        }
    }

    fn schema(start: &BytesStart<'_>) -> Result<Schema, error::Error> {
        let [target_namespace, element_form_default] =
            get_attributes(start, ["targetNamespace", "elementFormDefault"])?;

        Ok(Schema {
            target_namespace,
            element_form_default,
            ..Default::default()
        })
    }

    fn element(start: &BytesStart<'_>) -> Result<Element, error::Error> {
        let [name, reference, ty, min_occurs, max_occurs, nillable] = get_attributes(
            start,
            ["name", "ref", "type", "minOccurs", "maxOccurs", "nillable"],
        )?;

        if name.is_none() && reference.is_none() {
            return Err(error::Error::MissingAttribute {
                element: "element".into(),
                attribute: "name",
            });
        }

        Ok(Element {
            name,
            reference,
            ty,
            min_occurs,
            max_occurs,
            nillable: is_true(nillable),
            ..Default::default()
        })
    }

    fn complex_type(start: &BytesStart<'_>) -> Result<ComplexType, error::Error> {
        let [name, is_abstract, mixed] = get_attributes(start, ["name", "abstract", "mixed"])?;

        Ok(ComplexType {
            name,
            is_abstract: is_true(is_abstract),
            mixed: is_true(mixed),
            ..Default::default()
        })
    }

    fn attribute(start: &BytesStart<'_>) -> Result<Attribute, error::Error> {
        let [name, reference, ty, usage, default] =
            get_attributes(start, ["name", "ref", "type", "use", "default"])?;

        Ok(Attribute {
            name,
            reference,
            ty,
            required: usage.as_deref() == Some("required"),
            default,
            ..Default::default()
        })
    }

    fn handle_start(
        &mut self,
        stack: &mut Vec<ParseState>,
        start: &BytesStart<'_>,
    ) -> Result<(), error::Error> {
        let name = std::str::from_utf8(start.local_name().as_ref())?.to_owned();

        let mut state = stack.pop();
        let mut new_state = ParseState::Other(name.clone());

        match (&mut state, name.as_str()) {
            (None, "definitions") => {
                let [name, target_namespace] =
                    get_attributes(start, ["name", "targetNamespace"])?;

                self.definitions = Some(Definitions {
                    name,
                    target_namespace,
                    ..Default::default()
                });

                new_state = ParseState::Definitions;
            }

            (None, "schema") => new_state = ParseState::Schema(Self::schema(start)?),

            (None, other) => {
                return Err(error::Error::InvalidDocument(format!(
                    "unexpected root element <{}>",
                    other
                )))
            }

            (Some(ParseState::Other(_)), _) => (),

            (Some(_), "annotation") => new_state = ParseState::Annotation(None),
            (Some(_), "documentation") => new_state = ParseState::Documentation(String::new()),

            (Some(ParseState::Definitions), "import") => {
                let [location, namespace] = get_attributes(start, ["location", "namespace"])?;
                let location = required("import", "location", location)?;

                self.definitions_mut()?
                    .imports
                    .push(WsdlImport { namespace, location });
            }

            (Some(ParseState::Definitions), "types") => new_state = ParseState::Types,

            (Some(ParseState::Definitions), "message") => {
                let [name] = get_attributes(start, ["name"])?;

                new_state = ParseState::Message(Message {
                    name: required("message", "name", name)?,
                    parts: Vec::new(),
                });
            }

            (Some(ParseState::Definitions), "portType") => {
                let [name] = get_attributes(start, ["name"])?;

                new_state = ParseState::PortType(PortType {
                    name: required("portType", "name", name)?,
                    documentation: None,
                    operations: Vec::new(),
                });
            }

            (Some(ParseState::Definitions), "binding") => {
                let [name, ty] = get_attributes(start, ["name", "type"])?;

                new_state = ParseState::Binding(Binding {
                    name: required("binding", "name", name)?,
                    ty: required("binding", "type", ty)?,
                    style: None,
                    transport: None,
                    operations: Vec::new(),
                });
            }

            (Some(ParseState::Definitions), "service") => {
                let [name] = get_attributes(start, ["name"])?;

                new_state = ParseState::Service(Service {
                    name: required("service", "name", name)?,
                    documentation: None,
                    ports: Vec::new(),
                });
            }

            (Some(ParseState::Types), "schema") => {
                new_state = ParseState::Schema(Self::schema(start)?)
            }

            (Some(ParseState::Schema(schema)), "import") => {
                let [namespace, schema_location] =
                    get_attributes(start, ["namespace", "schemaLocation"])?;

                schema.imports.push(Import {
                    namespace,
                    schema_location,
                });
            }

            (Some(ParseState::Schema(schema)), "include") => {
                let [schema_location] = get_attributes(start, ["schemaLocation"])?;

                schema.includes.push(Include {
                    schema_location: required("include", "schemaLocation", schema_location)?,
                });
            }

            (Some(ParseState::Schema(_) | ParseState::Compositor { .. }), "element") => {
                new_state = ParseState::Element(Self::element(start)?)
            }

            (Some(ParseState::Schema(_) | ParseState::Element(_)), "complexType") => {
                new_state = ParseState::ComplexType(Self::complex_type(start)?)
            }

            (
                Some(
                    ParseState::Schema(_)
                    | ParseState::Element(_)
                    | ParseState::Attribute(_)
                    | ParseState::Union(_),
                ),
                "simpleType",
            ) => {
                let [name] = get_attributes(start, ["name"])?;

                new_state = ParseState::SimpleType(SimpleType {
                    name,
                    ..Default::default()
                });
            }

            (
                Some(
                    ParseState::Schema(_)
                    | ParseState::ComplexType(_)
                    | ParseState::Derivation(_)
                    | ParseState::AttributeGroup(_),
                ),
                "attribute",
            ) => new_state = ParseState::Attribute(Self::attribute(start)?),

            (
                Some(
                    ParseState::Schema(_)
                    | ParseState::ComplexType(_)
                    | ParseState::Derivation(_)
                    | ParseState::AttributeGroup(_),
                ),
                "attributeGroup",
            ) => {
                let [name, reference] = get_attributes(start, ["name", "ref"])?;

                new_state = ParseState::AttributeGroup(AttributeGroup {
                    name,
                    reference,
                    ..Default::default()
                });
            }

            (
                Some(
                    ParseState::Schema(_)
                    | ParseState::ComplexType(_)
                    | ParseState::Derivation(_)
                    | ParseState::Compositor { .. },
                ),
                "group",
            ) => {
                let [name, reference] = get_attributes(start, ["name", "ref"])?;

                new_state = ParseState::Group(Group {
                    name,
                    reference,
                    ..Default::default()
                });
            }

            (
                Some(
                    ParseState::ComplexType(_)
                    | ParseState::Derivation(_)
                    | ParseState::Group(_)
                    | ParseState::Compositor { .. },
                ),
                "sequence" | "choice" | "all",
            ) => {
                let kind = match name.as_str() {
                    "sequence" => CompositorKind::Sequence,
                    "choice" => CompositorKind::Choice,
                    _ => CompositorKind::All,
                };

                new_state = ParseState::Compositor {
                    kind,
                    elements: Vec::new(),
                    groups: Vec::new(),
                    any: Vec::new(),
                };
            }

            (
                Some(
                    ParseState::ComplexType(ComplexType { any, .. })
                    | ParseState::Derivation(Derivation { any, .. })
                    | ParseState::Compositor { any, .. },
                ),
                "any",
            ) => {
                let [namespace, max_occurs] = get_attributes(start, ["namespace", "maxOccurs"])?;
                any.push(Any {
                    namespace,
                    max_occurs,
                });
            }

            (Some(ParseState::ComplexType(_)), "complexContent") => {
                new_state = ParseState::ComplexContent(None)
            }

            (Some(ParseState::ComplexType(_)), "simpleContent") => {
                new_state = ParseState::SimpleContent(None)
            }

            (
                Some(ParseState::ComplexContent(_) | ParseState::SimpleContent(_)),
                "extension" | "restriction",
            ) => {
                let [base] = get_attributes(start, ["base"])?;
                let kind = if name == "extension" {
                    DerivationKind::Extension
                } else {
                    DerivationKind::Restriction
                };

                new_state = ParseState::Derivation(Derivation::new(kind, base));
            }

            (Some(ParseState::SimpleType(_)), "restriction") => {
                let [base] = get_attributes(start, ["base"])?;

                new_state = ParseState::Restriction(Restriction {
                    base,
                    ..Default::default()
                });
            }

            (Some(ParseState::SimpleType(_)), "union") => {
                let [member_types] = get_attributes(start, ["memberTypes"])?;

                new_state = ParseState::Union(Union {
                    member_types: member_types
                        .map(|types| types.split_whitespace().map(ToOwned::to_owned).collect())
                        .unwrap_or_default(),
                    simple_types: Vec::new(),
                });
            }

            (Some(ParseState::SimpleType(ty)), "list") => {
                let [item_type] = get_attributes(start, ["itemType"])?;
                ty.list = Some(item_type.unwrap_or_else(|| "string".into()));
            }

            (Some(ParseState::Restriction(_)), "enumeration") => {
                let [value] = get_attributes(start, ["value"])?;

                new_state = ParseState::Enumeration(Enumeration {
                    value: required("enumeration", "value", value)?,
                    documentation: None,
                });
            }

            (Some(ParseState::Restriction(restriction)), facet) => {
                if let [Some(value)] = get_attributes(start, ["value"])? {
                    restriction.facets.push(Facet {
                        kind: facet.to_owned(),
                        value,
                    });
                }
            }

            (Some(ParseState::Message(message)), "part") => {
                let [name, element, ty] = get_attributes(start, ["name", "element", "type"])?;

                message.parts.push(Part {
                    name: required("part", "name", name)?,
                    element,
                    ty,
                });
            }

            (Some(ParseState::PortType(_)), "operation") => {
                let [name] = get_attributes(start, ["name"])?;

                new_state = ParseState::Operation(Operation {
                    name: required("operation", "name", name)?,
                    documentation: None,
                    input: None,
                    output: None,
                    faults: Vec::new(),
                });
            }

            (Some(ParseState::Operation(operation)), kind @ ("input" | "output" | "fault")) => {
                let [name, message] = get_attributes(start, ["name", "message"])?;
                let message = required(kind, "message", message)?;

                match kind {
                    "input" => operation.input = Some(message),
                    "output" => operation.output = Some(message),
                    _ => operation.faults.push(Fault { name, message }),
                }
            }

            (Some(ParseState::Binding(binding)), "binding") => {
                let [style, transport] = get_attributes(start, ["style", "transport"])?;
                binding.style = style;
                binding.transport = transport;
            }

            (Some(ParseState::Binding(_)), "operation") => {
                let [name] = get_attributes(start, ["name"])?;

                new_state = ParseState::BindingOperation(BindingOperation {
                    name: required("operation", "name", name)?,
                    action: None,
                    style: None,
                });
            }

            (Some(ParseState::BindingOperation(operation)), "operation") => {
                let [action, style] = get_attributes(start, ["soapAction", "style"])?;
                operation.action = action;
                operation.style = style;
            }

            (Some(ParseState::Service(_)), "port") => {
                let [name, binding] = get_attributes(start, ["name", "binding"])?;

                new_state = ParseState::Port(Port {
                    name: required("port", "name", name)?,
                    binding: required("port", "binding", binding)?,
                    location: None,
                });
            }

            (Some(ParseState::Port(port)), "address") => {
                let [location] = get_attributes(start, ["location"])?;
                port.location = location;
            }

            (Some(_), other) => trace!(element = other, "Skipping unsupported element"),
        }

        stack.extend(state);
        stack.push(new_state);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), error::Error> {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match (finished_state, &mut next_state) {
            (Some(ParseState::Schema(schema)), None) => self.schema = Some(schema),

            (Some(ParseState::Schema(schema)), Some(ParseState::Types)) => {
                self.definitions_mut()?.schemas.push(schema)
            }

            (Some(ParseState::Element(element)), Some(ParseState::Schema(schema))) => {
                schema.elements.push(element)
            }

            (Some(ParseState::Element(element)), Some(ParseState::Compositor { elements, .. })) => {
                elements.push(element)
            }

            (Some(ParseState::ComplexType(ty)), Some(ParseState::Schema(schema))) => {
                schema.complex_types.push(ty)
            }

            (Some(ParseState::ComplexType(ty)), Some(ParseState::Element(element))) => {
                element.complex_type = Some(Box::new(ty))
            }

            (Some(ParseState::SimpleType(ty)), Some(ParseState::Schema(schema))) => {
                schema.simple_types.push(ty)
            }

            (Some(ParseState::SimpleType(ty)), Some(ParseState::Element(element))) => {
                element.simple_type = Some(Box::new(ty))
            }

            (Some(ParseState::SimpleType(ty)), Some(ParseState::Attribute(attribute))) => {
                attribute.simple_type = Some(ty)
            }

            (Some(ParseState::SimpleType(ty)), Some(ParseState::Union(union))) => {
                union.simple_types.push(ty)
            }

            (
                Some(ParseState::Compositor {
                    kind,
                    elements,
                    groups,
                    any,
                }),
                Some(ParseState::ComplexType(ty)),
            ) => {
                match kind {
                    CompositorKind::Sequence => ty.sequence.extend(elements),
                    CompositorKind::Choice => ty.choice.extend(elements),
                    CompositorKind::All => ty.all.extend(elements),
                }

                ty.groups.extend(groups);
                ty.any.extend(any);
            }

            (
                Some(ParseState::Compositor {
                    elements,
                    groups,
                    any,
                    ..
                }),
                Some(
                    ParseState::Derivation(Derivation {
                        elements: parent_elements,
                        groups: parent_groups,
                        any: parent_any,
                        ..
                    })
                    | ParseState::Compositor {
                        elements: parent_elements,
                        groups: parent_groups,
                        any: parent_any,
                        ..
                    },
                ),
            ) => {
                parent_elements.extend(elements);
                parent_groups.extend(groups);
                parent_any.extend(any);
            }

            (
                Some(ParseState::Compositor {
                    elements, groups, ..
                }),
                Some(ParseState::Group(group)),
            ) => {
                group.elements.extend(elements);
                group.groups.extend(groups);
            }

            (
                Some(ParseState::Derivation(derivation)),
                Some(ParseState::ComplexContent(content) | ParseState::SimpleContent(content)),
            ) => *content = Some(derivation),

            (Some(ParseState::ComplexContent(content)), Some(ParseState::ComplexType(ty))) => {
                ty.complex_content = content
            }

            (Some(ParseState::SimpleContent(content)), Some(ParseState::ComplexType(ty))) => {
                ty.simple_content = content
            }

            (Some(ParseState::Restriction(restriction)), Some(ParseState::SimpleType(ty))) => {
                ty.restriction = Some(restriction)
            }

            (Some(ParseState::Union(union)), Some(ParseState::SimpleType(ty))) => {
                ty.union = Some(union)
            }

            (
                Some(ParseState::Enumeration(enumeration)),
                Some(ParseState::Restriction(restriction)),
            ) => restriction.enumerations.push(enumeration),

            (
                Some(ParseState::Attribute(attribute)),
                Some(
                    ParseState::ComplexType(ComplexType { attributes, .. })
                    | ParseState::Derivation(Derivation { attributes, .. })
                    | ParseState::AttributeGroup(AttributeGroup { attributes, .. }),
                ),
            ) => attributes.push(attribute),

            (Some(ParseState::Attribute(attribute)), Some(ParseState::Schema(_))) => {
                trace!(attribute = ?attribute.name, "Skipping global attribute")
            }

            (Some(ParseState::AttributeGroup(group)), Some(ParseState::Schema(schema))) => {
                schema.attribute_groups.push(group)
            }

            (
                Some(ParseState::AttributeGroup(group)),
                Some(
                    ParseState::ComplexType(ComplexType {
                        attribute_groups, ..
                    })
                    | ParseState::Derivation(Derivation {
                        attribute_groups, ..
                    })
                    | ParseState::AttributeGroup(AttributeGroup {
                        attribute_groups, ..
                    }),
                ),
            ) => attribute_groups.extend(group.reference),

            (Some(ParseState::Group(group)), Some(ParseState::Schema(schema))) => {
                schema.groups.push(group)
            }

            (
                Some(ParseState::Group(group)),
                Some(
                    ParseState::ComplexType(ComplexType { groups, .. })
                    | ParseState::Derivation(Derivation { groups, .. })
                    | ParseState::Compositor { groups, .. },
                ),
            ) => groups.extend(group.reference),

            (Some(ParseState::Documentation(text)), Some(ParseState::Annotation(documentation))) => {
                append_documentation(documentation, text)
            }

            (
                Some(
                    ParseState::Documentation(text) | ParseState::Annotation(Some(text)),
                ),
                Some(parent),
            ) => {
                if let Some(documentation) = parent.documentation_mut() {
                    append_documentation(documentation, text);
                }
            }

            (Some(ParseState::Message(message)), Some(ParseState::Definitions)) => {
                self.definitions_mut()?.messages.push(message)
            }

            (Some(ParseState::PortType(port_type)), Some(ParseState::Definitions)) => {
                self.definitions_mut()?.port_types.push(port_type)
            }

            (Some(ParseState::Operation(operation)), Some(ParseState::PortType(port_type))) => {
                port_type.operations.push(operation)
            }

            (Some(ParseState::Binding(binding)), Some(ParseState::Definitions)) => {
                self.definitions_mut()?.bindings.push(binding)
            }

            (
                Some(ParseState::BindingOperation(operation)),
                Some(ParseState::Binding(binding)),
            ) => binding.operations.push(operation),

            (Some(ParseState::Service(service)), Some(ParseState::Definitions)) => {
                self.definitions_mut()?.services.push(service)
            }

            (Some(ParseState::Port(port)), Some(ParseState::Service(service))) => {
                service.ports.push(port)
            }

            _ => (),
        }

        stack.extend(next_state);
        Ok(())
    }

    fn handle_text(&mut self, stack: &mut [ParseState], text: &str) {
        if let Some(ParseState::Documentation(buffer)) = stack.last_mut() {
            buffer.push_str(text);
        }
    }
}

pub fn parse(bytes: &[u8]) -> Result<Parsed, error::Error> {
    Parser::default().parse(bytes)
}
