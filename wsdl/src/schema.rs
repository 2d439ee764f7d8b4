use url::Url;

#[derive(Default, Debug, Clone)]
pub struct Schema {
    /// Package this schema's definitions are emitted into.
    pub identifier: String,
    pub location: Option<Url>,

    pub target_namespace: Option<String>,
    pub element_form_default: Option<String>,

    pub imports: Vec<Import>,
    pub includes: Vec<Include>,

    pub elements: Vec<Element>,
    pub complex_types: Vec<ComplexType>,
    pub simple_types: Vec<SimpleType>,
    pub attribute_groups: Vec<AttributeGroup>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Include {
    pub schema_location: String,
}

#[derive(Default, Debug, Clone)]
pub struct Element {
    pub name: Option<String>,
    pub reference: Option<String>,
    pub ty: Option<String>,
    pub min_occurs: Option<String>,
    pub max_occurs: Option<String>,
    pub nillable: bool,
    pub documentation: Option<String>,

    pub complex_type: Option<Box<ComplexType>>,
    pub simple_type: Option<Box<SimpleType>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorKind {
    Sequence,
    Choice,
    All,
}

#[derive(Default, Debug, Clone)]
pub struct ComplexType {
    pub name: Option<String>,
    pub documentation: Option<String>,
    pub is_abstract: bool,
    pub mixed: bool,

    pub sequence: Vec<Element>,
    pub choice: Vec<Element>,
    pub all: Vec<Element>,
    pub any: Vec<Any>,
    /// Named model group references, in declaration order.
    pub groups: Vec<String>,

    pub complex_content: Option<Derivation>,
    pub simple_content: Option<Derivation>,

    pub attributes: Vec<Attribute>,
    pub attribute_groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationKind {
    Extension,
    Restriction,
}

/// The `extension` or `restriction` child of `complexContent` / `simpleContent`.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub kind: DerivationKind,
    pub base: Option<String>,

    pub elements: Vec<Element>,
    pub any: Vec<Any>,
    pub groups: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub attribute_groups: Vec<String>,
}

#[derive(Default, Debug, Clone)]
pub struct SimpleType {
    pub name: Option<String>,
    pub documentation: Option<String>,

    pub restriction: Option<Restriction>,
    pub union: Option<Union>,
    pub list: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Restriction {
    pub base: Option<String>,
    pub enumerations: Vec<Enumeration>,
    pub facets: Vec<Facet>,
}

#[derive(Debug, Clone)]
pub struct Enumeration {
    pub value: String,
    pub documentation: Option<String>,
}

/// Any restriction facet other than `enumeration`, e.g. `pattern` or `maxLength`.
#[derive(Debug, Clone)]
pub struct Facet {
    pub kind: String,
    pub value: String,
}

#[derive(Default, Debug, Clone)]
pub struct Union {
    pub member_types: Vec<String>,
    pub simple_types: Vec<SimpleType>,
}

#[derive(Default, Debug, Clone)]
pub struct Attribute {
    pub name: Option<String>,
    pub reference: Option<String>,
    pub ty: Option<String>,
    pub required: bool,
    pub default: Option<String>,
    pub documentation: Option<String>,

    pub simple_type: Option<SimpleType>,
}

#[derive(Default, Debug, Clone)]
pub struct AttributeGroup {
    pub name: Option<String>,
    pub reference: Option<String>,
    pub documentation: Option<String>,

    pub attributes: Vec<Attribute>,
    pub attribute_groups: Vec<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Group {
    pub name: Option<String>,
    pub reference: Option<String>,
    pub documentation: Option<String>,

    pub elements: Vec<Element>,
    pub groups: Vec<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Any {
    pub namespace: Option<String>,
    pub max_occurs: Option<String>,
}

impl Schema {
    /// Locations of imported and included schemas, imports first.
    pub fn external_locations(&self) -> Vec<String> {
        self.imports
            .iter()
            .filter_map(|import| import.schema_location.clone())
            .chain(
                self.includes
                    .iter()
                    .map(|include| include.schema_location.clone()),
            )
            .collect()
    }
}

impl Derivation {
    pub fn new(kind: DerivationKind, base: Option<String>) -> Self {
        Self {
            kind,
            base,
            elements: Vec::new(),
            any: Vec::new(),
            groups: Vec::new(),
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }
}
