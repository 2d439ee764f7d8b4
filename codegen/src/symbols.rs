use std::collections::HashMap;

use wsdlgen_wsdl::{
    schema::{AttributeGroup, ComplexType, Element, Group, Schema, SimpleType},
    Document,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Element,
    SimpleType,
    ComplexType,
    AttributeGroup,
}

#[derive(Debug, Clone, Copy)]
pub enum Definition<'a> {
    Element(&'a Element),
    SimpleType(&'a SimpleType),
    ComplexType(&'a ComplexType),
    AttributeGroup(&'a AttributeGroup),
}

#[derive(Debug, Clone, Copy)]
pub struct Symbol<'a> {
    pub name: &'a str,
    pub package: &'a str,
    pub namespace: Option<&'a str>,
    pub definition: Definition<'a>,
}

impl<'a> Symbol<'a> {
    pub fn kind(&self) -> SymbolKind {
        match self.definition {
            Definition::Element(_) => SymbolKind::Element,
            Definition::SimpleType(_) => SymbolKind::SimpleType,
            Definition::ComplexType(_) => SymbolKind::ComplexType,
            Definition::AttributeGroup(_) => SymbolKind::AttributeGroup,
        }
    }
}

/// Named definitions of every schema in a document, keyed by lower-cased local name.
///
/// Insertion follows scope order (root schemas, then the registry in discovery order), then
/// kind order (elements, simple types, complex types, attribute groups), then declaration
/// order. The first definition inserted under a key wins.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    all: HashMap<String, Symbol<'a>>,
    elements: HashMap<String, Symbol<'a>>,
    types: HashMap<String, Symbol<'a>>,
    attribute_groups: HashMap<String, Symbol<'a>>,
    groups: HashMap<String, (&'a str, &'a Group)>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

fn first_wins<'a>(table: &mut HashMap<String, Symbol<'a>>, symbol: Symbol<'a>) {
    table.entry(key(symbol.name)).or_insert(symbol);
}

impl<'a> SymbolTable<'a> {
    pub fn new(document: &'a Document) -> Self {
        let mut table = Self::default();

        for schema in document.root_schemas().iter().chain(document.registry.iter()) {
            table.insert_schema(schema);
        }

        table
    }

    fn insert_schema(&mut self, schema: &'a Schema) {
        let symbol = |name: &'a str, definition| Symbol {
            name,
            package: &schema.identifier,
            namespace: schema.target_namespace.as_deref(),
            definition,
        };

        for element in &schema.elements {
            if let Some(name) = &element.name {
                let symbol = symbol(name, Definition::Element(element));
                first_wins(&mut self.all, symbol);
                first_wins(&mut self.elements, symbol);
            }
        }

        for ty in &schema.simple_types {
            if let Some(name) = &ty.name {
                let symbol = symbol(name, Definition::SimpleType(ty));
                first_wins(&mut self.all, symbol);
                first_wins(&mut self.types, symbol);
            }
        }

        for ty in &schema.complex_types {
            if let Some(name) = &ty.name {
                let symbol = symbol(name, Definition::ComplexType(ty));
                first_wins(&mut self.all, symbol);
                first_wins(&mut self.types, symbol);
            }
        }

        for group in &schema.attribute_groups {
            if let Some(name) = &group.name {
                let symbol = symbol(name, Definition::AttributeGroup(group));
                first_wins(&mut self.all, symbol);
                first_wins(&mut self.attribute_groups, symbol);
            }
        }

        for group in &schema.groups {
            if let Some(name) = &group.name {
                self.groups
                    .entry(key(name))
                    .or_insert((schema.identifier.as_str(), group));
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol<'a>> {
        self.all.get(&key(name)).copied()
    }

    pub fn element(&self, name: &str) -> Option<Symbol<'a>> {
        self.elements.get(&key(name)).copied()
    }

    /// Simple and complex types only.
    pub fn ty(&self, name: &str) -> Option<Symbol<'a>> {
        self.types.get(&key(name)).copied()
    }

    pub fn attribute_group(&self, name: &str) -> Option<Symbol<'a>> {
        self.attribute_groups.get(&key(name)).copied()
    }

    pub fn group(&self, name: &str) -> Option<(&'a str, &'a Group)> {
        self.groups.get(&key(name)).copied()
    }
}
