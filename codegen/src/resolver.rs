use std::collections::{BTreeSet, HashSet};

use proc_macro2::TokenStream;
use quote::quote;
use tracing::debug;
use wsdlgen_wsdl::{
    schema::{AttributeGroup, ComplexType, Group},
    Document,
};

use super::{
    builtins::{self, Scalar},
    sanitize::{module_name, sanitize, strip_namespace, type_ident},
    symbols::{Definition, Symbol, SymbolKind, SymbolTable},
};

/// Bookkeeping for the package currently being emitted.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    package: Option<String>,
    imports: BTreeSet<String>,
    emitted: HashSet<String>,
}

impl ResolutionContext {
    pub fn new<S: Into<String>>(package: S) -> Self {
        Self {
            package: Some(package.into()),
            ..Default::default()
        }
    }

    /// A context owning no types, so every user type it resolves is package-qualified.
    pub fn detached() -> Self {
        Self::default()
    }

    /// An empty context for the same package; imports recorded in it are discarded.
    pub fn sibling(&self) -> Self {
        Self {
            package: self.package.clone(),
            ..Default::default()
        }
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Returns `true` the first time a name is seen, `false` on every later call.
    pub fn mark_emitted(&mut self, name: &str) -> bool {
        self.emitted.insert(name.to_owned())
    }

    pub fn is_emitted(&self, name: &str) -> bool {
        self.emitted.contains(name)
    }

    fn record_import(&mut self, package: &str) {
        if self.package.as_deref() != Some(package) {
            self.imports.insert(package.to_owned());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Builtin(Scalar),
    Local {
        name: String,
        kind: Option<SymbolKind>,
    },
    Foreign {
        package: String,
        name: String,
        kind: Option<SymbolKind>,
    },
}

impl TypeRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Builtin(_) => None,
            TypeRef::Local { name, .. } | TypeRef::Foreign { name, .. } => Some(name),
        }
    }

    fn kind(&self) -> Option<SymbolKind> {
        match self {
            TypeRef::Builtin(_) => None,
            TypeRef::Local { kind, .. } | TypeRef::Foreign { kind, .. } => *kind,
        }
    }

    /// Whether the referenced type is emitted as a struct, which fields hold behind a `Box`.
    pub fn is_record(&self) -> bool {
        !matches!(self, TypeRef::Builtin(_)) && self.kind() != Some(SymbolKind::SimpleType)
    }

    pub fn tokens(&self) -> TokenStream {
        match self {
            TypeRef::Builtin(scalar) => scalar.tokens(),

            TypeRef::Local { name, .. } => {
                let ident = type_ident(name);
                quote! { #ident }
            }

            TypeRef::Foreign { package, name, .. } => {
                let module = quote::format_ident!("{}", module_name(package));
                let ident = type_ident(name);
                quote! { #module::#ident }
            }
        }
    }
}

pub struct Resolver<'a> {
    table: SymbolTable<'a>,
    root_package: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            table: SymbolTable::new(document),
            root_package: &document.root_package,
        }
    }

    /// Resolves any type or element reference.
    pub fn resolve(&self, ctx: &mut ResolutionContext, name: &str) -> TypeRef {
        let local = strip_namespace(name);

        if let Some(scalar) = builtins::lookup(local) {
            return TypeRef::Builtin(scalar);
        }

        match self.table.lookup(local) {
            Some(symbol) => self.symbol(ctx, symbol),
            None => self.fallback(ctx, local),
        }
    }

    /// Resolves an element reference such as a message part or `ref=`, preferring elements.
    pub fn resolve_element(&self, ctx: &mut ResolutionContext, name: &str) -> TypeRef {
        let local = strip_namespace(name);

        match self.table.element(local) {
            Some(symbol) => self.symbol(ctx, symbol),
            None => self.resolve(ctx, name),
        }
    }

    /// Resolves a `type=` or `base=` reference against simple and complex types only.
    pub fn resolve_type(&self, ctx: &mut ResolutionContext, name: &str) -> TypeRef {
        let local = strip_namespace(name);

        if let Some(scalar) = builtins::lookup(local) {
            return TypeRef::Builtin(scalar);
        }

        match self.table.ty(local) {
            Some(symbol) => self.reference(ctx, symbol),
            None => self.fallback(ctx, local),
        }
    }

    /// The complex type whose content a record for `name` carries, following typed elements.
    pub fn complex_type(&self, name: &str) -> Option<(&'a str, &'a ComplexType)> {
        let local = strip_namespace(name);

        if builtins::lookup(local).is_some() {
            return None;
        }

        let symbol = self.table.lookup(local)?;
        match symbol.definition {
            Definition::Element(element) => match (&element.ty, &element.complex_type) {
                (Some(ty), _) => self.base_type(ty),
                (None, Some(inner)) => Some((symbol.name, &**inner)),
                (None, None) => None,
            },
            Definition::ComplexType(ty) => Some((symbol.name, ty)),
            _ => None,
        }
    }

    /// Looks up the complex type named by a `base=` or `type=` reference.
    pub fn base_type(&self, name: &str) -> Option<(&'a str, &'a ComplexType)> {
        let local = strip_namespace(name);

        if builtins::lookup(local).is_some() {
            return None;
        }

        let symbol = self.table.ty(local)?;
        match symbol.definition {
            Definition::ComplexType(ty) => Some((symbol.name, ty)),
            _ => None,
        }
    }

    pub fn attribute_group(&self, name: &str) -> Option<&'a AttributeGroup> {
        match self.table.attribute_group(strip_namespace(name))?.definition {
            Definition::AttributeGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn group(&self, name: &str) -> Option<&'a Group> {
        self.table
            .group(strip_namespace(name))
            .map(|(_, group)| group)
    }

    /// Target namespace of the schema declaring an element.
    pub fn element_namespace(&self, name: &str) -> Option<&'a str> {
        self.table
            .element(strip_namespace(name))
            .and_then(|symbol| symbol.namespace)
    }

    fn symbol(&self, ctx: &mut ResolutionContext, symbol: Symbol<'a>) -> TypeRef {
        match symbol.definition {
            // the element's type is the declared one, not a wrapper named after the element
            Definition::Element(element) => match &element.ty {
                Some(ty) => self.resolve_type(ctx, ty),
                None => self.reference(ctx, symbol),
            },

            _ => self.reference(ctx, symbol),
        }
    }

    fn reference(&self, ctx: &mut ResolutionContext, symbol: Symbol<'a>) -> TypeRef {
        let name = sanitize(symbol.name);
        let kind = Some(symbol.kind());

        if ctx.package() == Some(symbol.package) {
            TypeRef::Local { name, kind }
        } else {
            ctx.record_import(symbol.package);

            TypeRef::Foreign {
                package: symbol.package.to_owned(),
                name,
                kind,
            }
        }
    }

    fn fallback(&self, ctx: &mut ResolutionContext, local: &str) -> TypeRef {
        debug!(name = local, "Unresolved type, assuming a local definition");
        let name = sanitize(local);

        if ctx.package().is_some() {
            TypeRef::Local { name, kind: None }
        } else {
            ctx.record_import(self.root_package);

            TypeRef::Foreign {
                package: self.root_package.to_owned(),
                name,
                kind: None,
            }
        }
    }
}
