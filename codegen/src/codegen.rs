use std::collections::HashSet;

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::{debug, warn};
use wsdlgen_wsdl::{
    schema::{
        Any, Attribute, AttributeGroup, ComplexType, Derivation, DerivationKind, Element, Schema,
        SimpleType,
    },
    types::Part,
};

use super::{
    builtins::{self, Scalar},
    resolver::{ResolutionContext, Resolver, TypeRef},
    sanitize::{constant_name, field_name, is_array, sanitize, strip_namespace, type_ident},
    symbols::SymbolKind,
};

pub trait Codegen {
    fn codegen(&self, emitter: &mut Emitter<'_, '_>) -> TokenStream;
}

pub(crate) fn doc_attributes<S: AsRef<str>>(lines: &[S]) -> TokenStream {
    let lines = lines
        .iter()
        .flat_map(|text| text.as_ref().lines())
        .map(|line| format!(" {}", line.trim()));

    quote! { #(#[doc = #lines])* }
}

fn documentation(text: Option<&str>) -> TokenStream {
    doc_attributes(&text.into_iter().collect::<Vec<_>>())
}

fn derives(xml_name: &str) -> TokenStream {
    quote! {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            ::wsdlgen_util::serde::Serialize,
            ::wsdlgen_util::serde::Deserialize,
        )]
        #[serde(crate = "::wsdlgen_util::serde", rename = #xml_name)]
    }
}

/// Hands out identifiers that are unique within one scope.
#[derive(Default)]
pub(crate) struct UniqueNames(HashSet<String>);

impl UniqueNames {
    pub(crate) fn reserve(&mut self, name: &str) {
        self.0.insert(name.to_owned());
    }

    pub(crate) fn unique(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut counter = 2;

        while !self.0.insert(candidate.clone()) {
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }

        candidate
    }
}

#[derive(Default)]
struct Fields {
    names: UniqueNames,
    tokens: Vec<TokenStream>,
    has_text: bool,
}

impl Fields {
    fn ident(&mut self, xml_name: &str) -> Ident {
        format_ident!("{}", self.names.unique(field_name(xml_name)))
    }

    fn text(&mut self, ty: TokenStream) {
        if self.has_text {
            return;
        }

        self.has_text = true;
        let ident = self.ident("value");

        self.tokens.push(quote! {
            #[serde(rename = "$text", default)]
            pub #ident: #ty,
        });
    }
}

/// Field type for a singular value: records are boxed so recursive types stay finite.
fn optional(ty: &TypeRef) -> TokenStream {
    let tokens = ty.tokens();

    if ty.is_record() {
        quote! { ::std::option::Option<::std::boxed::Box<#tokens>> }
    } else {
        quote! { ::std::option::Option<#tokens> }
    }
}

fn string() -> TokenStream {
    Scalar::String.tokens()
}

/// Emits the declarations of one package.
pub struct Emitter<'r, 'a> {
    resolver: &'r Resolver<'a>,
    ctx: ResolutionContext,
    items: Vec<TokenStream>,
    groups: Vec<String>,
    attribute_groups: Vec<String>,
    /// Records whose content is currently being expanded.
    expanding: Vec<String>,
}

impl<'r, 'a> Emitter<'r, 'a> {
    pub fn new(resolver: &'r Resolver<'a>, ctx: ResolutionContext) -> Self {
        Self {
            resolver,
            ctx,
            items: Vec::new(),
            groups: Vec::new(),
            attribute_groups: Vec::new(),
            expanding: Vec::new(),
        }
    }

    pub fn finish(self) -> (ResolutionContext, Vec<TokenStream>) {
        (self.ctx, self.items)
    }

    fn emit_all(&mut self, all: &[impl Codegen]) {
        for item in all {
            let tokens = item.codegen(self);
            self.items.push(tokens);
        }
    }

    pub fn emit_schema(&mut self, schema: &Schema) {
        debug!(package = ?self.ctx.package(), schema = %schema.identifier, "Emitting schema");

        self.emit_all(&schema.simple_types);
        self.emit_all(&schema.complex_types);
        self.emit_all(&schema.elements);
        self.emit_all(&schema.attribute_groups);
    }

    /// Type, XML root name and namespace of a message part.
    pub fn message_part(&mut self, part: &Part, namespace: &str) -> (TypeRef, String, String) {
        match (&part.element, &part.ty) {
            (Some(element), _) => (
                self.resolver.resolve_element(&mut self.ctx, element),
                strip_namespace(element).to_owned(),
                self.resolver
                    .element_namespace(element)
                    .unwrap_or(namespace)
                    .to_owned(),
            ),

            (None, Some(ty)) => (
                self.resolver.resolve_type(&mut self.ctx, ty),
                part.name.clone(),
                namespace.to_owned(),
            ),

            (None, None) => (
                TypeRef::Builtin(Scalar::String),
                part.name.clone(),
                namespace.to_owned(),
            ),
        }
    }

    fn record(
        &self,
        name: &str,
        xml_name: &str,
        documentation: Option<&str>,
        fields: Fields,
    ) -> TokenStream {
        let ident = type_ident(name);
        let documentation = self::documentation(documentation);
        let derives = derives(xml_name);
        let fields = fields.tokens;

        quote! {
            #documentation
            #derives
            pub struct #ident {
                #(#fields)*
            }
        }
    }

    fn simple_type(
        &mut self,
        name: &str,
        ty: &SimpleType,
        documentation: Option<&str>,
    ) -> TokenStream {
        if !self.ctx.mark_emitted(name) {
            debug!(name, "Simple type already emitted");
            return TokenStream::new();
        }

        let mut docs: Vec<String> = documentation.into_iter().map(ToOwned::to_owned).collect();
        let mut enumerations = Vec::new();

        let base = if let Some(restriction) = &ty.restriction {
            for facet in &restriction.facets {
                docs.push(format!("{}: {}", facet.kind, facet.value));
            }

            enumerations.extend(&restriction.enumerations);

            restriction
                .base
                .as_deref()
                .map(|base| self.resolver.resolve_type(&mut self.ctx, base))
                .unwrap_or(TypeRef::Builtin(Scalar::String))
        } else if let Some(union) = &ty.union {
            if !union.member_types.is_empty() {
                docs.push(format!("Union of {}", union.member_types.join(", ")));
            }

            for member in &union.simple_types {
                if let Some(restriction) = &member.restriction {
                    enumerations.extend(&restriction.enumerations);
                }
            }

            TypeRef::Builtin(Scalar::String)
        } else if let Some(item) = &ty.list {
            docs.push(format!("Whitespace separated list of {}", item));
            TypeRef::Builtin(Scalar::String)
        } else {
            TypeRef::Builtin(Scalar::String)
        };

        // a restriction of a same-named type from another namespace
        let base = match base {
            TypeRef::Local { name: base, .. } if base == name => TypeRef::Builtin(Scalar::String),
            base => base,
        };

        let ident = type_ident(name);
        let base_tokens = base.tokens();
        let documentation = doc_attributes(&docs);

        let scalar = match base {
            TypeRef::Builtin(scalar) => Some(scalar),
            _ => None,
        };

        let prefix = constant_name(name);
        let mut names = UniqueNames::default();

        let constants = enumerations.iter().enumerate().map(|(index, enumeration)| {
            let suffix = constant_name(&sanitize(&enumeration.value));
            let constant = if suffix.is_empty() {
                format!("{}_{}", prefix, index)
            } else {
                format!("{}_{}", prefix, suffix)
            };

            let constant = format_ident!("{}", names.unique(constant));
            let value = &enumeration.value;

            let mut docs: Vec<String> = enumeration.documentation.iter().cloned().collect();
            docs.push(format!("Value of [`{}`].", ident));
            let documentation = doc_attributes(&docs);

            match scalar.and_then(|scalar| scalar.literal(value)) {
                Some(literal) => quote! {
                    #documentation
                    pub const #constant: #ident = #literal;
                },
                None => quote! {
                    #documentation
                    pub const #constant: &str = #value;
                },
            }
        });

        quote! {
            #documentation
            pub type #ident = #base_tokens;

            #(#constants)*
        }
    }

    fn complex_type(
        &mut self,
        name: &str,
        xml_name: &str,
        ty: &ComplexType,
        documentation: Option<&str>,
    ) -> TokenStream {
        if !self.ctx.mark_emitted(name) {
            debug!(name, "Complex type already emitted");
            return TokenStream::new();
        }

        // a nested anonymous type may extend a record that is being expanded
        let expanding = std::mem::replace(&mut self.expanding, vec![name.to_owned()]);
        let mut fields = Fields::default();
        self.content_fields(name, ty, &mut fields);
        self.expanding = expanding;

        self.record(name, xml_name, documentation, fields)
    }

    /// Fields for the content of `ty`; `parent` names its anonymous children.
    fn content_fields(&mut self, parent: &str, ty: &ComplexType, fields: &mut Fields) {
        if let Some(content) = &ty.complex_content {
            self.complex_content(parent, content, fields);
        }

        if let Some(content) = &ty.simple_content {
            self.simple_content(parent, content, fields);
        }

        for element in ty.sequence.iter().chain(&ty.choice).chain(&ty.all) {
            self.element_field(parent, element, fields);
        }

        for group in &ty.groups {
            self.group_fields(parent, group, fields);
        }

        self.any_field(&ty.any, fields);
        self.attribute_fields(parent, &ty.attributes, &ty.attribute_groups, fields);

        if ty.mixed {
            fields.text(string());
        }
    }

    /// Expands the content of another record in place.
    ///
    /// Returns `false` without touching `fields` if that record is already being expanded.
    fn inline(&mut self, name: &str, ty: &ComplexType, fields: &mut Fields) -> bool {
        let name = sanitize(name);

        if self.expanding.contains(&name) {
            warn!(name = %name, "Skipping cyclic derivation");
            return false;
        }

        self.expanding.push(name.clone());
        self.content_fields(&name, ty, fields);
        self.expanding.pop();

        true
    }

    fn complex_content(&mut self, parent: &str, content: &Derivation, fields: &mut Fields) {
        if let (DerivationKind::Extension, Some(base)) = (content.kind, &content.base) {
            match self.resolver.base_type(base) {
                Some((base, ty)) => {
                    self.inline(base, ty, fields);
                }
                None if builtins::lookup(strip_namespace(base)).is_some() => (),
                None => warn!(base = %base, "Unknown base type"),
            }
        }

        self.derivation_fields(parent, content, fields);
    }

    fn simple_content(&mut self, parent: &str, content: &Derivation, fields: &mut Fields) {
        let base = content.base.as_deref();

        match base.and_then(|base| self.resolver.base_type(base)) {
            // the base brings its own text and attributes
            Some((base, ty)) if content.kind == DerivationKind::Extension => {
                if !self.inline(base, ty, fields) {
                    fields.text(string());
                }
            }

            Some(_) => fields.text(string()),

            None => {
                let ty = base
                    .map(|base| self.resolver.resolve_type(&mut self.ctx, base))
                    .unwrap_or(TypeRef::Builtin(Scalar::String));

                match ty {
                    TypeRef::Local { name, .. } if name == parent => fields.text(string()),
                    ty if ty.is_record() => fields.text(string()),
                    ty => fields.text(ty.tokens()),
                }
            }
        }

        self.derivation_fields(parent, content, fields);
    }

    fn derivation_fields(&mut self, name: &str, content: &Derivation, fields: &mut Fields) {
        for element in &content.elements {
            self.element_field(name, element, fields);
        }

        for group in &content.groups {
            self.group_fields(name, group, fields);
        }

        self.any_field(&content.any, fields);
        self.attribute_fields(name, &content.attributes, &content.attribute_groups, fields);
    }

    fn element_field(&mut self, parent: &str, element: &Element, fields: &mut Fields) {
        let (xml_name, ty) = match (&element.reference, &element.name) {
            (Some(reference), _) => (
                strip_namespace(reference).to_owned(),
                self.resolver.resolve_element(&mut self.ctx, reference),
            ),

            (None, Some(name)) => {
                let ty = if let Some(ty) = &element.ty {
                    self.resolver.resolve(&mut self.ctx, ty)
                } else if let Some(inner) = &element.complex_type {
                    let synthetic = format!("{}{}", parent, sanitize(name));
                    let tokens =
                        self.complex_type(&synthetic, name, inner, inner.documentation.as_deref());
                    self.items.push(tokens);

                    TypeRef::Local {
                        name: synthetic,
                        kind: Some(SymbolKind::ComplexType),
                    }
                } else if let Some(inner) = &element.simple_type {
                    let synthetic = format!("{}{}", parent, sanitize(name));
                    let tokens =
                        self.simple_type(&synthetic, inner, inner.documentation.as_deref());
                    self.items.push(tokens);

                    TypeRef::Local {
                        name: synthetic,
                        kind: Some(SymbolKind::SimpleType),
                    }
                } else {
                    TypeRef::Builtin(Scalar::String)
                };

                (name.clone(), ty)
            }

            (None, None) => return,
        };

        let ident = fields.ident(&xml_name);
        let documentation = documentation(element.documentation.as_deref());

        let field = if is_array(element.max_occurs.as_deref()) {
            let ty = ty.tokens();

            quote! {
                #documentation
                #[serde(
                    rename = #xml_name,
                    default,
                    skip_serializing_if = "::std::vec::Vec::is_empty"
                )]
                pub #ident: ::std::vec::Vec<#ty>,
            }
        } else {
            let ty = optional(&ty);

            quote! {
                #documentation
                #[serde(
                    rename = #xml_name,
                    default,
                    skip_serializing_if = "::std::option::Option::is_none"
                )]
                pub #ident: #ty,
            }
        };

        fields.tokens.push(field);
    }

    /// Expands a named model group in place.
    fn group_fields(&mut self, parent: &str, reference: &str, fields: &mut Fields) {
        let local = strip_namespace(reference).to_owned();

        if self.groups.contains(&local) {
            debug!(group = %local, "Skipping cyclic group reference");
            return;
        }

        match self.resolver.group(reference) {
            Some(group) => {
                self.groups.push(local);

                for element in &group.elements {
                    self.element_field(parent, element, fields);
                }

                for nested in &group.groups {
                    self.group_fields(parent, nested, fields);
                }

                self.groups.pop();
            }

            None => warn!(group = %local, "Unknown model group"),
        }
    }

    fn any_field(&mut self, any: &[Any], fields: &mut Fields) {
        if any.is_empty() {
            return;
        }

        let ident = fields.ident("any");

        fields.tokens.push(quote! {
            #[serde(skip)]
            pub #ident: ::std::option::Option<::std::string::String>,
        });
    }

    fn attribute_fields(
        &mut self,
        parent: &str,
        attributes: &[Attribute],
        attribute_groups: &[String],
        fields: &mut Fields,
    ) {
        for attribute in attributes {
            let (xml_name, ty) = match (&attribute.name, &attribute.reference) {
                (Some(name), _) => {
                    let ty = if let Some(ty) = &attribute.ty {
                        self.resolver.resolve_type(&mut self.ctx, ty)
                    } else if let Some(inner) = &attribute.simple_type {
                        let synthetic = format!("{}{}", parent, sanitize(name));
                        let tokens =
                            self.simple_type(&synthetic, inner, inner.documentation.as_deref());
                        self.items.push(tokens);

                        TypeRef::Local {
                            name: synthetic,
                            kind: Some(SymbolKind::SimpleType),
                        }
                    } else {
                        TypeRef::Builtin(Scalar::String)
                    };

                    (name.as_str(), ty)
                }

                (None, Some(reference)) => {
                    (strip_namespace(reference), TypeRef::Builtin(Scalar::String))
                }

                (None, None) => continue,
            };

            let ident = fields.ident(xml_name);
            let rename = format!("@{}", xml_name);
            let documentation = documentation(attribute.documentation.as_deref());
            let ty = optional(&ty);

            fields.tokens.push(quote! {
                #documentation
                #[serde(
                    rename = #rename,
                    default,
                    skip_serializing_if = "::std::option::Option::is_none"
                )]
                pub #ident: #ty,
            });
        }

        for reference in attribute_groups {
            let local = strip_namespace(reference).to_lowercase();

            if self.attribute_groups.contains(&local) {
                debug!(group = %local, "Skipping cyclic attribute group reference");
                continue;
            }

            match self.resolver.attribute_group(reference) {
                Some(group) => {
                    self.attribute_groups.push(local);
                    self.attribute_fields(parent, &group.attributes, &group.attribute_groups, fields);
                    self.attribute_groups.pop();
                }

                None => warn!(group = %local, "Unknown attribute group"),
            }
        }
    }
}

impl Codegen for SimpleType {
    fn codegen(&self, emitter: &mut Emitter<'_, '_>) -> TokenStream {
        match &self.name {
            Some(name) => emitter.simple_type(&sanitize(name), self, self.documentation.as_deref()),
            None => TokenStream::new(),
        }
    }
}

impl Codegen for ComplexType {
    fn codegen(&self, emitter: &mut Emitter<'_, '_>) -> TokenStream {
        match &self.name {
            Some(name) => {
                emitter.complex_type(&sanitize(name), name, self, self.documentation.as_deref())
            }
            None => TokenStream::new(),
        }
    }
}

impl Codegen for Element {
    fn codegen(&self, emitter: &mut Emitter<'_, '_>) -> TokenStream {
        let xml_name = match &self.name {
            Some(name) => name,
            None => return TokenStream::new(),
        };

        let name = sanitize(xml_name);
        let element_docs = self.documentation.as_deref();

        match (&self.ty, &self.complex_type, &self.simple_type) {
            (Some(ty), _, _) => {
                if emitter.ctx.is_emitted(&name) {
                    return TokenStream::new();
                }

                // an inlined target is not referenced, so its package is not imported
                let target = emitter.resolver.resolve(&mut emitter.ctx.sibling(), ty);

                // `<element name="Foo" type="Foo"/>` is already covered by the type itself
                if matches!(&target, TypeRef::Local { name: target, .. } if *target == name) {
                    return TokenStream::new();
                }

                emitter.ctx.mark_emitted(&name);

                let mut fields = Fields::default();

                if !target.is_record() {
                    let target = emitter.resolver.resolve(&mut emitter.ctx, ty);
                    fields.text(target.tokens());
                } else if let Some((target_name, inner)) = emitter.resolver.complex_type(ty) {
                    emitter.inline(target_name, inner, &mut fields);
                } else {
                    let ident = type_ident(&name);
                    let documentation = documentation(element_docs);
                    let target = emitter.resolver.resolve(&mut emitter.ctx, ty).tokens();

                    return quote! {
                        #documentation
                        pub type #ident = #target;
                    };
                }

                emitter.record(&name, xml_name, element_docs, fields)
            }

            (None, Some(inner), _) => emitter.complex_type(
                &name,
                xml_name,
                inner,
                inner.documentation.as_deref().or(element_docs),
            ),

            (None, None, Some(inner)) => {
                emitter.simple_type(&name, inner, inner.documentation.as_deref().or(element_docs))
            }

            (None, None, None) => {
                if !emitter.ctx.mark_emitted(&name) {
                    return TokenStream::new();
                }

                emitter.record(&name, xml_name, element_docs, Fields::default())
            }
        }
    }
}

impl Codegen for AttributeGroup {
    fn codegen(&self, emitter: &mut Emitter<'_, '_>) -> TokenStream {
        let xml_name = match &self.name {
            Some(name) => name,
            None => return TokenStream::new(),
        };

        let name = sanitize(xml_name);
        if !emitter.ctx.mark_emitted(&name) {
            return TokenStream::new();
        }

        let mut fields = Fields::default();
        emitter.attribute_groups.push(xml_name.to_lowercase());
        emitter.attribute_fields(&name, &self.attributes, &self.attribute_groups, &mut fields);
        emitter.attribute_groups.pop();

        emitter.record(&name, xml_name, self.documentation.as_deref(), fields)
    }
}
