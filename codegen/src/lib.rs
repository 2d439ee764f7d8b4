use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tracing::info;
use wsdlgen_wsdl::Document;

pub mod builtins;
pub mod codegen;
pub mod error;
mod header;
mod operations;
mod preprocessor;
pub mod resolver;
pub mod sanitize;
pub mod symbols;
mod types;

pub use error::Error;
pub use wsdlgen_wsdl::{DocumentKind, LoadOptions};

use codegen::{Codegen, Emitter};
use resolver::{ResolutionContext, Resolver};
use sanitize::module_name;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Module holding the generated clients.
    pub operations_module: String,

    /// Generate types and clients on separate threads.
    ///
    /// Must be off inside a procedural macro, where token streams cannot cross threads.
    pub parallel: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            operations_module: "operations".into(),
            parallel: true,
        }
    }
}

/// The generated code of one package, or of the clients.
#[derive(Debug, Clone)]
pub struct Unit {
    pub package: String,
    pub module: String,
    pub code: TokenStream,
}

#[derive(Debug, Clone)]
pub struct Generated {
    pub types: Vec<Unit>,
    pub operations: Option<Unit>,
}

impl Generated {
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.types.iter().chain(self.operations.as_ref())
    }

    /// Every unit wrapped in its own `pub mod`.
    pub fn into_tokens(self) -> TokenStream {
        let modules = self.units().map(|unit| {
            let module = format_ident!("{}", unit.module);
            let code = &unit.code;

            quote! {
                pub mod #module {
                    #code
                }
            }
        });

        quote! { #(#modules)* }
    }
}

struct Rendered {
    package: String,
    module: String,
    code: String,
}

impl Rendered {
    fn into_unit(self) -> Result<Unit, Error> {
        let code: TokenStream =
            self.code
                .parse()
                .map_err(|error: proc_macro2::LexError| Error::Tokens {
                    module: self.module.clone(),
                    message: error.to_string(),
                })?;

        Ok(Unit {
            package: self.package,
            module: self.module,
            code,
        })
    }
}

pub fn from_location<S: AsRef<str>>(
    location: S,
    kind: DocumentKind,
    load_options: LoadOptions,
    options: &GenerateOptions,
) -> Result<Generated, Error> {
    let document = wsdlgen_wsdl::load(location, kind, load_options)?;
    from_document(&document, options)
}

pub fn from_document(document: &Document, options: &GenerateOptions) -> Result<Generated, Error> {
    let resolver = Resolver::new(document);

    let (types, operations) = if options.parallel {
        let (types, operations) = std::thread::scope(|scope| {
            let types = scope.spawn(|| generate_types(document, &resolver));
            let operations = scope
                .spawn(|| generate_operations(document, &resolver, &options.operations_module));

            (types.join(), operations.join())
        });

        (
            types.map_err(|_| Error::Worker("types"))?,
            operations.map_err(|_| Error::Worker("operations"))?,
        )
    } else {
        (
            generate_types(document, &resolver),
            generate_operations(document, &resolver, &options.operations_module),
        )
    };

    info!(
        packages = types.len(),
        clients = operations.is_some(),
        "Generated code"
    );

    Ok(Generated {
        types: types
            .into_iter()
            .map(Rendered::into_unit)
            .collect::<Result<_, _>>()?,
        operations: operations.map(Rendered::into_unit).transpose()?,
    })
}

fn generate_types(document: &Document, resolver: &Resolver) -> Vec<Rendered> {
    document
        .packages()
        .into_iter()
        .map(|package| {
            let mut emitter = Emitter::new(resolver, ResolutionContext::new(package));
            let mut source = None;

            for schema in document.schemas_in(package) {
                source = source.or(schema.location.as_ref());
                emitter.emit_schema(schema);
            }

            let (ctx, items) = emitter.finish();
            let source = source.or(document.location.as_ref());
            let header = header::types(package, source, ctx.imports());

            Rendered {
                package: package.to_owned(),
                module: module_name(package),
                code: quote! { #header #(#items)* }.to_string(),
            }
        })
        .collect()
}

fn generate_operations(document: &Document, resolver: &Resolver, module: &str) -> Option<Rendered> {
    if document.kind == DocumentKind::Xsd || document.definitions.port_types.is_empty() {
        return None;
    }

    let clients = preprocessor::preprocess(&document.definitions);
    let mut emitter = Emitter::new(resolver, ResolutionContext::detached());

    let items = clients
        .iter()
        .map(|client| client.codegen(&mut emitter))
        .collect::<Vec<_>>();

    let (ctx, _) = emitter.finish();
    let header = header::operations(document.location.as_ref(), ctx.imports());

    Some(Rendered {
        package: module.to_owned(),
        module: module_name(module),
        code: quote! { #header #(#items)* }.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsdlgen_wsdl::Loader;

    fn compact(tokens: impl ToString) -> String {
        tokens
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    fn generate(source: &str, kind: DocumentKind) -> Generated {
        let loader = Loader::new(LoadOptions::default()).unwrap();
        let document = loader.load_bytes(source.as_bytes(), None, kind).unwrap();
        from_document(&document, &GenerateOptions::default()).unwrap()
    }

    const USERS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:users"
    targetNamespace="urn:users">
  <wsdl:types>
    <xs:schema targetNamespace="urn:users">
      <xs:simpleType name="Color">
        <xs:restriction base="xs:string">
          <xs:enumeration value="RED"/>
          <xs:enumeration value="dark-blue"/>
        </xs:restriction>
      </xs:simpleType>
      <xs:complexType name="User">
        <xs:sequence>
          <xs:element name="Name" type="xs:string"/>
          <xs:element name="Tags" type="xs:string" maxOccurs="unbounded"/>
          <xs:element name="Manager" type="tns:User" minOccurs="0"/>
          <xs:element name="Favourite" type="tns:Color"/>
        </xs:sequence>
        <xs:attribute name="id" type="xs:int" use="required"/>
      </xs:complexType>
      <xs:element name="GetUserRequest">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="Id" type="xs:int"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
      <xs:element name="GetUserResponse" type="tns:User"/>
      <xs:element name="User" type="tns:User"/>
    </xs:schema>
  </wsdl:types>
  <wsdl:message name="GetUserIn">
    <wsdl:part name="parameters" element="tns:GetUserRequest"/>
  </wsdl:message>
  <wsdl:message name="GetUserOut">
    <wsdl:part name="parameters" element="tns:GetUserResponse"/>
  </wsdl:message>
  <wsdl:portType name="UserPort">
    <wsdl:operation name="GetUser">
      <wsdl:input message="tns:GetUserIn"/>
      <wsdl:output message="tns:GetUserOut"/>
    </wsdl:operation>
    <wsdl:operation name="Ping">
      <wsdl:input message="tns:GetUserIn"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="UserBinding" type="tns:UserPort">
    <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="GetUser">
      <soap:operation soapAction="urn:users/GetUser"/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="UserService">
    <wsdl:port name="UserPort" binding="tns:UserBinding">
      <soap:address location="http://users.example.com/soap"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_enumeration_constants() {
        let generated = generate(USERS, DocumentKind::Wsdl);
        let code = compact(&generated.types[0].code);

        assert!(code.contains("pubtypeColor=::std::string::String;"));
        assert!(code.contains(r#"#[doc="Valueof[`Color`]."]pubconstCOLOR_RED:&str="RED";"#));
        assert!(code.contains(r#"pubconstCOLOR_DARKBLUE:&str="dark-blue";"#));
        assert_eq!(code.matches(r#"#[doc="Valueof[`Color`]."]"#).count(), 2);
    }

    #[test]
    fn test_record_fields() {
        let generated = generate(USERS, DocumentKind::Wsdl);
        let code = compact(&generated.types[0].code);

        assert!(code.contains("pubstructUser{"));
        assert!(code.contains("pubname:::std::option::Option<::std::string::String>,"));
        assert!(code.contains("pubtags:::std::vec::Vec<::std::string::String>,"));
        assert!(code.contains("pubmanager:::std::option::Option<::std::boxed::Box<User>>,"));
        assert!(code.contains("pubfavourite:::std::option::Option<Color>,"));
        assert!(code.contains(r#"rename="@id""#));
        assert!(code.contains("pubid:::std::option::Option<i32>,"));
        assert!(code.contains(r#"skip_serializing_if="::std::option::Option::is_none""#));
        assert!(code.contains(r#"skip_serializing_if="::std::vec::Vec::is_empty""#));
    }

    #[test]
    fn test_elements_emitted_once() {
        let generated = generate(USERS, DocumentKind::Wsdl);
        let code = compact(&generated.types[0].code);

        assert_eq!(code.matches("pubstructUser{").count(), 1);
        assert_eq!(code.matches("pubstructGetUserRequest{").count(), 1);
        assert!(!code.contains("flatten"));

        // the wrapper carries the fields of `User` itself
        let response = &code[code.find("pubstructGetUserResponse{").unwrap()..];
        let response = &response[..response.find('}').unwrap()];
        assert!(response.contains("pubname:::std::option::Option<::std::string::String>,"));
        assert!(response.contains("pubmanager:::std::option::Option<::std::boxed::Box<User>>,"));
        assert!(response.contains("pubid:::std::option::Option<i32>,"));
    }

    #[test]
    fn test_operations() {
        let generated = generate(USERS, DocumentKind::Wsdl);
        let operations = generated.operations.as_ref().unwrap();
        let code = compact(&operations.code);

        assert_eq!(operations.module, "operations");
        assert!(code.contains("usesuper::basetypes;"));
        assert!(code.contains("pubstructUserPort{"));
        assert!(code.contains(r#"pubconstADDRESS:&'staticstr="http://users.example.com/soap";"#));
        assert!(code.contains("pubfnget_user(&self,request:&basetypes::GetUserRequest,"));
        assert!(code.contains(
            "::std::result::Result<::std::option::Option<basetypes::User>,::wsdlgen_util::soap::Error,>"
        ));
        assert!(code.contains(r#"self.client.call("urn:users/GetUser","#));
        assert!(code.contains(r#"::wsdlgen_util::soap::Request::new("GetUserRequest","urn:users",request)?"#));
        assert!(code.contains("pubfnping(&self,request:&basetypes::GetUserRequest,"));
        assert!(code.contains("::std::result::Result<(),::wsdlgen_util::soap::Error>"));
    }

    #[test]
    fn test_xsd_has_no_operations() {
        let generated = generate(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="Point">
    <xs:attribute name="x" type="xs:double"/>
  </xs:complexType>
</xs:schema>"#,
            DocumentKind::Xsd,
        );

        assert!(generated.operations.is_none());
        assert_eq!(generated.types.len(), 1);
        assert_eq!(generated.types[0].module, "basetypes");
    }

    #[test]
    fn test_prelude_named_types() {
        let generated = generate(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="Option">
    <xs:sequence>
      <xs:element name="Label" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Vec"/>
  <xs:complexType name="Item">
    <xs:sequence>
      <xs:element name="Choice" type="Option"/>
      <xs:element name="Choices" type="Option" maxOccurs="unbounded"/>
      <xs:element name="Parts" type="Vec"/>
      <xs:element name="Name" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
            DocumentKind::Xsd,
        );
        let code = compact(&generated.types[0].code);

        assert!(code.contains("pubstructOption{"));
        assert!(code.contains("publabel:::std::option::Option<::std::string::String>,"));
        assert!(code.contains("pubchoice:::std::option::Option<::std::boxed::Box<Option>>,"));
        assert!(code.contains("pubchoices:::std::vec::Vec<Option>,"));
        assert!(code.contains("pubparts:::std::option::Option<::std::boxed::Box<Vec>>,"));
        assert!(!code.contains(r#""Option::is_none""#));
        assert!(!code.contains(r#""Vec::is_empty""#));
    }

    #[test]
    fn test_derived_records_are_expanded() {
        let generated = generate(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:attributeGroup name="Tracking">
    <xs:attribute name="revision" type="xs:int"/>
    <xs:attributeGroup ref="Tracking"/>
  </xs:attributeGroup>
  <xs:complexType name="Base">
    <xs:sequence>
      <xs:element name="Count" type="xs:int"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:int"/>
  </xs:complexType>
  <xs:complexType name="Middle">
    <xs:complexContent>
      <xs:extension base="Base">
        <xs:attributeGroup ref="Tracking"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Leaf">
    <xs:complexContent>
      <xs:extension base="Middle">
        <xs:sequence>
          <xs:element name="Weight" type="xs:double"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Loop">
    <xs:complexContent>
      <xs:extension base="Loop">
        <xs:attribute name="depth" type="xs:int"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Price">
    <xs:simpleContent>
      <xs:extension base="xs:decimal">
        <xs:attribute name="currency" type="xs:string"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="Discount">
    <xs:simpleContent>
      <xs:extension base="Price">
        <xs:attribute name="percent" type="xs:int"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
</xs:schema>"#,
            DocumentKind::Xsd,
        );
        let code = compact(&generated.types[0].code);
        let record = |name: &str| {
            let start = code.find(&format!("pubstruct{}{{", name)).unwrap();
            let body = &code[start..];
            body[..body.find('}').unwrap()].to_owned()
        };

        assert!(!code.contains("flatten"));

        let leaf = record("Leaf");
        assert!(leaf.contains("pubcount:::std::option::Option<i32>,"));
        assert!(leaf.contains("pubid:::std::option::Option<i32>,"));
        assert!(leaf.contains(r#"rename="@revision""#));
        assert!(leaf.contains("pubweight:::std::option::Option<f64>,"));
        assert_eq!(leaf.matches("pubrevision:").count(), 1);
        assert_eq!(record("Tracking").matches("pubrevision:").count(), 1);

        let looping = record("Loop");
        assert!(looping.contains("pubdepth:::std::option::Option<i32>,"));

        let discount = record("Discount");
        assert!(discount.contains(r#"#[serde(rename="$text",default)]pubvalue:f64,"#));
        assert!(discount.contains(r#"rename="@currency""#));
        assert!(discount.contains(r#"rename="@percent""#));
    }

    #[test]
    fn test_into_tokens() {
        let generated = generate(USERS, DocumentKind::Wsdl);
        let code = compact(generated.into_tokens());

        assert!(code.starts_with("pubmodbasetypes{"));
        assert!(code.contains("pubmodoperations{"));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let loader = Loader::new(LoadOptions::default()).unwrap();
        let document = loader
            .load_bytes(USERS.as_bytes(), None, DocumentKind::Wsdl)
            .unwrap();

        let parallel = from_document(&document, &GenerateOptions::default()).unwrap();
        let sequential = from_document(
            &document,
            &GenerateOptions {
                parallel: false,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            compact(parallel.into_tokens()),
            compact(sequential.into_tokens())
        );
    }
}
