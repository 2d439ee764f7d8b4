use std::fs;

use wsdlgen_codegen::{from_location, DocumentKind, GenerateOptions, Generated, LoadOptions};

fn compact(tokens: impl ToString) -> String {
    tokens
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

const STRING: &str = "::std::string::String";

fn option(ty: &str) -> String {
    format!("::std::option::Option<{}>", ty)
}

fn boxed(ty: &str) -> String {
    option(&format!("::std::boxed::Box<{}>", ty))
}

fn vec(ty: &str) -> String {
    format!("::std::vec::Vec<{}>", ty)
}

fn fixture(name: &str, kind: DocumentKind) -> Generated {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    from_location(path, kind, LoadOptions::default(), &GenerateOptions::default()).unwrap()
}

fn orders() -> Generated {
    fixture("orders.wsdl", DocumentKind::Wsdl)
}

fn unit(generated: &Generated, module: &str) -> String {
    let unit = generated
        .units()
        .find(|unit| unit.module == module)
        .unwrap_or_else(|| panic!("missing module {}", module));

    compact(&unit.code)
}

/// The compacted body of one generated struct.
fn record<'c>(code: &'c str, name: &str) -> &'c str {
    let start = code
        .find(&format!("pubstruct{}{{", name))
        .unwrap_or_else(|| panic!("missing struct {}", name));
    let body = &code[start..];

    &body[..body.find('}').unwrap()]
}

#[test]
fn test_packages() {
    let generated = orders();

    let modules = generated
        .types
        .iter()
        .map(|unit| unit.module.as_str())
        .collect::<Vec<_>>();

    assert_eq!(modules, ["basetypes", "common"]);
    assert_eq!(
        generated.operations.as_ref().map(|unit| unit.module.as_str()),
        Some("operations")
    );
}

#[test]
fn test_imports() {
    let generated = orders();

    let basetypes = unit(&generated, "basetypes");
    assert_eq!(basetypes.matches("usesuper::").count(), 1);
    assert!(basetypes.contains("usesuper::common;"));

    let common = unit(&generated, "common");
    assert!(!common.contains("usesuper::"));

    let operations = unit(&generated, "operations");
    assert_eq!(operations.matches("usesuper::").count(), 1);
    assert!(operations.contains("usesuper::basetypes;"));
}

#[test]
fn test_imports_of_several_packages() {
    let generated = fixture("invoice.xsd", DocumentKind::Xsd);

    let modules = generated
        .types
        .iter()
        .map(|unit| unit.module.as_str())
        .collect::<Vec<_>>();
    assert_eq!(modules, ["invoice", "parties", "products", "units"]);

    // `units` is imported by the root schema but only used through `products`
    let invoice = unit(&generated, "invoice");
    assert_eq!(invoice.matches("usesuper::").count(), 2);
    assert!(invoice.contains("usesuper::parties;usesuper::products;"));
    assert!(invoice.contains(&format!("pubbuyer:{},", boxed("parties::Party"))));
    assert!(invoice.contains(&format!("pubitem:{},", vec("products::Product"))));

    let products = unit(&generated, "products");
    assert_eq!(products.matches("usesuper::").count(), 1);
    assert!(products.contains("usesuper::units;"));
    assert!(products.contains(&format!("pubweight:{},", boxed("units::Measure"))));

    assert!(!unit(&generated, "parties").contains("usesuper::"));
    assert!(!unit(&generated, "units").contains("usesuper::"));
}

#[test]
fn test_foreign_types() {
    let generated = orders();
    let code = unit(&generated, "basetypes");

    assert!(code.contains(&format!("pubtotal:{},", boxed("common::Money"))));
    assert!(code.contains(&format!("pubemail:{},", option(STRING))));
    assert!(code.contains(&format!("pubphone:{},", option(STRING))));
    assert!(code.contains(&format!("publines:{},", vec("OrderLine"))));
}

#[test]
fn test_attribute_groups_inline() {
    let generated = orders();
    let code = unit(&generated, "basetypes");
    let order = record(&code, "Order");

    assert!(order.contains(r#"rename="@createdBy""#));
    assert!(order.contains(&format!("pubcreated_by:{},", option(STRING))));
    assert!(order.contains(&format!("pubcreated_at:{},", option("::wsdlgen_util::Timestamp"))));
    assert!(!code.contains("flatten"));
    assert!(!code.contains("common::Audit"));

    // the group itself is still declared in its own package
    assert!(unit(&generated, "common").contains("pubstructAudit{"));
}

#[test]
fn test_recursive_group() {
    let generated = orders();
    let code = unit(&generated, "basetypes");

    assert_eq!(record(&code, "Order").matches("pubnote:").count(), 1);
    assert!(code.contains(&format!("pubnote:{},", option(STRING))));
}

#[test]
fn test_extension() {
    let generated = orders();
    let code = unit(&generated, "basetypes");

    let priority = record(&code, "PriorityOrder");

    assert!(priority.contains(&format!("pubid:{},", option(STRING))));
    assert!(priority.contains(&format!("pubtotal:{},", boxed("common::Money"))));
    assert!(priority.contains(&format!("publines:{},", vec("OrderLine"))));
    assert!(priority.contains(&format!("pubemail:{},", option(STRING))));
    assert!(priority.contains(r#"rename="@createdAt""#));
    assert!(priority.contains(&format!("pubpriority:{},", option("i32"))));
    assert!(priority.find("pubid:") < priority.find("pubpriority:"));
}

#[test]
fn test_element_wrapper() {
    let generated = orders();
    let code = unit(&generated, "basetypes");
    let response = record(&code, "PlaceOrderResponse");

    assert!(code.contains(r#"rename="PlaceOrderResponse")]pubstructPlaceOrderResponse{"#));
    assert!(response.contains(&format!("pubid:{},", option(STRING))));
    assert!(response.contains(r#"rename="@createdBy""#));
}

#[test]
fn test_anonymous_types() {
    let generated = orders();
    let code = unit(&generated, "basetypes");

    assert!(code.contains("pubstructPlaceOrderOptions{"));
    assert!(code.contains(&format!("puboptions:{},", boxed("PlaceOrderOptions"))));
    assert!(code.contains(&format!("pubexpress:{},", option("bool"))));
    assert_eq!(code.matches("pubstructPlaceOrder{").count(), 1);
}

#[test]
fn test_simple_type_documentation() {
    let generated = orders();
    let code = unit(&generated, "common");

    assert!(code.contains("pubtypeCurrencyCode=::std::string::String;"));
    assert!(code.contains(
        r#"#[doc="Valueof[`CurrencyCode`]."]pubconstCURRENCY_CODE_USD:&str="USD";"#
    ));
    assert!(code.contains(
        r#"#[doc="Valueof[`CurrencyCode`]."]pubconstCURRENCY_CODE_EUR:&str="EUR";"#
    ));
    assert!(code.contains(r#"#[doc="length:3"]"#));
    assert!(code.contains(&format!("pubcurrency:{},", option("CurrencyCode"))));
    assert!(code.contains(&format!("pubcreated_at:{},", option("::wsdlgen_util::Timestamp"))));
}

#[test]
fn test_client() {
    let generated = orders();
    let code = unit(&generated, "operations");

    assert!(code.contains(r#"#[doc="Placesorders"]pubstructOrderPort{"#));
    assert!(code.contains(r#"="https://orders.example.com/soap";"#));
    assert!(code.contains("pubfnplace_order(&self,request:&basetypes::PlaceOrder,"));
    assert!(code.contains(&format!(
        "::std::result::Result<{},::wsdlgen_util::soap::Error,>",
        option("basetypes::Order")
    )));
    assert!(code.contains(r#"#[doc="Faults:OrderFault"]"#));
    assert!(code.contains(r#""urn:orders/PlaceOrder""#));
}

#[test]
fn test_included_schemas() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(
        dir.path().join("shapes.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="points.xsd"/>
  <xs:complexType name="Polygon">
    <xs:sequence>
      <xs:element name="Vertex" type="Point" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("points.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="shapes.xsd"/>
  <xs:complexType name="Point">
    <xs:attribute name="x" type="xs:double"/>
    <xs:attribute name="y" type="xs:double"/>
  </xs:complexType>
</xs:schema>"#,
    )
    .unwrap();

    let location = dir.path().join("shapes.xsd");
    let generated = from_location(
        location.to_string_lossy(),
        DocumentKind::Xsd,
        LoadOptions::default(),
        &GenerateOptions::default(),
    )
    .unwrap();

    assert!(generated.operations.is_none());

    let shapes = unit(&generated, "shapes");
    assert!(shapes.contains("usesuper::points;"));
    assert!(shapes.contains(&format!("pubvertex:{},", vec("points::Point"))));

    let points = unit(&generated, "points");
    assert!(points.contains(&format!("pubx:{},", option("f64"))));
    assert!(!points.contains("pubstructPolygon"));
}
