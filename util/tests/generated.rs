use wsdlgen_util::soap;

wsdlgen_macro::wsdlgen!("../codegen/tests/fixtures/orders.wsdl");
wsdlgen_macro::wsdlgen!("tests/fixtures/catalog.xsd");

fn envelope(body: &str) -> String {
    format!(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>{}</soap:Body>
</soap:Envelope>"#,
        body
    )
}

#[test]
fn test_decode_extension() {
    let response = envelope(
        "<PriorityOrder>\
           <Id>o1</Id>\
           <Lines><Sku>a</Sku><Quantity>2</Quantity></Lines>\
           <Priority>1</Priority>\
         </PriorityOrder>",
    );

    let order = soap::parse_response::<basetypes::PriorityOrder>(&response)
        .unwrap()
        .unwrap();

    assert_eq!(order.id.as_deref(), Some("o1"));
    assert_eq!(
        order.lines,
        [basetypes::OrderLine {
            sku: Some("a".into()),
            quantity: Some(2),
        }]
    );
    assert_eq!(order.priority, Some(1));
    assert_eq!(order.total, None);
}

#[test]
fn test_decode_element_wrapper() {
    let response = envelope(
        r#"<PlaceOrderResponse createdBy="ada" createdAt="2024-03-01T10:00:00+01:00">
  <Id>o2</Id>
  <Total currency="EUR"><Amount>9.5</Amount></Total>
  <Email>ada@example.com</Email>
</PlaceOrderResponse>"#,
    );

    let order = soap::parse_response::<basetypes::PlaceOrderResponse>(&response)
        .unwrap()
        .unwrap();

    assert_eq!(order.id.as_deref(), Some("o2"));
    assert_eq!(order.email.as_deref(), Some("ada@example.com"));
    assert_eq!(order.created_by.as_deref(), Some("ada"));
    assert_eq!(
        order.created_at.map(|at| at.to_rfc3339()).as_deref(),
        Some("2024-03-01T10:00:00+01:00")
    );

    let total = order.total.unwrap();
    assert_eq!(total.amount, Some(9.5));
    assert_eq!(total.currency.as_deref(), Some(common::CURRENCY_CODE_EUR));
}

#[test]
fn test_request_carries_base_fields() {
    let order = basetypes::PriorityOrder {
        id: Some("o3".into()),
        priority: Some(5),
        ..Default::default()
    };

    let request = soap::Request::new("PriorityOrder", "urn:orders", &order).unwrap();
    let xml = soap::envelope(Some(&request), None).unwrap();

    assert!(xml.contains("<Id>o3</Id>"));
    assert!(xml.contains("<Priority>5</Priority>"));
}

#[test]
fn test_prelude_named_types() {
    let response = envelope(
        r#"<Item>
  <Name>lamp</Name>
  <Choice><Label>red</Label></Choice>
  <Choice><Label>blue</Label></Choice>
  <Default><Label>red</Label></Default>
  <Title lang="en"/>
  <Packaging><Width>3</Width></Packaging>
</Item>"#,
    );

    let item = soap::parse_response::<catalog::Item>(&response)
        .unwrap()
        .unwrap();

    assert_eq!(item.name.as_deref(), Some("lamp"));
    assert_eq!(
        item.choice
            .iter()
            .map(|choice| choice.label.as_deref())
            .collect::<Vec<_>>(),
        [Some("red"), Some("blue")]
    );
    assert_eq!(
        item.default.and_then(|default| default.label).as_deref(),
        Some("red")
    );
    assert_eq!(item.title.and_then(|title| title.lang).as_deref(), Some("en"));
    assert_eq!(item.packaging.and_then(|packaging| packaging.width), Some(3));
}
