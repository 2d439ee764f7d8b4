use wsdlgen_wsdl::types::Part;

/// A port type, flattened together with its binding and endpoint.
#[derive(Debug, Clone)]
pub struct ServiceClient<'a> {
    pub name: &'a str,
    pub documentation: Option<&'a str>,
    pub namespace: &'a str,
    pub address: &'a str,
    pub operations: Vec<ClientOperation<'a>>,
}

#[derive(Debug, Clone)]
pub struct ClientOperation<'a> {
    pub name: &'a str,
    pub documentation: Option<&'a str>,
    pub action: &'a str,
    pub input: Option<&'a Part>,
    pub output: Option<&'a Part>,
    pub faults: Vec<&'a str>,
}
