use tracing::warn;
use wsdlgen_wsdl::types::{Definitions, Part};

use super::{sanitize::strip_namespace, types};

pub fn preprocess(definitions: &Definitions) -> Vec<types::ServiceClient<'_>> {
    let namespace = definitions.target_namespace.as_deref().unwrap_or_default();

    definitions
        .port_types
        .iter()
        .map(|port_type| types::ServiceClient {
            name: &port_type.name,
            documentation: port_type.documentation.as_deref(),
            namespace,
            address: address(definitions, &port_type.name),
            operations: port_type
                .operations
                .iter()
                .map(|operation| types::ClientOperation {
                    name: &operation.name,
                    documentation: operation.documentation.as_deref(),
                    action: action(definitions, &port_type.name, &operation.name),
                    input: operation
                        .input
                        .as_deref()
                        .and_then(|message| first_part(definitions, message)),
                    output: operation
                        .output
                        .as_deref()
                        .and_then(|message| first_part(definitions, message)),
                    faults: operation
                        .faults
                        .iter()
                        .map(|fault| strip_namespace(&fault.message))
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Location of the port named after the port type, if any.
fn address<'a>(definitions: &'a Definitions, port_type: &str) -> &'a str {
    definitions
        .services
        .iter()
        .flat_map(|service| &service.ports)
        .find(|port| port.name == port_type)
        .and_then(|port| port.location.as_deref())
        .unwrap_or_default()
}

fn action<'a>(definitions: &'a Definitions, port_type: &str, operation: &str) -> &'a str {
    definitions
        .bindings
        .iter()
        .filter(|binding| strip_namespace(&binding.ty) == port_type)
        .flat_map(|binding| &binding.operations)
        .find(|binding_operation| binding_operation.name == operation)
        .and_then(|binding_operation| binding_operation.action.as_deref())
        .unwrap_or_default()
}

fn first_part<'a>(definitions: &'a Definitions, message: &str) -> Option<&'a Part> {
    let name = strip_namespace(message);

    match definitions.message(name) {
        Some(message) => {
            let part = message.parts.first();
            if part.is_none() {
                warn!(message = name, "Message has no parts");
            }

            part
        }

        None => {
            warn!(message = name, "Unknown message");
            None
        }
    }
}
