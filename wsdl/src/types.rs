use super::schema::Schema;

#[derive(Default, Debug, Clone)]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: Option<String>,

    pub imports: Vec<Import>,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub namespace: Option<String>,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub element: Option<String>,
    pub ty: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: String,
    pub documentation: Option<String>,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub faults: Vec<Fault>,
}

#[derive(Debug, Clone)]
pub struct Fault {
    pub name: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub ty: String,
    pub style: Option<String>,
    pub transport: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub action: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub binding: String,
    pub location: Option<String>,
}

impl Definitions {
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.name == name)
    }

    /// Appends everything defined by an imported document.
    pub fn merge(&mut self, other: Definitions) {
        self.schemas.extend(other.schemas);
        self.messages.extend(other.messages);
        self.port_types.extend(other.port_types);
        self.bindings.extend(other.bindings);
        self.services.extend(other.services);
    }
}
