use std::{
    collections::{HashMap, HashSet},
    path::Path,
    time::Duration,
};

use reqwest::blocking::Client;
use tracing::{debug, info};
use url::Url;

use super::{
    error,
    parser::{self, Parsed},
    schema::Schema,
    types::Definitions,
    BASE_PACKAGE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Wsdl,
    Xsd,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Accept invalid TLS certificates when downloading documents.
    pub ignore_tls: bool,
    pub timeout: Duration,
    /// Maximum import/include nesting followed from the root document.
    pub max_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            ignore_tls: false,
            timeout: Duration::from_secs(30),
            max_depth: 100,
        }
    }
}

/// Every external schema reached from the root document, in discovery order.
#[derive(Default, Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn get(&self, identifier: &str) -> Option<&Schema> {
        self.index.get(identifier).map(|index| &self.schemas[*index])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|schema| schema.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns `false` without replacing anything if the identifier is already known.
    pub fn insert(&mut self, schema: Schema) -> bool {
        if self.contains(&schema.identifier) {
            return false;
        }

        self.index
            .insert(schema.identifier.clone(), self.schemas.len());
        self.schemas.push(schema);
        true
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocumentKind,
    pub location: Option<Url>,
    /// Package of the root document's own schemas.
    pub root_package: String,
    pub definitions: Definitions,
    pub registry: SchemaRegistry,
}

impl Document {
    pub fn root_schemas(&self) -> &[Schema] {
        &self.definitions.schemas
    }

    /// Package names in emission order: the root package, then the registry.
    pub fn packages(&self) -> Vec<&str> {
        std::iter::once(self.root_package.as_str())
            .chain(
                self.registry
                    .identifiers()
                    .filter(|identifier| *identifier != self.root_package),
            )
            .collect()
    }

    pub fn schemas_in<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a Schema> + 'a {
        self.root_schemas()
            .iter()
            .chain(self.registry.iter())
            .filter(move |schema| schema.identifier == package)
    }
}

/// Converts a user supplied location into a URL. Anything without a scheme is a local path.
pub fn location_url(location: &str) -> Result<Url, error::Error> {
    match Url::parse(location) {
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => file_url(Path::new(location)),
        Err(err) => Err(err.into()),
    }
}

fn file_url(path: &Path) -> Result<Url, error::Error> {
    let path = path
        .canonicalize()
        .map_err(|err| error::Error::PathConversionError(Some(err)))?;

    Url::from_file_path(&path).map_err(|()| error::Error::PathConversionError(None))
}

/// Resolves a `schemaLocation` against the document that referenced it.
pub fn resolve_location(
    location: &str,
    base: Option<&Url>,
    referrer: &str,
) -> Result<Url, error::Error> {
    let unresolved = || error::Error::UnresolvedReference {
        location: location.to_owned(),
        referrer: referrer.to_owned(),
    };

    match Url::parse(location) {
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(location).map_err(|_| unresolved()),
            None if Path::new(location).is_absolute() => {
                Url::from_file_path(location).map_err(|()| unresolved())
            }
            None => Err(unresolved()),
        },
        Err(err) => Err(err.into()),
    }
}

/// Package identifier derived from the last path segment of a schema location.
pub fn schema_identifier(location: &str) -> String {
    let location = location
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    let segment = location
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    segment.replace('.', "").replace("xsd", "")
}

pub struct Loader {
    options: LoadOptions,
    client: Client,
}

struct Run<'l> {
    loader: &'l Loader,
    registry: SchemaRegistry,
    seen: HashSet<String>,
    seen_definitions: HashSet<Url>,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Result<Self, error::Error> {
        let client = Client::builder()
            .connect_timeout(options.timeout)
            .danger_accept_invalid_certs(options.ignore_tls)
            .build()?;

        Ok(Self { options, client })
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn fetch(&self, url: &Url) -> Result<Vec<u8>, error::Error> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| error::Error::PathConversionError(None))?;

                info!(path = %path.display(), "Reading document");
                std::fs::read(&path).map_err(|source| error::Error::FileReadError { path, source })
            }

            "http" | "https" => {
                info!(%url, "Downloading document");

                let response = self.client.get(url.clone()).send()?.error_for_status()?;
                Ok(response.bytes()?.to_vec())
            }

            other => Err(error::Error::UnsupportedScheme(other.into())),
        }
    }

    pub fn load(&self, location: &str, kind: DocumentKind) -> Result<Document, error::Error> {
        let url = location_url(location)?;
        let bytes = self.fetch(&url)?;
        self.load_bytes(&bytes, Some(url), kind)
    }

    /// Loads a document whose bytes are already available. Without a `base`, any relative
    /// import in the document fails to resolve.
    pub fn load_bytes(
        &self,
        bytes: &[u8],
        base: Option<Url>,
        kind: DocumentKind,
    ) -> Result<Document, error::Error> {
        let mut run = Run {
            loader: self,
            registry: SchemaRegistry::default(),
            seen: HashSet::new(),
            seen_definitions: HashSet::new(),
        };

        let (root_package, mut definitions) = match (kind, parser::parse(bytes)?) {
            (DocumentKind::Wsdl, Parsed::Definitions(definitions)) => {
                (BASE_PACKAGE.to_owned(), definitions)
            }

            (DocumentKind::Xsd, Parsed::Schema(schema)) => {
                let identifier = base
                    .as_ref()
                    .map(|url| schema_identifier(url.path()))
                    .unwrap_or_else(|| BASE_PACKAGE.to_owned());

                let definitions = Definitions {
                    target_namespace: schema.target_namespace.clone(),
                    schemas: vec![schema],
                    ..Default::default()
                };

                (identifier, definitions)
            }

            (DocumentKind::Wsdl, Parsed::Schema(_)) => {
                return Err(error::Error::InvalidDocument(
                    "expected a WSDL document but found an XSD schema".into(),
                ))
            }

            (DocumentKind::Xsd, Parsed::Definitions(_)) => {
                return Err(error::Error::InvalidDocument(
                    "expected an XSD schema but found a WSDL document".into(),
                ))
            }
        };

        if let Some(base) = &base {
            run.seen_definitions.insert(base.clone());
        }

        for schema in &mut definitions.schemas {
            schema.identifier = root_package.clone();
            schema.location = base.clone();
        }

        if kind == DocumentKind::Xsd {
            run.seen.insert(root_package.clone());
        }

        run.resolve_definition_imports(&mut definitions, base.as_ref(), 1)?;

        for schema in &definitions.schemas {
            let referrer = schema
                .location
                .as_ref()
                .map(Url::to_string)
                .unwrap_or_else(|| root_package.clone());

            run.resolve_externals(
                externals(schema),
                schema.location.as_ref(),
                &referrer,
                1,
            )?;
        }

        Ok(Document {
            kind,
            location: base,
            root_package,
            definitions,
            registry: run.registry,
        })
    }
}

/// Locations followed from `schema`; imports naming only a namespace are logged and skipped.
fn externals(schema: &Schema) -> Vec<String> {
    for import in &schema.imports {
        if import.schema_location.is_none() {
            debug!(
                namespace = ?import.namespace,
                schema = %schema.identifier,
                "Skipping import without schemaLocation"
            );
        }
    }

    schema.external_locations()
}

impl<'l> Run<'l> {
    fn check_depth(&self, location: &str, depth: usize) -> Result<(), error::Error> {
        if depth > self.loader.options.max_depth {
            return Err(error::Error::RecursionLimit {
                location: location.to_owned(),
                depth: self.loader.options.max_depth,
            });
        }

        Ok(())
    }

    fn resolve_definition_imports(
        &mut self,
        definitions: &mut Definitions,
        base: Option<&Url>,
        depth: usize,
    ) -> Result<(), error::Error> {
        let referrer = base.map(Url::to_string).unwrap_or_default();

        for import in std::mem::take(&mut definitions.imports) {
            let url = resolve_location(&import.location, base, &referrer)?;

            if !self.seen_definitions.insert(url.clone()) {
                debug!(%url, "Skipping already imported definitions");
                continue;
            }

            self.check_depth(&import.location, depth)?;

            let mut imported = match parser::parse(&self.loader.fetch(&url)?)? {
                Parsed::Definitions(imported) => imported,
                Parsed::Schema(_) => {
                    return Err(error::Error::InvalidDocument(format!(
                        "{} is imported as WSDL but is an XSD schema",
                        url
                    )))
                }
            };

            for schema in &mut imported.schemas {
                schema.identifier = BASE_PACKAGE.to_owned();
                schema.location = Some(url.clone());
            }

            self.resolve_definition_imports(&mut imported, Some(&url), depth + 1)?;
            definitions.merge(imported);
        }

        Ok(())
    }

    fn resolve_externals(
        &mut self,
        locations: Vec<String>,
        base: Option<&Url>,
        referrer: &str,
        depth: usize,
    ) -> Result<(), error::Error> {
        for location in locations {
            let identifier = schema_identifier(&location);

            if self.seen.contains(&identifier) {
                debug!(%location, %identifier, "Skipping known schema");
                continue;
            }

            self.check_depth(&location, depth)?;

            let url = resolve_location(&location, base, referrer)?;
            self.seen.insert(identifier.clone());

            let mut schema = match parser::parse(&self.loader.fetch(&url)?)? {
                Parsed::Schema(schema) => schema,
                Parsed::Definitions(_) => {
                    return Err(error::Error::InvalidDocument(format!(
                        "{} is referenced as a schema but is a WSDL document",
                        url
                    )))
                }
            };

            schema.identifier = identifier;
            schema.location = Some(url.clone());

            let nested = externals(&schema);
            self.registry.insert(schema);

            self.resolve_externals(nested, Some(&url), url.as_str(), depth + 1)?;
        }

        Ok(())
    }
}
