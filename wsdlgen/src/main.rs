use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use structopt::StructOpt;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wsdlgen_codegen::{self as codegen, DocumentKind, GenerateOptions, Generated, LoadOptions, Unit};

#[derive(Debug, Error)]
enum Error {
    #[error("{0}")]
    Codegen(#[from] codegen::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Generated code could not be formatted: {0}")]
    SynError(#[from] syn::Error),

    #[error("The output file `{0}` would overwrite the input")]
    OutputIsInput(String),

    #[error("Invalid output file name `{0}`")]
    InvalidOutput(String),
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Generates Rust types and SOAP clients from WSDL and XSD documents")]
struct Args {
    /// Directory and module name for the generated package
    #[structopt(short, long, default_value = "myservice")]
    package: String,

    /// File name for the generated clients
    #[structopt(short, long, default_value = "myservice.rs")]
    output: String,

    /// Accept invalid TLS certificates when downloading documents
    #[structopt(short, long)]
    ignore_tls: bool,

    /// Treat the input as XSD and generate types only
    #[structopt(short = "x", long)]
    process_xsd: bool,

    /// Process every `.xsd` file below the input directory
    #[structopt(short = "f", long)]
    is_folder: bool,

    /// Path or URL of the input document
    input: String,
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if is_same_file(&args.input, &args.output) {
        return Err(Error::OutputIsInput(args.output));
    }

    let load_options = LoadOptions {
        ignore_tls: args.ignore_tls,
        ..Default::default()
    };

    let directory = PathBuf::from(&args.package);
    fs::create_dir_all(&directory)?;

    if args.process_xsd {
        let inputs = if args.is_folder {
            xsd_files(Path::new(&args.input))?
        } else {
            vec![PathBuf::from(&args.input)]
        };

        for input in inputs {
            let generated = codegen::from_location(
                input.to_string_lossy(),
                DocumentKind::Xsd,
                load_options.clone(),
                &GenerateOptions::default(),
            )?;

            write_units(&directory, &generated, false)?;
        }
    } else {
        let module = operations_module(&args.output)?;
        let options = GenerateOptions {
            operations_module: module,
            ..Default::default()
        };

        let generated =
            codegen::from_location(&args.input, DocumentKind::Wsdl, load_options, &options)?;
        write_units(&directory, &generated, true)?;
    }

    write_mod_file(&directory)?;
    info!(directory = %directory.display(), "Done");

    Ok(())
}

fn is_same_file(input: &str, output: &str) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => input == output,
    }
}

/// Module name of the clients file, taken from its stem.
fn operations_module(output: &str) -> Result<String, Error> {
    Path::new(output)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::InvalidOutput(output.to_owned()))
}

fn xsd_files(root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(directory) = pending.pop() {
        for entry in fs::read_dir(&directory)? {
            let path = entry?.path();

            if path.is_dir() {
                pending.push(path);
            } else if path.extension().map_or(false, |extension| extension == "xsd") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn format(unit: &Unit) -> Result<String, Error> {
    let file = syn::parse2::<syn::File>(unit.code.clone())?;
    Ok(prettyplease::unparse(&file))
}

fn write_units(directory: &Path, generated: &Generated, overwrite: bool) -> Result<(), Error> {
    for unit in generated.units() {
        let path = directory.join(format!("{}.rs", unit.module));

        if !overwrite && path.exists() {
            debug!(path = %path.display(), "Skipping existing file");
            continue;
        }

        info!(path = %path.display(), package = %unit.package, "Writing");
        fs::write(&path, format(unit)?)?;
    }

    Ok(())
}

/// Rewrites `mod.rs` to declare every generated file in the directory.
fn write_mod_file(directory: &Path) -> Result<(), Error> {
    let mut modules = BTreeSet::new();

    for entry in fs::read_dir(directory)? {
        let path = entry?.path();

        if path.extension().map_or(false, |extension| extension == "rs") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if stem != "mod" {
                    modules.insert(stem.to_owned());
                }
            }
        }
    }

    let contents = modules
        .iter()
        .map(|module| format!("pub mod {};\n", module))
        .collect::<String>();

    fs::write(directory.join("mod.rs"), contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="Point">
    <xs:attribute name="x" type="xs:double"/>
  </xs:complexType>
</xs:schema>"#;

    fn generate(path: &Path) -> Generated {
        codegen::from_location(
            path.to_string_lossy(),
            DocumentKind::Xsd,
            LoadOptions::default(),
            &GenerateOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_operations_module() {
        assert_eq!(operations_module("myservice.rs").unwrap(), "myservice");
        assert_eq!(operations_module("out/clients.rs").unwrap(), "clients");
        assert!(operations_module("").is_err());
    }

    #[test]
    fn test_same_file() {
        assert!(is_same_file("service.wsdl", "service.wsdl"));
        assert!(!is_same_file("service.wsdl", "service.rs"));
    }

    #[test]
    fn test_write_units() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        let schema = input.path().join("points.xsd");
        fs::write(&schema, SCHEMA).unwrap();

        write_units(output.path(), &generate(&schema), false).unwrap();
        write_mod_file(output.path()).unwrap();

        let points = fs::read_to_string(output.path().join("points.rs")).unwrap();
        assert!(points.contains("pub struct Point {"));
        assert!(points.contains("pub x: ::std::option::Option<f64>,"));

        assert_eq!(
            fs::read_to_string(output.path().join("mod.rs")).unwrap(),
            "pub mod points;\n"
        );
    }

    #[test]
    fn test_existing_files_are_kept() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        let schema = input.path().join("points.xsd");
        fs::write(&schema, SCHEMA).unwrap();
        fs::write(output.path().join("points.rs"), "// edited").unwrap();

        write_units(output.path(), &generate(&schema), false).unwrap();
        assert_eq!(
            fs::read_to_string(output.path().join("points.rs")).unwrap(),
            "// edited"
        );

        write_units(output.path(), &generate(&schema), true).unwrap();
        assert_ne!(
            fs::read_to_string(output.path().join("points.rs")).unwrap(),
            "// edited"
        );
    }

    #[test]
    fn test_xsd_files() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("nested")).unwrap();
        fs::write(root.path().join("a.xsd"), SCHEMA).unwrap();
        fs::write(root.path().join("nested/b.xsd"), SCHEMA).unwrap();
        fs::write(root.path().join("notes.txt"), "").unwrap();

        let files = xsd_files(root.path()).unwrap();
        assert_eq!(
            files,
            [root.path().join("a.xsd"), root.path().join("nested/b.xsd")]
        );
    }
}
