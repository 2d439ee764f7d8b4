extern crate proc_macro;

use std::path::Path;

use proc_macro::TokenStream;
use quote::quote_spanned;
use syn::{parse_macro_input, LitStr};
use wsdlgen_codegen::{self as codegen, DocumentKind, GenerateOptions, LoadOptions};

/// Expands a WSDL or XSD document into one module per package, plus `operations` for WSDL
/// clients. Relative paths are taken from the crate's manifest directory.
#[proc_macro]
pub fn wsdlgen(input: TokenStream) -> TokenStream {
    let literal = parse_macro_input!(input as LitStr);
    let location = resolve(&literal.value());

    let kind = if location.ends_with(".xsd") {
        DocumentKind::Xsd
    } else {
        DocumentKind::Wsdl
    };

    let options = GenerateOptions {
        parallel: false,
        ..Default::default()
    };

    match codegen::from_location(&location, kind, LoadOptions::default(), &options) {
        Ok(generated) => generated.into_tokens().into(),

        Err(error) => {
            let message = format!("wsdlgen: {}", error);
            quote_spanned!(literal.span() => compile_error!(#message);).into()
        }
    }
}

fn resolve(location: &str) -> String {
    if location.contains("://") || Path::new(location).is_absolute() {
        return location.to_owned();
    }

    match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(root) => Path::new(&root).join(location).to_string_lossy().into_owned(),
        Err(_) => location.to_owned(),
    }
}
