use std::collections::BTreeSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use url::Url;

use super::sanitize::module_name;

fn header(title: String, source: Option<&Url>, imports: &BTreeSet<String>) -> TokenStream {
    let source = source.map(|url| {
        let line = format!(" Source: {}", url);
        quote! { #![doc = #line] }
    });

    let imports = imports
        .iter()
        .map(|package| format_ident!("{}", module_name(package)));

    quote! {
        #![doc = #title]
        #source
        #![allow(dead_code, unused_imports)]

        #(use super::#imports;)*
    }
}

pub fn types(package: &str, source: Option<&Url>, imports: &BTreeSet<String>) -> TokenStream {
    header(
        format!(" Types generated from package `{}`.", package),
        source,
        imports,
    )
}

pub fn operations(source: Option<&Url>, imports: &BTreeSet<String>) -> TokenStream {
    header(" SOAP clients generated from port types.".into(), source, imports)
}
