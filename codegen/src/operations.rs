use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{
    codegen::{doc_attributes, Codegen, Emitter, UniqueNames},
    sanitize::{field_name, sanitize, type_ident},
    types::{ClientOperation, ServiceClient},
};

impl Codegen for ServiceClient<'_> {
    fn codegen(&self, emitter: &mut Emitter<'_, '_>) -> TokenStream {
        let name = type_ident(&sanitize(self.name));
        let address = self.address;
        let documentation = doc_attributes(&self.documentation.into_iter().collect::<Vec<_>>());

        let mut methods = UniqueNames::default();
        methods.reserve("new");

        let operations = self
            .operations
            .iter()
            .map(|operation| {
                let method = format_ident!("{}", methods.unique(field_name(operation.name)));
                operation_tokens(operation, &method, self.namespace, emitter)
            })
            .collect::<Vec<_>>();

        quote! {
            #documentation
            pub struct #name {
                client: ::wsdlgen_util::soap::Client,
            }

            impl #name {
                pub const ADDRESS: &'static str = #address;

                /// Creates a client for `url`, or for the address declared by the service.
                pub fn new(
                    url: ::std::option::Option<&str>,
                    ignore_tls: bool,
                ) -> ::std::result::Result<Self, ::wsdlgen_util::soap::Error> {
                    ::std::result::Result::Ok(Self {
                        client: ::wsdlgen_util::soap::Client::new(
                            url.unwrap_or(Self::ADDRESS),
                            ignore_tls,
                        )?,
                    })
                }

                #(#operations)*
            }
        }
    }
}

fn operation_tokens(
    operation: &ClientOperation,
    method: &proc_macro2::Ident,
    namespace: &str,
    emitter: &mut Emitter<'_, '_>,
) -> TokenStream {
    let action = operation.action;

    let mut docs: Vec<String> = operation.documentation.into_iter().map(Into::into).collect();
    if !operation.faults.is_empty() {
        docs.push(format!("Faults: {}", operation.faults.join(", ")));
    }
    let documentation = doc_attributes(&docs);

    let (parameter, request) = match operation.input {
        Some(part) => {
            let (ty, root, namespace) = emitter.message_part(part, namespace);
            let ty = ty.tokens();

            (
                quote! { request: &#ty, },
                quote! {
                    ::std::option::Option::Some(
                        ::wsdlgen_util::soap::Request::new(#root, #namespace, request)?
                    )
                },
            )
        }

        None => (TokenStream::new(), quote! { ::std::option::Option::None }),
    };

    match operation.output {
        Some(part) => {
            let ty = emitter.message_part(part, namespace).0.tokens();

            quote! {
                #documentation
                pub fn #method(
                    &self,
                    #parameter
                    header: ::std::option::Option<&::wsdlgen_util::soap::Header>,
                    configure: ::std::option::Option<::wsdlgen_util::soap::Configure<'_>>,
                ) -> ::std::result::Result<
                    ::std::option::Option<#ty>,
                    ::wsdlgen_util::soap::Error,
                > {
                    self.client.call(#action, #request, header, configure)
                }
            }
        }

        None => quote! {
            #documentation
            pub fn #method(
                &self,
                #parameter
                header: ::std::option::Option<&::wsdlgen_util::soap::Header>,
                configure: ::std::option::Option<::wsdlgen_util::soap::Configure<'_>>,
            ) -> ::std::result::Result<(), ::wsdlgen_util::soap::Error> {
                self.client
                    .call::<::wsdlgen_util::soap::Empty>(#action, #request, header, configure)
                    .map(|_| ())
            }
        },
    }
}
