use proc_macro2::TokenStream;
use quote::quote;

/// Target scalar for a builtin XSD type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    Timestamp,
    Bytes,
}

/// Case-sensitive lookup of a prefix-free XSD type name.
pub fn lookup(name: &str) -> Option<Scalar> {
    let scalar = match name {
        "string" | "token" | "NMTOKEN" | "NMTOKENS" | "language" | "anyURI"
        | "normalizedString" | "Name" | "NCName" | "QName" | "ID" | "IDREF" | "IDREFS"
        | "ENTITY" | "ENTITIES" | "NOTATION" | "anyType" | "anySimpleType" | "gMonth"
        | "gMonthDay" | "gDay" | "gYearMonth" | "StringLength1to16" | "StringLength1to32" => {
            Scalar::String
        }

        "float" => Scalar::F32,
        "double" | "decimal" => Scalar::F64,
        "byte" => Scalar::I8,
        "short" => Scalar::I16,
        "int" | "integer" | "negativeInteger" | "nonPositiveInteger" => Scalar::I32,
        "long" => Scalar::I64,
        "unsignedByte" => Scalar::U8,
        "unsignedShort" => Scalar::U16,
        "unsignedInt" | "positiveInteger" | "nonNegativeInteger" => Scalar::U32,
        "unsignedLong" => Scalar::U64,
        "boolean" => Scalar::Bool,
        "dateTime" | "date" | "time" | "duration" | "gYear" => Scalar::Timestamp,
        "base64Binary" | "hexBinary" => Scalar::Bytes,

        _ => return None,
    };

    Some(scalar)
}

impl Scalar {
    pub fn tokens(self) -> TokenStream {
        match self {
            Scalar::String => quote! { ::std::string::String },
            Scalar::F32 => quote! { f32 },
            Scalar::F64 => quote! { f64 },
            Scalar::I8 => quote! { i8 },
            Scalar::I16 => quote! { i16 },
            Scalar::I32 => quote! { i32 },
            Scalar::I64 => quote! { i64 },
            Scalar::U8 => quote! { u8 },
            Scalar::U16 => quote! { u16 },
            Scalar::U32 => quote! { u32 },
            Scalar::U64 => quote! { u64 },
            Scalar::Bool => quote! { bool },
            Scalar::Timestamp => quote! { ::wsdlgen_util::Timestamp },
            Scalar::Bytes => quote! { ::std::vec::Vec<u8> },
        }
    }

    /// Typed literal for an enumeration value, if the value fits this scalar.
    pub fn literal(self, value: &str) -> Option<TokenStream> {
        let value = value.trim();

        let tokens = match self {
            Scalar::F32 => {
                let value = value.parse::<f32>().ok().filter(|value| value.is_finite())?;
                quote! { #value }
            }
            Scalar::F64 => {
                let value = value.parse::<f64>().ok().filter(|value| value.is_finite())?;
                quote! { #value }
            }
            Scalar::I8 => {
                let value = value.parse::<i8>().ok()?;
                quote! { #value }
            }
            Scalar::I16 => {
                let value = value.parse::<i16>().ok()?;
                quote! { #value }
            }
            Scalar::I32 => {
                let value = value.parse::<i32>().ok()?;
                quote! { #value }
            }
            Scalar::I64 => {
                let value = value.parse::<i64>().ok()?;
                quote! { #value }
            }
            Scalar::U8 => {
                let value = value.parse::<u8>().ok()?;
                quote! { #value }
            }
            Scalar::U16 => {
                let value = value.parse::<u16>().ok()?;
                quote! { #value }
            }
            Scalar::U32 => {
                let value = value.parse::<u32>().ok()?;
                quote! { #value }
            }
            Scalar::U64 => {
                let value = value.parse::<u64>().ok()?;
                quote! { #value }
            }
            Scalar::Bool => match value {
                "true" | "1" => quote! { true },
                "false" | "0" => quote! { false },
                _ => return None,
            },
            Scalar::String | Scalar::Timestamp | Scalar::Bytes => return None,
        };

        Some(tokens)
    }
}
