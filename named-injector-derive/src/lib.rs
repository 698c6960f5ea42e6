//! Derive macros for named-injector
//!
//! - `#[derive(Construct)]` - Implement `Construct` from a struct's named fields
//!
//! # Example
//!
//! ```rust,ignore
//! use named_injector::{Construct, Container, Terminal};
//! use std::sync::Arc;
//!
//! #[derive(Construct)]
//! struct UserService {
//!     // Resolved under the field name
//!     database: Arc<String>,
//!     // Resolved under an explicit name
//!     #[inject(name = "cache.size")]
//!     cache_size: usize,
//!     // Not a dependency, uses Default
//!     #[inject(default)]
//!     request_count: u64,
//! }
//!
//! let container = Container::new();
//! container.value("database", String::from("users.db"));
//! container.value("cache.size", 1024usize);
//! container.service("users", Terminal::constructor::<UserService>())?;
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for the `Construct` trait.
///
/// Every named field becomes a constructor parameter, in declaration
/// order, named after the field.
///
/// # Attributes
///
/// - `#[inject(name = "...")]` - Resolve the field under another name
/// - `#[inject(default)]` - Skip the field and use `Default::default()`
///
/// # Field types
///
/// - `Arc<T>` shares the resolved instance
/// - `Value` receives the type-erased value itself
/// - any other `T: Clone` is cloned out of the resolved instance
#[proc_macro_derive(Construct, attributes(inject))]
pub fn derive_construct(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_construct(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_construct(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Construct can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Construct can only be derived for structs",
            ));
        }
    };

    let mut parameters: Vec<String> = Vec::new();
    let mut field_inits = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };

        match parse_inject_attr(&field.attrs)? {
            InjectAttr::Default => {
                field_inits.push(quote! {
                    #field_name: ::std::default::Default::default()
                });
            }
            InjectAttr::Named(rename) => {
                let index = parameters.len();
                parameters.push(rename.unwrap_or_else(|| field_name.to_string()));

                let field_type = &field.ty;
                let init = if let Some(inner) = extract_arc_inner_type(field_type) {
                    quote! { args.get::<#inner>(#index)? }
                } else if is_value_type(field_type) {
                    quote! { ::std::clone::Clone::clone(args.value(#index)?) }
                } else {
                    quote! { args.cloned::<#field_type>(#index)? }
                };
                field_inits.push(quote! { #field_name: #init });
            }
        }
    }

    let init = if matches!(&input.data, Data::Struct(data) if matches!(data.fields, Fields::Unit)) {
        quote! { Self }
    } else {
        quote! { Self { #(#field_inits),* } }
    };

    Ok(quote! {
        impl #impl_generics ::named_injector::Construct for #name #ty_generics #where_clause {
            fn parameters() -> &'static [&'static str] {
                &[#(#parameters),*]
            }

            fn construct(
                args: ::named_injector::Arguments,
            ) -> ::named_injector::Result<Self> {
                let _ = &args;
                Ok(#init)
            }
        }
    })
}

/// How a field is filled
enum InjectAttr {
    /// From the argument at its position, optionally renamed
    Named(Option<String>),
    /// From `Default::default()`
    Default,
}

/// Parse the #[inject(...)] attribute of a field
fn parse_inject_attr(attrs: &[Attribute]) -> syn::Result<InjectAttr> {
    let mut result = InjectAttr::Named(None);

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                result = InjectAttr::Default;
                Ok(())
            } else if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                result = InjectAttr::Named(Some(name.value()));
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"` or `default`"))
            }
        })?;
    }

    Ok(result)
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Arc" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

/// Whether the type is named `Value` without generic arguments
fn is_value_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Value" && segment.arguments.is_empty()),
        _ => false,
    }
}
