//! Derive macro for the `Mappable` trait.
//!
//! `#[derive(Mappable)]` describes a struct with named fields to the
//! `ubiquity` mapper: every field becomes a property, in declaration order,
//! with accessors that borrow the field directly.
//!
//! # Example
//!
//! ```ignore
//! use ubiquity::Mappable;
//!
//! #[derive(Default, Mappable)]
//! struct Customer {
//!     id: u64,
//!     #[mappable(rename = "name")]
//!     full_name: String,
//!     #[mappable(read_only)]
//!     created_by: String,
//!     #[mappable(skip)]
//!     session: Option<std::sync::Arc<()>>,
//! }
//! ```
//!
//! # Container Attributes
//!
//! - `#[mappable(no_constructor)]`: The mapper never creates instances of the
//!   type; it can still be a source or a `map_into` destination. Without it
//!   the type must implement `Default`.
//! - `#[mappable(crate = path)]`: Path of the `ubiquity` crate, `::ubiquity`
//!   by default.
//!
//! # Field Attributes
//!
//! - `#[mappable(skip)]`: The field is not a property.
//! - `#[mappable(rename = "name")]`: Match the property under another name.
//! - `#[mappable(read_only)]`: The field is read as a source but never
//!   written as a target.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Fields, GenericParam, LitStr, Path,
    parse_macro_input, parse_quote,
};

/// Derive macro for `Mappable`.
///
/// Generates the `Property` and `Mappable` implementations of a struct with
/// named fields. Every type parameter receives a `Property` bound.
///
/// Enums, unions, tuple structs and types with lifetime or const parameters
/// are rejected.
#[proc_macro_derive(Mappable, attributes(mappable))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_mappable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ContainerAttributes {
    crate_path: Option<Path>,
    no_constructor: bool,
}

#[derive(Default)]
struct FieldAttributes {
    skip: bool,
    read_only: bool,
    rename: Option<LitStr>,
}

fn parse_container_attributes(
    input: &DeriveInput,
) -> Result<ContainerAttributes, Error> {
    let mut attributes = ContainerAttributes::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("mappable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                attributes.crate_path = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("no_constructor") {
                attributes.no_constructor = true;
                Ok(())
            } else {
                Err(meta.error(
                    "unknown container attribute, expected `crate` or \
                     `no_constructor`",
                ))
            }
        })?;
    }

    Ok(attributes)
}

fn parse_field_attributes(
    field: &syn::Field,
) -> Result<FieldAttributes, Error> {
    let mut attributes = FieldAttributes::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("mappable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attributes.skip = true;
                Ok(())
            } else if meta.path.is_ident("read_only") {
                attributes.read_only = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                attributes.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error(
                    "unknown field attribute, expected `skip`, `read_only` \
                     or `rename`",
                ))
            }
        })?;
    }

    Ok(attributes)
}

fn derive_mappable_impl(
    input: &DeriveInput,
) -> Result<proc_macro2::TokenStream, Error> {
    let container = parse_container_attributes(input)?;
    let crate_path =
        container.crate_path.unwrap_or_else(|| parse_quote!(::ubiquity));

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(Error::new_spanned(
                    input,
                    "Mappable can only be derived for structs with named \
                     fields",
                ));
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Mappable can only be derived for structs",
            ));
        }
    };

    let mut generics = input.generics.clone();
    for param in &input.generics.params {
        match param {
            GenericParam::Type(type_param) => {
                let ident = &type_param.ident;
                generics
                    .make_where_clause()
                    .predicates
                    .push(parse_quote!(#ident: #crate_path::Property));
            }
            GenericParam::Lifetime(_) | GenericParam::Const(_) => {
                return Err(Error::new_spanned(
                    param,
                    "Mappable types cannot have lifetime or const parameters",
                ));
            }
        }
    }

    let name = &input.ident;

    // the constructor needs `Default` of the whole type, which the type
    // parameters alone do not imply
    if !container.no_constructor && !input.generics.params.is_empty() {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        generics
            .make_where_clause()
            .predicates
            .push(parse_quote!(#name #ty_generics: ::core::default::Default));
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut properties = Vec::with_capacity(fields.len());
    for field in fields {
        let attributes = parse_field_attributes(field)?;
        if attributes.skip {
            continue;
        }

        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let property_name = attributes.rename.unwrap_or_else(|| {
            let name = ident.to_string();
            let name = name.strip_prefix("r#").unwrap_or(&name);
            LitStr::new(name, ident.span())
        });

        properties.push(if attributes.read_only {
            quote! {
                .read_only::<#ty>(#property_name, |this| &this.#ident)
            }
        } else {
            quote! {
                .property::<#ty>(
                    #property_name,
                    |this| &this.#ident,
                    |this| &mut this.#ident,
                )
            }
        });
    }

    let constructor = if container.no_constructor {
        quote! {}
    } else {
        quote! { .default_constructor() }
    };

    Ok(quote! {
        impl #impl_generics #crate_path::Property for #name #ty_generics
            #where_clause
        {
            fn shape() -> #crate_path::descriptor::Shape {
                #crate_path::descriptor::Shape::object::<Self>()
            }
        }

        impl #impl_generics #crate_path::Mappable for #name #ty_generics
            #where_clause
        {
            fn describe() -> #crate_path::descriptor::TypeDescriptor {
                #crate_path::descriptor::TypeDescriptor::builder::<Self>()
                    #constructor
                    #(#properties)*
                    .build()
            }
        }
    })
}
