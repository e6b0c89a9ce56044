//! Procedural macros for prop-relay

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level options for #[derive(PropertyEvent)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(event), supports(enum_any))]
struct EventOpts {
    ident: syn::Ident,
    data: darling::ast::Data<EventVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(event))]
struct EventVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit property-name override
    #[darling(default)]
    property: Option<String>,
}

/// Convert PascalCase to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Derive macro for the PropertyEvent trait
///
/// Generates a `property()` method that returns the snake_case variant name.
/// Individual variants can override the reported name with
/// `#[event(property = "...")]`.
///
/// # Example
/// ```ignore
/// #[derive(PropertyEvent, Clone, Debug)]
/// enum ModelEvent {
///     ValueChanged { old: i64, new: i64 },
///     #[event(property = "enabled")]
///     EnabledFlipped(bool),
/// }
///
/// let event = ModelEvent::ValueChanged { old: 1, new: 2 };
/// assert_eq!(event.property(), "value_changed");
/// ```
#[proc_macro_derive(PropertyEvent, attributes(event))]
pub fn derive_property_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match EventOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "PropertyEvent can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let property_arms = variants.iter().map(|v| {
        let variant_name = &v.ident;
        let property = v
            .property
            .clone()
            .unwrap_or_else(|| to_snake_case(&variant_name.to_string()));

        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant_name => #property
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant_name(..) => #property
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant_name { .. } => #property
            },
        }
    });

    let body = if variants.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#property_arms),*
            }
        }
    };

    let expanded = quote! {
        impl prop_relay::PropertyEvent for #name {
            fn property(&self) -> &str {
                #body
            }
        }
    };

    expanded.into()
}
