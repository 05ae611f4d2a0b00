//! Procedural macros for action-relay

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(ActionTypes)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action_types), supports(enum_unit))]
struct ActionTypesOpts {
    ident: syn::Ident,
    data: darling::ast::Data<TypeVariant, ()>,

    /// Prefix applied to every generated type as `NAMESPACE_NAME`
    #[darling(default)]
    namespace: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action_types))]
struct TypeVariant {
    ident: syn::Ident,

    /// Explicit name override (still namespaced)
    #[darling(default)]
    rename: Option<String>,
}

/// Split a PascalCase string into words
///
/// Runs of capitals stay together as an acronym: `HTTPRequest` -> `HTTP`, `Request`.
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev_lower || next_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert PascalCase to SCREAMING_SNAKE_CASE
fn to_screaming_snake(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Derive macro for the ActionTypes trait
///
/// Each unit variant names one action type. `CreateCar` becomes `CREATE_CAR`,
/// prefixed with the namespace if one is given.
///
/// Generates:
/// - `name() -> &'static str` - the un-namespaced name (type map key)
/// - `action_type() -> ActionType` - the full action type
/// - `all() -> &'static [Self]` - every variant in declaration order
///
/// # Example
/// ```ignore
/// #[derive(ActionTypes, Clone, Copy, Debug)]
/// #[action_types(namespace = "CAR")]
/// enum CarTypes {
///     CreateCar,
///     #[action_types(rename = "EDIT")]
///     EditCar,
/// }
///
/// assert_eq!(CarTypes::CreateCar.action_type(), "CAR_CREATE_CAR");
/// assert_eq!(CarTypes::EditCar.name(), "EDIT");
/// assert_eq!(CarTypes::type_map()["EDIT"], "CAR_EDIT");
/// ```
#[proc_macro_derive(ActionTypes, attributes(action_types))]
pub fn derive_action_types(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionTypesOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "ActionTypes can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(variants.len());
    for v in variants {
        let key = v
            .rename
            .clone()
            .unwrap_or_else(|| to_screaming_snake(&v.ident.to_string()));
        if !seen.insert(key.clone()) {
            return syn::Error::new_spanned(
                &v.ident,
                format!("duplicate action type name `{}`", key),
            )
            .to_compile_error()
            .into();
        }
        names.push(key);
    }

    let full_names: Vec<String> = names
        .iter()
        .map(|key| match &opts.namespace {
            Some(ns) => format!("{}_{}", ns, key),
            None => key.clone(),
        })
        .collect();

    let idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();

    let name_arms = idents.iter().zip(names.iter()).map(|(v, s)| {
        quote! { #name::#v => #s }
    });
    let type_arms = idents.iter().zip(full_names.iter()).map(|(v, s)| {
        quote! { #name::#v => #s }
    });
    let all_variants = idents.iter().map(|v| quote! { #name::#v });

    let expanded = quote! {
        impl action_relay::ActionTypes for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }

            fn action_type(&self) -> action_relay::ActionType {
                action_relay::ActionType::new(match self {
                    #(#type_arms),*
                })
            }

            fn all() -> &'static [Self] {
                static ALL: &[#name] = &[#(#all_variants),*];
                ALL
            }
        }
    };

    TokenStream::from(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_screaming_snake() {
        assert_eq!(to_screaming_snake("CreateCar"), "CREATE_CAR");
        assert_eq!(to_screaming_snake("Edit"), "EDIT");
        assert_eq!(to_screaming_snake("HTTPRequest"), "HTTP_REQUEST");
        assert_eq!(to_screaming_snake("LoadV2Data"), "LOAD_V2_DATA");
    }
}
