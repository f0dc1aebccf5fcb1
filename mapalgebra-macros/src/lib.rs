use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod op_meta;
use op_meta::parse_op_info;

/// Registers a map-algebra operator type in the global operator inventory.
///
/// The type must implement `Default` and `crate::core::MapOp`. Generates
/// `register()` (the keyword aliases) and `USAGE`, and submits an
/// `OperatorMetadata` whose factory builds a default instance.
#[proc_macro_derive(MapOperator, attributes(map_op))]
pub fn derive_map_operator(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let op_info = match parse_op_info(&input) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let struct_name = &input.ident;
    let op_name = &op_info.name;
    let aliases: Vec<String> = op_info
        .aliases
        .iter()
        .map(|alias| alias.to_lowercase())
        .collect();
    let usage = op_info
        .usage
        .clone()
        .unwrap_or_else(|| format!("{}(...)", aliases[0]));

    let mod_name = syn::Ident::new(
        &format!("__operator_registration_{}", struct_name.to_string().to_lowercase()),
        struct_name.span(),
    );

    let factory_fn_name = syn::Ident::new(
        &format!("create_metadata_{}", struct_name.to_string().to_lowercase()),
        struct_name.span(),
    );

    let expanded = quote! {
        impl #struct_name {
            /// Usage line reported in argument errors.
            pub const USAGE: &'static str = #usage;

            /// Operator keywords this type answers to.
            pub fn register() -> &'static [&'static str] {
                &[#(#aliases),*]
            }
        }

        mod #mod_name {
            use super::*;

            fn #factory_fn_name() -> crate::registry::OperatorMetadata {
                crate::registry::OperatorMetadata {
                    name: #op_name.to_string(),
                    aliases: #struct_name::register().iter().map(|a| a.to_string()).collect(),
                    usage: #struct_name::USAGE.to_string(),
                    factory: || Box::new(#struct_name::default()),
                }
            }

            ::inventory::submit! {
                crate::registry::OperatorMetadataFactoryWrapper(#factory_fn_name)
            }
        }
    };

    TokenStream::from(expanded)
}
