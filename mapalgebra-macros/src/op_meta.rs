use darling::FromAttributes;
use syn::DeriveInput;

/// Parsed attributes from #[map_op(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(map_op))]
pub struct MapOpArgs {
    pub name: String,

    /// Keyword aliases the operator answers to. Repeatable.
    #[darling(multiple, rename = "register")]
    pub aliases: Vec<String>,

    #[darling(default)]
    pub usage: Option<String>,
}

pub fn parse_op_info(input: &DeriveInput) -> darling::Result<MapOpArgs> {
    let args = MapOpArgs::from_attributes(&input.attrs)?;

    if args.aliases.is_empty() {
        return Err(darling::Error::custom(
            "map_op requires at least one `register = \"...\"` alias",
        )
        .with_span(&input.ident));
    }

    Ok(args)
}
