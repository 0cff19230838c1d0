use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Token, parse_macro_input};

/* ───────────────────────── #[sheet(...)] arguments ───────────────────────── */

enum SheetArg {
    /// `"ID;split(|)"`
    Directive(LitStr),
    Flatten(Span),
    Ignore(Span),
    /// `name = "Sheet"` (container only)
    Name(LitStr),
}

impl Parse for SheetArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(SheetArg::Directive(input.parse()?));
        }
        let ident = Ident::parse_any(input)?;
        match ident.to_string().as_str() {
            "flatten" => Ok(SheetArg::Flatten(ident.span())),
            "ignore" => Ok(SheetArg::Ignore(ident.span())),
            "name" => {
                input.parse::<Token![=]>()?;
                Ok(SheetArg::Name(input.parse()?))
            }
            other => Err(syn::Error::new(
                ident.span(),
                format!("unknown sheet attribute `{other}`"),
            )),
        }
    }
}

fn sheet_args(attrs: &[syn::Attribute]) -> syn::Result<Vec<SheetArg>> {
    let mut args = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("sheet")) {
        args.extend(attr.parse_args_with(Punctuated::<SheetArg, Token![,]>::parse_terminated)?);
    }
    Ok(args)
}

/// Top-level `;` entries of a directive, parentheses protecting their content.
fn directive_entries(raw: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let (mut depth, mut start) = (0usize, 0usize);
    for (i, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                entries.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(raw[start..].trim());
    entries
}

/// Same ignore forms the runtime parser accepts, spacing inside the
/// parentheses included.
fn is_ignore_entry(entry: &str) -> bool {
    if entry == "-" || entry == "ignore" {
        return true;
    }
    let Some(open) = entry.find('(') else {
        return false;
    };
    let Some(arg) = entry[open + 1..].strip_suffix(')') else {
        return false;
    };
    match entry[..open].trim() {
        "column" => arg.trim() == "-",
        "ignore" => arg.trim().is_empty(),
        _ => false,
    }
}

fn is_ignore_directive(raw: &str) -> bool {
    directive_entries(raw).into_iter().any(is_ignore_entry)
}

/* ───────────────────────────── SheetRecord ───────────────────────────── */

/// Derive `SheetRecord` (and `RowDestination`) for a struct with named fields.
///
/// Field attribute `#[sheet(...)]` takes a directive string (`"ID"`,
/// `"column(NameOf)"`, `"Slice;split(|)"`, `"-"`), `ignore` or `flatten`.
/// Container attribute `#[sheet(name = "...")]` declares the sheet name.
#[proc_macro_derive(SheetRecord, attributes(sheet))]
pub fn derive_sheet_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_sheet_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_sheet_record(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "SheetRecord cannot be derived for generic types",
        ));
    }

    let mut sheet_name = None;
    for arg in sheet_args(&input.attrs)? {
        match arg {
            SheetArg::Name(lit) => {
                if sheet_name.is_some() {
                    return Err(syn::Error::new(lit.span(), "duplicate sheet name"));
                }
                sheet_name = Some(lit);
            }
            SheetArg::Directive(lit) => {
                return Err(syn::Error::new(lit.span(), "expected `name = \"...\"`"));
            }
            SheetArg::Flatten(span) | SheetArg::Ignore(span) => {
                return Err(syn::Error::new(span, "only valid on fields"));
            }
        }
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "SheetRecord needs a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "SheetRecord can only be derived for structs",
            ));
        }
    };

    let mut registrations = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let name = field_ident.unraw().to_string();
        let ty = &field.ty;

        let (mut directive, mut flatten, mut ignore) = (None, false, false);
        for arg in sheet_args(&field.attrs)? {
            match arg {
                SheetArg::Directive(lit) => {
                    if directive.is_some() {
                        return Err(syn::Error::new(
                            lit.span(),
                            "duplicate directive; join entries with `;` instead",
                        ));
                    }
                    directive = Some(lit);
                }
                SheetArg::Flatten(_) => flatten = true,
                SheetArg::Ignore(_) => ignore = true,
                SheetArg::Name(lit) => {
                    return Err(syn::Error::new(lit.span(), "`name` is only valid on the struct"));
                }
            }
        }
        if directive.as_ref().is_some_and(|lit| is_ignore_directive(&lit.value())) {
            ignore = true;
        }

        let registration = if ignore {
            quote! { fields.ignored(#name); }
        } else if flatten {
            if let Some(lit) = &directive {
                return Err(syn::Error::new(lit.span(), "flattened fields take no directive"));
            }
            quote! {
                fields.flatten::<#ty>(#name, |record: &mut Self| &mut record.#field_ident)?;
            }
        } else {
            let directive = match &directive {
                Some(lit) => quote! { ::core::option::Option::Some(#lit) },
                None => quote! { ::core::option::Option::None },
            };
            quote! {
                fields.field::<#ty>(#name, #directive, |record: &mut Self| &mut record.#field_ident)?;
            }
        };
        registrations.push(registration);
    }

    let type_name = ident.unraw().to_string();
    let sheet_name = match sheet_name {
        Some(lit) => quote! { ::core::option::Option::Some(#lit) },
        None => quote! { ::core::option::Option::None },
    };

    Ok(quote! {
        impl ::sheetbind::SheetRecord for #ident {
            const TYPE_NAME: &'static str = #type_name;

            fn sheet_name() -> ::core::option::Option<&'static str> {
                #sheet_name
            }

            #[allow(unused_variables)]
            fn describe(fields: &mut ::sheetbind::FieldMapBuilder<Self>) -> ::sheetbind::Result<()> {
                #(#registrations)*
                ::core::result::Result::Ok(())
            }
        }

        ::sheetbind::impl_row_destination!(#ident);
    })
}

/* ────────────────────────────── BytesCell ────────────────────────────── */

/// Make a `DecodeFromBytes` type bindable: its cells are handed to the hook
/// as raw bytes.
#[proc_macro_derive(BytesCell)]
pub fn derive_bytes_cell(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::sheetbind::CellField for #ident #ty_generics #where_clause {
            fn shape() -> ::sheetbind::FieldShape {
                ::sheetbind::FieldShape::Bytes
            }

            fn write_cell(
                &mut self,
                text: &str,
                _conversion: &::sheetbind::Conversion,
            ) -> ::core::result::Result<(), ::sheetbind::CellFailure> {
                ::sheetbind::cell::decode_bytes(self, text)
            }
        }
    }
    .into()
}
