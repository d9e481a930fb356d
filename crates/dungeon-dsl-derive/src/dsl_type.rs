//! Implementation of #[derive(DslType)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Field, Fields, LitStr};

pub fn derive_dsl_type_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// How a field is exposed.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Exposure {
    Member,
    Callback,
}

struct FieldOptions {
    exposure: Exposure,
    name: Option<String>,
    readonly: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "DslType cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "DslType requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "DslType only works on structs",
            ));
        }
    };

    let dsl_name = match container_name(&input.attrs)? {
        Some(name) => name,
        None => to_snake_case(&ident.to_string()),
    };

    let mut members = Vec::new();
    for field in fields {
        if let Some(options) = field_options(field)? {
            members.push(member_tokens(field, &options));
        }
    }

    Ok(quote! {
        impl ::dungeon_dsl::interop::DslType for #ident {
            const DSL_NAME: &'static str = #dsl_name;

            fn members() -> ::std::vec::Vec<::dungeon_dsl::interop::HostMember<Self>> {
                ::std::vec![#(#members),*]
            }
        }

        impl ::dungeon_dsl::interop::HostValue for #ident {
            fn dsl_type() -> ::dungeon_dsl::types::Type {
                ::dungeon_dsl::types::Type::aggregate(#dsl_name)
            }

            fn to_value(&self) -> ::dungeon_dsl::value::Value {
                ::dungeon_dsl::interop::aggregate_to_value(self)
            }

            fn from_value(
                value: &::dungeon_dsl::value::Value,
                env: &::std::sync::Arc<::dungeon_dsl::runtime::RuntimeEnvironment>,
            ) -> ::std::result::Result<Self, ::dungeon_dsl::error::InteropError> {
                ::dungeon_dsl::interop::aggregate_from_value(value, env)
            }
        }
    })
}

fn member_tokens(field: &Field, options: &FieldOptions) -> TokenStream2 {
    // Named fields always have an ident
    let field_ident = field.ident.as_ref();
    let ty = &field.ty;
    let name = options.name.clone().unwrap_or_else(|| {
        field_ident
            .map(|id| id.to_string().trim_start_matches("r#").to_string())
            .unwrap_or_default()
    });
    let (settable, gettable) = match options.exposure {
        Exposure::Member => (!options.readonly, true),
        Exposure::Callback => (true, false),
    };

    quote! {
        ::dungeon_dsl::interop::HostMember {
            name: #name,
            ty: <#ty as ::dungeon_dsl::interop::HostValue>::dsl_type,
            settable: #settable,
            gettable: #gettable,
            get: |this: &Self| ::dungeon_dsl::interop::HostValue::to_value(&this.#field_ident),
            set: |this: &mut Self,
                  value: &::dungeon_dsl::value::Value,
                  env: &::std::sync::Arc<::dungeon_dsl::runtime::RuntimeEnvironment>| {
                this.#field_ident =
                    <#ty as ::dungeon_dsl::interop::HostValue>::from_value(value, env)?;
                ::std::result::Result::Ok(())
            },
        }
    }
}

fn container_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("dsl")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported dsl attribute, expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

fn field_options(field: &Field) -> syn::Result<Option<FieldOptions>> {
    let mut exposure = None;
    let mut name = None;
    let mut readonly = false;
    let mut seen = false;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("dsl")) {
        seen = true;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("member") {
                exposure = Some(Exposure::Member);
            } else if meta.path.is_ident("callback") {
                exposure = Some(Exposure::Callback);
            } else if meta.path.is_ident("readonly") {
                readonly = true;
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
            } else {
                return Err(meta.error(
                    "unsupported dsl attribute, expected `member`, `callback`, `name` or `readonly`",
                ));
            }
            Ok(())
        })?;
    }

    if !seen {
        return Ok(None);
    }
    let exposure = exposure.unwrap_or(Exposure::Member);
    if exposure == Exposure::Callback && readonly {
        return Err(syn::Error::new_spanned(
            field,
            "a callback field cannot be readonly",
        ));
    }
    Ok(Some(FieldOptions {
        exposure,
        name,
        readonly,
    }))
}

/// `QuestConfig` → `quest_config`, `HTTPServer` → `http_server`.
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p));
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
