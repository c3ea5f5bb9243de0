use crate::utils::{apply_derives, ensure_leading_field};
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Item, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 仅支持具名字段变体：`Variant { .. }`（允许空的 `Variant {}`）
/// - 确保每个变体具备字段 `meta: EventMeta`（缺失时补在最前）
/// - 生成 `::ddd_domain::domain_event::DomainEvent` 实现（meta/event_type/event_version）
/// - 支持：`#[domain_event(version = N)]`（枚举级默认版本，缺省为 1）
/// - 变体可覆写：`#[event(event_type = "...", event_version = N)]`，
///   未指定 event_type 时取 `枚举名.变体名`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on enum types",
            )
            .to_compile_error()
            .into();
        }
    };

    if enum_item.variants.is_empty() {
        return syn::Error::new(
            enum_item.span(),
            "#[domain_event] requires at least one variant",
        )
        .to_compile_error()
        .into();
    }

    let version_lit = cfg.version.unwrap_or_else(|| syn::parse_quote! { 1 });

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut enum_item.attrs, required, &[]);

    let meta_ty: Type = syn::parse_quote! { ::ddd_domain::domain_event::EventMeta };
    let mut variant_types: HashMap<String, syn::LitStr> = HashMap::new();
    let mut variant_versions: HashMap<String, syn::LitInt> = HashMap::new();

    for v in &mut enum_item.variants {
        let fields_named = match &mut v.fields {
            syn::Fields::Named(fields_named) => fields_named,
            _ => {
                return syn::Error::new(
                    v.span(),
                    "#[domain_event] supports only named-field enum variants, e.g., Variant { x: T }",
                )
                .to_compile_error()
                .into();
            }
        };
        ensure_leading_field(fields_named, "meta", &meta_ty);

        let mut retained_attrs = Vec::new();
        let mut type_lit: Option<syn::LitStr> = None;
        let mut version_lit_local: Option<syn::LitInt> = None;

        for attr in v.attrs.iter() {
            if !attr.path().is_ident("event") {
                retained_attrs.push(attr.clone());
                continue;
            }
            let vc = match parse_variant_event_attr(attr) {
                Ok(vc) => vc,
                Err(err) => return err.to_compile_error().into(),
            };
            if let Some(lit) = vc.ty {
                if type_lit.is_some() {
                    return syn::Error::new(
                        attr.span(),
                        "duplicate 'event_type' specified for this variant",
                    )
                    .to_compile_error()
                    .into();
                }
                type_lit = Some(lit);
            }
            if let Some(lit) = vc.version {
                if version_lit_local.is_some() {
                    return syn::Error::new(
                        attr.span(),
                        "duplicate 'event_version' specified for this variant",
                    )
                    .to_compile_error()
                    .into();
                }
                version_lit_local = Some(lit);
            }
        }

        v.attrs = retained_attrs;
        if let Some(lit) = type_lit {
            variant_types.insert(v.ident.to_string(), lit);
        }
        if let Some(lit) = version_lit_local {
            variant_versions.insert(v.ident.to_string(), lit);
        }
    }

    let enum_ident = &enum_item.ident;
    let enum_name_string = enum_ident.to_string();
    let (impl_generics, ty_generics, where_clause) = enum_item.generics.split_for_impl();

    let meta_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        quote! { Self::#v_ident { meta, .. } => meta }
    });

    let type_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let key = v_ident.to_string();
        let lit = variant_types.get(&key).cloned().unwrap_or_else(|| {
            syn::LitStr::new(&format!("{}.{}", enum_name_string, key), v_ident.span())
        });
        quote! { Self::#v_ident { .. } => #lit }
    });

    let ver_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        match variant_versions.get(&v_ident.to_string()) {
            Some(lit) => quote! { Self::#v_ident { .. } => #lit },
            None => quote! { Self::#v_ident { .. } => #version_lit },
        }
    });

    let out = quote! {
        #enum_item

        impl #impl_generics ::ddd_domain::domain_event::DomainEvent for #enum_ident #ty_generics #where_clause {
            fn meta(&self) -> &::ddd_domain::domain_event::EventMeta { match self { #( #meta_match_arms, )* } }
            fn event_type(&self) -> &str { match self { #( #type_match_arms, )* } }
            fn event_version(&self) -> usize { match self { #( #ver_match_arms, )* } }
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

struct VariantEventAttrConfig {
    ty: Option<syn::LitStr>,
    version: Option<syn::LitInt>,
}

fn parse_variant_event_attr(attr: &syn::Attribute) -> Result<VariantEventAttrConfig> {
    let syn::Meta::List(_) = &attr.meta else {
        return Err(syn::Error::new(attr.span(), "expected #[event(...)]"));
    };

    let mut ty: Option<syn::LitStr> = None;
    let mut version: Option<syn::LitInt> = None;
    let pairs = attr.parse_args_with(Punctuated::<syn::MetaNameValue, Token![,]>::parse_terminated)?;

    for kv in pairs {
        if kv.path.is_ident("event_type") {
            if ty.is_some() {
                return Err(syn::Error::new(
                    kv.path.span(),
                    "duplicate key 'event_type' in attribute",
                ));
            }
            ty = Some(match kv.value {
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit),
                    ..
                }) => lit,
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "expected string literal for 'event_type'",
                    ));
                }
            });
        } else if kv.path.is_ident("event_version") {
            if version.is_some() {
                return Err(syn::Error::new(
                    kv.path.span(),
                    "duplicate key 'event_version' in attribute",
                ));
            }
            version = Some(parse_int_lit(kv.value, "event_version")?);
        } else {
            return Err(syn::Error::new(
                kv.path.span(),
                "unknown key; expected 'event_type' | 'event_version'",
            ));
        }
    }

    Ok(VariantEventAttrConfig { ty, version })
}

fn parse_int_lit(expr: Expr, key: &str) -> Result<syn::LitInt> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(lit),
            ..
        }) => Ok(lit),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected integer literal for '{key}'"),
        )),
    }
}

// 枚举级配置：默认版本号
struct EventAttrConfig {
    version: Option<syn::LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut version: Option<syn::LitInt> = None;
        if input.is_empty() {
            return Ok(Self { version });
        }

        let pairs: Punctuated<syn::MetaNameValue, Token![,]> =
            Punctuated::parse_terminated(input)?;

        for kv in pairs {
            if kv.path.is_ident("version") {
                if version.is_some() {
                    return Err(syn::Error::new(
                        kv.path.span(),
                        "duplicate key 'version' in attribute",
                    ));
                }
                version = Some(parse_int_lit(kv.value, "version")?);
            } else {
                return Err(syn::Error::new(
                    kv.path.span(),
                    "unknown key; expected 'version'",
                ));
            }
        }

        Ok(Self { version })
    }
}
