use crate::utils::{apply_derives, is_option, parse_bool_expr};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[value_object] 宏实现
/// - 结构体（具名或 tuple）：按字段声明顺序生成相等性分量，`Option<T>` 字段映射为可空分量；
///   并据此手写 `PartialEq`/`Eq`/`Hash`（用户写在 derive 中的同名派生会被移除）
/// - 枚举：派生 `PartialEq`/`Eq`/`Hash`，整个枚举值作为唯一分量
/// - 合并/追加派生：Clone, (Debug 可控), Serialize, Deserialize
/// - 参数：`#[value_object(debug = true|false)]`，默认 true
/// - 没有字段的结构体无法区分取值，直接报编译错误
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ValueObjectAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }

    match &mut input {
        Item::Struct(st) => {
            let components: Vec<proc_macro2::TokenStream> = match &st.fields {
                syn::Fields::Named(named) => named
                    .named
                    .iter()
                    .map(|f| {
                        let ident = f.ident.as_ref().map(|i| quote! { #i });
                        component_expr(&f.ty, ident.unwrap_or_default())
                    })
                    .collect(),
                syn::Fields::Unnamed(unnamed) => unnamed
                    .unnamed
                    .iter()
                    .enumerate()
                    .map(|(index, f)| {
                        let index = syn::Index::from(index);
                        component_expr(&f.ty, quote! { #index })
                    })
                    .collect(),
                syn::Fields::Unit => Vec::new(),
            };

            if components.is_empty() {
                return syn::Error::new(
                    st.span(),
                    "#[value_object] requires at least one field to act as an equality component",
                )
                .to_compile_error()
                .into();
            }

            apply_derives(&mut st.attrs, required, &["PartialEq", "Eq", "Hash"]);

            let ident = &st.ident;
            let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

            TokenStream::from(quote! {
                #st

                impl #impl_generics ::ddd_domain::value_object::ValueObject for #ident #ty_generics #where_clause {
                    fn equality_components(&self) -> ::std::vec::Vec<::ddd_domain::value_object::Component<'_>> {
                        ::std::vec![ #( #components ),* ]
                    }
                }

                impl #impl_generics ::core::cmp::PartialEq for #ident #ty_generics #where_clause {
                    fn eq(&self, other: &Self) -> bool {
                        ::ddd_domain::value_object::ValueObject::value_eq(self, other)
                    }
                }

                impl #impl_generics ::core::cmp::Eq for #ident #ty_generics #where_clause {}

                impl #impl_generics ::core::hash::Hash for #ident #ty_generics #where_clause {
                    fn hash<__H: ::core::hash::Hasher>(&self, state: &mut __H) {
                        state.write_u64(::ddd_domain::value_object::ValueObject::value_hash(self));
                    }
                }
            })
        }
        Item::Enum(en) => {
            required.push(syn::parse_quote!(PartialEq));
            required.push(syn::parse_quote!(Eq));
            required.push(syn::parse_quote!(Hash));
            apply_derives(&mut en.attrs, required, &[]);

            let ident = &en.ident;
            let (impl_generics, ty_generics, where_clause) = en.generics.split_for_impl();

            TokenStream::from(quote! {
                #en

                impl #impl_generics ::ddd_domain::value_object::ValueObject for #ident #ty_generics #where_clause {
                    fn equality_components(&self) -> ::std::vec::Vec<::ddd_domain::value_object::Component<'_>> {
                        ::std::vec![::ddd_domain::value_object::Component::of(self)]
                    }
                }
            })
        }
        other => syn::Error::new(other.span(), "#[value_object] only supports struct or enum")
            .to_compile_error()
            .into(),
    }
}

fn component_expr(ty: &syn::Type, member: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    if is_option(ty) {
        quote! { ::ddd_domain::value_object::Component::optional(self.#member.as_ref()) }
    } else {
        quote! { ::ddd_domain::value_object::Component::of(&self.#member) }
    }
}

// -------- parsing --------

struct ValueObjectAttrConfig {
    derive_debug: Option<bool>,
}

impl Parse for ValueObjectAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut derive_debug: Option<bool> = None;
        if input.is_empty() {
            return Ok(Self { derive_debug });
        }

        let pairs: Punctuated<syn::MetaNameValue, Token![,]> =
            Punctuated::parse_terminated(input)?;

        for kv in pairs {
            if kv.path.is_ident("debug") {
                if derive_debug.is_some() {
                    return Err(syn::Error::new(
                        kv.path.span(),
                        "duplicate key 'debug' in attribute",
                    ));
                }
                derive_debug = Some(parse_bool_expr(kv.value, "debug")?);
            } else {
                return Err(syn::Error::new(
                    kv.path.span(),
                    "unknown key in attribute; expected 'debug'",
                ));
            }
        }
        Ok(Self { derive_debug })
    }
}
