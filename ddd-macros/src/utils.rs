use quote::ToTokens;
use syn::{Attribute, Field, FieldsNamed, Token, Type, punctuated::Punctuated};

// 提取非 derive 属性与已有 derive 列表
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) =
                attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let ident = last.ident.to_string();
            match ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{}", ident),
                _ => ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

/// 合并默认派生到 attrs：
/// - required 优先且去重；
/// - excluded 中的派生由宏手写实现，从用户已有派生中剔除以免冲突。
pub(crate) fn apply_derives(
    attrs: &mut Vec<Attribute>,
    required: Vec<syn::Path>,
    excluded: &[&str],
) {
    let (retained, existing) = split_derives(attrs);
    let mut seen = std::collections::HashSet::<String>::new();
    let mut merged: Vec<syn::Path> = Vec::new();
    for p in required.into_iter().chain(existing) {
        let key = derive_key(&p);
        if excluded.contains(&key.as_str()) {
            continue;
        }
        if seen.insert(key) {
            merged.push(p);
        }
    }
    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}

/// 字段缺失时在最前面补上 `name: ty`，已存在则保持原顺序
pub(crate) fn ensure_leading_field(fields_named: &mut FieldsNamed, name: &str, ty: &Type) {
    let exists = fields_named
        .named
        .iter()
        .any(|f| f.ident.as_ref().is_some_and(|i| i == name));
    if exists {
        return;
    }
    let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
    let field: Field = syn::parse_quote! { #ident: #ty };
    let mut named: Punctuated<Field, Token![,]> = Punctuated::new();
    named.push(field);
    named.extend(fields_named.named.clone());
    fields_named.named = named;
}

/// 判断类型是否形如 `Option<T>`
pub(crate) fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(tp) if tp.qself.is_none() => tp
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "Option"),
        _ => false,
    }
}

/// 解析 `debug = true|false` 形式的布尔参数
pub(crate) fn parse_bool_expr(expr: syn::Expr, key: &str) -> syn::Result<bool> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(b),
            ..
        }) => Ok(b.value()),
        other => Err(syn::Error::new_spanned(
            other,
            format!("expected boolean literal for '{key}'"),
        )),
    }
}
