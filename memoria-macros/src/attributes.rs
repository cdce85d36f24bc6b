//! Parsing of `#[memoize(...)]` attribute arguments.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parser;
use syn::{punctuated::Punctuated, Expr, Lit, MetaNameValue, Token};

/// Where a memoized function keeps its cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// One cache per thread, in `thread_local!` storage.
    Thread,
    /// One cache shared by all threads, behind a mutex.
    Global,
}

/// Parsed macro attributes
pub struct MemoizeAttributes {
    pub max_size: Option<usize>,
    pub cache_failures: bool,
    pub scope: Scope,
    pub custom_name: Option<String>,
}

impl Default for MemoizeAttributes {
    fn default() -> Self {
        Self {
            max_size: None,
            cache_failures: false,
            scope: Scope::Thread,
            custom_name: None,
        }
    }
}

impl MemoizeAttributes {
    /// Parses `name = value` pairs separated by commas.
    pub fn parse(attr: TokenStream2) -> syn::Result<Self> {
        let parser = Punctuated::<MetaNameValue, Token![,]>::parse_terminated;
        let parsed_args = parser.parse2(attr)?;

        let mut attrs = MemoizeAttributes::default();
        for nv in parsed_args {
            if nv.path.is_ident("max_size") {
                attrs.max_size = Some(parse_max_size(&nv)?);
            } else if nv.path.is_ident("cache_failures") {
                attrs.cache_failures = parse_bool(&nv, "cache_failures")?;
            } else if nv.path.is_ident("scope") {
                attrs.scope = parse_scope(&nv)?;
            } else if nv.path.is_ident("name") {
                attrs.custom_name = Some(parse_string(&nv, "name")?);
            } else {
                return Err(syn::Error::new_spanned(
                    &nv.path,
                    "unknown attribute: expected `max_size`, `cache_failures`, `scope` or `name`",
                ));
            }
        }

        Ok(attrs)
    }

    /// Expression building the `memoria_core::Capacity` of the cache.
    pub fn capacity_expr(&self) -> TokenStream2 {
        match self.max_size {
            Some(n) => quote! {
                ::memoria_core::Capacity::from(::std::num::NonZeroUsize::new(#n))
            },
            None => quote! { ::memoria_core::Capacity::Unbounded },
        }
    }
}

fn literal<'a>(nv: &'a MetaNameValue, what: &str) -> syn::Result<&'a Lit> {
    match &nv.value {
        Expr::Lit(expr_lit) => Ok(&expr_lit.lit),
        other => Err(syn::Error::new_spanned(
            other,
            format!("invalid syntax for `{}`: expected a literal", what),
        )),
    }
}

/// Parse the `max_size` attribute. Zero is a configuration error.
fn parse_max_size(nv: &MetaNameValue) -> syn::Result<usize> {
    match literal(nv, "max_size")? {
        Lit::Int(lit_int) => {
            let value = lit_int.base10_parse::<usize>()?;
            if value == 0 {
                Err(syn::Error::new_spanned(
                    lit_int,
                    "max_size must be greater than zero (omit it for an unbounded cache)",
                ))
            } else {
                Ok(value)
            }
        }
        other => Err(syn::Error::new_spanned(
            other,
            "invalid literal for `max_size`: expected a positive integer",
        )),
    }
}

fn parse_bool(nv: &MetaNameValue, what: &str) -> syn::Result<bool> {
    match literal(nv, what)? {
        Lit::Bool(lit_bool) => Ok(lit_bool.value),
        other => Err(syn::Error::new_spanned(
            other,
            format!("invalid literal for `{}`: expected `true` or `false`", what),
        )),
    }
}

fn parse_string(nv: &MetaNameValue, what: &str) -> syn::Result<String> {
    match literal(nv, what)? {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(
            other,
            format!("invalid literal for `{}`: expected a string", what),
        )),
    }
}

fn parse_scope(nv: &MetaNameValue) -> syn::Result<Scope> {
    match parse_string(nv, "scope")?.as_str() {
        "thread" => Ok(Scope::Thread),
        "global" => Ok(Scope::Global),
        _ => Err(syn::Error::new_spanned(
            &nv.value,
            "invalid scope: expected \"thread\" or \"global\"",
        )),
    }
}
