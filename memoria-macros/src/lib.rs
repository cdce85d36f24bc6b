use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, FnArg, GenericArgument, ItemFn, Pat, PathArguments, ReturnType, Type,
};

mod attributes;

use attributes::{MemoizeAttributes, Scope};

/// How the return type maps onto the memoizer's success and failure types.
enum Outcome {
    /// `Result<T, E>`: failures go through the failure policy.
    Result { ok: Type, err: Type },
    /// Anything else: every return value is a success.
    Plain(TokenStream2),
}

impl Outcome {
    fn from_return(output: &ReturnType) -> syn::Result<Self> {
        let ty = match output {
            ReturnType::Type(_, ty) => ty.as_ref(),
            ReturnType::Default => return Ok(Outcome::Plain(quote! { () })),
        };

        if let Type::Path(type_path) = ty {
            if let Some(last) = type_path.path.segments.last() {
                if last.ident == "Result" {
                    return match &last.arguments {
                        PathArguments::AngleBracketed(generic) if generic.args.len() == 2 => {
                            let mut types = generic.args.iter().filter_map(|arg| match arg {
                                GenericArgument::Type(ty) => Some(ty.clone()),
                                _ => None,
                            });
                            match (types.next(), types.next()) {
                                (Some(ok), Some(err)) => Ok(Outcome::Result { ok, err }),
                                _ => Err(syn::Error::new_spanned(
                                    ty,
                                    "#[memoize] could not read the Result type arguments",
                                )),
                            }
                        }
                        _ => Err(syn::Error::new_spanned(
                            ty,
                            "#[memoize] needs the error type spelled out: use Result<T, E>",
                        )),
                    };
                }
            }
        }

        Ok(Outcome::Plain(quote! { #ty }))
    }

    fn ok_type(&self) -> TokenStream2 {
        match self {
            Outcome::Result { ok, .. } => quote! { #ok },
            Outcome::Plain(ty) => ty.clone(),
        }
    }

    fn err_type(&self) -> TokenStream2 {
        match self {
            Outcome::Result { err, .. } => quote! { #err },
            Outcome::Plain(_) => quote! { ::std::convert::Infallible },
        }
    }

    /// Statement returning a cached `__outcome` from the function.
    fn replay(&self) -> TokenStream2 {
        match self {
            Outcome::Result { .. } => quote! { return __outcome; },
            Outcome::Plain(_) => quote! {
                match __outcome {
                    Ok(__value) => return __value,
                    Err(__never) => match __never {},
                }
            },
        }
    }

    /// Runs the original body into `__outcome`, an owned `Result`.
    fn compute(&self, ret_type: &TokenStream2, block: &syn::Block) -> TokenStream2 {
        match self {
            Outcome::Result { .. } => quote! {
                let __outcome: #ret_type = (|| -> #ret_type #block)();
            },
            Outcome::Plain(_) => quote! {
                let __outcome = ::std::result::Result::<#ret_type, ::std::convert::Infallible>::Ok(
                    (|| -> #ret_type #block)(),
                );
            },
        }
    }

    /// Expression turning `__outcome` back into the function's return value.
    fn finish(&self) -> TokenStream2 {
        match self {
            Outcome::Result { .. } => quote! { __outcome },
            Outcome::Plain(_) => quote! {
                match __outcome {
                    Ok(__value) => __value,
                    Err(__never) => match __never {},
                }
            },
        }
    }
}

/// Builds the cache key: every argument's `CacheableKey`, joined by `|`.
fn generate_key_expr(has_self: bool, arg_idents: &[syn::Ident]) -> TokenStream2 {
    let self_part = if has_self {
        quote! { __parts.push(::memoria_core::CacheableKey::to_cache_key(&self)); }
    } else {
        quote! {}
    };

    quote! {
        {
            let mut __parts: ::std::vec::Vec<::std::string::String> = ::std::vec::Vec::new();
            #self_part
            #( __parts.push(::memoria_core::CacheableKey::to_cache_key(&#arg_idents)); )*
            __parts.join("|")
        }
    }
}

/// Generate the thread-local cache branch
fn generate_thread_local_branch(
    memo_ident: &syn::Ident,
    outcome: &Outcome,
    ret_type: &TokenStream2,
    attrs: &MemoizeAttributes,
    fn_name_str: &str,
    key_expr: &TokenStream2,
    block: &syn::Block,
) -> TokenStream2 {
    let ok_type = outcome.ok_type();
    let err_type = outcome.err_type();
    let capacity_expr = attrs.capacity_expr();
    let cache_failures = attrs.cache_failures;
    let replay = outcome.replay();
    let compute = outcome.compute(ret_type, block);
    let finish = outcome.finish();

    quote! {
        thread_local! {
            static #memo_ident: ::std::cell::RefCell<
                ::memoria_core::Memoizer<::std::string::String, #ok_type, #err_type>
            > = ::std::cell::RefCell::new(::memoria_core::Memoizer::new(
                #fn_name_str,
                #capacity_expr,
                #cache_failures,
            ));
        }

        let __key: ::std::string::String = #key_expr;

        let __cached = #memo_ident.with(|__memo| __memo.borrow_mut().lookup(&__key));
        if let Some(__outcome) = __cached {
            #replay
        }

        // no borrow is held while the body runs, so it may recurse
        let __pending = #memo_ident.with(|__memo| __memo.borrow().begin_miss());
        #compute
        #memo_ident.with(|__memo| __memo.borrow_mut().complete(__key, __pending, &__outcome));
        #finish
    }
}

/// Generate the global cache branch
fn generate_global_branch(
    memo_ident: &syn::Ident,
    outcome: &Outcome,
    ret_type: &TokenStream2,
    attrs: &MemoizeAttributes,
    fn_name_str: &str,
    key_expr: &TokenStream2,
    block: &syn::Block,
) -> TokenStream2 {
    let ok_type = outcome.ok_type();
    let err_type = outcome.err_type();
    let capacity_expr = attrs.capacity_expr();
    let cache_failures = attrs.cache_failures;
    let replay = outcome.replay();
    let compute = outcome.compute(ret_type, block);
    let finish = outcome.finish();

    quote! {
        static #memo_ident: ::memoria_core::__private::once_cell::sync::Lazy<
            ::memoria_core::__private::parking_lot::Mutex<
                ::memoria_core::Memoizer<::std::string::String, #ok_type, #err_type>
            >
        > = ::memoria_core::__private::once_cell::sync::Lazy::new(|| {
            let __memo = ::memoria_core::Memoizer::new(#fn_name_str, #capacity_expr, #cache_failures);
            ::memoria_core::stats_registry::register(#fn_name_str, __memo.stats_handle());
            ::memoria_core::__private::parking_lot::Mutex::new(__memo)
        });

        let __key: ::std::string::String = #key_expr;

        let __cached = #memo_ident.lock().lookup(&__key);
        if let Some(__outcome) = __cached {
            #replay
        }

        // the lock is released while the body runs, so it may recurse
        let __pending = #memo_ident.lock().begin_miss();
        #compute
        #memo_ident.lock().complete(__key, __pending, &__outcome);
        #finish
    }
}

fn expand(attrs: MemoizeAttributes, input: ItemFn) -> syn::Result<TokenStream2> {
    let fn_attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let ident = &sig.ident;
    let block = &input.block;

    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[memoize] does not support async functions",
        ));
    }

    let ret_type = match &sig.output {
        ReturnType::Type(_, ty) => quote! { #ty },
        ReturnType::Default => quote! { () },
    };
    let outcome = Outcome::from_return(&sig.output)?;

    // Parse arguments and detect self
    let mut arg_idents = Vec::new();
    let mut has_self = false;
    for arg in sig.inputs.iter() {
        match arg {
            FnArg::Receiver(_) => has_self = true,
            FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
                Pat::Ident(pat_ident) => arg_idents.push(pat_ident.ident.clone()),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "#[memoize] needs plain identifier arguments",
                    ))
                }
            },
        }
    }

    let memo_ident = format_ident!("MEMOIZE_{}", ident.to_string().to_uppercase());
    let key_expr = generate_key_expr(has_self, &arg_idents);

    // Use custom name if provided, otherwise use function name
    let fn_name_str = attrs
        .custom_name
        .clone()
        .unwrap_or_else(|| ident.to_string());

    let body = match attrs.scope {
        Scope::Thread => generate_thread_local_branch(
            &memo_ident,
            &outcome,
            &ret_type,
            &attrs,
            &fn_name_str,
            &key_expr,
            block,
        ),
        Scope::Global => generate_global_branch(
            &memo_ident,
            &outcome,
            &ret_type,
            &attrs,
            &fn_name_str,
            &key_expr,
            block,
        ),
    };

    Ok(quote! {
        #(#fn_attrs)*
        #vis #sig {
            #body
        }
    })
}

/// Memoizes a function or method.
///
/// The arguments (and `self`, for methods) are turned into a string key with
/// `memoria_core::CacheableKey`, which every `Debug` type implements. A call
/// whose key is cached returns a clone of the stored outcome without running
/// the body.
///
/// Generated code refers to `memoria_core`, so the calling crate must depend
/// on it (the `memoria` crate does).
///
/// # Requirements
///
/// - **Arguments**: plain identifiers whose types implement `Debug`
/// - **Return type**: `Clone`; for `Result<T, E>` both `T` and `E` must be `Clone`,
///   and the error type must be written out (`io::Result<T>` is rejected).
///   The cache is a `static`, so the return type must not mention generic
///   parameters or `Self`
/// - **Global scope**: the return type must also be `Send`
///
/// # Macro Parameters
///
/// - `max_size` (optional): maximum number of cached outcomes. When the cache is
///   full, the least recently used entry is evicted. `max_size = 0` is a compile
///   error. Default: unbounded.
/// - `cache_failures` (optional): for `Result` returns, also cache `Err` values
///   and replay them on later calls. Default: `false`.
/// - `scope` (optional): where the cache lives.
///   - `"thread"` - one cache per thread (default)
///   - `"global"` - one cache shared by every thread, registered in
///     `memoria_core::stats_registry`
/// - `name` (optional): cache name used in log events and the statistics
///   registry. Default: the function name.
///
/// # Cache Behavior
///
/// - **Regular functions**: every result is cached
/// - **Result-returning functions**: `Ok` values are cached; `Err` values only
///   with `cache_failures = true`
/// - **Replay**: a hit returns a `Clone` of the stored value, not the stored
///   object itself. Write the error type as `Arc<E>` when callers need to see
///   the very failure the first call produced (`Arc::ptr_eq`)
/// - **Recursion**: no lock or borrow is held while the body runs
/// - **Methods**: work with `self`, `&self` and `&mut self`; the receiver's
///   `Debug` output is part of the key
/// - **Mutating methods**: the key is taken from the receiver before the body
///   runs, so a `&mut self` method that changes `self` misses on its next call
///   unless the receiver returns to an earlier state
///
/// # Examples
///
/// ```ignore
/// use memoria::memoize;
///
/// #[memoize(max_size = 100)]
/// fn fibonacci(n: u64) -> u64 {
///     if n < 2 {
///         return n;
///     }
///     fibonacci(n - 1) + fibonacci(n - 2)
/// }
///
/// #[memoize(max_size = 10, cache_failures = true, scope = "global", name = "config_loader")]
/// fn load(path: String) -> Result<String, String> {
///     std::fs::read_to_string(&path).map_err(|e| e.to_string())
/// }
///
/// if let Some(stats) = memoria::stats_registry::get("config_loader") {
///     println!("hit rate: {:.2}%", stats.hit_rate() * 100.0);
/// }
/// ```
#[proc_macro_attribute]
pub fn memoize(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match MemoizeAttributes::parse(attr.into()) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };
    let input = parse_macro_input!(item as ItemFn);

    match expand(attrs, input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}
