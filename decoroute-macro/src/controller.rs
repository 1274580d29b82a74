use crate::verbs;
use darling::{ast::NestedMeta, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, Attribute, Expr, ExprLit, ImplItem, ImplItemFn,
    ItemImpl, Lit, LitStr, Meta, Token,
};

const DEFAULT_PATH: &str = "*";

const INERT: &[&str] = &[
    "route",
    "use_middleware",
    "param",
    "middleware",
    "named_middleware",
];

#[derive(Debug, Default, FromMeta)]
struct RoutesArgs {
    #[darling(default)]
    path: Option<String>,
}

/// One declaration attribute, in source order.
enum Decl {
    Route { variant: syn::Ident, path: LitStr },
    Use(Option<LitStr>),
    Param(LitStr),
    Middleware(Expr),
    NamedMiddleware(LitStr),
}

struct MethodInfo {
    ident: syn::Ident,
    decls: Vec<Decl>,
    exported: bool,
}

impl MethodInfo {
    fn is_param(&self) -> bool {
        self.decls.iter().any(|d| matches!(d, Decl::Param(_)))
    }

    fn declares_more_than_params(&self) -> bool {
        self.exported || self.decls.iter().any(|d| !matches!(d, Decl::Param(_)))
    }
}

pub fn routes_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(list) => list,
        Err(e) => return TokenStream::from(darling::Error::from(e).write_errors()),
    };
    let args = match RoutesArgs::from_list(&args) {
        Ok(args) => args,
        Err(e) => return TokenStream::from(e.write_errors()),
    };
    let input = parse_macro_input!(item as ItemImpl);
    match expand(args, input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn expand(args: RoutesArgs, mut input: ItemImpl) -> syn::Result<TokenStream2> {
    let mut methods = Vec::new();
    for item in input.items.iter_mut() {
        if let ImplItem::Fn(method) = item {
            if let Some(info) = extract_method(method)? {
                methods.push(info);
            }
            method.attrs.retain(|attr| !is_route_attr(attr));
        }
    }

    let base_path = args.path.map(|path| quote! { meta.base_path(#path); });
    let declarations = methods
        .iter()
        .filter(|m| !m.decls.is_empty())
        .map(generate_declaration);
    let exported: Vec<_> = methods.iter().filter(|m| m.exported).collect();
    let table = (!exported.is_empty()).then(|| generate_table(&exported));

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::decoroute::Controller for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn declare(meta: &mut ::decoroute::ControllerMeta<Self>) {
                #base_path
                #(#declarations)*
            }

            #table
        }
    })
}

fn extract_method(method: &ImplItemFn) -> syn::Result<Option<MethodInfo>> {
    let mut decls = Vec::new();
    let mut exported = false;

    for attr in &method.attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        let name = ident.to_string();
        if verbs::SHORTHANDS.contains(&name.as_str()) {
            let variant = verb_ident(&name, ident.span())?;
            let path = optional_path(attr)?.unwrap_or_else(|| LitStr::new(DEFAULT_PATH, ident.span()));
            decls.push(Decl::Route { variant, path });
            continue;
        }
        match name.as_str() {
            "route" => {
                let args = attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
                let mut args = args.into_iter();
                let Some(verb) = args.next() else {
                    return Err(syn::Error::new_spanned(attr, "expected #[route(\"verb\", \"/path\")]"));
                };
                let variant = verb_ident(&verb.value(), verb.span())?;
                let path = args
                    .next()
                    .unwrap_or_else(|| LitStr::new(DEFAULT_PATH, verb.span()));
                if let Some(extra) = args.next() {
                    return Err(syn::Error::new_spanned(extra, "unexpected argument"));
                }
                decls.push(Decl::Route { variant, path });
            }
            "use_middleware" => decls.push(Decl::Use(optional_path(attr)?)),
            "param" => decls.push(Decl::Param(attr.parse_args::<LitStr>()?)),
            "middleware" => {
                let decl = match attr.parse_args::<Expr>()? {
                    Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) => Decl::NamedMiddleware(name),
                    expr => Decl::Middleware(expr),
                };
                decls.push(decl);
            }
            "named_middleware" => {
                attr.meta.require_path_only()?;
                exported = true;
            }
            _ => {}
        }
    }

    if decls.is_empty() && !exported {
        return Ok(None);
    }
    if method.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &method.sig.fn_token,
            "route handlers must be async fn",
        ));
    }

    let info = MethodInfo {
        ident: method.sig.ident.clone(),
        decls,
        exported,
    };
    if info.is_param() && info.declares_more_than_params() {
        return Err(syn::Error::new_spanned(
            &method.sig.ident,
            "a #[param] handler cannot also be a route or take middleware",
        ));
    }
    Ok(Some(info))
}

fn generate_declaration(method: &MethodInfo) -> TokenStream2 {
    let ident = &method.ident;
    let key = ident.to_string();

    let calls = method.decls.iter().map(|decl| match decl {
        Decl::Route { variant, path } => quote! { .route(::decoroute::Verb::#variant, #path) },
        Decl::Use(None) => quote! { .use_middleware() },
        Decl::Use(Some(path)) => quote! { .use_path(#path) },
        Decl::Param(name) => quote! { .param(#name) },
        Decl::Middleware(expr) => quote! { .middleware(#expr) },
        Decl::NamedMiddleware(name) => quote! { .middleware(::decoroute::HandlerRef::named(#name)) },
    });

    if method.is_param() {
        let own = param_closure(ident);
        quote! { meta.param_method(#key, #own) #(#calls)*; }
    } else {
        let own = method_closure(ident);
        quote! { meta.method(#key, #own) #(#calls)*; }
    }
}

fn generate_table(methods: &[&MethodInfo]) -> TokenStream2 {
    let entries = methods.iter().map(|method| {
        let name = method.ident.to_string();
        let own = method_closure(&method.ident);
        quote! { .with(#name, #own) }
    });
    quote! {
        fn middleware_table(&self) -> ::decoroute::MiddlewareTable<Self> {
            ::decoroute::MiddlewareTable::new() #(#entries)*
        }
    }
}

fn method_closure(ident: &syn::Ident) -> TokenStream2 {
    quote! {
        ::decoroute::handler(|this: ::std::sync::Arc<Self>, req, next| async move {
            this.#ident(req, next).await
        })
    }
}

fn param_closure(ident: &syn::Ident) -> TokenStream2 {
    quote! {
        ::decoroute::param_handler(|this: ::std::sync::Arc<Self>, req, next, value, name| async move {
            this.#ident(req, next, value, name).await
        })
    }
}

fn verb_ident(name: &str, span: Span) -> syn::Result<syn::Ident> {
    match verbs::variant(name) {
        Some(variant) => Ok(format_ident!("{}", variant, span = span)),
        None => Err(syn::Error::new(span, format!("unknown verb `{name}`"))),
    }
}

fn optional_path(attr: &Attribute) -> syn::Result<Option<LitStr>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(_) => attr.parse_args::<LitStr>().map(Some),
        Meta::NameValue(_) => Err(syn::Error::new_spanned(attr, "expected a path literal")),
    }
}

fn is_route_attr(attr: &Attribute) -> bool {
    attr.path().get_ident().map_or(false, |ident| {
        let name = ident.to_string();
        verbs::SHORTHANDS.contains(&name.as_str()) || INERT.contains(&name.as_str())
    })
}
