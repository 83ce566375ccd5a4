use proc_macro2::Span;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Error, ExprArray, LitStr, Meta, Result, Token};

pub const CATCH_AND_SEND_ERROR: &str = "catch_and_send_error";

const VERBS: [&str; 4] = ["get", "post", "put", "delete"];
const PARAMETERS: [&str; 9] = [
    "request",
    "response",
    "next",
    "param",
    "num_param",
    "query",
    "num_query",
    "body",
    "header",
];

#[derive(Default)]
pub struct ControllerAttributes {
    pub path: Option<LitStr>,
}

impl Parse for ControllerAttributes {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut result = Self::default();
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(kw::path) {
                if result.path.is_some() {
                    return Err(Error::new(input.span(), "Path is already defined!"));
                }

                result.path = Some(input.parse::<LitArg<kw::path, LitStr>>()?.value);
            } else if lookahead.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(result)
    }
}

/// `#[get("/path", middleware = [..])]` and the other verbs.
pub struct RouteAttributes {
    pub verb: &'static str,
    pub path: LitStr,
    pub middleware: Option<ExprArray>,
}

impl RouteAttributes {
    pub fn from_attribute(attribute: &Attribute) -> Result<Option<Self>> {
        let Some(verb) = VERBS
            .into_iter()
            .find(|verb| attribute.path().is_ident(verb))
        else {
            return Ok(None);
        };

        let args = match &attribute.meta {
            Meta::Path(_) => RouteArgs::default(),
            _ => attribute.parse_args::<RouteArgs>()?,
        };

        Ok(Some(Self {
            verb,
            path: args
                .path
                .unwrap_or_else(|| LitStr::new("", Span::call_site())),
            middleware: args.middleware,
        }))
    }
}

#[derive(Default)]
struct RouteArgs {
    path: Option<LitStr>,
    middleware: Option<ExprArray>,
}

impl Parse for RouteArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut result = Self::default();
        if input.peek(LitStr) {
            result.path = Some(input.parse()?);
        }

        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(kw::middleware) {
                if result.middleware.is_some() {
                    return Err(Error::new(input.span(), "Middleware is already defined!"));
                }

                result.middleware =
                    Some(input.parse::<LitArg<kw::middleware, ExprArray>>()?.value);
            } else if lookahead.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(result)
    }
}

/// Source of a single handler argument.
pub enum ParameterAttribute {
    Request,
    Response,
    Next,
    Path(Option<LitStr>),
    PathNumber { key: LitStr, float: bool },
    Query(Option<LitStr>),
    QueryNumber { key: LitStr, float: bool },
    Body(Option<LitStr>),
    Header(Option<LitStr>),
}

impl ParameterAttribute {
    pub fn is_parameter_attribute(attribute: &Attribute) -> bool {
        PARAMETERS
            .into_iter()
            .any(|name| attribute.path().is_ident(name))
    }

    pub fn from_attribute(attribute: &Attribute) -> Result<Option<Self>> {
        let path = attribute.path();
        let result = if path.is_ident("request") {
            Self::Request
        } else if path.is_ident("response") {
            Self::Response
        } else if path.is_ident("next") {
            Self::Next
        } else if path.is_ident("param") {
            Self::Path(parse_optional_key(attribute)?)
        } else if path.is_ident("num_param") {
            let (key, float) = parse_number_key(attribute)?;
            Self::PathNumber { key, float }
        } else if path.is_ident("query") {
            Self::Query(parse_optional_key(attribute)?)
        } else if path.is_ident("num_query") {
            let (key, float) = parse_number_key(attribute)?;
            Self::QueryNumber { key, float }
        } else if path.is_ident("body") {
            Self::Body(parse_optional_key(attribute)?)
        } else if path.is_ident("header") {
            Self::Header(parse_optional_key(attribute)?)
        } else {
            return Ok(None);
        };

        Ok(Some(result))
    }
}

fn parse_optional_key(attribute: &Attribute) -> Result<Option<LitStr>> {
    match &attribute.meta {
        Meta::Path(_) => Ok(None),
        _ => attribute.parse_args().map(Some),
    }
}

fn parse_number_key(attribute: &Attribute) -> Result<(LitStr, bool)> {
    attribute
        .parse_args::<NumberKey>()
        .map(|key| (key.key, key.float))
}

struct NumberKey {
    key: LitStr,
    float: bool,
}

impl Parse for NumberKey {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key = input.parse()?;
        let mut float = false;
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(kw::float) {
                let _ = input.parse::<kw::float>()?;
                float = true;
            } else if lookahead.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(Self { key, float })
    }
}

pub fn is_method_attribute(attribute: &Attribute) -> bool {
    attribute.path().is_ident(CATCH_AND_SEND_ERROR)
        || VERBS
            .into_iter()
            .any(|verb| attribute.path().is_ident(verb))
}

struct LitArg<T, A> {
    value: A,
    _p: std::marker::PhantomData<T>,
}

impl<T: Parse, A: Parse> Parse for LitArg<T, A> {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let _ = input.parse::<T>()?;
        let _ = input.parse::<Token![=]>()?;
        let value = input.parse()?;
        Ok(Self {
            value,
            _p: std::marker::PhantomData,
        })
    }
}

mod kw {
    use syn::custom_keyword;

    custom_keyword!(path);
    custom_keyword!(middleware);
    custom_keyword!(float);
}
