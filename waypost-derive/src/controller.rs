use crate::attributes::{
    is_method_attribute, ControllerAttributes, ParameterAttribute, RouteAttributes,
    CATCH_AND_SEND_ERROR,
};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Error, FnArg, ImplItem, ImplItemFn, Item, Result, Type};

struct HandlerParameter {
    ident: Ident,
    ty: Type,
    attribute: Option<ParameterAttribute>,
}

struct HandlerMethod {
    member: String,
    method: Ident,
    is_async: bool,
    routes: Vec<RouteAttributes>,
    catch_errors: bool,
    parameters: Vec<HandlerParameter>,
}

impl HandlerMethod {
    /// Extracts handler definition from given method, stripping all helper attributes.
    fn extract(method: &mut ImplItemFn) -> Result<Option<Self>> {
        let has_parameter_attributes = method.sig.inputs.iter().any(|input| {
            matches!(input, FnArg::Typed(arg) if arg
                .attrs
                .iter()
                .any(ParameterAttribute::is_parameter_attribute))
        });

        if !has_parameter_attributes && !method.attrs.iter().any(is_method_attribute) {
            return Ok(None);
        }

        match method.sig.inputs.first() {
            Some(FnArg::Receiver(receiver))
                if receiver.reference.is_some() && receiver.mutability.is_none() => {}
            _ => {
                return Err(Error::new(
                    method.sig.span(),
                    "Controller handlers must take &self!",
                ))
            }
        }

        let routes: Vec<_> = method
            .attrs
            .iter()
            .filter_map(|attribute| RouteAttributes::from_attribute(attribute).transpose())
            .try_collect()?;
        let catch_errors = method
            .attrs
            .iter()
            .any(|attribute| attribute.path().is_ident(CATCH_AND_SEND_ERROR));

        method
            .attrs
            .retain(|attribute| !is_method_attribute(attribute));

        let mut parameters = vec![];
        for input in method.sig.inputs.iter_mut() {
            if let FnArg::Typed(arg) = input {
                let attributes: Vec<_> = arg
                    .attrs
                    .iter()
                    .filter_map(|attribute| ParameterAttribute::from_attribute(attribute).transpose())
                    .try_collect()?;

                if attributes.len() > 1 {
                    return Err(Error::new(
                        arg.span(),
                        "Handler parameters can have only one source attribute!",
                    ));
                }

                arg.attrs
                    .retain(|attribute| !ParameterAttribute::is_parameter_attribute(attribute));

                parameters.push(HandlerParameter {
                    ident: format_ident!("argument_{}", parameters.len()),
                    ty: (*arg.ty).clone(),
                    attribute: attributes.into_iter().next(),
                });
            }
        }

        Ok(Some(Self {
            member: method.sig.ident.to_string(),
            method: method.sig.ident.clone(),
            is_async: method.sig.asyncness.is_some(),
            routes,
            catch_errors,
            parameters,
        }))
    }

    fn declaration(&self) -> TokenStream {
        let member = &self.member;

        // attributes apply from the bottom up
        let routes = self.routes.iter().rev().map(|route| {
            let verb = match route.verb {
                "post" => quote!(Post),
                "put" => quote!(Put),
                "delete" => quote!(Delete),
                _ => quote!(Get),
            };
            let path = &route.path;
            let middleware = route
                .middleware
                .as_ref()
                .map(|middleware| {
                    let elems = middleware.elems.iter();
                    quote!(::std::vec![#(#elems),*])
                })
                .unwrap_or_else(|| quote!(::std::vec::Vec::new()));

            quote! {
                route.set_verb_and_path(::waypost::metadata::HttpVerb::#verb, #path, #middleware);
            }
        });

        let bindings = self
            .parameters
            .iter()
            .enumerate()
            .filter_map(|(slot, parameter)| {
                let binding = match parameter.attribute.as_ref()? {
                    ParameterAttribute::Request => quote!(request(#slot)),
                    ParameterAttribute::Response => quote!(response(#slot)),
                    ParameterAttribute::Next => quote!(next(#slot)),
                    ParameterAttribute::Path(Some(key)) => quote!(path(#slot, #key)),
                    ParameterAttribute::Path(None) => quote!(all_path(#slot)),
                    ParameterAttribute::PathNumber { key, float: false } => {
                        quote!(path_number(#slot, #key))
                    }
                    ParameterAttribute::PathNumber { key, float: true } => {
                        quote!(path_float(#slot, #key))
                    }
                    ParameterAttribute::Query(Some(key)) => quote!(query(#slot, #key)),
                    ParameterAttribute::Query(None) => quote!(all_query(#slot)),
                    ParameterAttribute::QueryNumber { key, float: false } => {
                        quote!(query_number(#slot, #key))
                    }
                    ParameterAttribute::QueryNumber { key, float: true } => {
                        quote!(query_float(#slot, #key))
                    }
                    ParameterAttribute::Body(Some(key)) => quote!(body(#slot, #key)),
                    ParameterAttribute::Body(None) => quote!(whole_body(#slot)),
                    ParameterAttribute::Header(Some(key)) => quote!(header(#slot, #key)),
                    ParameterAttribute::Header(None) => quote!(all_headers(#slot)),
                };

                Some(quote! {
                    route.add_parameter(::waypost::metadata::ParameterBinding::#binding);
                })
            });

        let catch_errors = self
            .catch_errors
            .then(|| quote!(route.catch_and_send_error();));
        let arity = self.parameters.len();

        quote! {
            {
                let route = metadata.ensure_route(#member);
                #(#routes)*
                #(#bindings)*
                #catch_errors
                route.set_arity(#arity);
            }
        }
    }

    fn invocation(&self) -> TokenStream {
        let member = &self.member;
        let method = &self.method;

        let conversions = self.parameters.iter().enumerate().map(|(slot, parameter)| {
            let ident = &parameter.ident;
            let ty = &parameter.ty;

            quote! {
                let #ident = match <#ty as ::waypost::argument::FromArgument>::from_argument(
                    arguments.take(#slot),
                ) {
                    ::std::result::Result::Ok(value) => value,
                    ::std::result::Result::Err(mismatch) => {
                        return ::waypost::handler::fail(mismatch.at(#member, #slot))
                    }
                };
            }
        });

        let idents = self.parameters.iter().map(|parameter| &parameter.ident);
        let call = if self.is_async {
            quote! {
                ::waypost::handler::into_handler_future(async move {
                    self.#method(#(#idents),*).await
                })
            }
        } else {
            quote! {
                ::waypost::handler::resolved(self.#method(#(#idents),*))
            }
        };

        quote! {
            #member => {
                #(#conversions)*
                #call
            }
        }
    }
}

pub fn generate_controller(mut item: Item, args: &ControllerAttributes) -> Result<TokenStream> {
    let Item::Impl(item_impl) = &mut item else {
        return Err(Error::new(
            item.span(),
            "Only impl blocks can be marked as a controller!",
        ));
    };

    if item_impl.trait_.is_some() {
        return Err(Error::new(
            item_impl.span(),
            "Controllers must be inherent impl blocks!",
        ));
    }

    let mut handlers = vec![];
    for impl_item in item_impl.items.iter_mut() {
        if let ImplItem::Fn(method) = impl_item {
            if let Some(handler) = HandlerMethod::extract(method)? {
                handlers.push(handler);
            }
        }
    }

    let ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();
    let base_url = args
        .path
        .as_ref()
        .map(|path| quote!(metadata.set_base_url(#path);));
    let declarations = handlers.iter().map(HandlerMethod::declaration);
    let invocations = handlers.iter().map(HandlerMethod::invocation);

    Ok(quote! {
        #item_impl

        #[automatically_derived]
        impl #impl_generics ::waypost::controller::Controller for #ty #where_clause {
            fn declare(metadata: &mut ::waypost::metadata::ControllerMetadata) {
                #base_url
                #(#declarations)*
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(
                self: ::std::sync::Arc<Self>,
                member: &str,
                mut arguments: ::waypost::argument::Arguments,
            ) -> ::waypost::handler::HandlerFuture {
                match member {
                    #(#invocations)*
                    _ => ::waypost::handler::fail(
                        ::waypost::error::InvocationError::UnknownMember(member.to_string()),
                    ),
                }
            }
        }
    })
}
