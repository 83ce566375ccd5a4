mod attributes;
mod controller;

use crate::attributes::ControllerAttributes;
use crate::controller::generate_controller;
use proc_macro::TokenStream;
use syn::{parse_macro_input, Error, Item};

/// Implements `Controller` for an inherent impl block, turning route attributes (`#[get]`,
/// `#[post]`, `#[put]`, `#[delete]`, `#[catch_and_send_error]`) and parameter attributes
/// (`#[request]`, `#[response]`, `#[next]`, `#[param]`, `#[num_param]`, `#[query]`,
/// `#[num_query]`, `#[body]`, `#[header]`) into metadata declarations.
#[proc_macro_attribute]
pub fn controller(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as ControllerAttributes);
    let item = parse_macro_input!(input as Item);
    generate_controller(item, &args)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
