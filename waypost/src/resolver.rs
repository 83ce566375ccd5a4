//! Per-request parameter resolution. Builds the argument list of a handler from its declared
//! [ParameterBinding]s. Resolution never fails - missing or unparsable data becomes
//! `Value::Null`.

use crate::argument::{Argument, Arguments};
use crate::metadata::{ParameterBinding, ParameterKind};
use crate::next::Next;
use crate::request::Request;
use crate::response::Response;
use serde_json::{Map, Number, Value};

/// Resolves handler arguments for a request. Without bindings, the handler gets the default
/// arguments: request, response and next.
pub fn resolve_arguments(
    parameters: &[ParameterBinding],
    request: &Request,
    response: &Response,
    next: &Next,
) -> Arguments {
    if parameters.is_empty() {
        return Arguments::defaults(request.clone(), response.clone(), next.clone());
    }

    let len = parameters
        .iter()
        .map(|binding| binding.slot + 1)
        .max()
        .unwrap_or_default();

    let mut arguments = Arguments::with_len(len);
    for binding in parameters {
        arguments.set(binding.slot, resolve(binding, request, response, next));
    }

    arguments
}

fn resolve(
    binding: &ParameterBinding,
    request: &Request,
    response: &Response,
    next: &Next,
) -> Argument {
    let key = binding.source_key.as_deref();
    match binding.kind {
        ParameterKind::Request => Argument::Request(request.clone()),
        ParameterKind::Response => Argument::Response(response.clone()),
        ParameterKind::Next => Argument::Next(next.clone()),
        ParameterKind::Path => Argument::Value(lookup(request.params(), key)),
        ParameterKind::PathNumber => {
            Argument::Value(parse_number(request.params(), key, binding.is_float))
        }
        ParameterKind::Query => Argument::Value(lookup(request.query(), key)),
        ParameterKind::QueryNumber => {
            Argument::Value(parse_number(request.query(), key, binding.is_float))
        }
        ParameterKind::Body => Argument::Value(match (key, request.body()) {
            (None, body) => body.clone(),
            (Some(key), Value::Object(body)) => body.get(key).cloned().unwrap_or(Value::Null),
            (Some(_), _) => Value::Null,
        }),
        ParameterKind::Header => Argument::Value(lookup(request.headers(), key)),
    }
}

fn lookup(source: &Map<String, Value>, key: Option<&str>) -> Value {
    match key {
        Some(key) => source.get(key).cloned().unwrap_or(Value::Null),
        None => Value::Object(source.clone()),
    }
}

fn parse_number(source: &Map<String, Value>, key: Option<&str>, is_float: bool) -> Value {
    let Some(value) = key.and_then(|key| source.get(key)) else {
        return Value::Null;
    };

    let parsed = match value {
        Value::String(value) => {
            if is_float {
                parse_float(value)
            } else {
                parse_int(value)
            }
        }
        Value::Number(number) if !is_float => number
            .as_i64()
            .map(Number::from)
            .or_else(|| number.as_f64().and_then(|value| Number::from_f64(value.trunc()))),
        Value::Number(number) => Some(number.clone()),
        _ => None,
    };

    parsed.map(Value::Number).unwrap_or(Value::Null)
}

/// Parses the longest base 10 integer prefix, after optional leading whitespace and sign.
/// Trailing garbage is ignored, so `"42px"` is `42`. Integers beyond `i64` fall back to a float.
pub fn parse_int(value: &str) -> Option<Number> {
    let value = value.trim_start();
    let digits = strip_sign(value);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    if end == 0 {
        return None;
    }

    let literal = &value[..value.len() - digits.len() + end];
    literal.parse::<i64>().map(Number::from).ok().or_else(|| {
        literal
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .and_then(Number::from_f64)
    })
}

/// Parses the longest decimal floating point prefix (`"3.14abc"` is `3.14`, `".5"` is `0.5`,
/// `"1e3"` is `1000`). Non-finite results are rejected.
pub fn parse_float(value: &str) -> Option<Number> {
    let value = value.trim_start();
    let unsigned = strip_sign(value);
    let bytes = unsigned.as_bytes();

    let mut end = 0;
    let mut mantissa_digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        mantissa_digits += 1;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            mantissa_digits += 1;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exponent_end = end + 1;
        if exponent_end < bytes.len() && (bytes[exponent_end] == b'+' || bytes[exponent_end] == b'-')
        {
            exponent_end += 1;
        }

        let exponent_digits_start = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }

        if exponent_end > exponent_digits_start {
            end = exponent_end;
        }
    }

    let literal = &value[..value.len() - unsigned.len() + end];
    literal
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .and_then(Number::from_f64)
}

fn strip_sign(value: &str) -> &str {
    value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value)
}
