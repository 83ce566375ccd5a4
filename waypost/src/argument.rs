//! Resolved handler arguments and their conversion into typed handler parameters.

use crate::error::InvocationError;
use crate::next::Next;
use crate::request::Request;
use crate::response::Response;
use serde_json::{Map, Value};

/// A single resolved argument.
#[derive(Clone, Debug)]
pub enum Argument {
    Request(Request),
    Response(Response),
    Next(Next),
    /// Data taken from the request. Missing or unparsable data is `Value::Null`.
    Value(Value),
}

impl Argument {
    fn describe(argument: &Option<Argument>) -> &'static str {
        match argument {
            None => "nothing",
            Some(Argument::Request(_)) => "request",
            Some(Argument::Response(_)) => "response",
            Some(Argument::Next(_)) => "next",
            Some(Argument::Value(_)) => "value",
        }
    }
}

/// Positional handler arguments. Slots which no binding populated stay empty.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    slots: Vec<Option<Argument>>,
}

impl Arguments {
    /// The arguments passed to handlers without bindings: request, response and next.
    pub fn defaults(request: Request, response: Response, next: Next) -> Self {
        Self {
            slots: vec![
                Some(Argument::Request(request)),
                Some(Argument::Response(response)),
                Some(Argument::Next(next)),
            ],
        }
    }

    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub(crate) fn set(&mut self, slot: usize, argument: Argument) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }

        self.slots[slot] = Some(argument);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&Argument> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Moves the argument out of given slot.
    #[inline]
    pub fn take(&mut self, slot: usize) -> Option<Argument> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn value(&self, slot: usize) -> Option<&Value> {
        match self.get(slot) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn response(&self, slot: usize) -> Option<&Response> {
        match self.get(slot) {
            Some(Argument::Response(response)) => Some(response),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Argument>> {
        self.slots.iter().map(Option::as_ref)
    }
}

/// Type mismatch between a resolved argument and a handler parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArgumentMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ArgumentMismatch {
    fn new(expected: &'static str, argument: &Option<Argument>) -> Self {
        Self {
            expected,
            found: Argument::describe(argument),
        }
    }

    /// Attaches the position of the argument.
    pub fn at(self, member: &str, slot: usize) -> InvocationError {
        InvocationError::ArgumentMismatch {
            member: member.to_string(),
            slot,
            expected: self.expected,
            found: self.found,
        }
    }
}

/// Conversion of a resolved [Argument] into a handler parameter type. Data-carrying types are
/// lenient and map anything unexpected to `None`/`Value::Null`; only the ambient objects
/// ([Request], [Response], [Next]) require their argument to be present.
pub trait FromArgument: Sized {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch>;
}

impl FromArgument for Option<Argument> {
    #[inline]
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(argument)
    }
}

impl FromArgument for Value {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(value)) => value,
            _ => Value::Null,
        })
    }
}

impl FromArgument for Option<Value> {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(Value::Null)) | None => None,
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        })
    }
}

impl FromArgument for Option<String> {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(Value::String(value))) => Some(value),
            _ => None,
        })
    }
}

impl FromArgument for Option<i64> {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(value)) => value.as_i64(),
            _ => None,
        })
    }
}

impl FromArgument for Option<f64> {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(value)) => value.as_f64(),
            _ => None,
        })
    }
}

impl FromArgument for Option<bool> {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(value)) => value.as_bool(),
            _ => None,
        })
    }
}

impl FromArgument for Option<Map<String, Value>> {
    fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
        Ok(match argument {
            Some(Argument::Value(Value::Object(map))) => Some(map),
            _ => None,
        })
    }
}

macro_rules! ambient_from_argument {
    ($ty:ident, $name:literal) => {
        impl FromArgument for $ty {
            fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
                match argument {
                    Some(Argument::$ty(value)) => Ok(value),
                    other => Err(ArgumentMismatch::new($name, &other)),
                }
            }
        }

        impl FromArgument for Option<$ty> {
            fn from_argument(argument: Option<Argument>) -> Result<Self, ArgumentMismatch> {
                Ok(match argument {
                    Some(Argument::$ty(value)) => Some(value),
                    _ => None,
                })
            }
        }
    };
}

ambient_from_argument!(Request, "request");
ambient_from_argument!(Response, "response");
ambient_from_argument!(Next, "next");
