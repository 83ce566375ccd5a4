//! Request handlers and route chains.
//!
//! Every element of a route chain - middleware and the compiled controller handler alike - is a
//! [RequestHandler] receiving the request, the shared response and a fresh [Next]. The chain
//! advances only when a handler calls [Next::call].

use crate::error::ErrorPtr;
use crate::next::{Next, NextState};
use crate::request::Request;
use crate::response::Response;
use futures::future::{ready, BoxFuture};
use futures::FutureExt;
use serde_json::Value;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Outcome of a handler: a value for the router layer, or an error.
pub type HandlerResult = Result<Value, ErrorPtr>;

/// Deferred [HandlerResult].
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// Element of a route chain.
pub type RequestHandler = Arc<dyn Fn(Request, Response, Next) -> HandlerFuture + Send + Sync>;

/// Conversion of handler return values into a [HandlerResult].
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    #[inline]
    fn into_handler_result(self) -> HandlerResult {
        Ok(Value::Null)
    }
}

impl IntoHandlerResult for Value {
    #[inline]
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoHandlerResult for String {
    #[inline]
    fn into_handler_result(self) -> HandlerResult {
        Ok(Value::String(self))
    }
}

impl IntoHandlerResult for &'static str {
    #[inline]
    fn into_handler_result(self) -> HandlerResult {
        Ok(Value::from(self))
    }
}

impl<T: IntoHandlerResult, E: Error + Send + Sync + 'static> IntoHandlerResult for Result<T, E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(|error| Arc::new(error) as ErrorPtr)
            .and_then(IntoHandlerResult::into_handler_result)
    }
}

/// Creates a [RequestHandler] from an async function, e.g. for use as middleware:
///
/// ```
/// use waypost::handler::handler_fn;
/// use waypost::next::Next;
/// use waypost::request::Request;
/// use waypost::response::Response;
///
/// let log = handler_fn(|request: Request, _: Response, next: Next| async move {
///     println!("{}", request.path());
///     next.call();
/// });
/// ```
pub fn handler_fn<F, Fut, R>(handler: F) -> RequestHandler
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + 'static,
{
    Arc::new(move |request, response, next| into_handler_future(handler(request, response, next)))
}

/// Boxes a future resolving to any [IntoHandlerResult].
pub fn into_handler_future<F, R>(future: F) -> HandlerFuture
where
    F: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + 'static,
{
    future.map(IntoHandlerResult::into_handler_result).boxed()
}

/// Creates an already resolved [HandlerFuture] from a synchronous handler result.
pub fn resolved<R: IntoHandlerResult>(result: R) -> HandlerFuture {
    ready(result.into_handler_result()).boxed()
}

/// Creates an already failed [HandlerFuture].
pub fn fail<E: Error + Send + Sync + 'static>(error: E) -> HandlerFuture {
    ready(Err(Arc::new(error) as ErrorPtr)).boxed()
}

/// Result of running a route chain.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainOutcome {
    /// A handler finished the chain, returning given value.
    Handled(Value),
    /// Every handler passed control on - the request should go to the next matching route.
    Passed,
}

/// Runs handlers in order until one of them does not call its [Next].
pub async fn run_chain(
    handlers: &[RequestHandler],
    request: &Request,
    response: &Response,
) -> Result<ChainOutcome, ErrorPtr> {
    for (index, handler) in handlers.iter().enumerate() {
        let next = Next::default();
        let value = handler(request.clone(), response.clone(), next.clone()).await?;

        match next.state() {
            NextState::Pending => return Ok(ChainOutcome::Handled(value)),
            NextState::Failed(error) => return Err(error),
            NextState::Proceed => {
                debug!(path = request.path(), index, "Passing request to the next handler");
            }
        }
    }

    Ok(ChainOutcome::Passed)
}

#[cfg(test)]
mod tests {
    use crate::error::InvocationError;
    use crate::handler::{
        fail, handler_fn, into_handler_future, run_chain, ChainOutcome, IntoHandlerResult,
        RequestHandler,
    };
    use crate::next::Next;
    use crate::request::Request;
    use crate::response::Response;
    use http::StatusCode;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[test]
    fn should_convert_return_values() {
        assert_eq!(().into_handler_result().unwrap(), Value::Null);
        assert_eq!("a".into_handler_result().unwrap(), json!("a"));
        assert!(Err::<(), _>(InvocationError::UnknownMember("a".to_string()))
            .into_handler_result()
            .is_err());
    }

    #[tokio::test]
    async fn should_box_handler_futures() {
        let value = into_handler_future(async { Ok::<_, InvocationError>(json!({ "a": 1 })) })
            .await
            .unwrap();
        assert_eq!(value, json!({ "a": 1 }));

        let error = into_handler_future(async {
            Err::<Value, _>(InvocationError::UnknownMember("b".to_string()))
        })
        .await
        .unwrap_err();
        assert_eq!(error.to_string(), "Controller has no handler named 'b'");
    }

    #[tokio::test]
    async fn should_run_until_handler_does_not_call_next() {
        let calls = Arc::new(Mutex::new(vec![]));
        let first_calls = calls.clone();
        let second_calls = calls.clone();
        let third_calls = calls.clone();

        let handlers = vec![
            handler_fn(move |_: Request, _: Response, next: Next| {
                let calls = first_calls.clone();
                async move {
                    calls.lock().push(1);
                    next.call();
                }
            }),
            handler_fn(move |_: Request, response: Response, _: Next| {
                let calls = second_calls.clone();
                async move {
                    calls.lock().push(2);
                    response.status(StatusCode::CREATED);
                    json!("done")
                }
            }),
            handler_fn(move |_: Request, _: Response, _: Next| {
                let calls = third_calls.clone();
                async move {
                    calls.lock().push(3);
                }
            }),
        ];

        let response = Response::default();
        let outcome = run_chain(&handlers, &Request::default(), &response)
            .await
            .unwrap();

        assert_eq!(outcome, ChainOutcome::Handled(json!("done")));
        assert_eq!(*calls.lock(), vec![1, 2]);
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn should_pass_when_all_handlers_call_next() {
        let handlers = vec![handler_fn(|_: Request, _: Response, next: Next| async move {
            next.call();
        })];

        assert_eq!(
            run_chain(&handlers, &Request::default(), &Response::default())
                .await
                .unwrap(),
            ChainOutcome::Passed
        );
    }

    #[tokio::test]
    async fn should_stop_on_errors() {
        let handlers = vec![
            handler_fn(|_: Request, _: Response, next: Next| async move {
                next.fail(Arc::new(InvocationError::UnknownMember("x".to_string())));
            }),
            Arc::new(|_: Request, _: Response, _: Next| {
                fail(InvocationError::UnknownMember("unreachable".to_string()))
            }) as RequestHandler,
        ];

        let error = run_chain(&handlers, &Request::default(), &Response::default())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Controller has no handler named 'x'");
    }
}
