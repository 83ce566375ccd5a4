//! Functionality related to defining [Controller]s.

use crate::argument::Arguments;
use crate::handler::HandlerFuture;
use crate::metadata::ControllerMetadata;
use std::sync::Arc;

/// Main trait for controllers - collections of request handlers contained in typical structs,
/// grouped under a common URL prefix. Implementations are usually generated by the
/// `#[controller]` attribute macro, but can be written by hand:
///
/// ```
/// use std::sync::Arc;
/// use futures::FutureExt;
/// use serde_json::json;
/// use waypost::argument::Arguments;
/// use waypost::controller::Controller;
/// use waypost::error::InvocationError;
/// use waypost::handler::{fail, HandlerFuture};
/// use waypost::metadata::{ControllerMetadata, ParameterBinding};
///
/// struct HealthController;
///
/// impl Controller for HealthController {
///     fn declare(metadata: &mut ControllerMetadata) {
///         metadata.set_base_url("/health");
///         metadata
///             .ensure_route("check")
///             .get("/:probe")
///             .add_parameter(ParameterBinding::path(0, "probe"));
///     }
///
///     fn invoke(self: Arc<Self>, member: &str, arguments: Arguments) -> HandlerFuture {
///         match member {
///             "check" => {
///                 let probe = arguments.value(0).cloned();
///                 async move { Ok(json!({ "probe": probe, "ok": true })) }.boxed()
///             }
///             _ => fail(InvocationError::UnknownMember(member.to_string())),
///         }
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Declares routes of this controller type. Called once per type, before any registration.
    fn declare(metadata: &mut ControllerMetadata)
    where
        Self: Sized;

    /// Calls the handler named `member` with resolved arguments.
    fn invoke(self: Arc<Self>, member: &str, arguments: Arguments) -> HandlerFuture;
}
