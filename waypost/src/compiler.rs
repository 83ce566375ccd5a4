//! Compilation of controller metadata into router registrations.

use crate::argument::Argument;
use crate::catch::ErrorReporter;
use crate::config::RoutingConfig;
use crate::controller::Controller;
use crate::error::ConfigurationError;
use crate::handler::RequestHandler;
use crate::metadata::{ControllerMetadata, RouteDeclaration};
use crate::next::Next;
use crate::request::Request;
use crate::resolver::resolve_arguments;
use crate::response::Response;
use crate::router::{RouteTable, Router, RouterExt};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Registers all routes declared in `metadata` for given controller instance. Routes are added
/// to a fresh [RouteTable], in member name order, which is then nested in `router` under the
/// controller base URL.
pub fn compile_controller<R: Router + ?Sized>(
    metadata: &ControllerMetadata,
    config: &RoutingConfig,
    controller: Arc<dyn Controller>,
    router: &mut R,
) -> Result<(), ConfigurationError> {
    if config.validate_bindings {
        metadata.validate(config.reject_verb_conflicts)?;
    }

    let reporter = ErrorReporter::try_from(config)?;

    let mut routes = RouteTable::new();
    for declaration in metadata.routes() {
        let verb = declaration
            .verb()
            .ok_or_else(|| ConfigurationError::MissingVerb {
                controller: metadata.type_name().to_string(),
                member: declaration.member().to_string(),
            })?;

        debug!(
            controller = metadata.type_name(),
            member = declaration.member(),
            %verb,
            path = declaration.path(),
            "Compiling route"
        );

        let handlers = declaration
            .middleware()
            .iter()
            .cloned()
            .chain([handler_adapter(
                controller.clone(),
                Arc::new(declaration.clone()),
                reporter.clone(),
            )])
            .collect();

        routes.route(verb, declaration.path(), handlers);
    }

    info!(
        controller = metadata.type_name(),
        base_url = metadata.base_url(),
        routes = routes.len(),
        "Registering controller"
    );

    router.nest(metadata.base_url(), routes);
    Ok(())
}

/// Creates the last handler of a route chain: resolves arguments for the declaration and invokes
/// the controller member.
pub fn handler_adapter(
    controller: Arc<dyn Controller>,
    declaration: Arc<RouteDeclaration>,
    reporter: ErrorReporter,
) -> RequestHandler {
    Arc::new(move |request: Request, response: Response, next: Next| {
        let arguments = resolve_arguments(declaration.parameters(), &request, &response, &next);
        let target = declaration
            .response_slot()
            .and_then(|slot| match arguments.get(slot) {
                Some(Argument::Response(response)) => Some(response.clone()),
                _ => None,
            });

        let invocation = controller
            .clone()
            .invoke(declaration.member(), arguments);

        if declaration.catches_errors() {
            reporter
                .clone()
                .catch_and_send_error(target, invocation)
                .boxed()
        } else {
            invocation
        }
    })
}
