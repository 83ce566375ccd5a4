//! Registry of controller metadata, keyed by controller type.

use crate::compiler::compile_controller;
use crate::config::RoutingConfig;
use crate::controller::Controller;
use crate::error::ConfigurationError;
use crate::metadata::ControllerMetadata;
use crate::router::Router;
use fxhash::{FxHashMap, FxHashSet};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::sync::Arc;
use tracing::warn;

static GLOBAL_REGISTRY: Lazy<RwLock<ControllerRegistry>> = Lazy::new(|| {
    RwLock::new(ControllerRegistry::from_environment().unwrap_or_else(|error| {
        warn!("Cannot read routing configuration, using defaults: {}", error);
        ControllerRegistry::default()
    }))
});

/// Returns the process-wide registry, used by [register_controller].
pub fn global_registry() -> &'static RwLock<ControllerRegistry> {
    &GLOBAL_REGISTRY
}

/// Declares the controller type in the global registry, if not done already, and registers the
/// controller instance with the router.
pub fn register_controller<C: Controller, R: Router + ?Sized>(
    router: &mut R,
    controller: Arc<C>,
) -> Result<(), ConfigurationError> {
    GLOBAL_REGISTRY.write().register(router, controller)
}

/// Holds [ControllerMetadata] for every controller type touched by a declaration.
#[derive(Clone, Debug, Default)]
pub struct ControllerRegistry {
    config: RoutingConfig,
    controllers: FxHashMap<TypeId, ControllerMetadata>,
    declared: FxHashSet<TypeId>,
}

impl ControllerRegistry {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            config,
            controllers: Default::default(),
            declared: Default::default(),
        }
    }

    /// Creates a registry using [RoutingConfig::init_from_environment].
    pub fn from_environment() -> Result<Self, config::ConfigError> {
        RoutingConfig::init_from_environment().map(Self::new)
    }

    #[inline]
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Returns metadata for given type, creating an empty entry if needed.
    pub fn ensure_controller<C: 'static>(&mut self) -> &mut ControllerMetadata {
        let conflict_policy = self.config.conflict_policy;
        self.controllers
            .entry(TypeId::of::<C>())
            .or_insert_with(|| ControllerMetadata::with_policy(type_name::<C>(), conflict_policy))
    }

    /// Runs [Controller::declare] for given type, once.
    pub fn declare<C: Controller>(&mut self) -> &ControllerMetadata {
        let first_declaration = self.declared.insert(TypeId::of::<C>());
        let metadata = self.ensure_controller::<C>();
        if first_declaration {
            C::declare(metadata);
        }

        metadata
    }

    #[inline]
    pub fn metadata<C: 'static>(&self) -> Option<&ControllerMetadata> {
        self.controllers.get(&TypeId::of::<C>())
    }

    #[inline]
    pub fn is_declared<C: 'static>(&self) -> bool {
        self.declared.contains(&TypeId::of::<C>())
    }

    /// Compiles existing metadata of the controller type and registers its routes with the
    /// router. Registering the same controller twice duplicates its routes.
    pub fn register_controller<C: Controller, R: Router + ?Sized>(
        &self,
        router: &mut R,
        controller: Arc<C>,
    ) -> Result<(), ConfigurationError> {
        let metadata = self
            .metadata::<C>()
            .ok_or_else(|| ConfigurationError::MissingMetadata(type_name::<C>().to_string()))?;

        compile_controller(metadata, &self.config, controller, router)
    }

    /// Declares the controller type, if needed, and registers the controller.
    pub fn register<C: Controller, R: Router + ?Sized>(
        &mut self,
        router: &mut R,
        controller: Arc<C>,
    ) -> Result<(), ConfigurationError> {
        self.declare::<C>();
        self.register_controller(router, controller)
    }
}
