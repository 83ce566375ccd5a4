//! Routing configuration is represented by [RoutingConfig], which is consulted when controllers
//! are declared and registered.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by values from `waypost.json` file under the `routing` key, or by environment variables
//! prefixed with `WAYPOST_ROUTING__`, e.g. `WAYPOST_ROUTING__VALIDATE_BINDINGS=false`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "WAYPOST";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "waypost.json";

/// Default message sent by the error-wrapping adapter when a handler error has no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "an error has occurred processing request";

/// Decides which declaration survives when a route is declared with more than one verb.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The declaration applied last replaces earlier ones.
    #[default]
    LastWins,
    /// The first declaration is kept and later ones are ignored.
    FirstWins,
}

/// Routing configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoutingConfig {
    /// Resolution of repeated verb declarations on the same member.
    pub conflict_policy: ConflictPolicy,
    /// Fail registration when any route recorded a verb conflict.
    pub reject_verb_conflicts: bool,
    /// Check parameter slots for duplicates and gaps when registering a controller.
    pub validate_bindings: bool,
    /// Status code sent by the error-wrapping adapter.
    pub error_status: u16,
    /// Message sent by the error-wrapping adapter for errors without a message.
    pub default_error_message: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            reject_verb_conflicts: false,
            validate_bindings: true,
            error_status: 400,
            default_error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<OptionalRoutingConfig> for RoutingConfig {
    fn from(value: OptionalRoutingConfig) -> Self {
        let default = Self::default();
        Self {
            conflict_policy: value.conflict_policy.unwrap_or(default.conflict_policy),
            reject_verb_conflicts: value
                .reject_verb_conflicts
                .unwrap_or(default.reject_verb_conflicts),
            validate_bindings: value.validate_bindings.unwrap_or(default.validate_bindings),
            error_status: value.error_status.unwrap_or(default.error_status),
            default_error_message: value
                .default_error_message
                .unwrap_or(default.default_error_message),
        }
    }
}

impl RoutingConfig {
    /// Reads the config from `waypost.json` and the environment, using defaults for anything
    /// missing.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize::<OptionalRoutingConfigWrapper>())
            .map(|config| config.routing.map(|config| config.into()).unwrap_or_default())
    }
}

#[derive(Deserialize)]
struct OptionalRoutingConfig {
    conflict_policy: Option<ConflictPolicy>,
    reject_verb_conflicts: Option<bool>,
    validate_bindings: Option<bool>,
    error_status: Option<u16>,
    default_error_message: Option<String>,
}

#[derive(Deserialize)]
struct OptionalRoutingConfigWrapper {
    routing: Option<OptionalRoutingConfig>,
}
