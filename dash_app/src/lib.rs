use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("Failed to build application context: {0}")]
    Context(String),
}

pub trait ContextProvider<Config>: Sized {
    fn new(config: Config) -> impl Future<Output = Result<Self, AppError>>;
}

/// Install the JSON log subscriber used by every dashboard host.
///
/// The log level can be overridden with the `RUST_LOG` env var. Returns
/// `false` when a global subscriber was already installed, in which case
/// that subscriber is kept.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        // spans are not used for correlation, keep the entries flat
        .with_current_span(false)
        .with_ansi(false)
        // the process supervisor stamps each line already
        .without_time()
        .with_target(false)
        .try_init();

    match installed {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!("Keeping the existing log subscriber: {}", err);
            false
        }
    }
}

/// Extract a configuration record from environment variables.
///
/// Variables are read with the given `prefix`, and nested keys are separated
/// by a double underscore, so `DASHBOARD_GATEWAY__TIMEOUT_SECS` lands in
/// `gateway.timeout_secs`. Anything not set falls back to `Config::default()`.
///
/// # Errors
/// If a variable cannot be converted into the field it targets.
pub fn load_config<Config>(prefix: &str) -> Result<Config, figment::Error>
where
    Config: DeserializeOwned + Serialize + Default,
{
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(prefix).split("__"))
        .extract()
}

/// Initialize logging, load the configuration and build the application
/// context from it.
///
/// # Errors
/// If the configuration cannot be extracted from the environment variables
/// or if the context refuses the configuration.
pub async fn create_app_context<A, Config>(prefix: &str) -> Result<A, AppError>
where
    A: ContextProvider<Config>,
    Config: DeserializeOwned + Serialize + Default,
{
    init_tracing();

    let config: Config = load_config(prefix)?;

    A::new(config).await
}
