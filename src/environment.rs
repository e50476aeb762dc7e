use crate::configuration::{StoreSettings, StoresSettings};
use crate::domain::Environment;
use crate::error::ConfigurationError;
use crate::store::{self, StoreClient};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Binds each [`Environment`] tag to its store client.
///
/// All validation happens in [`EnvironmentResolver::new`]; once built,
/// resolving a tag cannot fail.
#[derive(Clone)]
pub struct EnvironmentResolver {
    dev: Arc<dyn StoreClient>,
    prod: Arc<dyn StoreClient>,
}

impl EnvironmentResolver {
    #[tracing::instrument(name = "Build environment resolver", skip(settings))]
    pub fn new(settings: &StoresSettings) -> Result<Self, ConfigurationError> {
        check_complete(Environment::Dev, &settings.dev)?;
        check_complete(Environment::Prod, &settings.prod)?;

        let endpoint = settings.dev.endpoint();
        if endpoint == settings.prod.endpoint() {
            return Err(ConfigurationError::SharedEndpoint(endpoint));
        }

        Ok(Self {
            dev: store::connect(&settings.dev),
            prod: store::connect(&settings.prod),
        })
    }

    pub fn resolve(&self, environment: Environment) -> Arc<dyn StoreClient> {
        match environment {
            Environment::Dev => Arc::clone(&self.dev),
            Environment::Prod => Arc::clone(&self.prod),
        }
    }
}

fn check_complete(
    environment: Environment,
    settings: &StoreSettings,
) -> Result<(), ConfigurationError> {
    let required = [
        ("host", settings.host.as_str()),
        ("database_name", settings.database_name.as_str()),
        ("username", settings.username.as_str()),
        ("password", settings.password.expose_secret().as_str()),
    ];
    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ConfigurationError::Missing {
            environment,
            field: *field,
        }),
        None => Ok(()),
    }
}
