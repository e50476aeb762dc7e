use crate::domain::{Environment, SubscriberEmail};
use crate::error::ConfigurationError;
use crate::template::Branding;
use secrecy::{ExposeSecret, Secret};
use serde;
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use std::net::IpAddr;

/// Which configuration file is layered over `base`.
pub enum Profile {
    Local,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub stores: StoresSettings,
    pub email_client: EmailClientSettings,
    pub newsletter: Branding,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_option_number_from_string")]
    pub port: Option<u16>,
    pub host: IpAddr,
    pub base_url: String,
    /// The store the public site reads and subscribes against.
    pub environment: Environment,
}

#[derive(serde::Deserialize, Clone)]
pub struct StoresSettings {
    pub dev: StoreSettings,
    pub prod: StoreSettings,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Postgres
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, ConfigurationError> {
        SubscriberEmail::parse(self.sender_email.clone()).map_err(ConfigurationError::InvalidSender)
    }

    /// The `From` header value, e.g. `Jane <newsletter@example.com>`.
    pub fn from_address(&self) -> Result<String, ConfigurationError> {
        let sender = self.sender()?;
        Ok(match self.sender_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} <{}>", name, sender),
            _ => sender.to_string(),
        })
    }
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Local => "local",
            Profile::Production => "production",
        }
    }
}

impl TryFrom<String> for Profile {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported profile. Use either 'local' or 'production'.",
                other
            )),
        }
    }
}

impl StoreSettings {
    /// Identifies the store independently of its credential. Two settings with
    /// the same endpoint point at the same data.
    pub fn endpoint(&self) -> String {
        let scheme = match self.backend {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        };
        format!(
            "{}://{}:{}/{}",
            scheme,
            self.host.trim().to_lowercase(),
            self.port,
            self.database_name.trim()
        )
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name,
            ssl_mode(self.require_ssl)
        )
    }

    /// The server-level connection, used to create and drop databases.
    pub fn connection_string_without_database(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            ssl_mode(self.require_ssl)
        )
    }
}

fn ssl_mode(require_ssl: bool) -> &'static str {
    match require_ssl {
        true => "require",
        false => "prefer",
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");
    let profile: Profile = std::env::var("APP_PROFILE")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let mut settings = config::Config::default();
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    settings.merge(
        config::File::from(configuration_directory.join(profile.as_str())).required(true),
    )?;
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;
    settings.try_into()
}
