//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VIVERO_PROJECT_ID` - Backend project identifier
//! - `VIVERO_API_KEY` - Backend API key
//!
//! ## Optional
//! - `VIVERO_AUTH_DOMAIN` - Auth domain (default: `<project>.firebaseapp.com`)
//! - `VIVERO_PRODUCTS_COLLECTION` - Products collection name (default: products)
//! - `VIVERO_USERS_COLLECTION` - Users collection name (default: users)
//! - `VIVERO_STORE_FILE` - Path of the local JSON store used by the CLI
//!   (default: vivero-store.json)

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend project identifier
    pub project_id: String,
    /// Backend API key
    pub api_key: SecretString,
    /// Auth domain for the hosted sign-in flow
    pub auth_domain: String,
    /// Collection holding product documents
    pub products_collection: String,
    /// Collection holding user profile documents (and per-user favorites)
    pub users_collection: String,
    /// Path of the local JSON store file (CLI / offline development)
    pub store_file: String,
}

impl StoreConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup, for tests.
    ///
    /// # Errors
    ///
    /// Same as [`StoreConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let project_id = required(&lookup, "VIVERO_PROJECT_ID")?;
        let api_key = SecretString::from(required(&lookup, "VIVERO_API_KEY")?);

        let auth_domain = lookup("VIVERO_AUTH_DOMAIN")
            .unwrap_or_else(|| format!("{project_id}.firebaseapp.com"));
        let products_collection = non_empty(
            &lookup,
            "VIVERO_PRODUCTS_COLLECTION",
            "products",
        )?;
        let users_collection = non_empty(&lookup, "VIVERO_USERS_COLLECTION", "users")?;
        let store_file =
            lookup("VIVERO_STORE_FILE").unwrap_or_else(|| "vivero-store.json".to_owned());

        Ok(Self {
            project_id,
            api_key,
            auth_domain,
            products_collection,
            users_collection,
            store_file,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            "must not be empty".to_owned(),
        )),
        None => Err(ConfigError::MissingEnvVar(name.to_owned())),
    }
}

fn non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            "must not be empty".to_owned(),
        )),
        Some(value) => Ok(value),
        None => Ok(default.to_owned()),
    }
}
