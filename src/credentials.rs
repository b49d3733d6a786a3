//! Catalog client credentials from the environment, the OS keyring, or the config file.

use std::fmt;

use keyring::Entry;
use log::{debug, warn};

use crate::config::CatalogConfig;

const CATALOG_SERVICE_NAME: &str = "genretag.catalog";
pub const CLIENT_ID_ENV: &str = "GENRETAG_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "GENRETAG_CLIENT_SECRET";

/// Opaque client id/secret pair for the catalog service.
#[derive(Clone, PartialEq, Eq)]
pub struct CatalogCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for CatalogCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no catalog client id: set GENRETAG_CLIENT_ID or [catalog] client_id in the config file")]
    MissingClientId,
    #[error(
        "no catalog client secret for client id '{client_id}': set GENRETAG_CLIENT_SECRET, store it in the system keyring (service 'genretag.catalog'), or set [catalog] client_secret"
    )]
    MissingClientSecret { client_id: String },
}

fn keyring_error_hint(error: &str) -> Option<String> {
    if error.contains("org.freedesktop.DBus.Error.ServiceUnknown") {
        return Some(
            "no Secret Service provider is available. Start GNOME Keyring or KeePassXC Secret Service."
                .to_string(),
        );
    }
    None
}

fn format_keyring_error(operation: &str, client_id: &str, error: &str) -> String {
    let base = format!("{operation} failed in system keyring for client id '{client_id}': {error}");
    match keyring_error_hint(error) {
        Some(hint) => format!("{base}. Hint: {hint}"),
        None => base,
    }
}

/// Loads the client secret for `client_id` from the OS keyring.
pub fn get_client_secret_from_keyring(client_id: &str) -> Result<Option<String>, String> {
    let entry = Entry::new(CATALOG_SERVICE_NAME, client_id).map_err(|err| {
        format!("failed to create keyring entry for client id '{client_id}': {err}")
    })?;
    match entry.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => {
            let detail = format!("failed to get keyring password: {err}");
            Err(format_keyring_error(
                "load catalog credential",
                client_id,
                detail.as_str(),
            ))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_value(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

fn resolve_credentials_from<F>(
    env_client_id: Option<String>,
    env_client_secret: Option<String>,
    config: &CatalogConfig,
    keyring_lookup: F,
) -> Result<CatalogCredentials, CredentialError>
where
    F: FnOnce(&str) -> Result<Option<String>, String>,
{
    let client_id = non_empty(env_client_id)
        .or_else(|| non_empty(Some(config.client_id.clone())))
        .ok_or(CredentialError::MissingClientId)?;

    let client_secret = match non_empty(env_client_secret) {
        Some(secret) => Some(secret),
        None => {
            let from_keyring = match keyring_lookup(&client_id) {
                Ok(secret) => non_empty(secret),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            };
            if from_keyring.is_some() {
                debug!("Using catalog client secret from the system keyring");
            }
            from_keyring.or_else(|| non_empty(Some(config.client_secret.clone())))
        }
    };

    let client_secret =
        client_secret.ok_or_else(|| CredentialError::MissingClientSecret {
            client_id: client_id.clone(),
        })?;

    Ok(CatalogCredentials {
        client_id,
        client_secret,
    })
}

/// Resolves credentials: environment first, then keyring (secret only), then config.
pub fn resolve_credentials(config: &CatalogConfig) -> Result<CatalogCredentials, CredentialError> {
    resolve_credentials_from(
        env_value(CLIENT_ID_ENV),
        env_value(CLIENT_SECRET_ENV),
        config,
        get_client_secret_from_keyring,
    )
}
