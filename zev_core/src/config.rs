//! Environment based configuration of the CRM connection.

use std::{num::ParseIntError, time::Duration};

use thiserror::Error;

use crate::event::FilterMode;

static DEFAULT_URL: &str = "https://25098.zebracrm.com/ext_interface.php?b=get_multi_cards_details";
static DEFAULT_CARD_TYPE_FILTER: &str = "EVEFAM";
static DEFAULT_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const DEFAULT_TIMEOUT_SECS: u64 = 40;

static ENV_URL: &str = "ZEBRA_GET_URL";
static ENV_USER: &str = "ZEBRA_USER";
static ENV_PASS: &str = "ZEBRA_PASS";
static ENV_CARD_TYPE_FILTER: &str = "ZEBRA_CARD_TYPE_FILTER";
static ENV_CONTENT_TYPE: &str = "ZEBRA_CONTENT_TYPE";
static ENV_TIMEOUT_SECS: &str = "ZEBRA_TIMEOUT_SECS";
static ENV_FILTER_MODE: &str = "ZEBRA_FILTER_MODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CRM credentials are missing; please set both ZEBRA_USER and ZEBRA_PASS.")]
    MissingCredentials,

    #[error("'{value}' is not a valid timeout in seconds for ZEBRA_TIMEOUT_SECS: {source}")]
    InvalidTimeout {
        value: String,
        source: ParseIntError,
    },

    #[error("'{0}' is not a valid filter mode for ZEBRA_FILTER_MODE; expected 'strict' or 'diagnostic'.")]
    InvalidFilterMode(String),
}

/// Everything needed to talk to the CRM and to decide which events are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ZebraConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub card_type_filter: String,
    pub content_type: String,
    pub timeout: Duration,
    pub filter_mode: FilterMode,
}

/// A username and password which are both known to be non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> Credentials<'a> {
    pub fn new(username: &'a str, password: &'a str) -> Result<Self, ConfigError> {
        if username.is_empty() || password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &'a str {
        self.username
    }

    pub fn password(&self) -> &'a str {
        self.password
    }
}

impl ZebraConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, treating empty values as unset.
    ///
    /// Missing credentials are not an error here; they are checked by [`Self::credentials`]
    /// right before a request is built.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(value) => {
                let secs = value
                    .parse::<u64>()
                    .map_err(|source| ConfigError::InvalidTimeout {
                        value: value.clone(),
                        source,
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let filter_mode = match get(ENV_FILTER_MODE) {
            Some(value) => value.parse()?,
            None => FilterMode::default(),
        };

        Ok(Self {
            url: get(ENV_URL).unwrap_or_else(|| DEFAULT_URL.to_string()),
            username: get(ENV_USER).unwrap_or_default(),
            password: get(ENV_PASS).unwrap_or_default(),
            card_type_filter: get(ENV_CARD_TYPE_FILTER)
                .unwrap_or_else(|| DEFAULT_CARD_TYPE_FILTER.to_string()),
            content_type: get(ENV_CONTENT_TYPE).unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            timeout,
            filter_mode,
        })
    }

    /// The configured credentials, or an error if either of them is empty.
    pub fn credentials(&self) -> Result<Credentials<'_>, ConfigError> {
        Credentials::new(&self.username, &self.password)
    }
}
