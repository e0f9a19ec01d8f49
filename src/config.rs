//! Resolves the endpoint and credentials for a run.
//!
//! Sources, highest precedence first: command-line values, the TOML config
//! file, and finally the auth token file written by zabbix-cli.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::{Endpoint, TransportOptions};
use crate::session::Credentials;

const TOKEN_TAG: &str = "cli::";
const TOKEN_LEN: usize = 32;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token_file: Option<PathBuf>,
    pub timezone: Option<String>,
    pub timeout_secs: Option<u64>,
    pub insecure: Option<bool>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid config file: {e}")))
    }

    /// Loads `path`, or the default location when none is given.
    ///
    /// Only an explicitly named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded config file");
                Self::parse(&content)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!(
                "cannot read config file {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token_file: Option<PathBuf>,
    pub timezone: Option<String>,
    pub timeout_secs: Option<u64>,
    pub insecure: bool,
}

/// Everything the core needs, resolved up front.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Endpoint,
    pub credentials: Option<Credentials>,
    pub transport: TransportOptions,
    pub timezone: Option<Tz>,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let url = overrides
            .url
            .or(file.url)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config("missing URL".to_string()))?;

        let credentials = match explicit_credentials(overrides.user, overrides.password)? {
            Some(c) => Some(c),
            None => match explicit_credentials(file.user, file.password)? {
                Some(c) => Some(c),
                None => {
                    let path = overrides.token_file.or(file.token_file).or_else(default_token_path);
                    path.as_deref().and_then(read_token_file).map(Credentials::Token)
                }
            },
        };

        let timezone = overrides
            .timezone
            .or(file.timezone)
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| Error::Config(format!("unknown timezone '{name}'")))
            })
            .transpose()?;

        let timeout = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            endpoint: Endpoint::new(url),
            credentials,
            transport: TransportOptions {
                timeout: Duration::from_secs(timeout),
                accept_invalid_certs: overrides.insecure || file.insecure.unwrap_or(false),
            },
            timezone,
        })
    }
}

fn explicit_credentials(user: Option<String>, password: Option<String>) -> Result<Option<Credentials>> {
    match (user, password) {
        (Some(user), Some(password)) => Ok(Some(Credentials::Password { user, password })),
        (Some(user), None) => Err(Error::Config(format!("password missing for user '{user}'"))),
        (None, Some(_)) => Err(Error::Config("password given without user".to_string())),
        (None, None) => Ok(None),
    }
}

/// Extracts the token from the content of a zabbix-cli token file.
pub fn parse_token(content: &str) -> Option<String> {
    let content = content.trim_end();
    let token = content.strip_prefix(TOKEN_TAG)?;
    (token.chars().count() == TOKEN_LEN).then(|| token.to_string())
}

fn read_token_file(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let token = parse_token(&content);
    if token.is_none() {
        debug!(path = %path.display(), "ignoring malformed token file");
    }
    token
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zabbix-maintenance").join("config.toml"))
}

fn default_token_path() -> Option<PathBuf> {
    dirs::home_dir().map(|d| d.join(".zabbix-cli_auth_token"))
}
