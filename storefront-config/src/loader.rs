//! Client configuration and where it is loaded from.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, policy::RouteProtectionPolicy};

/// Path of a TOML or JSON config file.
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG_PATH";
/// Inline JSON config body.
pub const CONFIG_JSON_ENV: &str = "STOREFRONT_CONFIG_JSON";
/// Overrides `server_url` after loading.
pub const SERVER_URL_ENV: &str = "STOREFRONT_SERVER_URL";
/// Overrides `session_file` after loading.
pub const SESSION_FILE_ENV: &str = "STOREFRONT_SESSION_FILE";

const SESSION_FILE_NAME: &str = "session.json";

/// Source that produced the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// Built-in defaults; nothing was found.
    #[default]
    Default,
    /// File named by `$STOREFRONT_CONFIG_PATH`.
    EnvPath(PathBuf),
    /// JSON in `$STOREFRONT_CONFIG_JSON`.
    EnvInline,
    /// Default file found in the working directory.
    File(PathBuf),
}

/// Settings for the storefront client and its session core.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL. A missing scheme is filled in with `http://` when
    /// the client is built.
    pub server_url: String,
    /// Per-request timeout applied by the HTTP client.
    #[serde(with = "crate::duration_serde")]
    pub request_timeout: Duration,
    /// How long a notification stays visible before it clears itself.
    #[serde(with = "crate::duration_serde")]
    pub notification_timeout: Duration,
    /// Where the durable session lives. Falls back to the platform data
    /// directory when unset.
    pub session_file: Option<PathBuf>,
    /// Which pages need a session and where to go when it is lost.
    pub policy: RouteProtectionPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(30),
            notification_timeout: Duration::from_secs(5),
            session_file: None,
            policy: RouteProtectionPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration for the running process.
    ///
    /// Reads `.env` first, then resolves the config body in this order:
    /// 1) `$STOREFRONT_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$STOREFRONT_CONFIG_JSON` (inline JSON),
    /// 3) a `storefront.{toml,json}` file in the working directory or `config/`,
    /// 4) defaults.
    ///
    /// `$STOREFRONT_SERVER_URL` and `$STOREFRONT_SESSION_FILE` override the
    /// loaded values.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            log::warn!("[Config] Ignoring unreadable .env file: {}", err);
        }

        let (mut config, source) = Self::load_from_env()?;
        config.apply_env_overrides();
        config.validate()?;

        log::debug!("[Config] Loaded client config from {:?}", source);
        Ok((config, source))
    }

    /// Resolve the config body from the environment, default files or
    /// defaults, without overrides or validation.
    pub fn load_from_env() -> Result<(Self, ConfigSource), ConfigError> {
        if let Ok(path_str) = env::var(CONFIG_PATH_ENV)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var(CONFIG_JSON_ENV)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw, CONFIG_JSON_ENV)?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    /// Parse one file; the extension picks the format, anything else is
    /// tried as TOML and then JSON.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let origin = path.display().to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents, &origin),
            Some("toml") | Some("tml") => toml::from_str(&contents)
                .map_err(|err| ConfigError::Parse {
                    origin,
                    message: err.to_string(),
                }),
            _ => Self::parse_from_str(&contents, &origin),
        }
    }

    /// Parse a body of unknown format. `origin` names it in errors.
    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> Result<Self, ConfigError> {
        // Try TOML first, then JSON for convenience.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                ConfigError::Parse {
                    origin: origin.to_string(),
                    message: format!(
                        "toml error: {}; json error: {}",
                        toml_err, json_err
                    ),
                }
            })
        })
    }

    fn parse_json(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::Parse {
            origin: origin.to_string(),
            message: err.to_string(),
        })
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "storefront.toml",
            "storefront.json",
            "config/storefront.toml",
            "config/storefront.json",
        ];

        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(|path| path.to_path_buf())
    }

    /// Apply `$STOREFRONT_SERVER_URL` and `$STOREFRONT_SESSION_FILE`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(server_url) = env::var(SERVER_URL_ENV)
            && !server_url.trim().is_empty()
        {
            self.server_url = server_url;
        }

        if let Ok(session_file) = env::var(SESSION_FILE_ENV)
            && !session_file.trim().is_empty()
        {
            self.session_file = Some(PathBuf::from(session_file));
        }
    }

    /// Reject empty URLs, zero timeouts and an inconsistent policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server_url must not be empty".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than zero".into(),
            ));
        }
        if self.notification_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "notification_timeout must be greater than zero".into(),
            ));
        }
        self.policy.validate()
    }

    /// Resolved location of the durable session file.
    pub fn session_file_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }

        let proj_dirs = ProjectDirs::from("", "storefront", "storefront-client")
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "unable to determine data directory for the session file"
                        .into(),
                )
            })?;
        Ok(proj_dirs.data_dir().join(SESSION_FILE_NAME))
    }
}
