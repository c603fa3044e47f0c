use crate::client::BasicAuth;
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "LEDFX_BRIDGE_";
pub const MIN_SCAN_INTERVAL_SECS: u64 = 7;
pub const MIN_TIMEOUT_SECS: u64 = 10;

const REDACTED: &str = "**REDACTED**";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            scan_interval: default_scan_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_scan_interval() -> u64 {
    MIN_SCAN_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    MIN_TIMEOUT_SECS
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "ledfx", "ledfx-bridge").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Project config file, then `LEDFX_BRIDGE_*` variables.
    pub fn load() -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = Self::config_path() {
            figment = figment.merge(Toml::file(path));
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn load_from_path(path: &str) -> Result<Self, figment::Error> {
        let path = PathBuf::from(shellexpand::tilde(path).into_owned());
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        Self::extract(figment)
    }

    pub fn extract(figment: Figment) -> Result<Self, figment::Error> {
        let config: Config = figment.extract()?;

        Ok(config.with_floors())
    }

    /// Raises the interval and timeout to their minimums.
    pub fn with_floors(mut self) -> Self {
        if self.scan_interval < MIN_SCAN_INTERVAL_SECS {
            tracing::warn!(
                "scan_interval {}s is below the minimum, using {}s",
                self.scan_interval,
                MIN_SCAN_INTERVAL_SECS
            );
            self.scan_interval = MIN_SCAN_INTERVAL_SECS;
        }
        if self.timeout < MIN_TIMEOUT_SECS {
            tracing::warn!("timeout {}s is below the minimum, using {}s", self.timeout, MIN_TIMEOUT_SECS);
            self.timeout = MIN_TIMEOUT_SECS;
        }
        self
    }

    /// Basic auth, only when both halves are set.
    pub fn auth(&self) -> Option<BasicAuth> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(BasicAuth::new(username.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }

    /// Copy safe to print or attach to diagnostics.
    pub fn redacted(&self) -> Self {
        Self {
            username: self.username.as_ref().map(|_| REDACTED.to_string()),
            password: self.password.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}
