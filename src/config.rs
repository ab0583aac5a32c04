// esu - ElasticSearch Utility for managing an Elasticsearch cluster
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "9200";

pub const HOST_ENV: &str = "ESU_HOST";
pub const PORT_ENV: &str = "ESU_PORT";
pub const SSL_ENV: &str = "ESU_SSL";
pub const CONFIG_DIR_ENV: &str = "ESU_CONFIG_DIR";

/// Connection defaults persisted with `esu configure`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<String>,
    pub ssl: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
}

/// Values passed explicitly on the command line. `ssl` is a plain switch, so
/// `false` means "not passed".
#[derive(Debug, Default, Clone)]
pub struct ConnectionFlags {
    pub host: Option<String>,
    pub port: Option<String>,
    pub ssl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub ssl: bool,
}

impl ConnectionConfig {
    /// Resolves each field as flag, then environment, then config file, then
    /// the built-in default.
    pub fn resolve<F>(flags: &ConnectionFlags, env_lookup: F, file: &Config) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env_lookup(key).filter(|v| !v.trim().is_empty());

        let host = flags
            .host
            .clone()
            .or_else(|| lookup(HOST_ENV))
            .or_else(|| file.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = flags
            .port
            .clone()
            .or_else(|| lookup(PORT_ENV))
            .or_else(|| file.port.clone())
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        let ssl = flags.ssl
            || lookup(SSL_ENV)
                .map(|v| is_truthy(&v))
                .or(file.ssl)
                .unwrap_or(false);

        Self { host, port, ssl }
    }

    pub fn scheme(&self) -> &'static str {
        if self.ssl { "https" } else { "http" }
    }

    pub fn base_url(&self) -> Result<Url> {
        let raw = self.to_string();
        Url::parse(&raw).with_context(|| format!("invalid cluster address `{raw}`"))
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// Resolves the connection for this invocation from flags, the process
/// environment and any config files.
pub fn connection(cwd: &Path, flags: &ConnectionFlags) -> Result<ConnectionConfig> {
    let file = load(cwd)?;
    Ok(ConnectionConfig::resolve(flags, |key| env::var(key).ok(), &file))
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".esu.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var(CONFIG_DIR_ENV) {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("esu").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    Config {
        host: local.host.or(user.host),
        port: local.port.or(user.port),
        ssl: local.ssl.or(user.ssl),
    }
}
