/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result, anyhow};
use clap::Args;
use connector::{RequestConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    #[arg(long, global = true, env = "HYDRA_HOST")]
    pub host: Option<String>,
    #[arg(long, global = true, env = "HYDRA_USERNAME")]
    pub username: Option<String>,
    #[arg(long, global = true, env = "HYDRA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, global = true, env = "HYDRA_PASSWORD_FILE")]
    pub password_file: Option<String>,
    #[arg(long, global = true, env = "HYDRA_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, env = "HYDRA_TIMEOUT", value_parser = greater_than_zero::<u64>, default_value = "60")]
    pub timeout: u64,
    #[arg(long, global = true, env = "HYDRA_MAX_RETRIES", default_value = "10")]
    pub max_retries: u32,
    #[arg(long, global = true, env = "HYDRA_RETRY_WAIT_MIN", value_parser = greater_than_zero::<u64>, default_value = "1")]
    pub retry_wait_min: u64,
    #[arg(long, global = true, env = "HYDRA_RETRY_WAIT_MAX", value_parser = greater_than_zero::<u64>, default_value = "30")]
    pub retry_wait_max: u64,
}

/// Optional defaults read from `config.toml`. Command line and environment win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password_file: Option<String>,
}

impl ConfigFile {
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("hydra-provider");
        path.push("config.toml");
        Some(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))
    }

    /// An explicitly given path must exist; the default location is optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(ConfigFile::default()),
        }
    }
}

impl ProviderArgs {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        if self.retry_wait_min > self.retry_wait_max {
            return Err(anyhow!(
                "retry-wait-min ({}s) must not exceed retry-wait-max ({}s)",
                self.retry_wait_min,
                self.retry_wait_max
            ));
        }

        Ok(RetryPolicy {
            wait_min: Duration::from_secs(self.retry_wait_min),
            wait_max: Duration::from_secs(self.retry_wait_max),
            max_retries: self.max_retries,
        })
    }

    pub fn request_config(&self, file: &ConfigFile) -> Result<RequestConfig> {
        let host = self
            .host
            .clone()
            .or_else(|| file.host.clone())
            .ok_or_else(|| anyhow!("No Hydra host configured, set --host or HYDRA_HOST"))?;

        let username = self
            .username
            .clone()
            .or_else(|| file.username.clone())
            .ok_or_else(|| anyhow!("No Hydra username configured, set --username or HYDRA_USERNAME"))?;

        let password = match (&self.password, &self.password_file, &file.password_file) {
            (Some(password), _, _) => password.clone(),
            (None, Some(path), _) | (None, None, Some(path)) => load_secret(path)?,
            (None, None, None) => {
                return Err(anyhow!(
                    "No Hydra password configured, set HYDRA_PASSWORD or HYDRA_PASSWORD_FILE"
                ));
            }
        };

        let mut config = RequestConfig::new(host, username, password);
        config.timeout = Duration::from_secs(self.timeout);
        config.retry = self.retry_policy()?;

        Ok(config)
    }
}

pub fn greater_than_zero<
    T: std::str::FromStr + std::cmp::PartialOrd + std::fmt::Display + Default,
>(
    s: &str,
) -> Result<T, String> {
    let num: T = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number", s))?;

    if num > T::default() {
        Ok(num)
    } else {
        Err(format!("`{}` is not larger than 0", s))
    }
}

/// Reads a secret file, dropping surrounding whitespace.
pub fn load_secret(path: &str) -> Result<String> {
    let secret = fs::read_to_string(path)
        .with_context(|| format!("Failed to read secret file {}", path))?;

    Ok(secret.trim().to_string())
}
