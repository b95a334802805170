//! Application configuration.

use crate::consts::polling::POLL_INTERVAL_MS;
use crate::consts::search::{DEFAULT_BRANCHES, DEFAULT_EPOCHS};
use crate::consts::transport::SUBMIT_TIMEOUT_SECS;
use crate::environment::Environment;
use crate::search::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{fs, path::Path};

/// Get the path to the config file: `reach.config` in the current directory
/// if it exists, otherwise `~/.reach/config.json`.
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let local_config_path = std::env::current_dir()?.join("reach.config");
    if local_config_path.exists() {
        return Ok(local_config_path);
    }

    let home_path = home::home_dir().ok_or(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "Home directory not found",
    ))?;
    Ok(home_path.join(".reach").join("config.json"))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `local`, or one base URL serving both backends. Empty means local.
    #[serde(default)]
    pub environment: String,

    /// Checker URL, overriding the environment. Empty when unset.
    #[serde(default)]
    pub checker_url: String,

    /// Simulator URL, overriding the environment. Empty when unset.
    #[serde(default)]
    pub simulator_url: String,

    /// Period of job status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,

    /// Random-walk length per search epoch.
    #[serde(default = "default_branches")]
    pub branches: u32,

    #[serde(default = "default_epochs")]
    pub epochs: u32,

    #[serde(default)]
    pub match_policy: MatchPolicy,
}

fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}

fn default_submit_timeout_secs() -> u64 {
    SUBMIT_TIMEOUT_SECS
}

fn default_branches() -> u32 {
    DEFAULT_BRANCHES
}

fn default_epochs() -> u32 {
    DEFAULT_EPOCHS
}

impl Default for Config {
    fn default() -> Self {
        Config::new(Environment::Local)
    }
}

impl Config {
    pub fn new(environment: Environment) -> Self {
        Config {
            environment: environment.to_string(),
            checker_url: String::new(),
            simulator_url: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            submit_timeout_secs: default_submit_timeout_secs(),
            branches: default_branches(),
            epochs: default_epochs(),
            match_policy: MatchPolicy::default(),
        }
    }

    /// Loads configuration from a JSON file at the given path.
    ///
    /// # Errors
    /// Returns an `std::io::Error` if reading from file fails or JSON is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let buf = fs::read(path)?;
        let config: Config = serde_json::from_slice(&buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(config)
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, std::io::Error> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from_file(path)
    }

    pub fn environment(&self) -> Result<Environment, std::io::Error> {
        self.environment
            .parse()
            .map_err(|e: String| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn resolved_checker_url(&self) -> Result<String, std::io::Error> {
        if !self.checker_url.is_empty() {
            return Ok(self.checker_url.clone());
        }
        Ok(self.environment()?.checker_url())
    }

    pub fn resolved_simulator_url(&self) -> Result<String, std::io::Error> {
        if !self.simulator_url.is_empty() {
            return Ok(self.simulator_url.clone());
        }
        Ok(self.environment()?.simulator_url())
    }
}
