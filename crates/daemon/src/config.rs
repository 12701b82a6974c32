//! Daemon configuration
//!
//! Layered as: built-in defaults, then the TOML file named by `HSQ_CONFIG`
//! (default `~/.hsq/config.toml`, optional), then `HSQ_*` environment
//! variables.

use anyhow::{bail, Context, Result};
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use hsq_core::application::constants::DEFAULT_SKIP_COMPLETION_ON_SUCCESS;
use hsq_core::domain::{Http503Verbosity, RequestQueueMode, UrlPrefix};
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "HSQ_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "~/.hsq/config.toml";
pub const ENV_PREFIX: &str = "HSQ";
pub const DEFAULT_URL_PREFIX: &str = "http://localhost:8080/";
pub const LOG_FILE_PREFIX: &str = "hsq-queued.log";

/// `HSQ_*` variables; `url_prefixes` takes a comma-separated list
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("url_prefixes")
}

/// Which kernel HTTP stack to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// HTTP.sys through the Win32 HTTP Server API
    #[default]
    HttpSys,
    /// In-process emulation, for dry runs on any host
    Emulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Queue name; absent or empty means an anonymous queue
    pub queue_name: Option<String>,
    pub mode: RequestQueueMode,
    pub url_prefixes: Vec<String>,
    pub max_queue_length: Option<u32>,
    pub rejection_verbosity: Option<Http503Verbosity>,
    pub skip_completion_on_success: bool,
    pub driver: DriverKind,
    /// Directory for daily-rotated log files; stdout only when absent
    pub log_dir: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            queue_name: None,
            mode: RequestQueueMode::default(),
            url_prefixes: vec![DEFAULT_URL_PREFIX.to_string()],
            max_queue_length: None,
            rejection_verbosity: None,
            skip_completion_on_success: DEFAULT_SKIP_COMPLETION_ON_SUCCESS,
            driver: DriverKind::default(),
            log_dir: None,
        }
    }
}

impl DaemonConfig {
    /// Load from the config file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = shellexpand::tilde(&path).into_owned();

        let builder = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(environment());

        Self::from_builder(builder).with_context(|| format!("Invalid configuration (file: {})", path))
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(source: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: DaemonConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.mode != RequestQueueMode::Attach && self.url_prefixes.is_empty() {
            bail!("url_prefixes must not be empty when mode is '{}'", self.mode);
        }
        if self.max_queue_length == Some(0) {
            bail!("max_queue_length must be greater than zero");
        }
        self.parsed_prefixes()?;
        Ok(())
    }

    /// Queue name with empty treated as anonymous
    pub fn queue_name(&self) -> Option<&str> {
        self.queue_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn parsed_prefixes(&self) -> Result<Vec<UrlPrefix>> {
        self.url_prefixes
            .iter()
            .map(|prefix| {
                UrlPrefix::parse(prefix).with_context(|| format!("Invalid URL prefix '{}'", prefix))
            })
            .collect()
    }
}
