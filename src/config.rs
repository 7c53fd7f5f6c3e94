//! Configuration for boardsync.
//!
//! Settings are read from `.boardsync/boardsync.toml` in the project
//! directory, falling back to `boardsync/boardsync.toml` under the user's
//! config directory. Layering is file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! url = "https://boards.example.com/api"
//! token = "..."
//! timeout_secs = 15
//!
//! [realtime]
//! enabled = true
//! url = "wss://boards.example.com/api/ws"
//! fast_attempts = 3
//! fast_delay_ms = 1000
//! slow_delay_ms = 5000
//! max_delay_ms = 30000
//! ping_interval_secs = 30
//! pong_timeout_secs = 60
//!
//! [logging]
//! filter = "boardsync=debug"
//! json = false
//! ```
//!
//! Environment overrides: `BOARDSYNC_API_URL`, `BOARDSYNC_WS_URL`,
//! `BOARDSYNC_TOKEN`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::board::{Backoff, HttpBoardApi, RealtimeChannel};

pub const CONFIG_DIR: &str = ".boardsync";
pub const CONFIG_FILE: &str = "boardsync.toml";

pub const ENV_API_URL: &str = "BOARDSYNC_API_URL";
pub const ENV_WS_URL: &str = "BOARDSYNC_WS_URL";
pub const ENV_TOKEN: &str = "BOARDSYNC_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Realtime channel settings. Without `url` the websocket address is
/// derived from the API URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_fast_attempts")]
    pub fast_attempts: u32,
    #[serde(default = "default_fast_delay_ms")]
    pub fast_delay_ms: u64,
    #[serde(default = "default_slow_delay_ms")]
    pub slow_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_pong_timeout_secs")]
    pub pong_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_fast_attempts() -> u32 {
    3
}

fn default_fast_delay_ms() -> u64 {
    1_000
}

fn default_slow_delay_ms() -> u64 {
    5_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_pong_timeout_secs() -> u64 {
    60
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            fast_attempts: default_fast_attempts(),
            fast_delay_ms: default_fast_delay_ms(),
            slow_delay_ms: default_slow_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            pong_timeout_secs: default_pong_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `EnvFilter` directive; `BOARDSYNC_LOG` and `RUST_LOG` win over it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default)]
    pub json: bool,
}

/// The complete boardsync.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub realtime: RealtimeSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl SyncToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse boardsync.toml")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize boardsync.toml")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Problems worth reporting before anything connects.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(self.api.url.starts_with("http://") || self.api.url.starts_with("https://")) {
            problems.push(format!("api.url must be http(s): {}", self.api.url));
        }
        if self.api.timeout_secs == 0 {
            problems.push("api.timeout_secs must be greater than 0".to_string());
        }
        if let Some(url) = &self.realtime.url
            && !(url.starts_with("ws://") || url.starts_with("wss://"))
        {
            problems.push(format!("realtime.url must be ws(s): {url}"));
        }
        if self.realtime.max_delay_ms < self.realtime.slow_delay_ms {
            problems.push("realtime.max_delay_ms is smaller than realtime.slow_delay_ms".to_string());
        }
        if self.realtime.pong_timeout_secs < self.realtime.ping_interval_secs {
            problems.push("realtime.pong_timeout_secs is shorter than the ping interval".to_string());
        }
        problems
    }
}

/// Websocket address for an API base URL: `http` becomes `ws`, `https`
/// becomes `wss`, and `/ws` is appended.
pub fn derive_ws_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{swapped}/ws")
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("boardsync").join(CONFIG_FILE))
}

/// Effective configuration: the file plus environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub project_dir: PathBuf,
    /// File the settings came from, if any.
    pub source: Option<PathBuf>,
    pub toml: SyncToml,
    env_api_url: Option<String>,
    env_ws_url: Option<String>,
    env_token: Option<String>,
    cli_api_url: Option<String>,
    cli_token: Option<String>,
}

impl SyncConfig {
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::load_layered(project_dir, user_config_path(), &|key| std::env::var(key).ok())
    }

    pub fn load_layered(
        project_dir: &Path,
        user_file: Option<PathBuf>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let project_file = Self::project_file(project_dir);
        let source = [Some(project_file), user_file]
            .into_iter()
            .flatten()
            .find(|path| path.exists());
        let toml = match &source {
            Some(path) => SyncToml::load(path)?,
            None => SyncToml::default(),
        };
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            source,
            toml,
            env_api_url: non_empty(ENV_API_URL),
            env_ws_url: non_empty(ENV_WS_URL),
            env_token: non_empty(ENV_TOKEN),
            cli_api_url: None,
            cli_token: None,
        })
    }

    pub fn with_cli_args(mut self, api_url: Option<String>, token: Option<String>) -> Self {
        self.cli_api_url = api_url;
        self.cli_token = token;
        self
    }

    pub fn project_file(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// API base URL (CLI → env → file).
    pub fn api_url(&self) -> String {
        self.cli_api_url
            .clone()
            .or_else(|| self.env_api_url.clone())
            .unwrap_or_else(|| self.toml.api.url.clone())
    }

    /// Websocket URL (env → file → derived from the API URL).
    pub fn ws_url(&self) -> String {
        self.env_ws_url
            .clone()
            .or_else(|| self.toml.realtime.url.clone())
            .unwrap_or_else(|| derive_ws_url(&self.api_url()))
    }

    /// Bearer token (CLI → env → file).
    pub fn token(&self) -> Option<String> {
        self.cli_token
            .clone()
            .or_else(|| self.env_token.clone())
            .or_else(|| self.toml.api.token.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.api.timeout_secs)
    }

    pub fn realtime_enabled(&self) -> bool {
        self.toml.realtime.enabled
    }

    pub fn backoff(&self) -> Backoff {
        let rt = &self.toml.realtime;
        Backoff::new(
            rt.fast_attempts,
            Duration::from_millis(rt.fast_delay_ms),
            Duration::from_millis(rt.slow_delay_ms),
            Duration::from_millis(rt.max_delay_ms),
        )
    }

    pub fn api_client(&self) -> Result<HttpBoardApi> {
        HttpBoardApi::new(&self.api_url(), self.token(), self.request_timeout())
            .context("Failed to build API client")
    }

    pub fn realtime_channel(&self) -> RealtimeChannel {
        let rt = &self.toml.realtime;
        RealtimeChannel::new(self.ws_url(), self.token())
            .with_keepalive(
                Duration::from_secs(rt.ping_interval_secs),
                Duration::from_secs(rt.pong_timeout_secs),
            )
            .with_backoff(self.backoff())
    }

    /// Settings after all overrides, with the token redacted.
    pub fn effective(&self) -> SyncToml {
        let mut toml = self.toml.clone();
        toml.api.url = self.api_url();
        toml.api.token = self.token().map(|_| "<redacted>".to_string());
        toml.realtime.url = Some(self.ws_url());
        toml
    }

    pub fn validate(&self) -> Vec<String> {
        self.effective().validate()
    }
}
