//! TOML configuration shared by the initiator and the responder.
//!
//! Both binaries read the same file layout:
//!
//! ```toml
//! log_level = "info"
//!
//! [network]
//! host = "127.0.0.1"
//! port = 65432
//! buffer_size = 4096
//! max_frame_len = 1048576
//! handshake_timeout_ms = 5000
//!
//! [auth]
//! shared_secret = "ThisIsATestSecretPassword"
//!
//! [trigger]
//! window_ms = 500
//! cooldown_ms = 500
//! poll_interval_ms = 10
//!
//! [storage]
//! macro_file = "macros.toml"
//! ```
//!
//! Every field except `auth.shared_secret` has a serde default, so a file
//! containing only the `[auth]` section is complete.  The loaded value is
//! passed down explicitly; nothing in the crates reads configuration from
//! global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No shared secret was configured.
    #[error("auth.shared_secret must be set")]
    MissingSecret,

    /// A field holds a value the peers cannot work with.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration for one peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where to connect or listen, and framing limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Responder address (initiator) or bind address (responder).
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Size of each socket read; does not bound message size.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Largest accepted frame payload in bytes.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

/// Shared-secret authentication.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub shared_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("shared_secret", &"<redacted>")
            .finish()
    }
}

/// Hotkey matching and macro pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerConfig {
    /// All keys of a hotkey must be pressed within this many milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Pause after a macro fires.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Interval between trigger polls in the initiator's active loop.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Macro persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StorageConfig {
    /// TOML macro file; `None` keeps macros in memory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_file: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    65432
}
fn default_buffer_size() -> usize {
    4096
}
fn default_max_frame_len() -> usize {
    1024 * 1024
}
fn default_handshake_timeout_ms() -> u64 {
    5000
}
fn default_window_ms() -> u64 {
    500
}
fn default_cooldown_ms() -> u64 {
    500
}
fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            network: NetworkConfig::default(),
            auth: AuthConfig::default(),
            trigger: TriggerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            buffer_size: default_buffer_size(),
            max_frame_len: default_max_frame_len(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            cooldown_ms: default_cooldown_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl NetworkConfig {
    /// `host:port`, suitable for `TcpStream::connect` / `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

impl TriggerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl PeerConfig {
    /// Checks the invariants both peers rely on.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingSecret`] for an empty secret and
    /// [`ConfigError::InvalidValue`] for zero sizes or intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.shared_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        let zero = |field: &'static str| ConfigError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        };
        if self.network.buffer_size == 0 {
            return Err(zero("network.buffer_size"));
        }
        if self.network.max_frame_len == 0 {
            return Err(zero("network.max_frame_len"));
        }
        if self.network.max_frame_len > u32::MAX as usize {
            return Err(ConfigError::InvalidValue {
                field: "network.max_frame_len",
                reason: format!("must not exceed {}", u32::MAX),
            });
        }
        if self.network.handshake_timeout_ms == 0 {
            return Err(zero("network.handshake_timeout_ms"));
        }
        if self.trigger.poll_interval_ms == 0 {
            return Err(zero("trigger.poll_interval_ms"));
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads a `PeerConfig` from `path`, returning defaults if the file does not
/// exist.  The result is not validated.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<PeerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PeerConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &PeerConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
