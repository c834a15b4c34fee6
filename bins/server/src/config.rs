use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use kafka_source::KafkaSourceConfig;
use session_engine::SessionOptions;

use crate::error::ServerError;

#[derive(Parser, Debug)]
#[command(name = "flowbro-server", about = "Kafka partitions over WebSocket")]
pub struct Cli {
    /// HTTP/WebSocket port
    #[arg(env = "FLOWBRO_PORT")]
    pub port: Option<u16>,

    /// Path to a TOML config file
    #[arg(long, env = "FLOWBRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory served for paths other than the landing page
    #[arg(long)]
    pub webroot: Option<PathBuf>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webroot")]
    pub webroot: PathBuf,
    /// Capacity of each session's fan-in channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
    #[serde(default)]
    pub handshake_timeout_ms: Option<u64>,
    #[serde(default)]
    pub send_timeout_ms: Option<u64>,
    #[serde(default)]
    pub kafka: KafkaSourceConfig,
}

fn default_port() -> u16 {
    41234
}
fn default_webroot() -> PathBuf {
    PathBuf::from("webroot")
}
fn default_channel_buffer() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            webroot: default_webroot(),
            channel_buffer: default_channel_buffer(),
            handshake_timeout_ms: None,
            send_timeout_ms: None,
            kafka: KafkaSourceConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path).map_err(|e| ServerError::Config {
            context: "read",
            detail: format!("'{}': {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| ServerError::Config {
            context: "parse",
            detail: format!("'{}': {e}", path.display()),
        })
    }

    /// File values (or defaults without `--config`), then CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, ServerError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(webroot) = &cli.webroot {
            config.webroot = webroot.clone();
        }
        if config.channel_buffer == 0 {
            return Err(ServerError::Config {
                context: "validate",
                detail: "channel_buffer must be at least 1".into(),
            });
        }
        Ok(config)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            channel_buffer: self.channel_buffer,
            handshake_timeout: self.handshake_timeout_ms.map(Duration::from_millis),
            send_timeout: self.send_timeout_ms.map(Duration::from_millis),
        }
    }
}
