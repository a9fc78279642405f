use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use quire_gate::ThrottleConfig;
use quire_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding the index and the publication tree.
    pub data_dir: PathBuf,
    /// Bearer token the producer presents. Required to serve.
    pub api_token: Option<String>,
    /// Reader sessions idle longer than this are forgotten.
    pub session_idle_ttl_secs: u64,
    /// Largest request body accepted, in bytes.
    pub max_request_bytes: usize,
    pub limits: StoreConfig,
    pub throttle: ThrottleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8400)),
            data_dir: PathBuf::from("./data"),
            api_token: None,
            session_idle_ttl_secs: 24 * 60 * 60,
            max_request_bytes: 64 * 1024 * 1024,
            limits: StoreConfig::default(),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Check the settings that have no usable default.
    pub fn validate(&self) -> ServerResult<()> {
        match self.api_token.as_deref().map(str::trim) {
            None | Some("") => Err(ServerError::Config("api_token must be set".into())),
            Some(_) => Ok(()),
        }
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }
}
