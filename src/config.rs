use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::http::reader::Limits;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub buffer_size: usize,

    pub max_buffer_size: usize,
    pub max_header_size: usize,
    pub max_body_size: usize,

    #[serde(deserialize_with = "deserialize_duration")]
    pub read_timeout: Duration,

    pub static_files_root: String,

    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 42069,
            buffer_size: 4096,

            max_buffer_size: 64 * 1024,
            max_header_size: 8192,
            max_body_size: 1024 * 1024, // 1 MB

            read_timeout: Duration::from_secs(5),

            static_files_root: "./static".to_string(),

            server_name: "rawhttp/0.1".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads a TOML config, falling back to defaults when the file cannot be
    /// read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read config, using defaults");
                return ServerConfig::default();
            }
        };

        match toml::from_str::<ServerConfig>(&content) {
            Ok(server_config) => server_config,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to parse config, using defaults");
                ServerConfig::default()
            }
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            read_size: self.buffer_size,
            max_buffer_size: self.max_buffer_size,
            max_header_size: self.max_header_size,
            max_body_size: self.max_body_size,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
