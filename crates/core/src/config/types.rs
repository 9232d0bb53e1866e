use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::encoder::EncoderConfig;
use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[encoder]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 120
log_level = "warning"
extra_args = ["-threads", "2"]

[orchestrator]
max_parallel_encodes = 4
output_dir = "/srv/out"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.encoder.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.encoder.extra_args, vec!["-threads", "2"]);
        assert_eq!(config.orchestrator.max_parallel_encodes, 4);
        assert_eq!(
            config.orchestrator.output_dir,
            Some(PathBuf::from("/srv/out"))
        );
    }
}
