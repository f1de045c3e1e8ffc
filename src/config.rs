use serde::Deserialize;
use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    CONTROL_PORT, DEFAULT_CONFIG_PATH, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVE_TIMEOUT_SECS,
    ENV_FRAME_IP, ENV_LOCAL_ADDRESS, ENV_SERVE_PORT, MEDIA_PORT, SERVE_PORT,
};
use crate::error::{FrameError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub frame: FrameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameConfig {
    pub ip: String,
    #[serde(default = "default_control_port")]
    pub control_port: u16,
    #[serde(default = "default_media_port")]
    pub media_port: u16,
    /// Port for the one-shot image server; 0 picks an ephemeral port
    #[serde(default = "default_serve_port")]
    pub serve_port: u16,
    /// Address the frame should use to reach this host. Discovered when unset.
    #[serde(default)]
    pub local_address: Option<IpAddr>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 0 waits for the frame indefinitely
    #[serde(default = "default_serve_timeout_secs")]
    pub serve_timeout_secs: u64,
}

fn default_control_port() -> u16 {
    CONTROL_PORT
}

fn default_media_port() -> u16 {
    MEDIA_PORT
}

fn default_serve_port() -> u16 {
    SERVE_PORT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_serve_timeout_secs() -> u64 {
    DEFAULT_SERVE_TIMEOUT_SECS
}

impl FrameConfig {
    /// Defaults for a frame at `ip`.
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            control_port: CONTROL_PORT,
            media_port: MEDIA_PORT,
            serve_port: SERVE_PORT,
            local_address: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            serve_timeout_secs: DEFAULT_SERVE_TIMEOUT_SECS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn serve_timeout(&self) -> Option<Duration> {
        match self.serve_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn control_url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.ip, self.control_port, path)
    }

    pub fn media_url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.ip, self.media_port, path)
    }

    /// Apply `DEPICT_*` environment overrides on top of the current values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(ip) = env::var(ENV_FRAME_IP) {
            self.ip = ip;
        }
        if let Ok(addr) = env::var(ENV_LOCAL_ADDRESS) {
            let addr = addr.parse().map_err(|e| {
                FrameError::Config(format!("Invalid {}='{}': {}", ENV_LOCAL_ADDRESS, addr, e))
            })?;
            self.local_address = Some(addr);
        }
        if let Ok(port) = env::var(ENV_SERVE_PORT) {
            self.serve_port = port.parse().map_err(|e| {
                FrameError::Config(format!("Invalid {}='{}': {}", ENV_SERVE_PORT, port, e))
            })?;
        }
        Ok(())
    }
}

impl Config {
    /// Load `depict.toml` from the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            FrameError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::parse(&config_content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.frame.ip.trim().is_empty() {
            return Err(FrameError::MissingField("frame.ip".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = Config::parse("[frame]\nip = \"192.168.1.40\"\n").unwrap();

        assert_eq!(config.frame.ip, "192.168.1.40");
        assert_eq!(config.frame.control_port, 3002);
        assert_eq!(config.frame.media_port, 56789);
        assert_eq!(config.frame.serve_port, 8080);
        assert_eq!(config.frame.local_address, None);
        assert_eq!(config.frame.serve_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [frame]
            ip = "10.0.0.5"
            serve_port = 0
            local_address = "10.0.0.2"
            request_timeout_secs = 5
            serve_timeout_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.frame.serve_port, 0);
        assert_eq!(config.frame.local_address, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(config.frame.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.frame.serve_timeout(), None);
    }

    #[test]
    fn test_empty_ip_is_rejected() {
        let err = Config::parse("[frame]\nip = \"\"\n").unwrap_err();
        assert!(matches!(err, FrameError::MissingField(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load_from("/nonexistent/depict.toml").unwrap_err();
        assert!(matches!(err, FrameError::Config(_)));
    }

    // Environment is process-wide, so every override case runs in this one test
    #[test]
    fn test_env_overrides() {
        let mut frame = FrameConfig::new("10.0.0.5");

        env::set_var(ENV_FRAME_IP, "10.0.0.9");
        env::set_var(ENV_LOCAL_ADDRESS, "10.0.0.2");
        env::set_var(ENV_SERVE_PORT, "9090");
        frame.apply_env_overrides().unwrap();

        assert_eq!(frame.ip, "10.0.0.9");
        assert_eq!(frame.local_address, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(frame.serve_port, 9090);

        env::set_var(ENV_SERVE_PORT, "not-a-port");
        let err = FrameConfig::new("10.0.0.5").apply_env_overrides().unwrap_err();
        assert!(matches!(err, FrameError::Config(ref msg) if msg.contains(ENV_SERVE_PORT)));

        env::set_var(ENV_LOCAL_ADDRESS, "frame.local");
        let err = FrameConfig::new("10.0.0.5").apply_env_overrides().unwrap_err();
        assert!(matches!(err, FrameError::Config(ref msg) if msg.contains(ENV_LOCAL_ADDRESS)));

        env::remove_var(ENV_FRAME_IP);
        env::remove_var(ENV_LOCAL_ADDRESS);
        env::remove_var(ENV_SERVE_PORT);

        let mut untouched = FrameConfig::new("10.0.0.5");
        untouched.apply_env_overrides().unwrap();
        assert_eq!(untouched.ip, "10.0.0.5");
        assert_eq!(untouched.local_address, None);
        assert_eq!(untouched.serve_port, 8080);
    }

    #[test]
    fn test_urls() {
        let frame = FrameConfig::new("10.0.0.5");
        assert_eq!(frame.control_url("/settings"), "http://10.0.0.5:3002/settings");
        assert_eq!(
            frame.media_url("/apps/DepictFramePlayer/load_media"),
            "http://10.0.0.5:56789/apps/DepictFramePlayer/load_media"
        );
    }
}
