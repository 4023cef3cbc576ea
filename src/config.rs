//! TOML configuration for the binary front-end.
//!
//! Library users construct [`Config`] directly; the shipped binary loads
//! it from a TOML file. Only the server host and nickname are required,
//! everything else has a sensible default.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML or is missing required keys.
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Client connection and behavior settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether to upgrade the connection to TLS.
    #[serde(default)]
    pub tls: bool,
    /// Nickname to register with.
    pub nickname: String,
    /// Username for registration; defaults to the nickname.
    #[serde(default)]
    username: Option<String>,
    /// Real name for registration; defaults to the nickname.
    #[serde(default)]
    realname: Option<String>,
    /// Channels to join once registered.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Leading character marking a PRIVMSG as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,
    /// Seconds between keepalive probes.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

fn default_port() -> u16 {
    6667
}

fn default_command_prefix() -> char {
    '!'
}

fn default_ping_interval() -> u64 {
    60
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Build a minimal config for the given server and nickname.
    pub fn new(host: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            tls: false,
            nickname: nickname.into(),
            username: None,
            realname: None,
            channels: Vec::new(),
            command_prefix: default_command_prefix(),
            ping_interval_secs: default_ping_interval(),
        }
    }

    /// The registration username, falling back to the nickname.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    /// The registration real name, falling back to the nickname.
    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            host = "irc.example.net"
            nickname = "mybot"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 6667);
        assert!(!config.tls);
        assert_eq!(config.username(), "mybot");
        assert_eq!(config.realname(), "mybot");
        assert_eq!(config.command_prefix, '!');
        assert_eq!(config.ping_interval_secs, 60);
        assert!(config.channels.is_empty());
    }

    #[test]
    fn full_config_round_trip() {
        let config: Config = toml::from_str(
            r##"
            host = "irc.example.net"
            port = 6697
            tls = true
            nickname = "mybot"
            username = "botuser"
            realname = "An example bot"
            channels = ["#home", "#dev"]
            command_prefix = "."
            ping_interval_secs = 30
            "##,
        )
        .unwrap();
        assert_eq!(config.port, 6697);
        assert!(config.tls);
        assert_eq!(config.username(), "botuser");
        assert_eq!(config.realname(), "An example bot");
        assert_eq!(config.channels, vec!["#home", "#dev"]);
        assert_eq!(config.command_prefix, '.');
    }

    #[test]
    fn missing_required_keys_fail() {
        assert!(toml::from_str::<Config>("port = 6667").is_err());
    }
}
