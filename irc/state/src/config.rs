use std::path::Path;

use serde::Deserialize;

use crate::cap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// The client's nickname.
    pub nickname: String,
    /// Channels the client intends to be in.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Capabilities to request when the server offers them.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    /// Replies to CTCP queries.
    #[serde(default)]
    pub ctcp: Ctcp,
}

impl Config {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            channels: vec![],
            capabilities: default_capabilities(),
            ctcp: Ctcp::default(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;

        Self::parse(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ctcp {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_finger")]
    pub finger: String,
}

impl Default for Ctcp {
    fn default() -> Self {
        Self {
            version: default_version(),
            finger: default_finger(),
        }
    }
}

fn default_capabilities() -> Vec<String> {
    cap::RECOGNIZED.iter().map(ToString::to_string).collect()
}

fn default_version() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_finger() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] toml::de::Error),
}
