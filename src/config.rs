use std::net::SocketAddr;

use crate::env::{
    EnvVar, Secret, GISTORY_GITHUB_API_URL, GISTORY_GITHUB_TOKEN, GISTORY_LISTEN_ADDRESS,
};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:3000";

#[derive(Debug, ::serde::Deserialize)]
pub struct GithubConfig {
    pub token: Secret,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, ::serde::Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

#[derive(Debug, ::serde::Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    pub async fn load(path: &str) -> anyhow::Result<Self> {
        let data = tokio::fs::read_to_string(path).await?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(data).map_err(Into::into)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let token = GISTORY_GITHUB_TOKEN::get_or("");
        if token.is_empty() {
            log::warn!(
                "{} is not set, using the GitHub API anonymously",
                GISTORY_GITHUB_TOKEN::key()
            );
        }

        let address = GISTORY_LISTEN_ADDRESS::get_or(DEFAULT_LISTEN_ADDRESS);
        let address = address.parse::<SocketAddr>().map_err(|err| {
            anyhow::anyhow!("invalid {}: '{address}': {err}", GISTORY_LISTEN_ADDRESS::key())
        })?;

        Ok(Self {
            github: GithubConfig {
                token: Secret::new_key_value(GISTORY_GITHUB_TOKEN::key(), token),
                api_url: GISTORY_GITHUB_API_URL::get_or(DEFAULT_API_URL),
            },
            server: ServerConfig { address },
        })
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}
