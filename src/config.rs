use std::env;
use std::net::SocketAddr;

use anyhow::{bail, Context};

/// Address the HTTP listener binds to.
pub const LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);

pub const MONGODB_URI_VAR: &str = "MONGODB_URI";

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = lookup(MONGODB_URI_VAR)
            .with_context(|| format!("`{}` is not set", MONGODB_URI_VAR))?;
        if mongodb_uri.trim().is_empty() {
            bail!("`{}` is empty", MONGODB_URI_VAR)
        }
        Ok(Config {
            mongodb_uri,
            listen_addr: SocketAddr::from(LISTEN_ADDR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_uri_and_uses_fixed_port() {
        let cfg = Config::from_lookup(|key| {
            (key == MONGODB_URI_VAR).then(|| "mongodb://localhost:27017".to_string())
        })
        .unwrap();
        assert_eq!(cfg.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(cfg.listen_addr.port(), 8080);
    }

    #[test]
    fn missing_or_blank_uri_is_an_error() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains(MONGODB_URI_VAR));
        assert!(Config::from_lookup(|_| Some("  ".to_string())).is_err());
    }
}
