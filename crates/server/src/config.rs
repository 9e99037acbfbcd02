//! Startup configuration, read once from the environment.

use std::time::Duration;

use anyhow::Context;
use url::Url;

pub const DEFAULT_PORT: u16 = 7000;
pub const DEFAULT_ORIGIN_URL: &str = "https://asialiveaction.com";
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub origin_url: Url,
    pub cache_ttl: Duration,
}

impl Config {
    /// `ALA_BIND` (full `host:port`) wins over `PORT`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = match lookup("ALA_BIND").filter(|v| !v.trim().is_empty()) {
            Some(addr) => addr,
            None => {
                let port = match lookup("PORT") {
                    Some(raw) => raw
                        .trim()
                        .parse::<u16>()
                        .with_context(|| format!("PORT is not a valid port: {raw}"))?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{port}")
            }
        };

        let origin = lookup("ALA_ORIGIN_URL").unwrap_or_else(|| DEFAULT_ORIGIN_URL.to_string());
        let origin_url =
            Url::parse(origin.trim()).with_context(|| format!("ALA_ORIGIN_URL is not a URL: {origin}"))?;

        Ok(Self {
            bind_addr,
            origin_url,
            cache_ttl: CACHE_TTL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:7000");
        assert_eq!(cfg.origin_url.as_str(), "https://asialiveaction.com/");
        assert_eq!(cfg.cache_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn port_and_bind_overrides() {
        assert_eq!(config(&[("PORT", "8080")]).unwrap().bind_addr, "0.0.0.0:8080");
        let cfg = config(&[("PORT", "8080"), ("ALA_BIND", "127.0.0.1:9000")]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("PORT", "seven")]).is_err());
        assert!(config(&[("ALA_ORIGIN_URL", "not a url")]).is_err());
    }
}
