//! Configuration loading and resolution.
//!
//! Each setting resolves in order: explicit command-line value, then
//! environment variable, then built-in default.

use anyhow::{Context, Result};
use pesu_auth::PortalConfig;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Maximum authentication attempts in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 64;

pub const ENV_HOST: &str = "PESU_AUTH_HOST";
pub const ENV_PORT: &str = "PESU_AUTH_PORT";
pub const ENV_PORTAL_URL: &str = "PESU_AUTH_PORTAL_URL";
pub const ENV_TIMEOUT_MS: &str = "PESU_AUTH_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENT: &str = "PESU_AUTH_MAX_CONCURRENT";
pub const ENV_CLASS_LOOKUP: &str = "PESU_AUTH_CLASS_LOOKUP";

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub portal_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_concurrent: Option<usize>,
    pub class_lookup: Option<bool>,
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_concurrent: usize,
    pub portal: PortalConfig,
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let host = overrides
            .host
            .or_else(|| env(ENV_HOST))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = pick(overrides.port, &env, ENV_PORT, DEFAULT_PORT)?;
        let max_concurrent = pick(
            overrides.max_concurrent,
            &env,
            ENV_MAX_CONCURRENT,
            DEFAULT_MAX_CONCURRENT,
        )?;
        if max_concurrent == 0 {
            anyhow::bail!("max concurrent requests must be at least 1");
        }

        let mut portal = match overrides.portal_url.or_else(|| env(ENV_PORTAL_URL)) {
            Some(url) => PortalConfig::with_base_url(&url)
                .with_context(|| format!("invalid portal url '{url}'"))?,
            None => PortalConfig::default(),
        };
        portal.timeout_ms = pick(overrides.timeout_ms, &env, ENV_TIMEOUT_MS, portal.timeout_ms)?;
        if portal.timeout_ms == 0 {
            anyhow::bail!("request timeout must be greater than zero");
        }
        portal.class_lookup = match overrides.class_lookup {
            Some(v) => v,
            None => env(ENV_CLASS_LOOKUP)
                .map(|v| parse_flag(&v))
                .transpose()?
                .unwrap_or(false),
        };

        Ok(Self {
            host,
            port,
            max_concurrent,
            portal,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn pick<T>(
    explicit: Option<T>,
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(v) = explicit {
        return Ok(v);
    }
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value '{raw}' for {key}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("invalid value '{other}' for {ENV_CLASS_LOOKUP}"),
    }
}
