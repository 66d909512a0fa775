//! Portal location, timeouts, and optional lookups.

use crate::error::PortalResult;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_PORTAL_URL: &str = "https://www.pesuacademy.com";

/// Default per-request timeout (30 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

const LANDING_PATH: &str = "Academy/";
const LOGIN_PATH: &str = "Academy/j_spring_security_check";
const PROFILE_PATH: &str = "Academy/s/studentProfilePESUAdmin";
const CLASS_INFO_PATH: &str = "Academy/getStudentClassInfo";

/// Configuration for [`crate::PortalClient`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    /// Scheme and host of the portal. Endpoint paths are joined onto it.
    pub base_url: Url,

    /// Timeout applied to every outbound request, in milliseconds.
    pub timeout_ms: u64,

    pub user_agent: String,

    /// Also query the class and section lookup when a profile is requested.
    pub class_lookup: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            // Constant, always parses.
            base_url: Url::parse(DEFAULT_PORTAL_URL).unwrap(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            class_lookup: false,
        }
    }
}

impl PortalConfig {
    /// Default configuration pointed at a different portal host.
    pub fn with_base_url(base_url: &str) -> PortalResult<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            ..Self::default()
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Unauthenticated landing page carrying the first csrf token.
    pub fn landing_url(&self) -> PortalResult<Url> {
        self.endpoint(LANDING_PATH)
    }

    pub fn login_url(&self) -> PortalResult<Url> {
        self.endpoint(LOGIN_PATH)
    }

    pub fn profile_url(&self) -> PortalResult<Url> {
        self.endpoint(PROFILE_PATH)
    }

    pub fn class_info_url(&self) -> PortalResult<Url> {
        self.endpoint(CLASS_INFO_PATH)
    }

    fn endpoint(&self, path: &str) -> PortalResult<Url> {
        Ok(self.base_url.join(path)?)
    }
}
