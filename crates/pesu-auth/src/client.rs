//! Authenticate against the portal and optionally fetch the profile.
//!
//! One call is one conversation: landing page (csrf token), login POST,
//! then the profile page and the optional class lookup. Each step depends
//! on cookies or tokens from the previous one, so they run in order.

use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::extract::{self, LoginOutcome};
use crate::filter::FieldFilter;
use crate::session::Session;
use crate::types::*;
use chrono::Utc;
use tracing::{debug, error, info, warn};

/// Client for the portal. Cheap to clone; holds configuration only.
#[derive(Debug, Clone, Default)]
pub struct PortalClient {
    config: PortalConfig,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Self {
        Self { config }
    }

    /// Verify credentials and, if `want_profile`, scrape the profile.
    ///
    /// Never fails: transport and parse errors are reported inside the
    /// returned result. The session is dropped before returning on every
    /// path.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        want_profile: bool,
        fields: Option<&FieldFilter>,
    ) -> AuthenticationResult {
        let identifier = credentials.identifier.as_str();

        let mut session = match Session::open(&self.config) {
            Ok(s) => s,
            Err(e) => {
                error!(identifier, error = %e, "unable to open portal session");
                return AuthenticationResult::failure(MSG_TOKEN_FETCH_FAILED, e);
            }
        };

        let token = match self.fetch_token(&session).await {
            Ok(t) => t,
            Err(e) => {
                error!(identifier, error = %e, "unable to fetch csrf token");
                return AuthenticationResult::failure(MSG_TOKEN_FETCH_FAILED, e);
            }
        };

        let outcome = match self.submit_credentials(&session, &token, credentials).await {
            Ok(o) => o,
            Err(e) => {
                error!(identifier, error = %e, "unable to authenticate");
                return AuthenticationResult::failure(MSG_AUTHENTICATION_FAILED, e);
            }
        };

        let fresh_token = match outcome {
            LoginOutcome::Rejected => {
                info!(identifier, "login unsuccessful");
                return AuthenticationResult::rejected();
            }
            LoginOutcome::Accepted { token } => token,
        };

        info!(identifier, "login successful");
        if fresh_token.is_none() {
            warn!(identifier, "no csrf token on post-login page");
        }
        session.set_token(fresh_token);

        let mut result = AuthenticationResult::success();
        if want_profile {
            result.profile = Some(self.fetch_profile(&session, credentials, fields).await);
        }
        result
    }

    async fn fetch_token(&self, session: &Session) -> PortalResult<String> {
        let response = session.get(self.config.landing_url()?).await?;
        debug!(status = response.status, "landing page fetched");
        extract::extract_csrf_token(&response.body).ok_or(PortalError::MissingToken)
    }

    async fn submit_credentials(
        &self,
        session: &Session,
        token: &str,
        credentials: &Credentials,
    ) -> PortalResult<LoginOutcome> {
        let form = [
            ("_csrf", token),
            ("j_username", credentials.identifier.as_str()),
            ("j_password", credentials.secret.as_str()),
        ];
        let response = session
            .post_form(self.config.login_url()?, &form, &[])
            .await?;
        debug!(status = response.status, url = %response.url, "login submitted");
        Ok(extract::inspect_login_response(&response.body))
    }

    /// Profile fetch failures become `{error}` under the profile key.
    async fn fetch_profile(
        &self,
        session: &Session,
        credentials: &Credentials,
        fields: Option<&FieldFilter>,
    ) -> ProfilePayload {
        let identifier = credentials.identifier.as_str();

        let mut record = match self.profile_record(session, identifier).await {
            Ok(r) => r,
            Err(e) => {
                error!(identifier, error = %e, "unable to fetch profile data");
                return ProfilePayload::Error {
                    error: format!("{MSG_PROFILE_FETCH_FAILED}: {e}"),
                };
            }
        };

        if self.config.class_lookup {
            if let Err(e) = self.merge_class_info(session, identifier, &mut record).await {
                warn!(identifier, error = %e, "class and section lookup failed");
            }
        }

        if let Some(filter) = fields {
            record = filter.apply(record);
        }
        if record.is_empty() {
            warn!(identifier, "profile page yielded no recognized fields");
        }
        debug!(identifier, fields = record.len(), "profile extracted");
        ProfilePayload::Record(record)
    }

    async fn profile_record(
        &self,
        session: &Session,
        identifier: &str,
    ) -> PortalResult<ProfileRecord> {
        let url = self.config.profile_url()?;
        let query = [
            ("menuId", "670".to_string()),
            ("url", "studentProfilePESUAdmin".to_string()),
            ("controllerMode", "6414".to_string()),
            ("actionType", "5".to_string()),
            ("id", "0".to_string()),
            ("selectedData", "0".to_string()),
            ("_", Utc::now().timestamp_millis().to_string()),
        ];
        let response = session.get_direct(url, &query).await?;
        if response.status != 200 {
            return Err(PortalError::UnexpectedStatus {
                status: response.status,
                url: response.url,
            });
        }
        extract::extract_profile(&response.body, Some(identifier))
    }

    /// Fill the legacy keys from the class and section lookup. Keys already
    /// observed on the profile page are left alone.
    async fn merge_class_info(
        &self,
        session: &Session,
        identifier: &str,
        record: &mut ProfileRecord,
    ) -> PortalResult<()> {
        let token = session.token().ok_or(PortalError::MissingToken)?;
        let headers = [
            ("x-csrf-token", token),
            ("x-requested-with", "XMLHttpRequest"),
        ];
        let response = session
            .post_form(
                self.config.class_info_url()?,
                &[("loginId", identifier)],
                &headers,
            )
            .await?;
        if response.status != 200 {
            return Err(PortalError::UnexpectedStatus {
                status: response.status,
                url: response.url,
            });
        }

        for (key, value) in extract::parse_class_info(&response.body) {
            let Ok(field) = key.parse::<ProfileField>() else {
                continue;
            };
            if field.is_legacy() && !record.contains(field) && !value.is_empty() {
                record.insert_text(field, value);
            }
        }
        Ok(())
    }
}
