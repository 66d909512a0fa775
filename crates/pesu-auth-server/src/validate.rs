//! Request body parsing and validation for `POST /authenticate`.

use pesu_auth::{Credentials, FieldFilter, ProfileField};
use serde::Deserialize;

/// Raw request body. Types are strict: `profile` must be a JSON boolean
/// and `username` a JSON string; unknown keys are rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub profile: bool,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// A request that passed validation.
#[derive(Debug)]
pub struct ValidatedRequest {
    pub credentials: Credentials,
    pub profile: bool,
    pub fields: Option<FieldFilter>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Malformed(String),

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Fields must be a non-empty list or None")]
    EmptyFields,

    #[error("Invalid field: '{field}'. Valid fields are: {}", valid_fields())]
    InvalidField { field: String },
}

/// `['name', 'prn', ...]`
fn valid_fields() -> String {
    let names: Vec<String> = ProfileField::DEFAULT
        .iter()
        .map(|f| format!("'{f}'"))
        .collect();
    format!("[{}]", names.join(", "))
}

/// Deserialize and validate a JSON request body.
pub fn parse_request(body: &[u8]) -> Result<ValidatedRequest, ValidationError> {
    let request: AuthenticateRequest =
        serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    request.validate()
}

impl AuthenticateRequest {
    pub fn validate(self) -> Result<ValidatedRequest, ValidationError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }

        let fields = match self.fields {
            None => None,
            Some(names) if names.is_empty() => return Err(ValidationError::EmptyFields),
            Some(names) => {
                let mut requested = Vec::with_capacity(names.len());
                for name in names {
                    // Legacy keys parse but are not requestable.
                    match name.parse::<ProfileField>() {
                        Ok(field) if !field.is_legacy() => requested.push(field),
                        _ => return Err(ValidationError::InvalidField { field: name }),
                    }
                }
                Some(FieldFilter::new(requested))
            }
        };

        Ok(ValidatedRequest {
            credentials: Credentials::new(username, self.password),
            profile: self.profile,
            fields,
        })
    }
}
