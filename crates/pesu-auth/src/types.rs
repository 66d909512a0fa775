//! Core data types: credentials, profile records, and authentication results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MSG_LOGIN_SUCCESSFUL: &str = "Login successful.";
pub const MSG_INVALID_CREDENTIALS: &str =
    "Invalid username or password, or the user does not exist.";
pub const MSG_TOKEN_FETCH_FAILED: &str = "Unable to fetch csrf token.";
pub const MSG_AUTHENTICATION_FAILED: &str = "Unable to authenticate.";
pub const MSG_PROFILE_FETCH_FAILED: &str = "Unable to fetch profile data";

/// Login identifier and password for one authentication attempt.
///
/// The secret is redacted from `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    /// PRN, SRN, email, or phone number. Opaque to this crate.
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"*****")
            .finish()
    }
}

/// A recognized profile key.
///
/// Declaration order is the order keys appear in serialized profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Prn,
    Srn,
    Program,
    BranchShortCode,
    Branch,
    Semester,
    Section,
    Email,
    Phone,
    CampusCode,
    Campus,
    // Legacy keys, only filled by the class and section lookup.
    Class,
    Cycle,
    Department,
    InstituteName,
}

impl ProfileField {
    /// Fields a caller may request through a field filter.
    pub const DEFAULT: [ProfileField; 12] = [
        ProfileField::Name,
        ProfileField::Prn,
        ProfileField::Srn,
        ProfileField::Program,
        ProfileField::BranchShortCode,
        ProfileField::Branch,
        ProfileField::Semester,
        ProfileField::Section,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::CampusCode,
        ProfileField::Campus,
    ];

    pub const LEGACY: [ProfileField; 4] = [
        ProfileField::Class,
        ProfileField::Cycle,
        ProfileField::Department,
        ProfileField::InstituteName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Prn => "prn",
            ProfileField::Srn => "srn",
            ProfileField::Program => "program",
            ProfileField::BranchShortCode => "branch_short_code",
            ProfileField::Branch => "branch",
            ProfileField::Semester => "semester",
            ProfileField::Section => "section",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::CampusCode => "campus_code",
            ProfileField::Campus => "campus",
            ProfileField::Class => "class",
            ProfileField::Cycle => "cycle",
            ProfileField::Department => "department",
            ProfileField::InstituteName => "institute_name",
        }
    }

    pub fn is_legacy(&self) -> bool {
        Self::LEGACY.contains(self)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field name outside the recognized set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown profile field: '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for ProfileField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::DEFAULT
            .iter()
            .chain(Self::LEGACY.iter())
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A profile value. Campus code is the only integer field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Text(String),
    Integer(i64),
}

impl ProfileValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProfileValue::Text(s) => Some(s),
            ProfileValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ProfileValue::Integer(n) => Some(*n),
            ProfileValue::Text(_) => None,
        }
    }
}

/// Partial student profile. A missing key means "not observed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileRecord(BTreeMap<ProfileField, ProfileValue>);

impl ProfileRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, field: ProfileField, value: impl Into<String>) {
        self.0.insert(field, ProfileValue::Text(value.into()));
    }

    pub fn insert_integer(&mut self, field: ProfileField, value: i64) {
        self.0.insert(field, ProfileValue::Integer(value));
    }

    pub fn get(&self, field: ProfileField) -> Option<&ProfileValue> {
        self.0.get(&field)
    }

    pub fn text(&self, field: ProfileField) -> Option<&str> {
        self.get(field).and_then(ProfileValue::as_text)
    }

    pub fn integer(&self, field: ProfileField) -> Option<i64> {
        self.get(field).and_then(ProfileValue::as_integer)
    }

    pub fn contains(&self, field: ProfileField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.0.keys().copied()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(ProfileField) -> bool) {
        self.0.retain(|field, _| keep(*field));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What ends up under the `profile` key of a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfilePayload {
    Record(ProfileRecord),
    Error { error: String },
}

impl ProfilePayload {
    pub fn record(&self) -> Option<&ProfileRecord> {
        match self {
            ProfilePayload::Record(r) => Some(r),
            ProfilePayload::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProfilePayload::Error { error } => Some(error),
            ProfilePayload::Record(_) => None,
        }
    }
}

/// Outcome of one authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResult {
    pub status: bool,
    pub message: String,
    /// Present only when a profile was requested and login succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfilePayload>,
    /// Underlying transport or parse error for failed attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthenticationResult {
    pub fn success() -> Self {
        Self {
            status: true,
            message: MSG_LOGIN_SUCCESSFUL.to_string(),
            profile: None,
            error: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            status: false,
            message: MSG_INVALID_CREDENTIALS.to_string(),
            profile: None,
            error: None,
        }
    }

    pub fn failure(message: &str, error: impl fmt::Display) -> Self {
        Self {
            status: false,
            message: message.to_string(),
            profile: None,
            error: Some(error.to_string()),
        }
    }
}
