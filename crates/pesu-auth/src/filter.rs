//! Field projection over profile records.

use crate::types::{ProfileField, ProfileRecord, UnknownField};
use std::collections::BTreeSet;

/// Caller-supplied allow-list of profile keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    fields: BTreeSet<ProfileField>,
}

impl FieldFilter {
    pub fn new(fields: impl IntoIterator<Item = ProfileField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Parse field names, failing on the first unrecognized one.
    pub fn parse<I, S>(names: I) -> Result<Self, UnknownField>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .map(|n| n.as_ref().parse::<ProfileField>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn contains(&self, field: ProfileField) -> bool {
        self.fields.contains(&field)
    }

    /// Drop every key not in the filter. Filtered keys that were never
    /// observed stay absent.
    pub fn apply(&self, mut record: ProfileRecord) -> ProfileRecord {
        record.retain(|field| self.contains(field));
        record
    }
}
