use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::Deserialize;

/// Canonical district identifier.
///
/// Source layers carry the identifier either as an integer or as a
/// zero-padded string (e.g. `"00302421"`). Exactly one canonical form is
/// used for all joins: the integer value with leading zeros stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct DistrictId(u32);

impl DistrictId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// The canonical integer value, as stored in the `district_id` column.
    #[inline]
    pub fn value(&self) -> i64 {
        self.0 as i64
    }

    /// Strip leading zeros from a zero-padded code without parsing it.
    pub fn strip_leading_zeros(code: &str) -> &str {
        let stripped = code.trim_start_matches('0');
        // "000" is the code for district 0, not an empty id.
        if stripped.is_empty() && !code.is_empty() {
            "0"
        } else {
            stripped
        }
    }
}

impl FromStr for DistrictId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = Self::strip_leading_zeros(s.trim());
        if trimmed.is_empty() {
            bail!("empty district identifier");
        }
        let id: u32 = trimmed
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid district identifier: {s:?}"))?;
        Ok(Self(id))
    }
}

impl From<u32> for DistrictId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
