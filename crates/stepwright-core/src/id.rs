//! Step identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a compiled step.
/// Uses random UUIDv4 values rendered in canonical hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct StepId(Uuid);

impl StepId {
    /// Create a new random StepId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for StepId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_canonical_hyphenated() {
        let id = StepId::new();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 36);
        assert_eq!(rendered.matches('-').count(), 4);
        assert_eq!(id.as_uuid().get_version_num(), 4);

        let parsed: StepId = rendered.parse().unwrap();
        assert_eq!(parsed, id);
    }
}
