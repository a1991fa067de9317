//! Identifier types for controller-owned records.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Accepts either a JSON string or a JSON integer as an identifier.
///
/// The controller serializes primary keys as strings in most responses,
/// but some deployments emit raw integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Opaque identifier of a controller session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// Identifier of a program in the controller's catalog.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProgramId(String);

impl ProgramId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProgramId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramId({})", self.0)
    }
}

impl From<&str> for ProgramId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_id_accepts_string_and_integer() {
        let from_text: ProgramId = serde_json::from_str(r#""foam""#).unwrap();
        let from_number: ProgramId = serde_json::from_str("7").unwrap();

        assert_eq!(from_text.as_str(), "foam");
        assert_eq!(from_number.as_str(), "7");
    }

    #[test]
    fn session_id_serializes_as_plain_string() {
        let id = SessionId::new("sess-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""sess-42""#);
    }

    #[test]
    fn debug_shows_kind() {
        assert_eq!(format!("{:?}", ProgramId::new("3")), "ProgramId(3)");
        assert_eq!(format!("{:?}", SessionId::new("s")), "SessionId(s)");
    }

    #[test]
    fn rejects_non_scalar_ids() {
        assert!(serde_json::from_str::<ProgramId>("[1]").is_err());
        assert!(serde_json::from_str::<SessionId>("{}").is_err());
    }
}
