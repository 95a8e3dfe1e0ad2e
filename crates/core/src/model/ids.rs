use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of random bytes behind a `TestSessionId` (128 bits).
const SESSION_ID_BYTES: usize = 16;

/// Unique identifier for a question bank
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionBankId(u64);

impl QuestionBankId {
    /// Creates a new `QuestionBankId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a question
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(u64);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for an answer option
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(u64);

impl OptionId {
    /// Creates a new `OptionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Opaque identifier handed to the client for a started test.
///
/// Generated ids are 128 bits drawn from the thread-local CSPRNG and rendered
/// as lowercase hex. Ids coming back from clients are accepted verbatim; an
/// unknown id simply never matches a stored session.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestSessionId(String);

impl TestSessionId {
    /// Draws a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; SESSION_ID_BYTES];
        rand::rng().fill(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps an id received from a caller.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionBankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionBankId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionId({})", self.0)
    }
}

impl fmt::Debug for TestSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestSessionId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionBankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TestSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionBankId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(QuestionBankId::new)
            .map_err(|_| ParseIdError {
                kind: "QuestionBankId",
            })
    }
}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(QuestionId::new)
            .map_err(|_| ParseIdError { kind: "QuestionId" })
    }
}

impl FromStr for OptionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(OptionId::new)
            .map_err(|_| ParseIdError { kind: "OptionId" })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bank_id_from_str() {
        let id: QuestionBankId = "12".parse().unwrap();
        assert_eq!(id, QuestionBankId::new(12));
        assert_eq!(id.to_string(), "12");
    }

    #[test]
    fn question_id_from_str_invalid() {
        let err = "abc".parse::<QuestionId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse QuestionId from string");
    }

    #[test]
    fn option_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&OptionId::new(4)).unwrap();
        assert_eq!(json, "4");
    }

    #[test]
    fn generated_session_ids_are_128_bit_hex() {
        let id = TestSessionId::generate();
        assert_eq!(id.as_str().len(), SESSION_ID_BYTES * 2);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_session_ids_do_not_repeat() {
        let ids: HashSet<_> = (0..1_000).map(|_| TestSessionId::generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn session_id_serializes_as_string() {
        let id = TestSessionId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        let back: TestSessionId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);
    }
}
