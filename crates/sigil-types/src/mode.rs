use std::fmt;

use sigil_common::{SigilError, SigilResult};

/// Execution mode a procedure is registered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Mode {
    Read,
    Write,
    Schema,
    Dbms,
    Default,
}

impl Mode {
    /// Parse a user-supplied mode string, case-insensitive. Absent or
    /// empty means READ.
    pub fn parse(text: Option<&str>) -> SigilResult<Self> {
        let Some(text) = text.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::Read);
        };
        match text.to_uppercase().as_str() {
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            "SCHEMA" => Ok(Self::Schema),
            "DBMS" => Ok(Self::Dbms),
            "DEFAULT" => Ok(Self::Default),
            other => Err(SigilError::Validation(format!(
                "unknown procedure mode: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Schema => "SCHEMA",
            Self::Dbms => "DBMS",
            Self::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
