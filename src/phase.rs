//! The closed phase vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A step of work within a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Analysis,
    Processing,
    Output,
}

impl Phase {
    /// Every allowed phase, in canonical order
    pub const ALL: [Phase; 3] = [Phase::Analysis, Phase::Processing, Phase::Output];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Analysis => "analysis",
            Phase::Processing => "processing",
            Phase::Output => "output",
        }
    }

    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|phase| phase.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Phase {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid phase: {}. Must be one of: {}",
            self.0,
            Phase::valid_names()
        )
    }
}

impl std::error::Error for UnknownPhase {}

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(Phase::Analysis),
            "processing" => Ok(Phase::Processing),
            "output" => Ok(Phase::Output),
            other => Err(UnknownPhase(other.to_string())),
        }
    }
}
