use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

use crate::errors::PreconditionError;

/// The closed set of scanners keysweep knows how to drive.
///
/// Config tables (`[tool.<id>]`), the CLI `--tool` flag and the dispatch
/// table all key on this enum, so an unknown tool can only ever show up as a
/// parse error at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Aes,
    Rsa,
    Serpent,
    Twofish,
}

impl ToolId {
    pub const ALL: [ToolId; 4] = [ToolId::Aes, ToolId::Rsa, ToolId::Serpent, ToolId::Twofish];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::Aes => "aes",
            ToolId::Rsa => "rsa",
            ToolId::Serpent => "serpent",
            ToolId::Twofish => "twofish",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = PreconditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aes" => Ok(ToolId::Aes),
            "rsa" => Ok(ToolId::Rsa),
            "serpent" => Ok(ToolId::Serpent),
            "twofish" => Ok(ToolId::Twofish),
            other => Err(PreconditionError::UnknownTool(other.to_string())),
        }
    }
}
