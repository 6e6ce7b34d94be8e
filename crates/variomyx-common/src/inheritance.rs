//! Mendelian inheritance modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VariomyxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InheritanceMode {
    AutosomalDominant,
    AutosomalRecessive,
    XDominant,
    XRecessive,
    Mitochondrial,
    /// No mode requested; every gene counts as compatible.
    Any,
}

impl InheritanceMode {
    /// The modes segregation analysis tests for. `Any` is a request, not a pattern.
    pub const CANDIDATES: [InheritanceMode; 5] = [
        InheritanceMode::AutosomalDominant,
        InheritanceMode::AutosomalRecessive,
        InheritanceMode::XDominant,
        InheritanceMode::XRecessive,
        InheritanceMode::Mitochondrial,
    ];

    pub fn abbreviation(&self) -> &'static str {
        match self {
            InheritanceMode::AutosomalDominant  => "AD",
            InheritanceMode::AutosomalRecessive => "AR",
            InheritanceMode::XDominant          => "XD",
            InheritanceMode::XRecessive         => "XR",
            InheritanceMode::Mitochondrial      => "MT",
            InheritanceMode::Any                => "ANY",
        }
    }

    pub fn is_x_linked(&self) -> bool {
        matches!(self, InheritanceMode::XDominant | InheritanceMode::XRecessive)
    }
}

impl fmt::Display for InheritanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for InheritanceMode {
    type Err = VariomyxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AD" | "AUTOSOMAL_DOMINANT"  => Ok(InheritanceMode::AutosomalDominant),
            "AR" | "AUTOSOMAL_RECESSIVE" => Ok(InheritanceMode::AutosomalRecessive),
            "XD" | "X_DOMINANT"          => Ok(InheritanceMode::XDominant),
            "XR" | "X_RECESSIVE"         => Ok(InheritanceMode::XRecessive),
            "MT" | "MITOCHONDRIAL"       => Ok(InheritanceMode::Mitochondrial),
            "ANY" | ""                   => Ok(InheritanceMode::Any),
            other => Err(VariomyxError::Config(format!("Unknown inheritance mode: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_exclude_any() {
        assert!(!InheritanceMode::CANDIDATES.contains(&InheritanceMode::Any));
    }

    #[test]
    fn test_parse_abbreviations() {
        assert_eq!("ad".parse::<InheritanceMode>().unwrap(), InheritanceMode::AutosomalDominant);
        assert_eq!("X_RECESSIVE".parse::<InheritanceMode>().unwrap(), InheritanceMode::XRecessive);
        assert!("polygenic".parse::<InheritanceMode>().is_err());
    }
}
