//! Variable placement on a staggered (Arakawa C) grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a quantity is sampled within a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Cell centre (tracers)
    T,
    /// East face
    U,
    /// North face
    V,
    /// Vertical face, shares the centre's horizontal position
    W,
    /// Cell corner
    F,
}

impl Placement {
    pub const ALL: [Placement; 5] = [
        Placement::T,
        Placement::U,
        Placement::V,
        Placement::W,
        Placement::F,
    ];

    /// Suffix used in field names (`lon_t`, `depth_u`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::T => "t",
            Placement::U => "u",
            Placement::V => "v",
            Placement::W => "w",
            Placement::F => "f",
        }
    }

    /// Placement encoded by the last character of a dimension name, e.g. `lon_u`.
    pub fn from_name_suffix(name: &str) -> Option<Self> {
        name.chars().last().and_then(|c| c.to_string().parse().ok())
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "t" => Ok(Placement::T),
            "u" => Ok(Placement::U),
            "v" => Ok(Placement::V),
            "w" => Ok(Placement::W),
            "f" => Ok(Placement::F),
            other => Err(format!("unknown grid placement: {}", other)),
        }
    }
}
