//! Physical quantities used in the model comparisons.

use std::fmt;

use crate::Placement;

/// A physical quantity with its display symbol and unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Canonical variable name after cleaning
    pub name: &'static str,
    pub symbol: &'static str,
    pub unit: &'static str,
    /// Grid placement of the quantity in SYMPHONIE output
    pub placement: Placement,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.symbol, self.unit)
    }
}

pub const TEMPERATURE: Unit = Unit {
    name: "tem",
    symbol: "T",
    unit: "°C",
    placement: Placement::T,
};

pub const SALINITY: Unit = Unit {
    name: "sal",
    symbol: "S",
    unit: "psu",
    placement: Placement::T,
};

pub const DEPTH: Unit = Unit {
    name: "dpt",
    symbol: "Depth",
    unit: "m",
    placement: Placement::T,
};

pub const HEIGHT: Unit = Unit {
    name: "hgt",
    symbol: "Height",
    unit: "m",
    placement: Placement::T,
};

/// Look up a predefined quantity by canonical name.
pub fn by_name(name: &str) -> Option<Unit> {
    [TEMPERATURE, SALINITY, DEPTH, HEIGHT]
        .into_iter()
        .find(|u| u.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TEMPERATURE.to_string(), "T [°C]");
        assert_eq!(by_name("sal"), Some(SALINITY));
        assert_eq!(by_name("xyz"), None);
    }
}
