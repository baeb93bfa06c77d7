//! Physical quantities: volume and mass
//!
//! Both are stored as integers in their smallest unit (millilitres and
//! milligrams) so sums over pocket contents are exact. Definition documents
//! spell them as unit strings (`"1 L"`, `"250 ml"`, `"2 kg"`), optionally
//! compound (`"1 L 250 ml"`). A bare JSON integer is read as millilitres for
//! volume and grams for mass.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const VOLUME_UNITS: &[(&str, f64)] = &[("ml", 1.0), ("L", 1_000.0), ("l", 1_000.0)];
const MASS_UNITS: &[(&str, f64)] = &[("mg", 1.0), ("g", 1_000.0), ("kg", 1_000_000.0)];

/// Raw document form of a quantity: a unit string or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitAmount {
    Number(i64),
    Text(String),
}

/// Sum the `<amount> <unit>` pairs in `input`, scaled to the base unit.
fn parse_with_units(input: &str, kind: &str, units: &[(&str, f64)]) -> Result<i64, DomainError> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(DomainError::parse(format!("Empty {} string", kind)));
    }

    let mut total = 0.0_f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);
        let amount: f64 = number.parse().map_err(|_| {
            DomainError::parse(format!("Invalid {} amount '{}' in '{}'", kind, number, input))
        })?;

        let tail = tail.trim_start();
        let unit_end = tail
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let factor = units
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, factor)| *factor)
            .ok_or_else(|| {
                DomainError::parse(format!("Unknown {} unit '{}' in '{}'", kind, unit, input))
            })?;

        total += amount * factor;
        rest = tail.trim_start();
    }

    Ok(total.round() as i64)
}

macro_rules! quantity_ops {
    ($name:ident) => {
        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Sum for $name {
            fn sum<It: Iterator<Item = Self>>(iter: It) -> Self {
                iter.fold(Self::ZERO, Add::add)
            }
        }

        impl<'a> Sum<&'a $name> for $name {
            fn sum<It: Iterator<Item = &'a Self>>(iter: It) -> Self {
                iter.copied().sum()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.to_string()
            }
        }
    };
}

// ============================================================================
// Volume
// ============================================================================

/// A volume in millilitres
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "UnitAmount", into = "String")]
pub struct Volume(i64);

impl Volume {
    pub const ZERO: Self = Self(0);

    pub const fn from_milliliters(ml: i64) -> Self {
        Self(ml)
    }

    pub const fn from_liters(liters: i64) -> Self {
        Self(liters * 1_000)
    }

    pub const fn as_milliliters(self) -> i64 {
        self.0
    }
}

quantity_ops!(Volume);

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 != 0 && self.0 % 1_000 == 0 {
            write!(f, "{} L", self.0 / 1_000)
        } else {
            write!(f, "{} ml", self.0)
        }
    }
}

impl FromStr for Volume {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_with_units(s, "volume", VOLUME_UNITS).map(Self)
    }
}

impl TryFrom<UnitAmount> for Volume {
    type Error = DomainError;

    fn try_from(raw: UnitAmount) -> Result<Self, Self::Error> {
        match raw {
            UnitAmount::Number(ml) => Ok(Self(ml)),
            UnitAmount::Text(text) => text.parse(),
        }
    }
}

// ============================================================================
// Mass
// ============================================================================

/// A mass in milligrams
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "UnitAmount", into = "String")]
pub struct Mass(i64);

impl Mass {
    pub const ZERO: Self = Self(0);

    pub const fn from_milligrams(mg: i64) -> Self {
        Self(mg)
    }

    pub const fn from_grams(grams: i64) -> Self {
        Self(grams * 1_000)
    }

    pub const fn from_kilograms(kg: i64) -> Self {
        Self(kg * 1_000_000)
    }

    pub const fn as_milligrams(self) -> i64 {
        self.0
    }
}

quantity_ops!(Mass);

/// Scales a mass, rounding to the nearest milligram.
impl Mul<f32> for Mass {
    type Output = Self;

    fn mul(self, factor: f32) -> Self {
        Self((self.0 as f64 * f64::from(factor)).round() as i64)
    }
}

impl fmt::Display for Mass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "0 g")
        } else if self.0 % 1_000_000 == 0 {
            write!(f, "{} kg", self.0 / 1_000_000)
        } else if self.0 % 1_000 == 0 {
            write!(f, "{} g", self.0 / 1_000)
        } else {
            write!(f, "{} mg", self.0)
        }
    }
}

impl FromStr for Mass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_with_units(s, "mass", MASS_UNITS).map(Self)
    }
}

impl TryFrom<UnitAmount> for Mass {
    type Error = DomainError;

    fn try_from(raw: UnitAmount) -> Result<Self, Self::Error> {
        match raw {
            UnitAmount::Number(grams) => Ok(Self::from_grams(grams)),
            UnitAmount::Text(text) => text.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod volume {
        use super::*;

        #[test]
        fn parses_simple_and_compound_strings() {
            assert_eq!("500 ml".parse::<Volume>().unwrap(), Volume::from_milliliters(500));
            assert_eq!("1 L".parse::<Volume>().unwrap(), Volume::from_liters(1));
            assert_eq!("1.5 L".parse::<Volume>().unwrap(), Volume::from_milliliters(1_500));
            assert_eq!("250ml".parse::<Volume>().unwrap(), Volume::from_milliliters(250));
            assert_eq!(
                "1 L 250 ml".parse::<Volume>().unwrap(),
                Volume::from_milliliters(1_250)
            );
        }

        #[test]
        fn rejects_unknown_units_and_garbage() {
            assert!(matches!("5 gallons".parse::<Volume>(), Err(DomainError::Parse(_))));
            assert!(matches!("".parse::<Volume>(), Err(DomainError::Parse(_))));
            assert!(matches!("ml".parse::<Volume>(), Err(DomainError::Parse(_))));
            assert!(matches!("500".parse::<Volume>(), Err(DomainError::Parse(_))));
        }

        #[test]
        fn displays_in_largest_exact_unit() {
            assert_eq!(Volume::from_liters(2).to_string(), "2 L");
            assert_eq!(Volume::from_milliliters(750).to_string(), "750 ml");
            assert_eq!(Volume::ZERO.to_string(), "0 ml");
        }

        #[test]
        fn deserializes_strings_and_bare_numbers() {
            let from_text: Volume = serde_json::from_str("\"2 L\"").unwrap();
            let from_number: Volume = serde_json::from_str("300").unwrap();
            assert_eq!(from_text, Volume::from_liters(2));
            assert_eq!(from_number, Volume::from_milliliters(300));
            assert!(serde_json::from_str::<Volume>("\"2 furlongs\"").is_err());
        }

        #[test]
        fn sums_and_subtracts() {
            let parts = [Volume::from_milliliters(200), Volume::from_milliliters(300)];
            let total: Volume = parts.iter().sum();
            assert_eq!(total, Volume::from_milliliters(500));
            assert_eq!(
                Volume::from_liters(1) - total,
                Volume::from_milliliters(500)
            );
        }
    }

    mod mass {
        use super::*;

        #[test]
        fn parses_metric_suffixes() {
            assert_eq!("2 kg".parse::<Mass>().unwrap(), Mass::from_kilograms(2));
            assert_eq!("250 g".parse::<Mass>().unwrap(), Mass::from_grams(250));
            assert_eq!("15 mg".parse::<Mass>().unwrap(), Mass::from_milligrams(15));
        }

        #[test]
        fn bare_number_is_grams() {
            let mass: Mass = serde_json::from_str("40").unwrap();
            assert_eq!(mass, Mass::from_grams(40));
        }

        #[test]
        fn multiplier_rounds_to_milligrams() {
            assert_eq!(Mass::from_grams(100) * 0.5, Mass::from_grams(50));
            assert_eq!(Mass::from_milligrams(3) * 0.5, Mass::from_milligrams(2));
        }

        #[test]
        fn serializes_as_unit_string() {
            let json = serde_json::to_string(&Mass::from_kilograms(2)).unwrap();
            assert_eq!(json, "\"2 kg\"");
            assert_eq!(Mass::from_milligrams(1_500).to_string(), "1500 mg");
            assert_eq!(Mass::ZERO.to_string(), "0 g");
        }
    }
}
