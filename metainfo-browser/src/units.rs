//! Unit systems and display-time unit conversion.
//!
//! Values are stored in a storage unit declared by their quantity. A
//! [`UnitSystem`] maps storage units to display units, and a
//! [`ConversionTable`] supplies the affine factors between them:
//! `display = value * multiplier + constant`. The constant is only non-zero
//! for offset scales such as temperatures.

use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::UnitError;

/// Affine conversion factors for one unit pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Conversion {
    pub multiplier: f64,
    #[serde(default)]
    pub constant: f64,
}

impl Conversion {
    pub const IDENTITY: Conversion = Conversion {
        multiplier: 1.0,
        constant: 0.0,
    };

    pub fn apply(&self, value: f64) -> f64 {
        value * self.multiplier + self.constant
    }
}

/// One row of the conversion table, as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConversionEntry {
    /// Storage unit.
    pub from: String,
    /// Display unit.
    pub to: String,
    pub multiplier: f64,
    /// Additive offset, e.g. `-273.15` for kelvin to celsius.
    #[serde(default)]
    pub constant: f64,
}

/// Conversion factors keyed by `(source unit, target unit)`.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    factors: HashMap<(String, String), Conversion>,
}

impl ConversionTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ConversionEntry>) -> Self {
        let mut table = Self::default();
        for e in entries {
            table.insert(&e.from, &e.to, Conversion {
                multiplier: e.multiplier,
                constant: e.constant,
            });
        }
        table
    }

    pub fn insert(&mut self, from: &str, to: &str, conversion: Conversion) {
        self.factors
            .insert((from.to_string(), to.to_string()), conversion);
    }

    /// Factors for `from -> to`; a unit always converts to itself.
    pub fn get(&self, from: &str, to: &str) -> Option<Conversion> {
        if from == to {
            return Some(Conversion::IDENTITY);
        }
        self.factors
            .get(&(from.to_string(), to.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// A named choice of display units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnitSystem {
    /// Storage unit to display unit. Units not listed are shown as stored.
    #[serde(default)]
    pub units: BTreeMap<String, String>,
}

impl UnitSystem {
    pub fn display_unit<'a>(&'a self, storage: &'a str) -> &'a str {
        self.units.get(storage).map(String::as_str).unwrap_or(storage)
    }
}

/// The selected unit system together with the conversion table.
#[derive(Debug, Clone, Default)]
pub struct UnitContext {
    system: UnitSystem,
    table: ConversionTable,
}

impl UnitContext {
    /// Build a context, failing if the system maps a unit pair the table
    /// has no factors for.
    pub fn new(system: UnitSystem, table: ConversionTable) -> Result<Self, UnitError> {
        validate(&system, &table)?;
        Ok(Self { system, table })
    }

    /// Context that displays every value in its storage unit.
    pub fn storage_units() -> Self {
        Self::default()
    }

    /// Convert a stored value into the display unit for `unit`.
    pub fn convert<'a>(&'a self, value: f64, unit: &'a str) -> Result<(f64, &'a str), UnitError> {
        let target = self.system.display_unit(unit);
        let conversion =
            self.table
                .get(unit, target)
                .ok_or_else(|| UnitError::MissingConversion {
                    from: unit.to_string(),
                    to: target.to_string(),
                })?;
        Ok((conversion.apply(value), target))
    }
}

/// Check that every pair a unit system maps has conversion factors.
pub fn validate(system: &UnitSystem, table: &ConversionTable) -> Result<(), UnitError> {
    for (from, to) in &system.units {
        if table.get(from, to).is_none() {
            return Err(UnitError::MissingConversion {
                from: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(())
}

/// Format a number for previews: four significant digits, exponential
/// notation outside `[1e-3, 1e4)`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let abs = value.abs();
    if !(1e-3..1e4).contains(&abs) {
        return format!("{value:.3e}");
    }
    let decimals = (3 - abs.log10().floor() as i32).max(0) as usize;
    let s = format!("{value:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ConversionTable {
        ConversionTable::from_entries(&[
            ConversionEntry {
                from: "joule".into(),
                to: "electron_volt".into(),
                multiplier: 6.241509074e18,
                constant: 0.0,
            },
            ConversionEntry {
                from: "kelvin".into(),
                to: "celsius".into(),
                multiplier: 1.0,
                constant: -273.15,
            },
        ])
    }

    fn system(pairs: &[(&str, &str)]) -> UnitSystem {
        UnitSystem {
            units: pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_linear_and_affine_conversion() {
        let ctx = UnitContext::new(
            system(&[("joule", "electron_volt"), ("kelvin", "celsius")]),
            table(),
        )
        .unwrap();

        let (v, unit) = ctx.convert(1.602176634e-19, "joule").unwrap();
        assert_eq!(unit, "electron_volt");
        assert!((v - 1.0).abs() < 1e-9);

        let (v, unit) = ctx.convert(300.0, "kelvin").unwrap();
        assert_eq!(unit, "celsius");
        assert!((v - 26.85).abs() < 1e-9);

        // unmapped units stay as stored
        let (v, unit) = ctx.convert(2.0, "meter").unwrap();
        assert_eq!((v, unit), (2.0, "meter"));
    }

    #[test]
    fn test_missing_multiplier_is_a_config_error() {
        let err = UnitContext::new(system(&[("meter", "angstrom")]), table()).unwrap_err();
        assert_eq!(
            err,
            UnitError::MissingConversion {
                from: "meter".into(),
                to: "angstrom".into()
            }
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(26.85), "26.85");
        assert_eq!(format_number(1234.5678), "1235");
        assert_eq!(format_number(0.0123456), "0.01235");
        assert_eq!(format_number(12344.0), "1.234e4");
        assert_eq!(format_number(-0.0001), "-1.000e-4");
    }
}
