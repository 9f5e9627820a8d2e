//! Browser configuration.
//!
//! Read from `.toml` or `.json`, chosen by file extension. Every section has
//! defaults, so an empty or missing file yields a working configuration.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    render::ViewFlags,
    units::{ConversionEntry, ConversionTable, UnitContext, UnitSystem},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BrowserConfig {
    pub display: DisplayConfig,
    pub pagination: PaginationConfig,
    pub units: UnitsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde(flatten)]
    pub flags: ViewFlags,
    /// Name of the unit system used for display. Values are shown in their
    /// storage units when unset.
    pub unit_system: Option<String>,
}

/// Window sizes for long repeating sub-sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PaginationConfig {
    /// Elements shown initially from the start of a list.
    pub top: usize,
    /// Elements shown initially from the end of a list.
    pub bottom: usize,
    /// Elements revealed by one "more" step.
    pub page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            top: 10,
            bottom: 5,
            page: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct UnitsConfig {
    /// Named unit systems.
    pub systems: BTreeMap<String, UnitSystem>,
    /// Conversion factors between storage and display units.
    pub conversions: Vec<ConversionEntry>,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        let conversions = vec![
            entry("joule", "electron_volt", 6.241_509_074_460_763e18, 0.0),
            entry("meter", "angstrom", 1e10, 0.0),
            entry("kelvin", "celsius", 1.0, -273.15),
            entry("second", "femtosecond", 1e15, 0.0),
        ];
        let display = UnitSystem {
            units: conversions
                .iter()
                .map(|c| (c.from.clone(), c.to.clone()))
                .collect(),
        };
        Self {
            systems: BTreeMap::from([
                ("SI".to_string(), UnitSystem::default()),
                ("display".to_string(), display),
            ]),
            conversions,
        }
    }
}

fn entry(from: &str, to: &str, multiplier: f64, constant: f64) -> ConversionEntry {
    ConversionEntry {
        from: from.to_string(),
        to: to.to_string(),
        multiplier,
        constant,
    }
}

impl BrowserConfig {
    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_str_with_ext(&content, path)?;
        config.validate()?;
        debug!("loaded config {}", path.display());
        Ok(config)
    }

    /// Parse config text; the format follows the extension of `path`.
    pub fn from_str_with_ext(content: &str, path: &Path) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
            "json" => serde_json::from_str(content)?,
            "toml" => toml::from_str(content)?,
            ext => bail!("Unsupported config file extension: {ext:?}"),
        };
        Ok(config)
    }

    /// Check the selected unit system against the conversion table.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.unit_context().map(|_| ())
    }

    /// The unit context for the selected unit system.
    pub fn unit_context(&self) -> anyhow::Result<UnitContext> {
        let Some(name) = &self.display.unit_system else {
            return Ok(UnitContext::storage_units());
        };
        let Some(system) = self.units.systems.get(name) else {
            bail!("unknown unit system `{name}`");
        };
        let table = ConversionTable::from_entries(&self.units.conversions);
        UnitContext::new(system.clone(), table)
            .with_context(|| format!("invalid unit system `{name}`"))
    }

    /// JSON Schema of the config format.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(BrowserConfig)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert_eq!(config.pagination, PaginationConfig {
            top: 10,
            bottom: 5,
            page: 10
        });
        assert!(!config.display.flags.show_code_specific);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BrowserConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BrowserConfig::default());
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            "toml",
            r#"
[display]
show_code_specific = true
unit_system = "display"

[pagination]
top = 3
"#,
        );
        let config = BrowserConfig::load(file.path()).unwrap();
        assert!(config.display.flags.show_code_specific);
        assert!(!config.display.flags.show_meta);
        assert_eq!(config.pagination.top, 3);
        assert_eq!(config.pagination.bottom, 5);

        let units = config.unit_context().unwrap();
        let (v, unit) = units.convert(300.0, "kelvin").unwrap();
        assert_eq!(unit, "celsius");
        assert!((v - 26.85).abs() < 1e-9);
    }

    #[test]
    fn test_load_json() {
        let file = write_config("json", r#"{"display": {"show_meta": true}}"#);
        let config = BrowserConfig::load(file.path()).unwrap();
        assert!(config.display.flags.show_meta);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config("yaml", "display: {}");
        let err = BrowserConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file extension"));
    }

    #[test]
    fn test_missing_conversion_is_rejected() {
        let file = write_config(
            "toml",
            r#"
[display]
unit_system = "mine"

[units.systems.mine.units]
meter = "bohr"
"#,
        );
        let err = BrowserConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("no conversion from `meter` to `bohr`"));
    }

    #[test]
    fn test_unknown_unit_system() {
        let mut config = BrowserConfig::default();
        config.display.unit_system = Some("imperial".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_schema_lists_sections() {
        let schema = BrowserConfig::json_schema();
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("display"));
        assert!(props.contains_key("pagination"));
        assert!(props.contains_key("units"));
    }
}
