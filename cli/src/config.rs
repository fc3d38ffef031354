//! Configuration for the report commands
//!
//! Values come from, in increasing priority: built-in defaults, a TOML
//! settings file (`--config PATH`, or `kernscope.toml` in the working
//! directory if present), `KERNSCOPE_*` environment variables, and finally
//! command-line flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default column selection
pub const DEFAULT_COLUMNS: &str = "idx,dir,sub,mod,op,kernel,kernel_long,sil";

/// A report column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Idx,
    Seq,
    AltSeq,
    Tid,
    Layer,
    Trace,
    Dir,
    Sub,
    Mod,
    Op,
    Kernel,
    KernelLong,
    Sil,
    Device,
    Stream,
    Grid,
    Block,
}

impl Column {
    pub const ALL: [Column; 17] = [
        Column::Idx,
        Column::Seq,
        Column::AltSeq,
        Column::Tid,
        Column::Layer,
        Column::Trace,
        Column::Dir,
        Column::Sub,
        Column::Mod,
        Column::Op,
        Column::Kernel,
        Column::KernelLong,
        Column::Sil,
        Column::Device,
        Column::Stream,
        Column::Grid,
        Column::Block,
    ];

    /// Name accepted by `-c`
    pub fn name(&self) -> &'static str {
        match self {
            Column::Idx => "idx",
            Column::Seq => "seq",
            Column::AltSeq => "altseq",
            Column::Tid => "tid",
            Column::Layer => "layer",
            Column::Trace => "trace",
            Column::Dir => "dir",
            Column::Sub => "sub",
            Column::Mod => "mod",
            Column::Op => "op",
            Column::Kernel => "kernel",
            Column::KernelLong => "kernel_long",
            Column::Sil => "sil",
            Column::Device => "device",
            Column::Stream => "stream",
            Column::Grid => "grid",
            Column::Block => "block",
        }
    }

    /// Table heading
    pub fn header(&self) -> &'static str {
        match self {
            Column::Idx => "Idx",
            Column::Seq => "SeqId",
            Column::AltSeq => "AltSeqId",
            Column::Tid => "TId",
            Column::Layer => "Layer",
            Column::Trace => "Trace",
            Column::Dir => "Direction",
            Column::Sub => "Sub",
            Column::Mod => "Module",
            Column::Op => "Op",
            Column::Kernel => "Kernel",
            Column::KernelLong => "Kernel Name",
            Column::Sil => "Sil(ns)",
            Column::Device => "Device",
            Column::Stream => "Stream",
            Column::Grid => "Grid",
            Column::Block => "Block",
        }
    }

    /// Numeric columns are right aligned in tables
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Column::Idx | Column::Tid | Column::Sub | Column::Sil | Column::Device | Column::Stream
        )
    }

    /// Free-text columns share whatever room `-w` leaves
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Column::Layer
                | Column::Trace
                | Column::Mod
                | Column::Op
                | Column::Kernel
                | Column::KernelLong
        )
    }
}

impl std::str::FromStr for Column {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = Column::ALL.iter().map(Column::name).collect();
                anyhow::anyhow!(
                    "{} is not a valid column name. Valid column names are {}.",
                    s,
                    valid.join(",")
                )
            })
    }
}

/// Parse a comma separated column list
pub fn parse_columns(s: &str) -> Result<Vec<Column>> {
    s.split(',').map(str::parse).collect()
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Values read from the settings file and environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub profiling_start: Option<u64>,
    pub columns: Option<String>,
    pub width: Option<usize>,
}

impl Settings {
    /// Load the settings file and `KERNSCOPE_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name("kernscope").required(false),
        };

        ::config::Config::builder()
            .add_source(file)
            .add_source(::config::Environment::with_prefix("KERNSCOPE").try_parsing(true))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}

/// Fully resolved report configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Kernels must start strictly after this timestamp
    pub profiling_start: u64,

    pub columns: Vec<Column>,

    pub format: OutputFormat,

    /// Table width; 0 means unbounded
    pub width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            profiling_start: 0,
            columns: parse_columns(DEFAULT_COLUMNS).unwrap_or_default(),
            format: OutputFormat::Table,
            width: 0,
        }
    }
}

/// Command-line overrides, `None` where the flag was not given
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profiling_start: Option<u64>,
    pub columns: Option<String>,
    pub width: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl ReportConfig {
    /// Layer command-line overrides on top of loaded settings
    pub fn resolve(settings: Settings, overrides: Overrides) -> Result<Self> {
        let columns = overrides
            .columns
            .or(settings.columns)
            .unwrap_or_else(|| DEFAULT_COLUMNS.to_string());

        let format = overrides.format.unwrap_or(OutputFormat::Table);

        // A configured width only shapes tables
        let width = match format {
            OutputFormat::Table => overrides.width.or(settings.width).unwrap_or(0),
            OutputFormat::Csv | OutputFormat::Json => overrides.width.unwrap_or(0),
        };

        let config = Self {
            profiling_start: overrides
                .profiling_start
                .or(settings.profiling_start)
                .unwrap_or(0),
            columns: parse_columns(&columns)?,
            format,
            width,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            anyhow::bail!("At least one column must be selected");
        }

        if self.format != OutputFormat::Table && self.width != 0 {
            anyhow::bail!("Width only applies to columnated output, not CSV or JSON");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_columns() {
        let columns = parse_columns("idx,kernel,sil").unwrap();
        assert_eq!(columns, vec![Column::Idx, Column::Kernel, Column::Sil]);

        let err = parse_columns("idx,flops").unwrap_err().to_string();
        assert!(err.starts_with("flops is not a valid column name."));
        assert!(err.contains("idx,seq,altseq"));
    }

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.columns.len(), 8);
        assert_eq!(config.columns[0], Column::Idx);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_win_over_settings() {
        let settings = Settings {
            profiling_start: Some(10),
            columns: Some("kernel".to_string()),
            width: Some(80),
        };
        let overrides = Overrides {
            profiling_start: Some(20),
            ..Default::default()
        };

        let config = ReportConfig::resolve(settings, overrides).unwrap();
        assert_eq!(config.profiling_start, 20);
        assert_eq!(config.columns, vec![Column::Kernel]);
        assert_eq!(config.width, 80);
        assert_eq!(config.format, OutputFormat::Table);
    }

    #[test]
    fn test_csv_with_width_is_invalid() {
        let overrides = Overrides {
            format: Some(OutputFormat::Csv),
            width: Some(100),
            ..Default::default()
        };
        assert!(ReportConfig::resolve(Settings::default(), overrides).is_err());
    }

    #[test]
    fn test_configured_width_ignored_for_csv_and_json() {
        for format in [OutputFormat::Csv, OutputFormat::Json] {
            let settings = Settings {
                width: Some(120),
                ..Default::default()
            };
            let overrides = Overrides {
                format: Some(format),
                ..Default::default()
            };

            let config = ReportConfig::resolve(settings, overrides).unwrap();
            assert_eq!(config.format, format);
            assert_eq!(config.width, 0);
        }

        let settings = Settings {
            width: Some(120),
            ..Default::default()
        };
        let config = ReportConfig::resolve(settings, Overrides::default()).unwrap();
        assert_eq!(config.width, 120);
    }

    #[test]
    fn test_load_settings_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "profiling_start = 1234").unwrap();
        writeln!(file, "columns = \"idx,op\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.profiling_start, Some(1234));
        assert_eq!(settings.columns.as_deref(), Some("idx,op"));
        assert_eq!(settings.width, None);
    }
}
