//! Configuration management for `TripKML`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripKmlError;
use crate::extract::DEFAULT_COORDINATE_PRECISION;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `TripKML`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripKmlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Output rendering and placement
    #[serde(default)]
    pub output: OutputConfig,
    /// Extraction tuning
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Prefix dated placemark names with `[DD.MM]`
    #[serde(default)]
    pub date_prefix: bool,
    /// Indentation width of the generated KML, 0 for compact output
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Directory the KML files are written to
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

/// Extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Decimal digits compared when detecting duplicate places
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: u32,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_indent() -> usize {
    2
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_coordinate_precision() -> u32 {
    DEFAULT_COORDINATE_PRECISION
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            date_prefix: false,
            indent: default_indent(),
            directory: default_output_directory(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: default_coordinate_precision(),
        }
    }
}

impl TripKmlConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("tripkml.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPKML_OUTPUT__DATE_PREFIX=true style overrides
        builder = builder.add_source(
            Environment::with_prefix("TRIPKML")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripKmlConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripkml").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.output.directory.is_empty() {
            self.output.directory = default_output_directory();
        }
        if self.extraction.coordinate_precision == 0 {
            self.extraction.coordinate_precision = default_coordinate_precision();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.output.indent > 8 {
            return Err(TripKmlError::config("Output indent cannot exceed 8").into());
        }

        if self.extraction.coordinate_precision > 9 {
            return Err(
                TripKmlError::config("Coordinate precision cannot exceed 9 digits").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripKmlError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripKmlError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
