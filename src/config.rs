use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::generators::GenerationError;

/// Application-level constants
pub const APP_NAME: &str = "IcuSynth";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PATIENT_COUNT: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

/// Get the application data directory: ~/IcuSynth/ on all platforms.
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default OMOP database file
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("omop_cdm.db")
}

/// Filter used when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "icu_synth=info"
}

/// Tunables for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub patient_count: usize,
    pub seed: u64,
    pub vitals_batch_size: usize,
    pub labs_batch_size: usize,
    pub ventilation_batch_size: usize,
    /// Share of episodes that receive ventilator readings.
    pub ventilated_fraction: f64,
    /// Delete existing clinical rows before generating.
    pub clear_existing: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            patient_count: DEFAULT_PATIENT_COUNT,
            seed: DEFAULT_SEED,
            vitals_batch_size: 10_000,
            labs_batch_size: 5_000,
            ventilation_batch_size: 10_000,
            ventilated_fraction: 0.6,
            clear_existing: true,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GenerationError> {
        for (name, size) in [
            ("vitals_batch_size", self.vitals_batch_size),
            ("labs_batch_size", self.labs_batch_size),
            ("ventilation_batch_size", self.ventilation_batch_size),
        ] {
            if size == 0 {
                return Err(GenerationError::Config(format!("{name} must be at least 1")));
            }
        }
        if !(0.0..=1.0).contains(&self.ventilated_fraction) {
            return Err(GenerationError::Config(format!(
                "ventilated_fraction must be within [0, 1], got {}",
                self.ventilated_fraction
            )));
        }
        Ok(())
    }
}
