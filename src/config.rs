use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::pipeline::demand::Thresholds;

/// Run configuration. Every key is optional in the TOML file:
///
/// ```toml
/// input_dir = "data"
/// output_dir = "out"
///
/// [inputs]
/// population = "population_2020.csv"
///
/// [thresholds]
/// employment_rate = 0.55
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub inputs: InputFiles,
    pub outputs: OutputFiles,
    pub thresholds: Thresholds,
    /// Rows shown in each console preview.
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            inputs: InputFiles::default(),
            outputs: OutputFiles::default(),
            thresholds: Thresholds::default(),
            preview_rows: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub facilities: PathBuf,
    pub population: PathBuf,
    pub income: PathBuf,
    pub employment: PathBuf,
}

impl Default for InputFiles {
    fn default() -> Self {
        InputFiles {
            facilities: "child_care_regulated.csv".into(),
            population: "population.csv".into(),
            income: "avg_individual_income.csv".into(),
            employment: "employment_rate.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFiles {
    pub facilities: PathBuf,
    pub population: PathBuf,
    pub demand: PathBuf,
}

impl Default for OutputFiles {
    fn default() -> Self {
        OutputFiles {
            facilities: "child_care_regulated_cleaned.csv".into(),
            population: "population_calculated.csv".into(),
            demand: "demand_classification.csv".into(),
        }
    }
}

impl PipelineConfig {
    /// Read a TOML config file; absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.thresholds.employment_rate.is_finite(),
            "employment_rate threshold must be finite"
        );
        ensure!(
            self.thresholds.average_income.is_finite(),
            "average_income threshold must be finite"
        );
        Ok(())
    }

    /// Relative input names resolve against `input_dir`.
    pub fn input_path(&self, file: &Path) -> PathBuf {
        self.input_dir.join(file)
    }

    /// Relative output names resolve against `output_dir`.
    pub fn output_path(&self, file: &Path) -> PathBuf {
        self.output_dir.join(file)
    }
}
