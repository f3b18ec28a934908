//! Pipeline layer: zip normalization and the three independent stages.
//!
//! ```text
//!  facilities ──► facility::prepare ─────────► cleaned facility table
//!  population ──► population::aggregate ─────► child-population table
//!  income ──────┐
//!               ├► demand::classify_tables ──► demand classification table
//!  employment ──┘
//! ```
//!
//! Every stage takes its source tables by reference and returns new tables;
//! no stage reads another's output.

pub mod demand;
pub mod facility;
pub mod population;
pub mod zip;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;

use crate::config::PipelineConfig;
use crate::data::loader::load_file;
use crate::data::model::Table;
use crate::data::writer::stage_csv;
use demand::{DemandOutcome, Thresholds};
use facility::FacilityOutcome;
use population::PopulationOutcome;

/// Name of the canonical zip column in every output table.
pub const CLEANED_ZIP_COLUMN: &str = "zip_code_cleaned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Stage {
    Facility,
    Population,
    Demand,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Facility, Stage::Population, Stage::Demand];
}

/// Source tables for a run. A stage that is not selected needs no input.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub facilities: Option<Table>,
    pub population: Option<Table>,
    pub income: Option<Table>,
    pub employment: Option<Table>,
}

/// Results of the stages that ran.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub facility: Option<FacilityOutcome>,
    pub population: Option<PopulationOutcome>,
    pub demand: Option<DemandOutcome>,
}

/// Run the selected stages over in-memory sources. A selected stage whose
/// sources are absent is skipped.
pub fn run_stages(
    sources: &Sources,
    stages: &[Stage],
    thresholds: &Thresholds,
) -> crate::error::Result<RunSummary> {
    let mut summary = RunSummary::default();

    if stages.contains(&Stage::Facility) {
        if let Some(raw) = &sources.facilities {
            summary.facility = Some(facility::prepare(raw)?);
        }
    }
    if stages.contains(&Stage::Population) {
        if let Some(raw) = &sources.population {
            summary.population = Some(population::aggregate(raw)?);
        }
    }
    if stages.contains(&Stage::Demand) {
        if let (Some(income), Some(employment)) = (&sources.income, &sources.employment) {
            summary.demand = Some(demand::classify_tables(income, employment, thresholds)?);
        }
    }

    Ok(summary)
}

/// Load the source files the selected stages need.
pub fn load_sources(config: &PipelineConfig, stages: &[Stage]) -> Result<Sources> {
    let load = |file: &Path| load_file(&config.input_path(file));
    let mut sources = Sources::default();

    if stages.contains(&Stage::Facility) {
        sources.facilities = Some(load(&config.inputs.facilities)?);
    }
    if stages.contains(&Stage::Population) {
        sources.population = Some(load(&config.inputs.population)?);
    }
    if stages.contains(&Stage::Demand) {
        sources.income = Some(load(&config.inputs.income)?);
        sources.employment = Some(load(&config.inputs.employment)?);
    }
    Ok(sources)
}

/// Write every output table present in `summary`. All tables are staged
/// before any is moved into place, so a failed write leaves no outputs.
pub fn write_outputs(config: &PipelineConfig, summary: &RunSummary) -> Result<()> {
    let outputs = [
        (summary.facility.as_ref().map(|o| &o.table), &config.outputs.facilities),
        (summary.population.as_ref().map(|o| &o.table), &config.outputs.population),
        (summary.demand.as_ref().map(|o| &o.table), &config.outputs.demand),
    ];
    let staged = outputs
        .into_iter()
        .filter_map(|(table, file)| table.map(|t| stage_csv(t, &config.output_path(file))))
        .collect::<Result<Vec<_>>>()?;
    for output in staged {
        output.commit()?;
    }
    Ok(())
}

/// Load, run and write in one batch.
pub fn execute(config: &PipelineConfig, stages: &[Stage]) -> Result<RunSummary> {
    info!("running stages {stages:?}");
    let sources = load_sources(config, stages)?;
    let summary = run_stages(&sources, stages, &config.thresholds)
        .context("pipeline stage failed")?;
    write_outputs(config, &summary)?;
    Ok(summary)
}
